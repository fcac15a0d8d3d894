pub mod alignment;
pub mod axis_config;
pub mod curve_config;
pub mod handles;
pub mod primitives;
pub mod style_defaults;
pub mod types;
pub mod windowing;

pub use alignment::{
    AlignmentAnchor, AlignmentParams, AxisRange, align_range, aligned_range_for_mode,
};
pub use axis_config::AxisConfig;
pub use curve_config::CurveConfig;
pub use handles::{AxisItemId, AxisRenderHandle, CurveRenderHandle, ViewportId};
pub use style_defaults::StyleDefaults;
pub use types::{
    AlignmentMode, AxisSide, Color, DataPoint, LineStyle, RangeMode, UnitValue, ViewportRect,
};
