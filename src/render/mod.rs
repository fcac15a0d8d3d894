mod coordinate_aligner;
mod headless_surface;

pub use coordinate_aligner::{AxisCoordinateAligner, RefreshReport};
pub use headless_surface::HeadlessSurface;

use serde::{Deserialize, Serialize};

use crate::core::{AxisConfig, AxisItemId, AxisRange, AxisSide, Color, ViewportId, ViewportRect};
use crate::error::PlotResult;

/// What an axis item shows: side, text and color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisItemSpec {
    pub side: AxisSide,
    pub label: String,
    pub color: Color,
}

impl AxisItemSpec {
    #[must_use]
    pub fn from_config(config: &AxisConfig) -> Self {
        Self {
            side: config.side,
            label: config.display_label(),
            color: config.color,
        }
    }
}

/// Contract implemented by the plotting backend of one subplot.
///
/// The surface owns a primary viewport and any number of dependent viewports
/// stacked on top of it, each with its own Y range. Pan/zoom and resize
/// events are forwarded by the host to [`AxisCoordinateAligner`].
pub trait RenderSurface {
    fn primary_viewport(&self) -> ViewportId;

    fn create_viewport(&mut self) -> PlotResult<ViewportId>;
    fn destroy_viewport(&mut self, viewport: ViewportId) -> PlotResult<()>;

    fn create_axis_item(&mut self, viewport: ViewportId, spec: &AxisItemSpec)
    -> PlotResult<AxisItemId>;
    fn update_axis_item(&mut self, item: AxisItemId, spec: &AxisItemSpec) -> PlotResult<()>;
    fn destroy_axis_item(&mut self, item: AxisItemId) -> PlotResult<()>;

    fn set_y_range(&mut self, viewport: ViewportId, range: AxisRange) -> PlotResult<()>;
    fn y_range(&self, viewport: ViewportId) -> PlotResult<AxisRange>;
    fn enable_auto_range(&mut self, viewport: ViewportId) -> PlotResult<()>;

    fn viewport_rect(&self, viewport: ViewportId) -> PlotResult<ViewportRect>;
    fn set_viewport_rect(&mut self, viewport: ViewportId, rect: ViewportRect) -> PlotResult<()>;
}
