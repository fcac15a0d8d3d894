use serde::{Deserialize, Serialize};

use crate::core::alignment::{AlignmentParams, AxisRange};
use crate::core::handles::AxisRenderHandle;
use crate::core::style_defaults::StyleDefaults;
use crate::core::types::{AlignmentMode, AxisSide, Color, RangeMode, UnitValue};

/// Full configuration of one Y axis inside a subplot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub name: String,
    pub side: AxisSide,
    pub label: String,
    pub unit: UnitValue,
    pub color: Color,
    pub range_mode: RangeMode,
    /// Bounds applied only when `range_mode` is `Manual`.
    pub manual_range: AxisRange,
    pub align_mode: AlignmentMode,
    /// Reference axis for alignment; the subplot primary when `None`.
    pub align_target: Option<String>,
    pub align: AlignmentParams,
    pub is_primary: bool,
    #[serde(skip)]
    pub render_handle: Option<AxisRenderHandle>,
}

impl AxisConfig {
    /// Config of the subplot's primary axis: left side, no alignment.
    #[must_use]
    pub fn primary(name: impl Into<String>, style: &StyleDefaults) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            side: AxisSide::Left,
            unit: style.default_unit,
            color: style.primary_axis_color,
            range_mode: RangeMode::Auto,
            manual_range: style.manual_range,
            align_mode: AlignmentMode::None,
            align_target: None,
            align: AlignmentParams::default(),
            is_primary: true,
            render_handle: None,
        }
    }

    /// Config of a secondary axis; `palette_index` selects its color.
    #[must_use]
    pub fn secondary(name: impl Into<String>, style: &StyleDefaults, palette_index: usize) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            side: style.secondary_side,
            unit: style.default_unit,
            color: style.axis_color(palette_index),
            range_mode: RangeMode::Auto,
            manual_range: style.manual_range,
            align_mode: AlignmentMode::None,
            align_target: None,
            align: AlignmentParams::default(),
            is_primary: false,
            render_handle: None,
        }
    }

    /// Label shown by the rendering layer, including the unit symbol.
    #[must_use]
    pub fn display_label(&self) -> String {
        format!("{} [{}]", self.label, self.unit.symbol())
    }

    #[must_use]
    pub fn is_aligned(&self) -> bool {
        self.align_mode != AlignmentMode::None
    }
}
