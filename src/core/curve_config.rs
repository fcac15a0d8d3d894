use serde::{Deserialize, Serialize};

use crate::core::handles::CurveRenderHandle;
use crate::core::style_defaults::StyleDefaults;
use crate::core::types::{Color, LineStyle};

/// Configuration of one curve drawn from a data column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveConfig {
    /// Actual (untranslated) column name; unique within a subplot.
    pub column: String,
    pub subplot: usize,
    /// Name of the axis this curve is drawn against.
    pub axis: String,
    pub visible: bool,
    pub color: Color,
    pub line_style: LineStyle,
    pub width: f64,
    pub step: bool,
    #[serde(skip)]
    pub render_handle: Option<CurveRenderHandle>,
}

impl CurveConfig {
    #[must_use]
    pub fn new(
        column: impl Into<String>,
        subplot: usize,
        axis: impl Into<String>,
        style: &StyleDefaults,
        palette_index: usize,
    ) -> Self {
        Self {
            column: column.into(),
            subplot,
            axis: axis.into(),
            visible: true,
            color: style.curve_color(palette_index),
            line_style: style.line_style,
            width: style.curve_width,
            step: false,
            render_handle: None,
        }
    }
}
