use serde::{Deserialize, Serialize};

use crate::core::alignment::AxisRange;
use crate::core::types::{AxisSide, Color, LineStyle, UnitValue};
use crate::error::{PlotError, PlotResult};

/// Default visual parameters applied to newly created axis and curve configs.
///
/// A value of this type is handed to every manager at construction; there are
/// no process-wide style globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleDefaults {
    pub primary_axis_color: Color,
    pub secondary_axis_palette: Vec<Color>,
    pub default_unit: UnitValue,
    pub secondary_side: AxisSide,
    pub manual_range: AxisRange,
    pub curve_palette: Vec<Color>,
    pub curve_width: f64,
    pub line_style: LineStyle,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            primary_axis_color: Color::WHITE,
            secondary_axis_palette: vec![
                Color::WHITE,
                Color::from_rgb8(255, 200, 0),
                Color::from_rgb8(0, 200, 255),
                Color::from_rgb8(180, 255, 120),
            ],
            default_unit: UnitValue::MWh,
            secondary_side: AxisSide::Right,
            manual_range: AxisRange::default(),
            curve_palette: vec![
                Color::RED,
                Color::from_rgb8(31, 119, 180),
                Color::from_rgb8(44, 160, 44),
                Color::from_rgb8(255, 127, 14),
                Color::from_rgb8(148, 103, 189),
                Color::from_rgb8(23, 190, 207),
            ],
            curve_width: 2.0,
            line_style: LineStyle::Solid,
        }
    }
}

impl StyleDefaults {
    /// Palette color for the `index`-th curve, cycling through the palette.
    #[must_use]
    pub fn curve_color(&self, index: usize) -> Color {
        pick(&self.curve_palette, index, Color::RED)
    }

    /// Palette color for the `index`-th secondary axis.
    #[must_use]
    pub fn axis_color(&self, index: usize) -> Color {
        pick(&self.secondary_axis_palette, index, Color::WHITE)
    }

    pub fn validate(&self) -> PlotResult<()> {
        self.primary_axis_color.validate()?;
        for color in self.secondary_axis_palette.iter().chain(&self.curve_palette) {
            color.validate()?;
        }
        if !self.curve_width.is_finite() || self.curve_width <= 0.0 {
            return Err(PlotError::InvalidData(
                "default curve width must be finite and > 0".to_owned(),
            ));
        }
        if self.manual_range.span() <= 0.0 {
            return Err(PlotError::DegenerateRange {
                lower: self.manual_range.lower,
                upper: self.manual_range.upper,
            });
        }
        Ok(())
    }
}

fn pick(palette: &[Color], index: usize, fallback: Color) -> Color {
    if palette.is_empty() {
        return fallback;
    }
    palette[index % palette.len()]
}
