use serde::{Deserialize, Serialize};

use crate::core::primitives::ensure_finite;
use crate::core::types::AlignmentMode;
use crate::error::{PlotError, PlotResult};

/// Closed numeric interval shown by one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub lower: f64,
    pub upper: f64,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 100.0,
        }
    }
}

impl AxisRange {
    /// Creates a range from finite bounds. Equal bounds are accepted here and
    /// rejected only where a non-zero span is required.
    pub fn new(lower: f64, upper: f64) -> PlotResult<Self> {
        ensure_finite(lower, "axis range lower bound")?;
        ensure_finite(upper, "axis range upper bound")?;
        Ok(Self { lower, upper })
    }

    #[must_use]
    pub fn span(self) -> f64 {
        self.upper - self.lower
    }

    /// Relative position of `value` inside the range (0 at `lower`, 1 at `upper`).
    pub fn fraction_of(self, value: f64) -> PlotResult<f64> {
        let span = self.span();
        if span == 0.0 || !span.is_finite() {
            return Err(PlotError::DegenerateRange {
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok((value - self.lower) / span)
    }

    /// Data value found at relative position `fraction`.
    #[must_use]
    pub fn value_at(self, fraction: f64) -> f64 {
        self.lower + fraction * self.span()
    }
}

/// Per-axis alignment parameters stored in the axis configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentParams {
    /// Value on the axis being moved that must line up.
    pub source_value: f64,
    /// Value on the reference axis it lines up with.
    pub target_value: f64,
    /// Source span per unit of target span, used by `ValueWithScale`.
    pub scale_ratio: f64,
}

impl Default for AlignmentParams {
    fn default() -> Self {
        Self {
            source_value: 0.0,
            target_value: 0.0,
            scale_ratio: 1.0,
        }
    }
}

/// Fully resolved input of the alignment formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentAnchor {
    pub source_value: f64,
    pub target_value: f64,
    pub scale_ratio: Option<f64>,
}

impl AlignmentAnchor {
    /// Resolves the anchor used by `mode`, or `None` when the mode does not align.
    #[must_use]
    pub fn for_mode(mode: AlignmentMode, params: AlignmentParams) -> Option<Self> {
        match mode {
            AlignmentMode::None => None,
            AlignmentMode::Zero => Some(Self {
                source_value: 0.0,
                target_value: 0.0,
                scale_ratio: None,
            }),
            AlignmentMode::Value => Some(Self {
                source_value: params.source_value,
                target_value: params.target_value,
                scale_ratio: None,
            }),
            AlignmentMode::ValueWithScale => Some(Self {
                source_value: params.source_value,
                target_value: params.target_value,
                scale_ratio: Some(params.scale_ratio),
            }),
        }
    }
}

/// Computes the range the source axis must adopt so that
/// `anchor.source_value` sits at the same relative height as
/// `anchor.target_value` does on the target axis.
pub fn align_range(
    target: AxisRange,
    source: AxisRange,
    anchor: AlignmentAnchor,
) -> PlotResult<AxisRange> {
    ensure_finite(anchor.source_value, "alignment source value")?;
    ensure_finite(anchor.target_value, "alignment target value")?;
    let position = target.fraction_of(anchor.target_value)?;

    let source_span = match anchor.scale_ratio {
        Some(ratio) => {
            if !ratio.is_finite() || ratio <= 0.0 {
                return Err(PlotError::InvalidData(
                    "alignment scale ratio must be finite and > 0".to_owned(),
                ));
            }
            target.span() * ratio
        }
        None => source.span(),
    };

    let lower = anchor.source_value - position * source_span;
    let upper = anchor.source_value + (1.0 - position) * source_span;
    AxisRange::new(lower, upper)
}

/// Mode-level wrapper around [`align_range`]. Returns `Ok(None)` for
/// `AlignmentMode::None`.
pub fn aligned_range_for_mode(
    mode: AlignmentMode,
    params: AlignmentParams,
    target: AxisRange,
    source: AxisRange,
) -> PlotResult<Option<AxisRange>> {
    match AlignmentAnchor::for_mode(mode, params) {
        Some(anchor) => align_range(target, source, anchor).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::{AlignmentAnchor, AlignmentParams, AxisRange, align_range, aligned_range_for_mode};
    use crate::core::AlignmentMode;
    use crate::error::PlotError;

    fn range(lower: f64, upper: f64) -> AxisRange {
        AxisRange::new(lower, upper).expect("finite range")
    }

    #[test]
    fn value_alignment_shifts_source_and_keeps_span() {
        let params = AlignmentParams {
            source_value: 10.0,
            target_value: 40.0,
            scale_ratio: 1.0,
        };
        let aligned =
            aligned_range_for_mode(AlignmentMode::Value, params, range(0.0, 100.0), range(-50.0, 50.0))
                .expect("aligned")
                .expect("mode aligns");
        assert!((aligned.lower + 30.0).abs() <= 1e-12);
        assert!((aligned.upper - 70.0).abs() <= 1e-12);
    }

    #[test]
    fn scaled_alignment_derives_span_from_target() {
        let anchor = AlignmentAnchor {
            source_value: 0.0,
            target_value: 50.0,
            scale_ratio: Some(0.5),
        };
        let aligned = align_range(range(0.0, 100.0), range(-1.0, 1.0), anchor).expect("aligned");
        assert!((aligned.span() - 50.0).abs() <= 1e-12);
        assert!((aligned.lower + 25.0).abs() <= 1e-12);
    }

    #[test]
    fn none_mode_yields_no_range() {
        let result = aligned_range_for_mode(
            AlignmentMode::None,
            AlignmentParams::default(),
            range(0.0, 1.0),
            range(0.0, 1.0),
        )
        .expect("no error");
        assert!(result.is_none());
    }

    #[test]
    fn flat_target_is_rejected() {
        let anchor = AlignmentAnchor::for_mode(AlignmentMode::Zero, AlignmentParams::default())
            .expect("zero aligns");
        let err = align_range(range(5.0, 5.0), range(0.0, 1.0), anchor).expect_err("flat target");
        assert!(matches!(err, PlotError::DegenerateRange { .. }));
    }
}
