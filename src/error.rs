use thiserror::Error;

pub type PlotResult<T> = Result<T, PlotError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlotError {
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("signal `{name}` is not registered on {manager}")]
    UnknownSignal { manager: &'static str, name: String },

    #[error("signal `{0}` is already registered")]
    DuplicateSignal(String),

    #[error("axis `{0}` does not exist")]
    AxisNotFound(String),

    #[error("invalid subplot index: index={index}, count={count}")]
    InvalidSubplot { index: usize, count: usize },

    #[error("degenerate axis range: lower={lower}, upper={upper}")]
    DegenerateRange { lower: f64, upper: f64 },

    #[error("viewport {0} does not exist")]
    UnknownViewport(u32),

    #[error("axis item {0} does not exist")]
    UnknownAxisItem(u32),

    #[error("invariant violated: {0}")]
    Invariant(String),
}
