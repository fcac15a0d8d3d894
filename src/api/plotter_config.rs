use serde::{Deserialize, Serialize};

use crate::core::StyleDefaults;
use crate::error::{PlotError, PlotResult};

/// Bootstrap configuration of a [`super::SubplotManager`].
///
/// Serializable so host applications can keep plot setup next to their own
/// settings files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotterConfig {
    #[serde(default = "default_subplot_count")]
    pub subplot_count: usize,
    #[serde(default = "default_primary_axis_name")]
    pub primary_axis_name: String,
    #[serde(default)]
    pub style: StyleDefaults,
    /// Upper bound of points fetched per curve; `0` disables decimation.
    #[serde(default = "default_max_points")]
    pub max_points: usize,
}

impl Default for PlotterConfig {
    fn default() -> Self {
        Self {
            subplot_count: default_subplot_count(),
            primary_axis_name: default_primary_axis_name(),
            style: StyleDefaults::default(),
            max_points: default_max_points(),
        }
    }
}

impl PlotterConfig {
    #[must_use]
    pub fn with_subplot_count(mut self, subplot_count: usize) -> Self {
        self.subplot_count = subplot_count;
        self
    }

    #[must_use]
    pub fn with_primary_axis_name(mut self, name: impl Into<String>) -> Self {
        self.primary_axis_name = name.into();
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: StyleDefaults) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    pub fn validate(&self) -> PlotResult<()> {
        if self.subplot_count == 0 {
            return Err(PlotError::InvalidData(
                "subplot count must be > 0".to_owned(),
            ));
        }
        if self.primary_axis_name.trim().is_empty() {
            return Err(PlotError::InvalidData(
                "primary axis name must not be empty".to_owned(),
            ));
        }
        self.style.validate()
    }

    /// Serializes config to pretty JSON.
    pub fn to_json_pretty(&self) -> PlotResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PlotError::InvalidData(format!("failed to serialize config: {e}")))
    }

    /// Deserializes and validates config from JSON.
    pub fn from_json_str(input: &str) -> PlotResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| PlotError::InvalidData(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

fn default_subplot_count() -> usize {
    3
}

fn default_primary_axis_name() -> String {
    "main".to_owned()
}

fn default_max_points() -> usize {
    10_000
}
