use chrono::{DateTime, Utc};

use crate::error::{PlotError, PlotResult};

#[must_use]
pub fn datetime_to_unix_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

pub fn ensure_finite(value: f64, field_name: &str) -> PlotResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PlotError::InvalidData(format!(
            "{field_name} must be finite"
        )))
    }
}
