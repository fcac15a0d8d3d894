use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::debug;

use crate::core::DataPoint;
use crate::core::primitives::datetime_to_unix_seconds;
use crate::core::windowing::{decimate_by_stride, points_in_time_window};
use crate::error::{PlotError, PlotResult};

/// Columnar dataset the plot draws from.
pub trait DataSource {
    fn column_names(&self) -> Vec<String>;

    /// Minimum and maximum of a time column, `None` when it holds no finite value.
    fn time_bounds(&self, time_column: &str) -> PlotResult<Option<(f64, f64)>>;

    /// Samples of `value_column` whose time lies in `[lower, upper]`, reduced
    /// to roughly `max_points` (`0` keeps everything).
    fn fetch_window(
        &self,
        time_column: &str,
        value_column: &str,
        lower: f64,
        upper: f64,
        max_points: usize,
    ) -> PlotResult<Vec<DataPoint>>;

    /// Time column used when the host does not name one: the first column.
    fn default_time_column(&self) -> Option<String> {
        self.column_names().into_iter().next()
    }
}

/// In-memory columnar table of `f64` columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnarDataSet {
    columns: IndexMap<String, Vec<f64>>,
    rows: usize,
}

impl ColumnarDataSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column. Every column must have the same length as the first.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> PlotResult<Self> {
        self.insert_column(name.into(), values)?;
        Ok(self)
    }

    /// Appends a timestamp column stored as Unix seconds.
    pub fn with_datetime_column(
        self,
        name: impl Into<String>,
        values: &[DateTime<Utc>],
    ) -> PlotResult<Self> {
        let seconds = values.iter().copied().map(datetime_to_unix_seconds).collect();
        self.with_column(name, seconds)
    }

    fn insert_column(&mut self, name: String, values: Vec<f64>) -> PlotResult<()> {
        if name.trim().is_empty() {
            return Err(PlotError::InvalidData(
                "column name must not be empty".to_owned(),
            ));
        }
        if self.columns.contains_key(&name) {
            return Err(PlotError::InvalidData(format!(
                "column `{name}` already exists"
            )));
        }
        if !self.columns.is_empty() && values.len() != self.rows {
            return Err(PlotError::InvalidData(format!(
                "column `{name}` has {} rows, expected {}",
                values.len(),
                self.rows
            )));
        }
        self.rows = values.len();
        self.columns.insert(name, values);
        Ok(())
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    fn require(&self, name: &str) -> PlotResult<&[f64]> {
        self.column(name)
            .ok_or_else(|| PlotError::InvalidData(format!("unknown column `{name}`")))
    }
}

impl DataSource for ColumnarDataSet {
    fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    fn time_bounds(&self, time_column: &str) -> PlotResult<Option<(f64, f64)>> {
        let times = self.require(time_column)?;
        let bounds = times
            .iter()
            .copied()
            .filter(|t| t.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, t| match acc {
                Some((min, max)) => Some((min.min(t), max.max(t))),
                None => Some((t, t)),
            });
        Ok(bounds)
    }

    fn fetch_window(
        &self,
        time_column: &str,
        value_column: &str,
        lower: f64,
        upper: f64,
        max_points: usize,
    ) -> PlotResult<Vec<DataPoint>> {
        let times = self.require(time_column)?;
        let values = self.require(value_column)?;
        let points: Vec<DataPoint> = times
            .iter()
            .zip(values)
            .filter(|(t, _)| t.is_finite())
            .map(|(t, v)| DataPoint::new(*t, *v))
            .collect();

        let window = points_in_time_window(&points, lower, upper);
        let in_window = window.len();
        let reduced = decimate_by_stride(window, max_points);
        debug!(
            column = value_column,
            in_window,
            returned = reduced.len(),
            "fetch window"
        );
        Ok(reduced)
    }
}
