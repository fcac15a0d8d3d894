//! Collaborators that sit outside the configuration model.
//!
//! Data access lives here so the managers only ever see column names.

pub mod data_source;

pub use data_source::{ColumnarDataSet, DataSource};
