//! multiaxis: configuration layer for multi-subplot, multi-Y-axis charts.
//!
//! The crate keeps an undoable, signal-driven model of subplots, their axes
//! and their curves, and aligns the coordinate spaces of stacked viewports.
//! Drawing is delegated to any backend implementing `render::RenderSurface`.

pub mod api;
pub mod core;
pub mod error;
pub mod extensions;
pub mod render;
pub mod telemetry;

pub use api::{AxisManager, CurveManager, PlotterConfig, SubplotManager};
pub use error::{PlotError, PlotResult};
