mod axis_manager;
mod column_metadata;
mod curve_manager;
mod manager;
mod notifications;
mod plotter_config;
mod signals;
mod subplot_manager;

pub use axis_manager::{AxisManager, AxisManagerSnapshot};
pub use column_metadata::{
    ColumnMetadataManager, ColumnNameTranslator, FnTranslator, IdentityTranslator, MapTranslator,
};
pub use curve_manager::{CurveManager, CurveManagerSnapshot};
pub use manager::{AtomicSubject, ManagerCore, Observable};
pub use notifications::{
    Notice, NoticeChannels, NoticeLevel, NotificationSink, StatusBarSink, StatusMessage,
};
pub use plotter_config::PlotterConfig;
pub use signals::{
    ManagerEvent, Signal, SignalRegistry, Slot, SlotId, SubplotScope, signal_names,
};
pub use subplot_manager::{SubplotManager, SubplotManagerSnapshot};
