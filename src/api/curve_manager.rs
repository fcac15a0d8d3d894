use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;

use super::column_metadata::ColumnMetadataManager;
use super::manager::{AtomicSubject, ManagerCore, Observable};
use super::signals::{ManagerEvent, signal_names};
use crate::core::{CurveConfig, CurveRenderHandle, StyleDefaults};
use crate::error::{PlotError, PlotResult};

/// Saved state of a [`CurveManager`].
#[derive(Debug, Clone, PartialEq)]
pub struct CurveManagerSnapshot {
    configs: IndexMap<String, CurveConfig>,
    added: IndexSet<String>,
    default_axis: String,
}

/// Curves of one subplot, keyed by actual column name.
#[derive(Debug)]
pub struct CurveManager {
    core: ManagerCore,
    subplot: usize,
    metadata: Rc<ColumnMetadataManager>,
    style: StyleDefaults,
    configs: IndexMap<String, CurveConfig>,
    added: IndexSet<String>,
    default_axis: String,
}

impl CurveManager {
    pub fn new(
        subplot: usize,
        default_axis: &str,
        metadata: Rc<ColumnMetadataManager>,
        style: StyleDefaults,
    ) -> PlotResult<Self> {
        let core = ManagerCore::with_signals("curve_manager", Some(subplot), &signal_names::CURVE_SIGNALS)?;
        Ok(Self {
            core,
            subplot,
            metadata,
            style,
            configs: IndexMap::new(),
            added: IndexSet::new(),
            default_axis: default_axis.to_owned(),
        })
    }

    #[must_use]
    pub fn subplot(&self) -> usize {
        self.subplot
    }

    #[must_use]
    pub fn default_axis(&self) -> &str {
        &self.default_axis
    }

    /// Axis used by `add_curve` when none is given.
    pub fn set_default_axis(&mut self, axis: &str) {
        self.default_axis = axis.to_owned();
    }

    /// Displays `column` bound to `axis` (the default axis when `None`).
    ///
    /// A retained config is reused; with `axis = None` it keeps its previous
    /// binding. Adding a column that is already displayed fails.
    ///
    /// Axis names are not checked here; [`crate::api::SubplotManager`] only
    /// passes axes that are added in the same subplot.
    pub fn add_curve(&mut self, column: &str, axis: Option<&str>) -> bool {
        if self.add_inner(column, axis) {
            self.core.emit(
                signal_names::CURVE_ADDED,
                ManagerEvent::CurveAdded {
                    column: column.to_owned(),
                },
            );
            true
        } else {
            false
        }
    }

    fn add_inner(&mut self, column: &str, axis: Option<&str>) -> bool {
        if self.added.contains(column) {
            self.core.warning(
                format!("curve `{}` is already displayed", self.metadata.display_name(column)),
                true,
            );
            return false;
        }
        if !self.metadata.is_empty() && !self.metadata.is_valid_actual_name(column) {
            self.core
                .warning(format!("column `{column}` does not exist in the dataset"), true);
            return false;
        }

        match self.configs.get_mut(column) {
            Some(config) => {
                if let Some(axis) = axis {
                    config.axis = axis.to_owned();
                }
            }
            None => {
                let axis = axis.unwrap_or(self.default_axis.as_str()).to_owned();
                let config =
                    CurveConfig::new(column, self.subplot, axis, &self.style, self.configs.len());
                self.configs.insert(column.to_owned(), config);
            }
        }
        self.added.insert(column.to_owned());
        true
    }

    pub fn add_curve_by_display_name(&mut self, display: &str, axis: Option<&str>) -> bool {
        match self.metadata.actual_name(display) {
            Some(actual) => self.add_curve(&actual, axis),
            None => {
                self.core
                    .warning(format!("unknown column `{display}`"), true);
                false
            }
        }
    }

    /// Stops displaying `column`; the config survives unless `remove_config`.
    pub fn remove_curve(&mut self, column: &str, remove_config: bool) -> bool {
        if self.remove_inner(column, remove_config) {
            self.core.emit(
                signal_names::CURVE_REMOVED,
                ManagerEvent::CurveRemoved {
                    column: column.to_owned(),
                },
            );
            true
        } else {
            false
        }
    }

    fn remove_inner(&mut self, column: &str, remove_config: bool) -> bool {
        if !self.added.shift_remove(column) {
            self.core
                .warning(format!("curve `{column}` is not displayed"), true);
            return false;
        }
        if remove_config {
            self.configs.shift_remove(column);
        }
        true
    }

    pub fn remove_curve_by_display_name(&mut self, display: &str, remove_config: bool) -> bool {
        match self.metadata.actual_name(display) {
            Some(actual) => self.remove_curve(&actual, remove_config),
            None => {
                self.core
                    .warning(format!("unknown column `{display}`"), true);
                false
            }
        }
    }

    pub fn add_curves_batch<S: AsRef<str>>(&mut self, columns: &[S], axis: Option<&str>) -> bool {
        let mut changed: SmallVec<[String; 8]> = SmallVec::new();
        for column in columns {
            let column = column.as_ref();
            if self.added.contains(column) {
                continue;
            }
            if self.add_inner(column, axis) {
                changed.push(column.to_owned());
            }
        }
        if changed.is_empty() {
            return false;
        }
        self.core.emit(
            signal_names::CURVES_BATCH_ADDED,
            ManagerEvent::CurvesBatchAdded {
                columns: changed.into_vec(),
            },
        );
        true
    }

    pub fn remove_curves_batch<S: AsRef<str>>(&mut self, columns: &[S], remove_config: bool) -> bool {
        let mut changed: SmallVec<[String; 8]> = SmallVec::new();
        for column in columns {
            let column = column.as_ref();
            if !self.added.contains(column) {
                continue;
            }
            if self.remove_inner(column, remove_config) {
                changed.push(column.to_owned());
            }
        }
        if changed.is_empty() {
            return false;
        }
        self.core.emit(
            signal_names::CURVES_BATCH_REMOVED,
            ManagerEvent::CurvesBatchRemoved {
                columns: changed.into_vec(),
            },
        );
        true
    }

    pub fn remove_all_curves(&mut self, remove_config: bool) -> bool {
        let columns = self.added_curve_names();
        self.remove_curves_batch(&columns, remove_config)
    }

    /// Rebinds one curve. Moving onto its current axis succeeds silently.
    pub fn move_curve_to_axis(&mut self, column: &str, axis: &str) -> bool {
        let Some(config) = self.configs.get_mut(column) else {
            self.core
                .warning(format!("curve `{column}` does not exist"), true);
            return false;
        };
        if config.axis == axis {
            return true;
        }
        config.axis = axis.to_owned();
        self.core.emit(
            signal_names::CURVE_CHANGED,
            ManagerEvent::CurveChanged {
                column: column.to_owned(),
            },
        );
        true
    }

    /// Rebinds every curve config bound to `old_axis`, displayed or retained.
    /// Returns how many configs moved.
    pub fn move_all_curves_from_axis(&mut self, old_axis: &str, new_axis: &str) -> usize {
        if old_axis == new_axis {
            return 0;
        }
        let columns: Vec<String> = self
            .configs
            .values()
            .filter(|config| config.axis == old_axis)
            .map(|config| config.column.clone())
            .collect();
        for column in &columns {
            if let Some(config) = self.configs.get_mut(column) {
                config.axis = new_axis.to_owned();
            }
        }
        if !columns.is_empty() {
            self.core.log_debug(format!(
                "moved {} curves from `{old_axis}` to `{new_axis}`",
                columns.len()
            ));
            self.core.emit(
                signal_names::CURVES_BATCH_CHANGED,
                ManagerEvent::CurvesBatchChanged {
                    columns: columns.clone(),
                },
            );
        }
        columns.len()
    }

    pub fn set_curve_visibility(&mut self, column: &str, visible: bool) -> bool {
        let Some(config) = self.configs.get_mut(column) else {
            self.core
                .warning(format!("curve `{column}` does not exist"), true);
            return false;
        };
        if config.visible != visible {
            config.visible = visible;
            self.core.emit(
                signal_names::CURVE_CHANGED,
                ManagerEvent::CurveChanged {
                    column: column.to_owned(),
                },
            );
        }
        true
    }

    /// Sets visibility on several curves with one `curves_batch_changed`.
    pub fn set_curves_visibility<S: AsRef<str>>(&mut self, columns: &[S], visible: bool) -> bool {
        let mut changed: SmallVec<[String; 8]> = SmallVec::new();
        for column in columns {
            let column = column.as_ref();
            if let Some(config) = self.configs.get_mut(column) {
                if config.visible != visible {
                    config.visible = visible;
                    changed.push(column.to_owned());
                }
            }
        }
        if changed.is_empty() {
            return false;
        }
        self.core.emit(
            signal_names::CURVES_BATCH_CHANGED,
            ManagerEvent::CurvesBatchChanged {
                columns: changed.into_vec(),
            },
        );
        true
    }

    /// Applies `edit` to a copy of the curve config. Column, subplot and axis
    /// binding are kept; use [`Self::move_curve_to_axis`] to rebind.
    pub fn update_curve<F>(&mut self, column: &str, edit: F) -> bool
    where
        F: FnOnce(&mut CurveConfig),
    {
        let Some(current) = self.configs.get(column) else {
            self.core
                .warning(format!("curve `{column}` does not exist"), true);
            return false;
        };
        let mut updated = current.clone();
        edit(&mut updated);
        updated.column = current.column.clone();
        updated.subplot = current.subplot;
        updated.axis = current.axis.clone();

        if let Err(err) = validate_curve_config(&updated) {
            self.core
                .warning(format!("curve `{column}` update rejected: {err}"), true);
            return false;
        }
        if *current == updated {
            return true;
        }
        self.configs.insert(column.to_owned(), updated);
        self.core.emit(
            signal_names::CURVE_CHANGED,
            ManagerEvent::CurveChanged {
                column: column.to_owned(),
            },
        );
        true
    }

    /// Records the drawing primitive of a curve. Emits nothing.
    pub fn set_render_handle(&mut self, column: &str, handle: Option<CurveRenderHandle>) -> bool {
        match self.configs.get_mut(column) {
            Some(config) => {
                config.render_handle = handle;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn curve_config(&self, column: &str) -> Option<&CurveConfig> {
        self.configs.get(column)
    }

    #[must_use]
    pub fn is_curve_added(&self, column: &str) -> bool {
        self.added.contains(column)
    }

    #[must_use]
    pub fn is_curve_initialized(&self, column: &str) -> bool {
        self.configs.contains_key(column)
    }

    #[must_use]
    pub fn added_curve_names(&self) -> Vec<String> {
        self.added.iter().cloned().collect()
    }

    #[must_use]
    pub fn initialized_curve_names(&self) -> Vec<String> {
        self.configs.keys().cloned().collect()
    }

    pub fn added_configs(&self) -> impl Iterator<Item = &CurveConfig> {
        self.added.iter().filter_map(|column| self.configs.get(column))
    }

    #[must_use]
    pub fn visible_curve_names(&self) -> Vec<String> {
        self.added_configs()
            .filter(|config| config.visible)
            .map(|config| config.column.clone())
            .collect()
    }

    #[must_use]
    pub fn hidden_curve_names(&self) -> Vec<String> {
        self.added_configs()
            .filter(|config| !config.visible)
            .map(|config| config.column.clone())
            .collect()
    }

    /// Displayed curves bound to `axis`.
    #[must_use]
    pub fn names_by_axis(&self, axis: &str) -> Vec<String> {
        self.added_configs()
            .filter(|config| config.axis == axis)
            .map(|config| config.column.clone())
            .collect()
    }

    /// `(initialized, added)` curve counts.
    #[must_use]
    pub fn curve_counts(&self) -> (usize, usize) {
        (self.configs.len(), self.added.len())
    }

    #[must_use]
    pub fn display_names<S: AsRef<str>>(&self, columns: &[S]) -> Vec<String> {
        self.metadata.display_names(columns)
    }

    #[must_use]
    pub fn actual_names<S: AsRef<str>>(&self, display: &[S]) -> Vec<String> {
        self.metadata.actual_names(display)
    }
}

fn validate_curve_config(config: &CurveConfig) -> PlotResult<()> {
    config.color.validate()?;
    if !config.width.is_finite() || config.width <= 0.0 {
        return Err(PlotError::InvalidData(
            "curve width must be finite and > 0".to_owned(),
        ));
    }
    Ok(())
}

impl Observable for CurveManager {
    fn manager_core(&self) -> &ManagerCore {
        &self.core
    }
}

impl AtomicSubject for CurveManager {
    type Snapshot = CurveManagerSnapshot;

    fn capture_snapshot(&self) -> Self::Snapshot {
        CurveManagerSnapshot {
            configs: self.configs.clone(),
            added: self.added.clone(),
            default_axis: self.default_axis.clone(),
        }
    }

    fn restore_snapshot(&mut self, snapshot: Self::Snapshot) {
        self.configs = snapshot.configs;
        self.added = snapshot.added;
        self.default_axis = snapshot.default_axis;
    }
}
