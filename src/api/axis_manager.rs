use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;

use super::column_metadata::ColumnMetadataManager;
use super::manager::{AtomicSubject, ManagerCore, Observable};
use super::signals::{ManagerEvent, signal_names};
use crate::core::{AlignmentMode, AxisConfig, AxisRenderHandle, AxisSide, RangeMode, StyleDefaults};
use crate::error::{PlotError, PlotResult};

/// Saved state of an [`AxisManager`].
#[derive(Debug, Clone, PartialEq)]
pub struct AxisManagerSnapshot {
    configs: IndexMap<String, AxisConfig>,
    added: IndexSet<String>,
    primary: String,
}

/// Y axes of one subplot: exactly one primary plus any number of secondaries.
///
/// An axis is `initialized` once a config exists for its name and `added`
/// while it is displayed. Removing an axis may keep its config so a later
/// add restores the previous settings.
#[derive(Debug)]
pub struct AxisManager {
    core: ManagerCore,
    subplot: usize,
    metadata: Rc<ColumnMetadataManager>,
    style: StyleDefaults,
    configs: IndexMap<String, AxisConfig>,
    added: IndexSet<String>,
    primary: String,
}

impl AxisManager {
    pub fn new(
        subplot: usize,
        primary_name: &str,
        metadata: Rc<ColumnMetadataManager>,
        style: StyleDefaults,
    ) -> PlotResult<Self> {
        if primary_name.trim().is_empty() {
            return Err(PlotError::InvalidData(
                "primary axis name must not be empty".to_owned(),
            ));
        }
        let core = ManagerCore::with_signals("axis_manager", Some(subplot), &signal_names::AXIS_SIGNALS)?;

        let mut configs = IndexMap::new();
        configs.insert(
            primary_name.to_owned(),
            AxisConfig::primary(primary_name, &style),
        );
        let mut added = IndexSet::new();
        added.insert(primary_name.to_owned());

        core.log_debug(format!("axis manager created with primary `{primary_name}`"));
        Ok(Self {
            core,
            subplot,
            metadata,
            style,
            configs,
            added,
            primary: primary_name.to_owned(),
        })
    }

    #[must_use]
    pub fn subplot(&self) -> usize {
        self.subplot
    }

    #[must_use]
    pub fn style(&self) -> &StyleDefaults {
        &self.style
    }

    #[must_use]
    pub fn primary_axis_name(&self) -> &str {
        &self.primary
    }

    #[must_use]
    pub fn primary_config(&self) -> Option<&AxisConfig> {
        self.configs.get(&self.primary)
    }

    /// Adds (or overwrites) an axis from a complete config.
    pub fn add_axis(&mut self, mut config: AxisConfig) -> bool {
        if !self.accepts_secondary_name(&config.name) {
            return false;
        }
        if config.is_primary {
            self.core.warning(
                format!("axis `{}` cannot claim the primary role", config.name),
                true,
            );
            return false;
        }
        if let Err(err) = validate_axis_config(&config) {
            self.core
                .warning(format!("axis `{}` rejected: {err}", config.name), true);
            return false;
        }
        if !self.accepts_align_target(&config) {
            return false;
        }

        let name = config.name.clone();
        if let Some(previous) = self.configs.get(&name) {
            self.core
                .info(format!("overwriting configuration of axis `{name}`"), true);
            if config.render_handle.is_none() {
                config.render_handle = previous.render_handle;
            }
        }
        self.configs.insert(name.clone(), config);
        self.added.insert(name.clone());
        self.core
            .emit(signal_names::AXIS_ADDED, ManagerEvent::AxisAdded { name });
        true
    }

    /// Adds an axis by name, reusing a retained config when there is one.
    pub fn add_axis_named(&mut self, name: &str) -> bool {
        if self.add_named(name) {
            self.core.emit(
                signal_names::AXIS_ADDED,
                ManagerEvent::AxisAdded {
                    name: name.to_owned(),
                },
            );
            true
        } else {
            false
        }
    }

    fn add_named(&mut self, name: &str) -> bool {
        if !self.accepts_secondary_name(name) {
            return false;
        }
        if self.added.contains(name) {
            self.core
                .warning(format!("axis `{name}` is already added"), true);
            return false;
        }
        if !self.configs.contains_key(name) {
            let palette_index = self.configs.len().saturating_sub(1);
            self.configs.insert(
                name.to_owned(),
                AxisConfig::secondary(name, &self.style, palette_index),
            );
        }
        self.added.insert(name.to_owned());
        true
    }

    fn accepts_secondary_name(&self, name: &str) -> bool {
        if name.trim().is_empty() {
            self.core.warning("axis name must not be empty", true);
            return false;
        }
        if name == self.primary {
            self.core.warning(
                format!("`{name}` is the primary axis and cannot be added again"),
                true,
            );
            return false;
        }
        true
    }

    pub fn remove_axis(&mut self, name: &str, remove_config: bool) -> bool {
        if self.remove_inner(name, remove_config) {
            self.core.emit(
                signal_names::AXIS_REMOVED,
                ManagerEvent::AxisRemoved {
                    name: name.to_owned(),
                },
            );
            true
        } else {
            false
        }
    }

    fn remove_inner(&mut self, name: &str, remove_config: bool) -> bool {
        if name == self.primary {
            self.core
                .warning(format!("primary axis `{name}` cannot be removed"), true);
            return false;
        }
        if !self.added.shift_remove(name) {
            self.core
                .warning(format!("axis `{name}` is not added"), true);
            return false;
        }
        if remove_config {
            self.configs.shift_remove(name);
        }
        true
    }

    /// Adds every name in `names`; one `axes_batch_added` for the ones that changed.
    /// Names already added are skipped; the primary name draws a warning.
    pub fn add_axes_batch<S: AsRef<str>>(&mut self, names: &[S]) -> bool {
        let mut changed: SmallVec<[String; 8]> = SmallVec::new();
        for name in names {
            let name = name.as_ref();
            if self.added.contains(name) && name != self.primary {
                continue;
            }
            if self.add_named(name) {
                changed.push(name.to_owned());
            }
        }
        if changed.is_empty() {
            return false;
        }
        self.core.emit(
            signal_names::AXES_BATCH_ADDED,
            ManagerEvent::AxesBatchAdded {
                names: changed.into_vec(),
            },
        );
        true
    }

    pub fn remove_axes_batch<S: AsRef<str>>(&mut self, names: &[S], remove_config: bool) -> bool {
        let mut changed: SmallVec<[String; 8]> = SmallVec::new();
        for name in names {
            let name = name.as_ref();
            if !self.added.contains(name) || name == self.primary {
                continue;
            }
            if self.remove_inner(name, remove_config) {
                changed.push(name.to_owned());
            }
        }
        if changed.is_empty() {
            return false;
        }
        self.core.emit(
            signal_names::AXES_BATCH_REMOVED,
            ManagerEvent::AxesBatchRemoved {
                names: changed.into_vec(),
            },
        );
        true
    }

    /// Removes every added secondary axis.
    pub fn clear_secondary_axes(&mut self, remove_config: bool) -> bool {
        let secondaries = self.secondary_axis_names();
        self.remove_axes_batch(&secondaries, remove_config)
    }

    /// Makes `name` the primary axis. The previous primary is demoted to a
    /// secondary on the default secondary side and leaves the added set.
    /// Curve bindings are not touched here; the subplot-level switch moves
    /// them along.
    pub fn switch_primary_axis(&mut self, name: &str) -> bool {
        match self.try_switch_primary_axis(name) {
            Ok(_) => true,
            Err(PlotError::AxisNotFound(_)) => {
                self.core.warning(
                    format!("cannot switch primary axis: axis `{name}` does not exist"),
                    true,
                );
                false
            }
            Err(_) => false,
        }
    }

    /// Fallible form of [`Self::switch_primary_axis`]. Returns `Ok(false)`
    /// when `name` already is the primary axis.
    pub fn try_switch_primary_axis(&mut self, name: &str) -> PlotResult<bool> {
        if name == self.primary {
            return Ok(false);
        }
        if !self.configs.contains_key(name) {
            return Err(PlotError::AxisNotFound(name.to_owned()));
        }
        self.atomic_operation("switch_primary_axis", |this| {
            this.apply_primary_switch(name)
        })?;
        Ok(true)
    }

    fn apply_primary_switch(&mut self, name: &str) -> PlotResult<()> {
        let old = self.primary.clone();
        let secondary_side = self.style.secondary_side;

        let old_config = self
            .configs
            .get_mut(&old)
            .ok_or_else(|| PlotError::AxisNotFound(old.clone()))?;
        old_config.is_primary = false;
        old_config.side = secondary_side;
        self.added.shift_remove(&old);

        let new_config = self
            .configs
            .get_mut(name)
            .ok_or_else(|| PlotError::AxisNotFound(name.to_owned()))?;
        new_config.is_primary = true;
        new_config.side = AxisSide::Left;
        new_config.align_mode = AlignmentMode::None;
        new_config.align_target = None;
        self.added.insert(name.to_owned());
        self.primary = name.to_owned();

        self.check_invariants()?;
        self.core.success(
            format!("primary axis switched from `{old}` to `{name}`"),
            true,
        );
        self.core.emit(
            signal_names::AXES_BATCH_CHANGED,
            ManagerEvent::AxesBatchChanged {
                names: vec![old, name.to_owned()],
            },
        );
        Ok(())
    }

    /// Applies `edit` to a copy of the axis config and stores it when valid.
    /// The name and primary role are not editable here.
    pub fn update_axis<F>(&mut self, name: &str, edit: F) -> bool
    where
        F: FnOnce(&mut AxisConfig),
    {
        let Some(current) = self.configs.get(name) else {
            self.core
                .warning(format!("axis `{name}` does not exist"), true);
            return false;
        };
        let mut updated = current.clone();
        edit(&mut updated);

        updated.name = name.to_owned();
        updated.is_primary = name == self.primary;
        if updated.is_primary {
            updated.side = AxisSide::Left;
            updated.align_mode = AlignmentMode::None;
        }
        if let Err(err) = validate_axis_config(&updated) {
            self.core
                .warning(format!("axis `{name}` update rejected: {err}"), true);
            return false;
        }
        if !self.accepts_align_target(&updated) {
            return false;
        }
        if *current == updated {
            return true;
        }
        self.configs.insert(name.to_owned(), updated);
        self.core.emit(
            signal_names::AXIS_CHANGED,
            ManagerEvent::AxisChanged {
                name: name.to_owned(),
            },
        );
        true
    }

    /// An alignment target must be another initialized axis.
    fn accepts_align_target(&self, config: &AxisConfig) -> bool {
        match config.align_target.as_deref() {
            Some(target) if target == config.name || !self.configs.contains_key(target) => {
                self.core.warning(
                    format!("axis `{}` cannot align to `{target}`", config.name),
                    true,
                );
                false
            }
            _ => true,
        }
    }

    /// Records the rendering objects of an axis. Emits nothing.
    pub fn set_render_handle(&mut self, name: &str, handle: Option<AxisRenderHandle>) -> bool {
        match self.configs.get_mut(name) {
            Some(config) => {
                config.render_handle = handle;
                true
            }
            None => {
                self.core.log_debug(format!(
                    "ignoring render handle for unknown axis `{name}`"
                ));
                false
            }
        }
    }

    /// Whether `name` is the primary axis. The recorded primary name wins if
    /// the stored flag disagrees; the mismatch is reported as a warning.
    #[must_use]
    pub fn is_axis_primary(&self, name: &str) -> bool {
        let by_name = name == self.primary;
        if let Some(config) = self.configs.get(name) {
            if config.is_primary != by_name {
                self.core.warning(
                    format!(
                        "axis `{name}` primary flag ({}) disagrees with recorded primary `{}`",
                        config.is_primary, self.primary
                    ),
                    true,
                );
            }
        }
        by_name
    }

    #[must_use]
    pub fn axis_config(&self, name: &str) -> Option<&AxisConfig> {
        self.configs.get(name)
    }

    #[must_use]
    pub fn is_axis_initialized(&self, name: &str) -> bool {
        self.configs.contains_key(name)
    }

    #[must_use]
    pub fn is_axis_added(&self, name: &str) -> bool {
        self.added.contains(name)
    }

    #[must_use]
    pub fn initialized_axis_names(&self) -> Vec<String> {
        self.configs.keys().cloned().collect()
    }

    #[must_use]
    pub fn added_axis_names(&self) -> Vec<String> {
        self.added.iter().cloned().collect()
    }

    /// Added axes other than the primary, in insertion order.
    #[must_use]
    pub fn secondary_axis_names(&self) -> Vec<String> {
        self.added
            .iter()
            .filter(|name| **name != self.primary)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn added_axis_count(&self) -> usize {
        self.added.len()
    }

    pub fn added_configs(&self) -> impl Iterator<Item = &AxisConfig> {
        self.added.iter().filter_map(|name| self.configs.get(name))
    }

    #[must_use]
    pub fn display_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        self.metadata.display_names(names)
    }

    #[must_use]
    pub fn actual_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        self.metadata.actual_names(names)
    }

    /// Exactly one config carries the primary flag, it is the recorded
    /// primary, it sits on the left and it is added.
    pub fn check_invariants(&self) -> PlotResult<()> {
        let Some(primary) = self.configs.get(&self.primary) else {
            return Err(PlotError::Invariant(format!(
                "primary axis `{}` has no config",
                self.primary
            )));
        };
        if !primary.is_primary || primary.side != AxisSide::Left {
            return Err(PlotError::Invariant(format!(
                "primary axis `{}` must be flagged primary and drawn on the left",
                self.primary
            )));
        }
        if !self.added.contains(&self.primary) {
            return Err(PlotError::Invariant(format!(
                "primary axis `{}` is not added",
                self.primary
            )));
        }
        let flagged = self.configs.values().filter(|c| c.is_primary).count();
        if flagged != 1 {
            return Err(PlotError::Invariant(format!(
                "{flagged} axes are flagged primary"
            )));
        }
        if let Some(orphan) = self.added.iter().find(|name| !self.configs.contains_key(*name)) {
            return Err(PlotError::Invariant(format!(
                "added axis `{orphan}` has no config"
            )));
        }
        Ok(())
    }
}

fn validate_axis_config(config: &AxisConfig) -> PlotResult<()> {
    config.color.validate()?;
    let range = config.manual_range;
    if !range.lower.is_finite() || !range.upper.is_finite() {
        return Err(PlotError::InvalidData(
            "manual range bounds must be finite".to_owned(),
        ));
    }
    if config.range_mode == RangeMode::Manual && range.span() <= 0.0 {
        return Err(PlotError::DegenerateRange {
            lower: range.lower,
            upper: range.upper,
        });
    }
    if config.align_mode == AlignmentMode::ValueWithScale
        && (!config.align.scale_ratio.is_finite() || config.align.scale_ratio <= 0.0)
    {
        return Err(PlotError::InvalidData(
            "alignment scale ratio must be finite and > 0".to_owned(),
        ));
    }
    Ok(())
}

impl Observable for AxisManager {
    fn manager_core(&self) -> &ManagerCore {
        &self.core
    }
}

impl AtomicSubject for AxisManager {
    type Snapshot = AxisManagerSnapshot;

    fn capture_snapshot(&self) -> Self::Snapshot {
        AxisManagerSnapshot {
            configs: self.configs.clone(),
            added: self.added.clone(),
            primary: self.primary.clone(),
        }
    }

    fn restore_snapshot(&mut self, snapshot: Self::Snapshot) {
        self.configs = snapshot.configs;
        self.added = snapshot.added;
        self.primary = snapshot.primary;
    }
}
