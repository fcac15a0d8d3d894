use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexSet;

use super::axis_manager::{AxisManager, AxisManagerSnapshot};
use super::column_metadata::{ColumnMetadataManager, ColumnNameTranslator};
use super::curve_manager::{CurveManager, CurveManagerSnapshot};
use super::manager::{AtomicSubject, ManagerCore, Observable};
use super::plotter_config::PlotterConfig;
use super::signals::{ManagerEvent, Signal, SubplotScope, signal_names};
use crate::core::{AxisConfig, AxisRenderHandle, CurveConfig, CurveRenderHandle};
use crate::error::{PlotError, PlotResult};

type DisplayedColumns = Rc<RefCell<IndexSet<String>>>;

#[derive(Debug)]
struct SubplotSlot {
    axes: AxisManager,
    curves: CurveManager,
    displayed: DisplayedColumns,
}

/// Saved state of every subplot owned by a [`SubplotManager`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubplotManagerSnapshot {
    subplots: Vec<(AxisManagerSnapshot, CurveManagerSnapshot)>,
}

/// Owns one axis manager and one curve manager per subplot and performs the
/// operations that touch both.
///
/// Every child signal is re-emitted as `subplot_config_changed` with the
/// subplot index; changes of the shared column metadata are re-emitted with
/// [`SubplotScope::Global`].
#[derive(Debug)]
pub struct SubplotManager {
    core: ManagerCore,
    config: PlotterConfig,
    metadata: Rc<ColumnMetadataManager>,
    subplots: Vec<SubplotSlot>,
}

impl SubplotManager {
    pub fn new(config: PlotterConfig, metadata: Rc<ColumnMetadataManager>) -> PlotResult<Self> {
        config.validate()?;
        let core = ManagerCore::with_signals(
            "subplot_manager",
            None,
            &[signal_names::SUBPLOT_CONFIG_CHANGED],
        )?;
        let changed = core.signal(signal_names::SUBPLOT_CONFIG_CHANGED)?;
        forward_changes(metadata.manager_core(), &changed, SubplotScope::Global);

        let mut subplots = Vec::with_capacity(config.subplot_count);
        for index in 0..config.subplot_count {
            let axes = AxisManager::new(
                index,
                &config.primary_axis_name,
                Rc::clone(&metadata),
                config.style.clone(),
            )?;
            let curves = CurveManager::new(
                index,
                &config.primary_axis_name,
                Rc::clone(&metadata),
                config.style.clone(),
            )?;

            let displayed: DisplayedColumns = Rc::new(RefCell::new(IndexSet::new()));
            {
                let displayed = Rc::clone(&displayed);
                curves
                    .manager_core()
                    .connect_all(move |event| track_displayed(&displayed, event));
            }
            forward_changes(axes.manager_core(), &changed, SubplotScope::Subplot(index));
            forward_changes(curves.manager_core(), &changed, SubplotScope::Subplot(index));

            subplots.push(SubplotSlot {
                axes,
                curves,
                displayed,
            });
        }

        core.log_debug(format!(
            "subplot manager created with {} subplots",
            config.subplot_count
        ));
        Ok(Self {
            core,
            config,
            metadata,
            subplots,
        })
    }

    #[must_use]
    pub fn config(&self) -> &PlotterConfig {
        &self.config
    }

    #[must_use]
    pub fn metadata(&self) -> &Rc<ColumnMetadataManager> {
        &self.metadata
    }

    #[must_use]
    pub fn subplot_count(&self) -> usize {
        self.subplots.len()
    }

    fn slot(&self, index: usize) -> PlotResult<&SubplotSlot> {
        let count = self.subplots.len();
        self.subplots
            .get(index)
            .ok_or(PlotError::InvalidSubplot { index, count })
    }

    fn slot_mut(&mut self, index: usize) -> PlotResult<&mut SubplotSlot> {
        let count = self.subplots.len();
        self.subplots
            .get_mut(index)
            .ok_or(PlotError::InvalidSubplot { index, count })
    }

    /// Reports an out-of-range index as a warning.
    fn valid_index(&self, index: usize) -> bool {
        if index < self.subplots.len() {
            return true;
        }
        self.core.warning(
            format!(
                "invalid subplot index {index} (have {})",
                self.subplots.len()
            ),
            true,
        );
        false
    }

    /// Read access to one subplot's axes. Edits go through the methods of
    /// this manager so curve bindings stay on added axes.
    pub fn axis_manager(&self, index: usize) -> PlotResult<&AxisManager> {
        self.slot(index).map(|slot| &slot.axes)
    }

    pub fn curve_manager(&self, index: usize) -> PlotResult<&CurveManager> {
        self.slot(index).map(|slot| &slot.curves)
    }

    /// Displays `column` in subplot `index`. The axis must be added; without
    /// one a retained config keeps its binding unless that axis is gone, in
    /// which case the curve goes to the primary axis.
    pub fn add_curve(&mut self, index: usize, column: &str, axis: Option<&str>) -> bool {
        if !self.valid_index(index) {
            return false;
        }
        let slot = &mut self.subplots[index];
        let axis = match axis {
            Some(axis) if !slot.axes.is_axis_added(axis) => {
                self.core.warning(
                    format!("axis `{axis}` is not added in subplot {index}"),
                    true,
                );
                return false;
            }
            Some(axis) => Some(axis.to_owned()),
            None => match slot.curves.curve_config(column) {
                Some(retained) if !slot.axes.is_axis_added(&retained.axis) => {
                    Some(slot.axes.primary_axis_name().to_owned())
                }
                _ => None,
            },
        };
        slot.curves.add_curve(column, axis.as_deref())
    }

    pub fn add_curve_by_display_name(
        &mut self,
        index: usize,
        display: &str,
        axis: Option<&str>,
    ) -> bool {
        match self.metadata.actual_name(display) {
            Some(actual) => self.add_curve(index, &actual, axis),
            None => {
                self.core
                    .warning(format!("unknown column `{display}`"), true);
                false
            }
        }
    }

    pub fn remove_curve(&mut self, index: usize, column: &str, remove_config: bool) -> bool {
        if !self.valid_index(index) {
            return false;
        }
        self.subplots[index]
            .curves
            .remove_curve(column, remove_config)
    }

    /// Rebinds a curve to another added axis of the same subplot.
    pub fn move_curve(&mut self, index: usize, column: &str, axis: &str) -> bool {
        if !self.valid_index(index) {
            return false;
        }
        let slot = &mut self.subplots[index];
        if !slot.axes.is_axis_added(axis) {
            self.core.warning(
                format!("axis `{axis}` is not added in subplot {index}"),
                true,
            );
            return false;
        }
        slot.curves.move_curve_to_axis(column, axis)
    }

    /// Displays several columns with one `curves_batch_added`. Same axis
    /// rules as [`Self::add_curve`].
    pub fn add_curves_batch<S: AsRef<str>>(
        &mut self,
        index: usize,
        columns: &[S],
        axis: Option<&str>,
    ) -> bool {
        if !self.valid_index(index) {
            return false;
        }
        let slot = &mut self.subplots[index];
        match axis {
            Some(axis) if !slot.axes.is_axis_added(axis) => {
                self.core.warning(
                    format!("axis `{axis}` is not added in subplot {index}"),
                    true,
                );
                return false;
            }
            Some(_) => {}
            None => {
                let primary = slot.axes.primary_axis_name().to_owned();
                let stranded: Vec<String> = columns
                    .iter()
                    .map(|column| column.as_ref())
                    .filter(|column| !slot.curves.is_curve_added(column))
                    .filter(|column| {
                        slot.curves
                            .curve_config(column)
                            .is_some_and(|config| !slot.axes.is_axis_added(&config.axis))
                    })
                    .map(str::to_owned)
                    .collect();
                for column in &stranded {
                    slot.curves.move_curve_to_axis(column, &primary);
                }
            }
        }
        slot.curves.add_curves_batch(columns, axis)
    }

    pub fn remove_curves_batch<S: AsRef<str>>(
        &mut self,
        index: usize,
        columns: &[S],
        remove_config: bool,
    ) -> bool {
        if !self.valid_index(index) {
            return false;
        }
        self.subplots[index]
            .curves
            .remove_curves_batch(columns, remove_config)
    }

    /// Edits a curve config in place. The axis binding is kept.
    pub fn update_curve<F>(&mut self, index: usize, column: &str, edit: F) -> bool
    where
        F: FnOnce(&mut CurveConfig),
    {
        if !self.valid_index(index) {
            return false;
        }
        self.subplots[index].curves.update_curve(column, edit)
    }

    pub fn set_curve_visibility(&mut self, index: usize, column: &str, visible: bool) -> bool {
        if !self.valid_index(index) {
            return false;
        }
        self.subplots[index]
            .curves
            .set_curve_visibility(column, visible)
    }

    pub fn set_curves_visibility<S: AsRef<str>>(
        &mut self,
        index: usize,
        columns: &[S],
        visible: bool,
    ) -> bool {
        if !self.valid_index(index) {
            return false;
        }
        self.subplots[index]
            .curves
            .set_curves_visibility(columns, visible)
    }

    pub fn set_curve_render_handle(
        &mut self,
        index: usize,
        column: &str,
        handle: Option<CurveRenderHandle>,
    ) -> bool {
        if !self.valid_index(index) {
            return false;
        }
        self.subplots[index].curves.set_render_handle(column, handle)
    }

    pub fn add_axis(&mut self, index: usize, name: &str) -> bool {
        if !self.valid_index(index) {
            return false;
        }
        self.subplots[index].axes.add_axis_named(name)
    }

    pub fn add_axis_config(&mut self, index: usize, config: AxisConfig) -> bool {
        if !self.valid_index(index) {
            return false;
        }
        self.subplots[index].axes.add_axis(config)
    }

    pub fn add_axes_batch<S: AsRef<str>>(&mut self, index: usize, names: &[S]) -> bool {
        if !self.valid_index(index) {
            return false;
        }
        self.subplots[index].axes.add_axes_batch(names)
    }

    /// Edits an axis config in place. Name and primary role are kept.
    pub fn update_axis<F>(&mut self, index: usize, name: &str, edit: F) -> bool
    where
        F: FnOnce(&mut AxisConfig),
    {
        if !self.valid_index(index) {
            return false;
        }
        self.subplots[index].axes.update_axis(name, edit)
    }

    pub fn set_axis_render_handle(
        &mut self,
        index: usize,
        name: &str,
        handle: Option<AxisRenderHandle>,
    ) -> bool {
        if !self.valid_index(index) {
            return false;
        }
        self.subplots[index].axes.set_render_handle(name, handle)
    }

    /// Moves the curves of `axis` to the primary axis, then removes `axis`.
    /// Both steps commit together or not at all.
    pub fn delete_axis(&mut self, index: usize, axis: &str) -> bool {
        if !self.valid_index(index) {
            return false;
        }
        {
            let axes = &self.subplots[index].axes;
            if axes.primary_axis_name() == axis {
                self.core
                    .warning(format!("primary axis `{axis}` cannot be deleted"), true);
                return false;
            }
            if !axes.is_axis_added(axis) {
                self.core.warning(
                    format!("axis `{axis}` is not added in subplot {index}"),
                    true,
                );
                return false;
            }
        }

        self.atomic_operation("delete_axis", |this| {
            let slot = this.slot_mut(index)?;
            let primary = slot.axes.primary_axis_name().to_owned();
            slot.curves.move_all_curves_from_axis(axis, &primary);
            if !slot.axes.remove_axis(axis, false) {
                return Err(PlotError::Invariant(format!(
                    "axis `{axis}` could not be removed from subplot {index}"
                )));
            }
            Ok(())
        })
        .is_ok()
    }

    /// Switches the primary axis of a subplot, moves the curves bound to the
    /// old primary onto the new one and makes it the default curve axis.
    pub fn switch_primary_axis(&mut self, index: usize, name: &str) -> bool {
        if !self.valid_index(index) {
            return false;
        }
        {
            let axes = &self.subplots[index].axes;
            if axes.primary_axis_name() == name {
                return true;
            }
            if !axes.is_axis_initialized(name) {
                self.core.warning(
                    format!("cannot switch primary axis: axis `{name}` does not exist"),
                    true,
                );
                return false;
            }
        }

        self.atomic_operation("switch_primary_axis", |this| {
            let slot = this.slot_mut(index)?;
            let old = slot.axes.primary_axis_name().to_owned();
            slot.axes.try_switch_primary_axis(name)?;
            slot.curves.set_default_axis(name);
            slot.curves.move_all_curves_from_axis(&old, name);
            this.check_invariants(index)
        })
        .is_ok()
    }

    /// Removes all curves and secondary axes of a subplot. Configs are kept.
    /// Returns whether anything was displayed.
    pub fn clear_subplot(&mut self, index: usize) -> bool {
        if !self.valid_index(index) {
            return false;
        }
        self.atomic_operation("clear_subplot", |this| {
            let slot = this.slot_mut(index)?;
            let curves_removed = slot.curves.remove_all_curves(false);
            let axes_removed = slot.axes.clear_secondary_axes(false);
            Ok(curves_removed || axes_removed)
        })
        .unwrap_or(false)
    }

    pub fn clear_all_subplots(&mut self) -> bool {
        self.atomic_operation("clear_all_subplots", |this| {
            let mut changed = false;
            for slot in &mut this.subplots {
                changed |= slot.curves.remove_all_curves(false);
                changed |= slot.axes.clear_secondary_axes(false);
            }
            Ok(changed)
        })
        .unwrap_or(false)
    }

    /// Replaces the column-name translator shared by all subplots.
    pub fn set_column_translator(&self, translator: Rc<dyn ColumnNameTranslator>) {
        self.metadata.set_translator(translator);
    }

    #[must_use]
    pub fn total_curves_added(&self) -> usize {
        self.subplots
            .iter()
            .map(|slot| slot.curves.curve_counts().1)
            .sum()
    }

    #[must_use]
    pub fn total_curves_initialized(&self) -> usize {
        self.subplots
            .iter()
            .map(|slot| slot.curves.curve_counts().0)
            .sum()
    }

    /// Added Y axes over all subplots, primaries included.
    #[must_use]
    pub fn total_y_axes(&self) -> usize {
        self.subplots
            .iter()
            .map(|slot| slot.axes.added_axis_count())
            .sum()
    }

    /// Indices of the subplots currently displaying `column`.
    #[must_use]
    pub fn subplots_displaying(&self, column: &str) -> Vec<usize> {
        self.subplots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.displayed.borrow().contains(column))
            .map(|(index, _)| index)
            .collect()
    }

    #[must_use]
    pub fn is_column_displayed(&self, column: &str) -> bool {
        self.subplots
            .iter()
            .any(|slot| slot.displayed.borrow().contains(column))
    }

    pub fn displayed_columns(&self, index: usize) -> PlotResult<Vec<String>> {
        let slot = self.slot(index)?;
        let columns = slot.displayed.borrow().iter().cloned().collect();
        Ok(columns)
    }

    /// Checks the structural invariants of one subplot: a single consistent
    /// primary axis, every displayed curve bound to an added axis, and the
    /// displayed-column set matching the curve manager.
    pub fn check_invariants(&self, index: usize) -> PlotResult<()> {
        let slot = self.slot(index)?;
        slot.axes.check_invariants()?;
        if let Some(orphan) = slot
            .curves
            .added_configs()
            .find(|config| !slot.axes.is_axis_added(&config.axis))
        {
            return Err(PlotError::Invariant(format!(
                "curve `{}` in subplot {index} is bound to missing axis `{}`",
                orphan.column, orphan.axis
            )));
        }
        // Deferred curve signals have not reached the tracker yet.
        if !self.core.is_holding() {
            let displayed = slot.displayed.borrow();
            let added = slot.curves.added_curve_names();
            if displayed.len() != added.len() || added.iter().any(|c| !displayed.contains(c)) {
                return Err(PlotError::Invariant(format!(
                    "displayed columns of subplot {index} are out of sync"
                )));
            }
        }
        Ok(())
    }
}

fn forward_changes(source: &ManagerCore, target: &Signal<ManagerEvent>, scope: SubplotScope) {
    let target = target.clone();
    source.connect_all(move |_| target.emit(&ManagerEvent::SubplotConfigChanged { scope }));
}

fn track_displayed(displayed: &DisplayedColumns, event: &ManagerEvent) {
    let mut displayed = displayed.borrow_mut();
    match event {
        ManagerEvent::CurveAdded { column } => {
            displayed.insert(column.clone());
        }
        ManagerEvent::CurveRemoved { column } => {
            displayed.shift_remove(column);
        }
        ManagerEvent::CurvesBatchAdded { columns } => {
            displayed.extend(columns.iter().cloned());
        }
        ManagerEvent::CurvesBatchRemoved { columns } => {
            for column in columns {
                displayed.shift_remove(column);
            }
        }
        _ => {}
    }
}

impl Observable for SubplotManager {
    fn manager_core(&self) -> &ManagerCore {
        &self.core
    }
}

impl AtomicSubject for SubplotManager {
    type Snapshot = SubplotManagerSnapshot;

    fn capture_snapshot(&self) -> Self::Snapshot {
        SubplotManagerSnapshot {
            subplots: self
                .subplots
                .iter()
                .map(|slot| (slot.axes.capture_snapshot(), slot.curves.capture_snapshot()))
                .collect(),
        }
    }

    fn restore_snapshot(&mut self, snapshot: Self::Snapshot) {
        for (slot, (axes, curves)) in self.subplots.iter_mut().zip(snapshot.subplots) {
            slot.axes.restore_snapshot(axes);
            slot.curves.restore_snapshot(curves);
            *slot.displayed.borrow_mut() = slot.curves.added_curve_names().into_iter().collect();
        }
    }

    fn hold_signals(&self) {
        self.core.hold();
        for slot in &self.subplots {
            slot.axes.hold_signals();
            slot.curves.hold_signals();
        }
    }

    fn release_signals(&self, commit: bool) {
        for slot in &self.subplots {
            slot.curves.release_signals(commit);
            slot.axes.release_signals(commit);
        }
        self.core.release(commit);
    }
}
