use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use crate::api::AxisManager;
use crate::core::{
    AxisConfig, AxisRange, AxisRenderHandle, AxisSide, RangeMode, ViewportId,
    aligned_range_for_mode,
};
use crate::error::{PlotError, PlotResult};
use crate::render::{AxisItemSpec, RenderSurface};

/// Outcome of [`AxisCoordinateAligner::refresh`].
///
/// The aligner never writes axis configs; hosts record `attached` handles
/// with `AxisManager::set_render_handle` and clear the `detached` ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    pub attached: Vec<(String, AxisRenderHandle)>,
    pub detached: Vec<String>,
    /// Axes the surface could not host, e.g. a secondary on the left side.
    pub rejected: Vec<String>,
    pub aligned: usize,
    pub alignment_failures: usize,
}

/// Keeps the viewports of one subplot consistent with its axis configs.
///
/// Each secondary axis gets a dependent viewport stacked on the primary one.
/// Dependent viewports always share the primary rectangle and their Y ranges
/// are recomputed from the configured alignment whenever a reference range
/// changes.
#[derive(Debug)]
pub struct AxisCoordinateAligner<S: RenderSurface> {
    surface: S,
    subplot: usize,
    primary_axis: String,
    attached: IndexMap<String, AxisRenderHandle>,
}

impl<S: RenderSurface> AxisCoordinateAligner<S> {
    pub fn new(surface: S, subplot: usize, primary_axis: impl Into<String>) -> Self {
        Self {
            surface,
            subplot,
            primary_axis: primary_axis.into(),
            attached: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct surface access for host-driven changes (pan, zoom, resize).
    /// Follow up with `on_range_changed` or `on_primary_resized`.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[must_use]
    pub fn into_surface(self) -> S {
        self.surface
    }

    #[must_use]
    pub fn primary_axis(&self) -> &str {
        &self.primary_axis
    }

    #[must_use]
    pub fn handle(&self, axis: &str) -> Option<AxisRenderHandle> {
        self.attached.get(axis).copied()
    }

    #[must_use]
    pub fn attached_axis_names(&self) -> Vec<String> {
        self.attached.keys().cloned().collect()
    }

    /// Viewport showing `axis`; the primary axis uses the surface's own.
    #[must_use]
    pub fn viewport_for(&self, axis: &str) -> Option<ViewportId> {
        if axis == self.primary_axis {
            return Some(self.surface.primary_viewport());
        }
        self.attached.get(axis).map(|handle| handle.viewport)
    }

    fn require_viewport(&self, axis: &str) -> PlotResult<ViewportId> {
        self.viewport_for(axis)
            .ok_or_else(|| PlotError::AxisNotFound(axis.to_owned()))
    }

    /// Creates the viewport and axis item of a secondary axis. Attaching an
    /// attached axis refreshes its axis item instead.
    pub fn attach_axis(&mut self, config: &AxisConfig) -> PlotResult<AxisRenderHandle> {
        if config.name == self.primary_axis {
            return Err(PlotError::InvalidData(format!(
                "primary axis `{}` is drawn by the primary viewport",
                config.name
            )));
        }
        if config.side == AxisSide::Left {
            return Err(PlotError::InvalidData(format!(
                "axis `{}`: only the primary axis may be drawn on the left",
                config.name
            )));
        }
        let spec = AxisItemSpec::from_config(config);
        if let Some(handle) = self.attached.get(&config.name).copied() {
            if let Some(item) = handle.axis_item {
                self.surface.update_axis_item(item, &spec)?;
            }
            return Ok(handle);
        }

        let viewport = self.surface.create_viewport()?;
        let primary_rect = self.surface.viewport_rect(self.surface.primary_viewport())?;
        self.surface.set_viewport_rect(viewport, primary_rect)?;
        let axis_item = match self.surface.create_axis_item(viewport, &spec) {
            Ok(item) => item,
            Err(err) => {
                // Do not leak the viewport created above.
                if let Err(cleanup) = self.surface.destroy_viewport(viewport) {
                    warn!(error = %cleanup, "failed to destroy viewport after axis item error");
                }
                return Err(err);
            }
        };
        let handle = AxisRenderHandle {
            viewport,
            axis_item: Some(axis_item),
        };
        self.attached.insert(config.name.clone(), handle);
        debug!(subplot = self.subplot, axis = %config.name, viewport = %viewport, "attach axis");
        Ok(handle)
    }

    pub fn detach_axis(&mut self, axis: &str) -> PlotResult<()> {
        let handle = self
            .attached
            .shift_remove(axis)
            .ok_or_else(|| PlotError::AxisNotFound(axis.to_owned()))?;
        if let Some(item) = handle.axis_item {
            self.surface.destroy_axis_item(item)?;
        }
        self.surface.destroy_viewport(handle.viewport)?;
        debug!(subplot = self.subplot, axis, "detach axis");
        Ok(())
    }

    /// Copies the primary rectangle onto every dependent viewport.
    pub fn sync_geometry(&mut self) -> PlotResult<usize> {
        let rect = self
            .surface
            .viewport_rect(self.surface.primary_viewport())?;
        for handle in self.attached.values() {
            self.surface.set_viewport_rect(handle.viewport, rect)?;
        }
        Ok(self.attached.len())
    }

    pub fn on_primary_resized(&mut self) -> PlotResult<usize> {
        self.sync_geometry()
    }

    /// Applies the configured range mode of one axis.
    pub fn apply_range(&mut self, config: &AxisConfig) -> PlotResult<()> {
        let viewport = self.require_viewport(&config.name)?;
        match config.range_mode {
            RangeMode::Manual => self.surface.set_y_range(viewport, config.manual_range),
            RangeMode::Auto => self.surface.enable_auto_range(viewport),
        }
    }

    /// Recomputes and applies the aligned range of `config`. Returns the new
    /// range, or `None` when the axis is not aligned.
    pub fn apply_alignment(&mut self, config: &AxisConfig) -> PlotResult<Option<AxisRange>> {
        if !config.is_aligned() || config.name == self.primary_axis {
            return Ok(None);
        }
        let target_axis = config
            .align_target
            .as_deref()
            .unwrap_or(self.primary_axis.as_str());
        let target_viewport = self.require_viewport(target_axis)?;
        let source_viewport = self.require_viewport(&config.name)?;

        let target = self.surface.y_range(target_viewport)?;
        let source = self.surface.y_range(source_viewport)?;
        let aligned = aligned_range_for_mode(config.align_mode, config.align, target, source)?;
        if let Some(range) = aligned {
            self.surface.set_y_range(source_viewport, range)?;
        }
        Ok(aligned)
    }

    /// Added axes aligned to `root`, directly or through other axes, in
    /// breadth-first order. Each axis follows its target and appears once.
    fn alignment_order(&self, axes: &AxisManager, root: &str) -> Vec<String> {
        let mut order: IndexSet<String> = IndexSet::new();
        order.insert(root.to_owned());
        let mut next = 0;
        while let Some(reference) = order.get_index(next).cloned() {
            next += 1;
            for config in axes.added_configs() {
                if self.aligns_to(config, &reference) {
                    order.insert(config.name.clone());
                }
            }
        }
        order.into_iter().skip(1).collect()
    }

    fn aligns_to(&self, config: &AxisConfig, reference: &str) -> bool {
        config.is_aligned()
            && config.name != self.primary_axis
            && config
                .align_target
                .as_deref()
                .unwrap_or(self.primary_axis.as_str())
                == reference
    }

    /// Re-aligns every added axis that depends, directly or through other
    /// axes, on `changed_axis`. Returns the number of axes updated.
    pub fn on_range_changed(&mut self, axes: &AxisManager, changed_axis: &str) -> PlotResult<usize> {
        let mut updated = 0;
        for name in self.alignment_order(axes, changed_axis) {
            let Some(config) = axes.axis_config(&name) else {
                continue;
            };
            if self.apply_alignment(config)?.is_some() {
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Brings the surface in line with `axes`: attaches and detaches
    /// viewports, syncs geometry, applies every range and then every
    /// alignment, targets before dependents. A primary switch rebuilds all dependent viewports.
    pub fn refresh(&mut self, axes: &AxisManager) -> PlotResult<RefreshReport> {
        let mut report = RefreshReport::default();

        if axes.primary_axis_name() != self.primary_axis {
            for name in self.attached_axis_names() {
                self.detach_axis(&name)?;
                report.detached.push(name);
            }
            self.primary_axis = axes.primary_axis_name().to_owned();
        }

        let stale: Vec<String> = self
            .attached
            .keys()
            .filter(|name| !axes.is_axis_added(name))
            .cloned()
            .collect();
        for name in stale {
            self.detach_axis(&name)?;
            report.detached.push(name);
        }

        for config in axes.added_configs() {
            if config.name == self.primary_axis {
                continue;
            }
            let was_attached = self.attached.contains_key(&config.name);
            match self.attach_axis(config) {
                Ok(handle) if !was_attached => report.attached.push((config.name.clone(), handle)),
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        subplot = self.subplot,
                        axis = %config.name,
                        error = %err,
                        "axis cannot be attached"
                    );
                    report.rejected.push(config.name.clone());
                }
            }
        }

        self.sync_geometry()?;
        let hosted: Vec<&AxisConfig> = axes
            .added_configs()
            .filter(|config| self.viewport_for(&config.name).is_some())
            .collect();
        for config in &hosted {
            self.apply_range(config)?;
        }

        // Left outside the primary's tree: target cycles and axes whose
        // target is not added.
        let mut order = self.alignment_order(axes, &self.primary_axis);
        for config in &hosted {
            if config.is_aligned() && !order.contains(&config.name) {
                order.push(config.name.clone());
            }
        }
        for name in order {
            let Some(config) = hosted.iter().find(|config| config.name == name) else {
                continue;
            };
            match self.apply_alignment(config) {
                Ok(Some(_)) => report.aligned += 1,
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        subplot = self.subplot,
                        axis = %config.name,
                        error = %err,
                        "skipping axis alignment"
                    );
                    report.alignment_failures += 1;
                }
            }
        }
        Ok(report)
    }
}
