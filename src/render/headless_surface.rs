use indexmap::IndexMap;

use crate::core::{AxisItemId, AxisRange, ViewportId, ViewportRect};
use crate::error::{PlotError, PlotResult};
use crate::render::{AxisItemSpec, RenderSurface};

#[derive(Debug, Clone, Copy, PartialEq)]
struct ViewportState {
    rect: ViewportRect,
    range: AxisRange,
    auto_range: bool,
}

/// In-memory surface used by tests and headless hosts.
///
/// It keeps viewport geometry and ranges so alignment results can be
/// inspected without a drawing backend.
#[derive(Debug)]
pub struct HeadlessSurface {
    primary: ViewportId,
    next_id: u32,
    viewports: IndexMap<ViewportId, ViewportState>,
    axis_items: IndexMap<AxisItemId, (ViewportId, AxisItemSpec)>,
    pub set_range_calls: usize,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new(ViewportRect::new(0.0, 0.0, 800.0, 500.0))
    }
}

impl HeadlessSurface {
    #[must_use]
    pub fn new(primary_rect: ViewportRect) -> Self {
        let primary = ViewportId::new(0);
        let mut viewports = IndexMap::new();
        viewports.insert(
            primary,
            ViewportState {
                rect: primary_rect,
                range: AxisRange::default(),
                auto_range: true,
            },
        );
        Self {
            primary,
            next_id: 1,
            viewports,
            axis_items: IndexMap::new(),
            set_range_calls: 0,
        }
    }

    fn state(&self, viewport: ViewportId) -> PlotResult<&ViewportState> {
        self.viewports
            .get(&viewport)
            .ok_or(PlotError::UnknownViewport(viewport.raw()))
    }

    fn state_mut(&mut self, viewport: ViewportId) -> PlotResult<&mut ViewportState> {
        self.viewports
            .get_mut(&viewport)
            .ok_or(PlotError::UnknownViewport(viewport.raw()))
    }

    /// Simulates the window resizing the primary viewport.
    pub fn resize_primary(&mut self, rect: ViewportRect) -> PlotResult<()> {
        let primary = self.primary;
        self.set_viewport_rect(primary, rect)
    }

    /// Simulates a user pan by shifting both bounds by `delta`.
    pub fn pan(&mut self, viewport: ViewportId, delta: f64) -> PlotResult<()> {
        let state = self.state_mut(viewport)?;
        state.range = AxisRange::new(state.range.lower + delta, state.range.upper + delta)?;
        state.auto_range = false;
        Ok(())
    }

    #[must_use]
    pub fn viewport_count(&self) -> usize {
        self.viewports.len()
    }

    #[must_use]
    pub fn axis_item_count(&self) -> usize {
        self.axis_items.len()
    }

    #[must_use]
    pub fn axis_item(&self, item: AxisItemId) -> Option<&AxisItemSpec> {
        self.axis_items.get(&item).map(|(_, spec)| spec)
    }

    #[must_use]
    pub fn is_auto_range(&self, viewport: ViewportId) -> bool {
        self.viewports
            .get(&viewport)
            .is_some_and(|state| state.auto_range)
    }
}

impl RenderSurface for HeadlessSurface {
    fn primary_viewport(&self) -> ViewportId {
        self.primary
    }

    fn create_viewport(&mut self) -> PlotResult<ViewportId> {
        let id = ViewportId::new(self.next_id);
        self.next_id += 1;
        let rect = self.state(self.primary)?.rect;
        self.viewports.insert(
            id,
            ViewportState {
                rect,
                range: AxisRange::default(),
                auto_range: true,
            },
        );
        Ok(id)
    }

    fn destroy_viewport(&mut self, viewport: ViewportId) -> PlotResult<()> {
        if viewport == self.primary {
            return Err(PlotError::InvalidData(
                "primary viewport cannot be destroyed".to_owned(),
            ));
        }
        self.viewports
            .shift_remove(&viewport)
            .ok_or(PlotError::UnknownViewport(viewport.raw()))?;
        self.axis_items.retain(|_, (owner, _)| *owner != viewport);
        Ok(())
    }

    fn create_axis_item(
        &mut self,
        viewport: ViewportId,
        spec: &AxisItemSpec,
    ) -> PlotResult<AxisItemId> {
        self.state(viewport)?;
        let id = AxisItemId::new(self.next_id);
        self.next_id += 1;
        self.axis_items.insert(id, (viewport, spec.clone()));
        Ok(id)
    }

    fn update_axis_item(&mut self, item: AxisItemId, spec: &AxisItemSpec) -> PlotResult<()> {
        let entry = self
            .axis_items
            .get_mut(&item)
            .ok_or(PlotError::UnknownAxisItem(item.raw()))?;
        entry.1 = spec.clone();
        Ok(())
    }

    fn destroy_axis_item(&mut self, item: AxisItemId) -> PlotResult<()> {
        self.axis_items
            .shift_remove(&item)
            .map(|_| ())
            .ok_or(PlotError::UnknownAxisItem(item.raw()))
    }

    fn set_y_range(&mut self, viewport: ViewportId, range: AxisRange) -> PlotResult<()> {
        let state = self.state_mut(viewport)?;
        state.range = range;
        state.auto_range = false;
        self.set_range_calls += 1;
        Ok(())
    }

    fn y_range(&self, viewport: ViewportId) -> PlotResult<AxisRange> {
        self.state(viewport).map(|state| state.range)
    }

    fn enable_auto_range(&mut self, viewport: ViewportId) -> PlotResult<()> {
        self.state_mut(viewport)?.auto_range = true;
        Ok(())
    }

    fn viewport_rect(&self, viewport: ViewportId) -> PlotResult<ViewportRect> {
        self.state(viewport).map(|state| state.rect)
    }

    fn set_viewport_rect(&mut self, viewport: ViewportId, rect: ViewportRect) -> PlotResult<()> {
        if !rect.is_valid() {
            return Err(PlotError::InvalidData(
                "viewport rectangle must be finite with non-negative size".to_owned(),
            ));
        }
        self.state_mut(viewport)?.rect = rect;
        Ok(())
    }
}
