use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{PlotError, PlotResult};

/// Names of the signals registered by the managers.
pub mod signal_names {
    pub const AXIS_ADDED: &str = "axis_added";
    pub const AXIS_REMOVED: &str = "axis_removed";
    pub const AXIS_CHANGED: &str = "axis_changed";
    pub const AXES_BATCH_ADDED: &str = "axes_batch_added";
    pub const AXES_BATCH_REMOVED: &str = "axes_batch_removed";
    pub const AXES_BATCH_CHANGED: &str = "axes_batch_changed";

    pub const CURVE_ADDED: &str = "curve_added";
    pub const CURVE_REMOVED: &str = "curve_removed";
    pub const CURVE_CHANGED: &str = "curve_changed";
    pub const CURVES_BATCH_ADDED: &str = "curves_batch_added";
    pub const CURVES_BATCH_REMOVED: &str = "curves_batch_removed";
    pub const CURVES_BATCH_CHANGED: &str = "curves_batch_changed";

    pub const TRANSLATOR_CHANGED: &str = "translator_changed";
    pub const SUBPLOT_CONFIG_CHANGED: &str = "subplot_config_changed";

    pub const AXIS_SIGNALS: [&str; 6] = [
        AXIS_ADDED,
        AXIS_REMOVED,
        AXIS_CHANGED,
        AXES_BATCH_ADDED,
        AXES_BATCH_REMOVED,
        AXES_BATCH_CHANGED,
    ];

    pub const CURVE_SIGNALS: [&str; 6] = [
        CURVE_ADDED,
        CURVE_REMOVED,
        CURVE_CHANGED,
        CURVES_BATCH_ADDED,
        CURVES_BATCH_REMOVED,
        CURVES_BATCH_CHANGED,
    ];
}

/// Which part of the plot a fanned-out change concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubplotScope {
    /// Shared state such as column metadata; affects every subplot.
    Global,
    Subplot(usize),
}

impl SubplotScope {
    /// Integer form used by hosts that expect `-1` for global changes.
    #[must_use]
    pub fn as_index(self) -> i64 {
        match self {
            Self::Global => -1,
            Self::Subplot(index) => i64::try_from(index).unwrap_or(i64::MAX),
        }
    }
}

/// Payload carried by every manager signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagerEvent {
    AxisAdded { name: String },
    AxisRemoved { name: String },
    AxisChanged { name: String },
    AxesBatchAdded { names: Vec<String> },
    AxesBatchRemoved { names: Vec<String> },
    AxesBatchChanged { names: Vec<String> },
    CurveAdded { column: String },
    CurveRemoved { column: String },
    CurveChanged { column: String },
    CurvesBatchAdded { columns: Vec<String> },
    CurvesBatchRemoved { columns: Vec<String> },
    CurvesBatchChanged { columns: Vec<String> },
    TranslatorChanged,
    SubplotConfigChanged { scope: SubplotScope },
}

/// Handle returned by [`Signal::connect`], used to disconnect a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(u64);

/// Shared slot callable.
pub type Slot<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct SignalInner<T> {
    name: String,
    next_slot: Cell<u64>,
    slots: RefCell<Vec<(SlotId, Slot<T>)>>,
}

/// Synchronous multicast signal.
///
/// Cloning yields another handle to the same slot list. Slots run in
/// connection order; a slot that is already running (re-entrant emission) is
/// skipped for the nested call.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.inner.name)
            .field("slots", &self.inner.slots.borrow().len())
            .finish()
    }
}

impl<T: 'static> Signal<T> {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                name: name.into(),
                next_slot: Cell::new(0),
                slots: RefCell::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn connect<F>(&self, slot: F) -> SlotId
    where
        F: FnMut(&T) + 'static,
    {
        self.connect_shared(Rc::new(RefCell::new(slot)))
    }

    /// Connects a slot that is also held elsewhere, e.g. by several signals.
    pub fn connect_shared(&self, slot: Slot<T>) -> SlotId {
        let id = SlotId(self.inner.next_slot.get());
        self.inner.next_slot.set(id.0 + 1);
        self.inner.slots.borrow_mut().push((id, slot));
        id
    }

    /// Removes a slot. Returns `false` when the id is unknown.
    pub fn disconnect(&self, id: SlotId) -> bool {
        let mut slots = self.inner.slots.borrow_mut();
        let before = slots.len();
        slots.retain(|(slot_id, _)| *slot_id != id);
        slots.len() != before
    }

    pub fn disconnect_all(&self) {
        self.inner.slots.borrow_mut().clear();
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.inner.slots.borrow().len()
    }

    pub fn emit(&self, value: &T) {
        // Slots may connect or disconnect while we iterate.
        let slots: Vec<Slot<T>> = self
            .inner
            .slots
            .borrow()
            .iter()
            .map(|(_, slot)| Rc::clone(slot))
            .collect();
        trace!(signal = %self.inner.name, slots = slots.len(), "emit signal");
        for slot in slots {
            match slot.try_borrow_mut() {
                Ok(mut callback) => (&mut *callback)(value),
                Err(_) => warn!(
                    signal = %self.inner.name,
                    "skipping re-entrant slot invocation"
                ),
            }
        }
    }
}

/// Named signals owned by one manager, in registration order.
#[derive(Debug, Default)]
pub struct SignalRegistry {
    signals: IndexMap<String, Signal<ManagerEvent>>,
}

impl SignalRegistry {
    pub fn register(&mut self, name: &str) -> PlotResult<Signal<ManagerEvent>> {
        if self.signals.contains_key(name) {
            return Err(PlotError::DuplicateSignal(name.to_owned()));
        }
        let signal = Signal::new(name);
        self.signals.insert(name.to_owned(), signal.clone());
        Ok(signal)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Signal<ManagerEvent>> {
        self.signals.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.signals.contains_key(name)
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.signals.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Signal<ManagerEvent>)> {
        self.signals
            .iter()
            .map(|(name, signal)| (name.as_str(), signal))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{Signal, SubplotScope};

    #[test]
    fn slots_run_in_connection_order_and_disconnect() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let signal = Signal::<u32>::new("value");

        let first = {
            let seen = Rc::clone(&seen);
            signal.connect(move |v| seen.borrow_mut().push(("a", *v)))
        };
        {
            let seen = Rc::clone(&seen);
            signal.connect(move |v| seen.borrow_mut().push(("b", *v)));
        }

        signal.emit(&1);
        assert!(signal.disconnect(first));
        assert!(!signal.disconnect(first));
        signal.emit(&2);

        assert_eq!(*seen.borrow(), vec![("a", 1), ("b", 1), ("b", 2)]);
    }

    #[test]
    fn reentrant_emission_skips_running_slot() {
        let signal = Signal::<u32>::new("loop");
        let hits = Rc::new(RefCell::new(0_u32));
        {
            let inner = signal.clone();
            let hits = Rc::clone(&hits);
            signal.connect(move |v| {
                *hits.borrow_mut() += 1;
                if *v == 0 {
                    inner.emit(&1);
                }
            });
        }
        signal.emit(&0);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn global_scope_maps_to_minus_one() {
        assert_eq!(SubplotScope::Global.as_index(), -1);
        assert_eq!(SubplotScope::Subplot(2).as_index(), 2);
    }
}
