use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use super::notifications::{Notice, NoticeChannels, NoticeLevel, NotificationSink};
use super::signals::{ManagerEvent, Signal, SignalRegistry, SlotId};
use crate::error::{PlotError, PlotResult};

/// Signal emissions queued while an atomic scope is open.
#[derive(Debug, Default)]
struct DeferredQueue {
    events: Vec<(String, ManagerEvent)>,
    /// Queue length at the time each still-open scope started.
    marks: Vec<usize>,
}

/// State shared by every manager: named signals, notification channels and
/// the deferred-emission queue used by atomic scopes.
#[derive(Debug)]
pub struct ManagerCore {
    kind: &'static str,
    subplot: Option<usize>,
    registry: RefCell<SignalRegistry>,
    notices: NoticeChannels,
    deferred: RefCell<DeferredQueue>,
    hold_depth: Cell<usize>,
}

impl ManagerCore {
    #[must_use]
    pub fn new(kind: &'static str, subplot: Option<usize>) -> Self {
        Self {
            kind,
            subplot,
            registry: RefCell::new(SignalRegistry::default()),
            notices: NoticeChannels::default(),
            deferred: RefCell::new(DeferredQueue::default()),
            hold_depth: Cell::new(0),
        }
    }

    /// Builds a core with `names` already registered.
    pub fn with_signals(
        kind: &'static str,
        subplot: Option<usize>,
        names: &[&str],
    ) -> PlotResult<Self> {
        let core = Self::new(kind, subplot);
        for name in names {
            core.register_signal(name)?;
        }
        Ok(core)
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    #[must_use]
    pub fn subplot(&self) -> Option<usize> {
        self.subplot
    }

    pub fn register_signal(&self, name: &str) -> PlotResult<Signal<ManagerEvent>> {
        let signal = self.registry.borrow_mut().register(name)?;
        debug!(manager = self.kind, subplot = ?self.subplot, signal = name, "register signal");
        Ok(signal)
    }

    /// Looks up a signal; an unknown name raises an error notice as well.
    pub fn signal(&self, name: &str) -> PlotResult<Signal<ManagerEvent>> {
        let found = self.registry.borrow().get(name);
        found.ok_or_else(|| {
            let err = PlotError::UnknownSignal {
                manager: self.kind,
                name: name.to_owned(),
            };
            self.error(err.to_string(), true);
            err
        })
    }

    #[must_use]
    pub fn signal_names(&self) -> Vec<String> {
        self.registry.borrow().names()
    }

    /// Connects one slot to every registered signal.
    pub fn connect_all<F>(&self, slot: F) -> Vec<SlotId>
    where
        F: FnMut(&ManagerEvent) + 'static,
    {
        let shared: Rc<RefCell<dyn FnMut(&ManagerEvent)>> = Rc::new(RefCell::new(slot));
        let signals: Vec<Signal<ManagerEvent>> = self
            .registry
            .borrow()
            .iter()
            .map(|(_, signal)| signal.clone())
            .collect();
        signals
            .iter()
            .map(|signal| signal.connect_shared(Rc::clone(&shared)))
            .collect()
    }

    #[must_use]
    pub fn notices(&self) -> &NoticeChannels {
        &self.notices
    }

    /// Emits `event` on the named signal, or queues it while signals are held.
    pub fn emit(&self, name: &str, event: ManagerEvent) {
        if self.hold_depth.get() > 0 {
            debug!(manager = self.kind, subplot = ?self.subplot, signal = name, "queue signal");
            self.deferred
                .borrow_mut()
                .events
                .push((name.to_owned(), event));
            return;
        }
        self.deliver(name, &event);
    }

    fn deliver(&self, name: &str, event: &ManagerEvent) {
        let signal = self.registry.borrow().get(name);
        match signal {
            Some(signal) => signal.emit(event),
            None => self.error(
                format!("cannot emit unregistered signal `{name}`"),
                true,
            ),
        }
    }

    #[must_use]
    pub fn is_holding(&self) -> bool {
        self.hold_depth.get() > 0
    }

    /// Opens a deferred-emission scope. Scopes nest.
    pub fn hold(&self) {
        let mut deferred = self.deferred.borrow_mut();
        let mark = deferred.events.len();
        deferred.marks.push(mark);
        self.hold_depth.set(self.hold_depth.get() + 1);
    }

    /// Closes the innermost scope. Without `commit` the events queued inside
    /// it are dropped. Closing the outermost scope delivers the queue.
    pub fn release(&self, commit: bool) {
        let depth = self.hold_depth.get();
        if depth == 0 {
            warn!(manager = self.kind, subplot = ?self.subplot, "release without matching hold");
            return;
        }
        {
            let mut deferred = self.deferred.borrow_mut();
            let mark = deferred.marks.pop().unwrap_or(0);
            if !commit {
                let dropped = deferred.events.len().saturating_sub(mark);
                deferred.events.truncate(mark);
                if dropped > 0 {
                    debug!(manager = self.kind, subplot = ?self.subplot, dropped, "discard queued signals");
                }
            }
        }
        self.hold_depth.set(depth - 1);
        if depth == 1 {
            let events = std::mem::take(&mut self.deferred.borrow_mut().events);
            for (name, event) in events {
                self.deliver(&name, &event);
            }
        }
    }

    fn notify(&self, level: NoticeLevel, message: String) {
        let notice = Notice {
            level,
            source: self.kind.to_owned(),
            subplot: self.subplot,
            message,
        };
        self.notices.channel(level).emit(&notice);
    }

    pub fn info(&self, message: impl Into<String>, also_log: bool) {
        let message = message.into();
        if also_log {
            info!(manager = self.kind, subplot = ?self.subplot, "{message}");
        }
        self.notify(NoticeLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>, also_log: bool) {
        let message = message.into();
        if also_log {
            info!(manager = self.kind, subplot = ?self.subplot, success = true, "{message}");
        }
        self.notify(NoticeLevel::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>, also_log: bool) {
        let message = message.into();
        if also_log {
            warn!(manager = self.kind, subplot = ?self.subplot, "{message}");
        }
        self.notify(NoticeLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>, also_log: bool) {
        let message = message.into();
        if also_log {
            error!(manager = self.kind, subplot = ?self.subplot, "{message}");
        }
        self.notify(NoticeLevel::Error, message);
    }

    /// Silent channel: structured log only, no notification.
    pub fn log_debug(&self, message: impl AsRef<str>) {
        debug!(manager = self.kind, subplot = ?self.subplot, "{}", message.as_ref());
    }
}

/// Named-signal and notification surface shared by all managers.
pub trait Observable {
    fn manager_core(&self) -> &ManagerCore;

    fn register_signal(&self, name: &str) -> PlotResult<Signal<ManagerEvent>> {
        self.manager_core().register_signal(name)
    }

    fn signal(&self, name: &str) -> PlotResult<Signal<ManagerEvent>> {
        self.manager_core().signal(name)
    }

    fn list_signal_names(&self) -> Vec<String> {
        self.manager_core().signal_names()
    }

    fn notices(&self) -> &NoticeChannels {
        self.manager_core().notices()
    }

    fn connect_all_signals<F>(&self, slot: F) -> Vec<SlotId>
    where
        F: FnMut(&ManagerEvent) + 'static,
        Self: Sized,
    {
        self.manager_core().connect_all(slot)
    }

    fn connect_to_status_channel<S>(&self, sink: Rc<RefCell<S>>)
    where
        S: NotificationSink + 'static,
        Self: Sized,
    {
        self.manager_core().notices().connect_sink(sink);
    }
}

/// Transactional mutation with snapshot and rollback.
pub trait AtomicSubject: Observable {
    type Snapshot;

    fn capture_snapshot(&self) -> Self::Snapshot;

    fn restore_snapshot(&mut self, snapshot: Self::Snapshot);

    /// Opens a deferred-emission scope on every core this subject owns.
    fn hold_signals(&self) {
        self.manager_core().hold();
    }

    fn release_signals(&self, commit: bool) {
        self.manager_core().release(commit);
    }

    /// Runs `body` against a snapshot of the current state.
    ///
    /// On `Err` the snapshot is restored, signals queued inside the scope are
    /// discarded, an error notice is raised and the error is returned. Scopes
    /// nest; each level keeps its own snapshot.
    fn atomic_operation<T, F>(&mut self, operation: &str, body: F) -> PlotResult<T>
    where
        F: FnOnce(&mut Self) -> PlotResult<T>,
        Self: Sized,
    {
        let snapshot = self.capture_snapshot();
        self.hold_signals();
        match body(self) {
            Ok(value) => {
                drop(snapshot);
                self.release_signals(true);
                Ok(value)
            }
            Err(err) => {
                self.restore_snapshot(snapshot);
                self.release_signals(false);
                let core = self.manager_core();
                warn!(
                    manager = core.kind(),
                    subplot = ?core.subplot(),
                    operation,
                    error = %err,
                    "state restored from snapshot"
                );
                core.error(format!("{operation} failed and was rolled back: {err}"), false);
                Err(err)
            }
        }
    }
}
