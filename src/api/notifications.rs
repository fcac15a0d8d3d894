use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::signals::Signal;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl NoticeLevel {
    /// Marker prepended by status displays.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Info => "",
            Self::Success => "✓ ",
            Self::Warning => "⚠ ",
            Self::Error => "✗ ",
        }
    }

    /// How long a status display keeps the message visible.
    #[must_use]
    pub const fn display_timeout_ms(self) -> u32 {
        match self {
            Self::Info | Self::Success => 3_000,
            Self::Warning | Self::Error => 5_000,
        }
    }
}

/// One user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    /// Kind of manager that raised the notice.
    pub source: String,
    pub subplot: Option<usize>,
    pub message: String,
}

/// The four notification channels every manager exposes.
#[derive(Debug, Clone)]
pub struct NoticeChannels {
    pub info: Signal<Notice>,
    pub warning: Signal<Notice>,
    pub error: Signal<Notice>,
    pub success: Signal<Notice>,
}

impl Default for NoticeChannels {
    fn default() -> Self {
        Self {
            info: Signal::new("info"),
            warning: Signal::new("warning"),
            error: Signal::new("error"),
            success: Signal::new("success"),
        }
    }
}

impl NoticeChannels {
    #[must_use]
    pub fn channel(&self, level: NoticeLevel) -> &Signal<Notice> {
        match level {
            NoticeLevel::Info => &self.info,
            NoticeLevel::Warning => &self.warning,
            NoticeLevel::Error => &self.error,
            NoticeLevel::Success => &self.success,
        }
    }

    /// Routes all four channels into one consumer.
    pub fn connect_sink<S>(&self, sink: Rc<RefCell<S>>)
    where
        S: NotificationSink + 'static,
    {
        for level in [
            NoticeLevel::Info,
            NoticeLevel::Warning,
            NoticeLevel::Error,
            NoticeLevel::Success,
        ] {
            let sink = Rc::clone(&sink);
            self.channel(level)
                .connect(move |notice| sink.borrow_mut().notify(notice));
        }
    }
}

/// Consumer of manager notifications, typically a status bar.
pub trait NotificationSink {
    fn notify(&mut self, notice: &Notice);
}

impl<F> NotificationSink for F
where
    F: FnMut(&Notice),
{
    fn notify(&mut self, notice: &Notice) {
        self(notice);
    }
}

/// Text shown by a status display, with its timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub timeout_ms: u32,
    pub level: NoticeLevel,
}

/// Headless status bar: formats notices and keeps a bounded history.
#[derive(Debug, Clone)]
pub struct StatusBarSink {
    history: Vec<StatusMessage>,
    capacity: usize,
}

impl Default for StatusBarSink {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl StatusBarSink {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            history: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Message currently on display.
    #[must_use]
    pub fn current(&self) -> Option<&StatusMessage> {
        self.history.last()
    }

    #[must_use]
    pub fn history(&self) -> &[StatusMessage] {
        &self.history
    }

    #[must_use]
    pub fn count(&self, level: NoticeLevel) -> usize {
        self.history.iter().filter(|m| m.level == level).count()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

impl NotificationSink for StatusBarSink {
    fn notify(&mut self, notice: &Notice) {
        if self.history.len() == self.capacity {
            self.history.remove(0);
        }
        self.history.push(StatusMessage {
            text: format!("{}{}", notice.level.marker(), notice.message),
            timeout_ms: notice.level.display_timeout_ms(),
            level: notice.level,
        });
    }
}
