//! Transient user notifications.
//!
//! A [`Notifier`] shows at most one toast at a time: a new toast replaces
//! the current one, and a toast expires a fixed delay after it was shown.
//! Time is always passed in, so expiry is deterministic under test.
//!
//! Every toast is also forwarded to an optional channel. The CLI prints from
//! that channel; tests collect from it.

use crate::types::IdSequence;
use std::fmt;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastMessage {
    pub id: u64,
    pub severity: Severity,
    pub text: String,
}

#[derive(Debug)]
pub struct Notifier {
    ids: IdSequence,
    current: Option<(ToastMessage, Instant)>,
    dismiss_after: Duration,
    sink: Option<Sender<ToastMessage>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_DISMISS_AFTER)
    }
}

impl Notifier {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            ids: IdSequence::new(),
            current: None,
            dismiss_after,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Sender<ToastMessage>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Show a toast at `now`, replacing whatever was visible.
    pub fn show_at(&mut self, severity: Severity, text: impl Into<String>, now: Instant) -> u64 {
        let toast = ToastMessage {
            id: self.ids.next_id(),
            severity,
            text: text.into(),
        };
        let id = toast.id;
        if let Some(sink) = &self.sink {
            // A closed sink only means nobody is listening any more.
            let _ = sink.send(toast.clone());
        }
        self.current = Some((toast, now));
        id
    }

    pub fn show(&mut self, severity: Severity, text: impl Into<String>) -> u64 {
        self.show_at(severity, text, Instant::now())
    }

    pub fn success(&mut self, text: impl Into<String>) -> u64 {
        self.show(Severity::Success, text)
    }

    pub fn warning(&mut self, text: impl Into<String>) -> u64 {
        self.show(Severity::Warning, text)
    }

    pub fn error(&mut self, text: impl Into<String>) -> u64 {
        self.show(Severity::Error, text)
    }

    /// The toast on screen at `now`, if it has not expired.
    pub fn visible_at(&self, now: Instant) -> Option<&ToastMessage> {
        self.current
            .as_ref()
            .filter(|(_, shown)| now.saturating_duration_since(*shown) < self.dismiss_after)
            .map(|(toast, _)| toast)
    }

    pub fn visible(&self) -> Option<&ToastMessage> {
        self.visible_at(Instant::now())
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}
