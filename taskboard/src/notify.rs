//! Transient user notifications.
//!
//! The board reports outcomes (saved, failed, could not load) as [`Notice`]s
//! on an mpsc channel. The front-end drains the channel into a
//! [`NoticeBoard`], which shows the latest notice until it expires.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// An operation completed.
    Success,
    /// An operation failed.
    Error,
    /// Something degraded but the operation's result stands.
    Warning,
}

/// A message shown to the user for a limited time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub kind: NoticeKind,
    /// Text to display.
    pub text: String,
    /// How long the notice stays visible.
    pub duration: Duration,
}

/// Display durations per severity.
#[derive(Debug, Clone, Copy)]
pub struct NoticeDurations {
    /// Success notices.
    pub success: Duration,
    /// Error and warning notices.
    pub error: Duration,
}

impl Default for NoticeDurations {
    fn default() -> Self {
        Self {
            success: Duration::from_millis(2000),
            error: Duration::from_millis(3000),
        }
    }
}

/// Sending half of the notice channel.
///
/// Never blocks. When the channel is full or closed the notice is dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Notice>,
    durations: NoticeDurations,
}

impl Notifier {
    /// Creates a notifier and the receiver the front-end drains.
    #[must_use]
    pub fn channel(buffer: usize, durations: NoticeDurations) -> (Self, mpsc::Receiver<Notice>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx, durations }, rx)
    }

    /// Reports a completed operation.
    pub fn success(&self, text: impl Into<String>) {
        self.emit(NoticeKind::Success, text.into(), self.durations.success);
    }

    /// Reports a failed operation.
    pub fn error(&self, text: impl Into<String>) {
        self.emit(NoticeKind::Error, text.into(), self.durations.error);
    }

    /// Reports a degraded outcome.
    pub fn warning(&self, text: impl Into<String>) {
        self.emit(NoticeKind::Warning, text.into(), self.durations.error);
    }

    fn emit(&self, kind: NoticeKind, text: String, duration: Duration) {
        if let Err(e) = self.tx.try_send(Notice {
            kind,
            text,
            duration,
        }) {
            tracing::debug!(error = %e, "notice dropped");
        }
    }
}

/// The notice currently on screen.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    current: Option<(Notice, Instant)>,
}

impl NoticeBoard {
    /// Shows `notice`, replacing whatever was visible.
    pub fn show(&mut self, notice: Notice, now: Instant) {
        let expires = now + notice.duration;
        self.current = Some((notice, expires));
    }

    /// Returns the notice if it has not expired at `now`.
    #[must_use]
    pub fn visible(&self, now: Instant) -> Option<&Notice> {
        self.current
            .as_ref()
            .filter(|(_, expires)| now < *expires)
            .map(|(notice, _)| notice)
    }
}
