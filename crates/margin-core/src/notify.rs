//! User Feedback
//!
//! Transient notices and a progress indicator shown while an operation runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Identifies one visible progress indicator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgressToken(pub u64);

/// Surface for short user-visible messages
pub trait Notifier: Send + Sync {
    /// Shows a short informational notice
    fn notice(&self, message: &str);

    /// Shows a short error notice
    fn error(&self, message: &str);

    /// Shows a progress indicator until `end_progress` is called with the token
    fn begin_progress(&self, message: &str) -> ProgressToken;

    /// Dismisses a progress indicator
    fn end_progress(&self, token: ProgressToken);
}

/// Dismisses its progress indicator when dropped
pub struct ProgressGuard {
    notifier: Arc<dyn Notifier>,
    token: Option<ProgressToken>,
}

impl ProgressGuard {
    pub fn begin(notifier: Arc<dyn Notifier>, message: &str) -> Self {
        let token = notifier.begin_progress(message);
        Self {
            notifier,
            token: Some(token),
        }
    }

    /// Dismisses now instead of at drop
    pub fn dismiss(&mut self) {
        if let Some(token) = self.token.take() {
            self.notifier.end_progress(token);
        }
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        self.dismiss();
    }
}

// =============================================================================
// Implementations
// =============================================================================

/// Something a [`RecordingNotifier`] was asked to show
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoticeEvent {
    Notice(String),
    Error(String),
    ProgressStarted(ProgressToken, String),
    ProgressEnded(ProgressToken),
}

/// Keeps every event in memory; used by tests and embedding hosts
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NoticeEvent>>,
    next_token: AtomicU64,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NoticeEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Progress indicators started but not yet dismissed
    pub fn open_progress(&self) -> Vec<ProgressToken> {
        let events = self.events();
        events
            .iter()
            .filter_map(|event| match event {
                NoticeEvent::ProgressStarted(token, _) => Some(*token),
                _ => None,
            })
            .filter(|token| !events.contains(&NoticeEvent::ProgressEnded(*token)))
            .collect()
    }

    fn push(&self, event: NoticeEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notice(&self, message: &str) {
        self.push(NoticeEvent::Notice(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(NoticeEvent::Error(message.to_string()));
    }

    fn begin_progress(&self, message: &str) -> ProgressToken {
        let token = ProgressToken(self.next_token.fetch_add(1, Ordering::SeqCst));
        self.push(NoticeEvent::ProgressStarted(token, message.to_string()));
        token
    }

    fn end_progress(&self, token: ProgressToken) {
        self.push(NoticeEvent::ProgressEnded(token));
    }
}
