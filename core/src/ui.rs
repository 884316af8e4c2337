//! User-facing side effects behind the `UiBridge` capability.
//!
//! # Design
//! The pipeline owes the user two kinds of feedback: a transient notice when
//! a request fails (a toast on mobile) and a navigation to the login page
//! when the session expires. `UiBridge` names those two effects without
//! prescribing a widget toolkit. Headless hosts take `LoggingUi`; the FFI
//! layer and tests use `UiOutbox`, which records events as data so the host
//! can replay them on its own UI thread.

use std::sync::Mutex;

/// Surface for user-visible side effects triggered by the pipeline.
pub trait UiBridge: Send + Sync {
    /// Show a transient notice, e.g. a toast.
    fn notify(&self, message: &str);

    /// Navigate to an app page, replacing the current one.
    fn redirect(&self, path: &str);
}

/// A recorded `UiBridge` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Notify(String),
    Redirect(String),
}

/// `UiBridge` that writes events to the log. The default for hosts without
/// a user interface.
#[derive(Debug, Default)]
pub struct LoggingUi;

impl UiBridge for LoggingUi {
    fn notify(&self, message: &str) {
        tracing::warn!(notice = message, "user notice");
    }

    fn redirect(&self, path: &str) {
        tracing::info!(path, "redirect requested");
    }
}

/// `UiBridge` that queues events for the host to drain and replay.
///
/// The FFI layer returns drained events alongside each classified response;
/// tests use it to assert on exactly which notices and redirects a request
/// produced.
#[derive(Debug, Default)]
pub struct UiOutbox {
    events: Mutex<Vec<UiEvent>>,
}

impl UiOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all queued events, oldest first, leaving the outbox empty.
    pub fn drain(&self) -> Vec<UiEvent> {
        let mut guard = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *guard)
    }
}

impl UiBridge for UiOutbox {
    fn notify(&self, message: &str) {
        let mut guard = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.push(UiEvent::Notify(message.to_string()));
    }

    fn redirect(&self, path: &str) {
        let mut guard = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.push(UiEvent::Redirect(path.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbox_drains_in_order_and_empties() {
        let outbox = UiOutbox::new();
        outbox.notify("request failed");
        outbox.redirect("/pages/login/login");

        assert_eq!(
            outbox.drain(),
            vec![
                UiEvent::Notify("request failed".to_string()),
                UiEvent::Redirect("/pages/login/login".to_string()),
            ]
        );
        assert!(outbox.drain().is_empty());
    }
}
