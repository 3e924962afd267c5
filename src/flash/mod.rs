//! One-shot status messages shown after a mutation.
//!
//! Handlers push into the shared bag; the next list render drains it, so each
//! message is displayed exactly once. Browser sessions are an external
//! collaborator — the bag is process-global.

use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashMessage {
    /// "success" | "error" | "danger" — mapped to styling in the list view.
    pub category: &'static str,
    pub text: String,
}

#[derive(Clone, Default)]
pub struct FlashBag {
    inner: Arc<Mutex<Vec<FlashMessage>>>,
}

impl FlashBag {
    pub fn push(&self, category: &'static str, text: impl Into<String>) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FlashMessage {
                category,
                text: text.into(),
            });
    }

    pub fn success(&self, text: impl Into<String>) {
        self.push("success", text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.push("error", text);
    }

    /// Destructive-action confirmations render in the warning style.
    pub fn danger(&self, text: impl Into<String>) {
        self.push("danger", text);
    }

    /// Take all pending messages, leaving the bag empty.
    pub fn drain(&self) -> Vec<FlashMessage> {
        std::mem::take(&mut *self.inner.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
