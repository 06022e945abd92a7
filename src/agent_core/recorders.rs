//! Lead and knowledge-gap recorders.
//!
//! Both actions forward a one-line summary to the site owner and hand the
//! model a fixed acknowledgment. Neither validates its input nor fails.

use std::sync::Arc;

use serde::Serialize;

use crate::notify::{notify_best_effort, Notifier};

/// Placeholder when the visitor did not give a name.
pub const NAME_NOT_PROVIDED: &str = "Name not provided";

/// Placeholder when there are no notes.
pub const NOTES_NOT_PROVIDED: &str = "not provided";

/// Acknowledgment returned to the model: `{"recorded": "ok"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recorded {
    pub recorded: &'static str,
}

impl Recorded {
    pub const OK: Recorded = Recorded { recorded: "ok" };
}

/// Records visitors who want to get in touch.
pub struct LeadRecorder {
    notifier: Arc<dyn Notifier>,
}

impl LeadRecorder {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Record a contact. `email` is accepted as-is.
    pub async fn record_contact(
        &self,
        email: &str,
        name: Option<&str>,
        notes: Option<&str>,
    ) -> Recorded {
        let name = name.unwrap_or(NAME_NOT_PROVIDED);
        let notes = notes.unwrap_or(NOTES_NOT_PROVIDED);
        notify_best_effort(
            self.notifier.as_ref(),
            &format!("Recording {name} with email {email} and notes {notes}"),
        )
        .await;
        Recorded::OK
    }
}

/// Records questions the assistant could not answer.
pub struct GapRecorder {
    notifier: Arc<dyn Notifier>,
}

impl GapRecorder {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub async fn record_gap(&self, question: &str) -> Recorded {
        notify_best_effort(self.notifier.as_ref(), &format!("Recording {question}")).await;
        Recorded::OK
    }
}
