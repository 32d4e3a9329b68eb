//! Delete confirmation
//!
//! Deleting is two-step: a request puts the target up for confirmation, and
//! only an explicit confirm reaches the gateway. The modal state is a plain
//! value so shells render it and tests drive it without a blocking dialog.
//!
//! ```text
//! Idle ──request──▶ ConfirmPending ──begin──▶ InFlight ──finish──▶ Done
//!   ▲                    │                                          │
//!   └──────cancel────────┴──────────────────cancel──────────────────┘
//! ```

use crate::routes::Route;
use biblioteca_common::metrics::record_delete;
use biblioteca_common::LibraryGateway;
use serde::Serialize;
use tracing::{info, warn};

/// The record a delete is aimed at, with the label shown in the prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteTarget {
    pub id: i64,
    pub label: String,
}

impl DeleteTarget {
    pub fn new(id: i64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }

    /// Confirmation question, e.g. `Delete "Dune"?`
    pub fn prompt(&self) -> String {
        format!("Delete \"{}\"?", self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted { target: DeleteTarget },
    Failed { target: DeleteTarget, message: String },
}

impl DeleteOutcome {
    pub fn target(&self) -> &DeleteTarget {
        match self {
            DeleteOutcome::Deleted { target } | DeleteOutcome::Failed { target, .. } => target,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeleteState {
    #[default]
    Idle,
    ConfirmPending {
        target: DeleteTarget,
    },
    InFlight {
        target: DeleteTarget,
    },
    Done {
        outcome: DeleteOutcome,
    },
}

impl DeleteState {
    /// Ask for confirmation. Refused while a delete is in flight.
    pub fn request(&mut self, target: DeleteTarget) -> bool {
        if self.is_in_flight() {
            return false;
        }
        *self = DeleteState::ConfirmPending { target };
        true
    }

    /// Back to idle with no side effects. An in-flight delete cannot be
    /// withdrawn.
    pub fn cancel(&mut self) -> bool {
        if self.is_in_flight() {
            return false;
        }
        *self = DeleteState::Idle;
        true
    }

    /// Confirm the pending target; `None` unless confirmation is pending
    pub fn begin(&mut self) -> Option<DeleteTarget> {
        let DeleteState::ConfirmPending { target } = self else {
            return None;
        };
        let target = target.clone();
        *self = DeleteState::InFlight {
            target: target.clone(),
        };
        Some(target)
    }

    pub fn finish(&mut self, outcome: DeleteOutcome) {
        *self = DeleteState::Done { outcome };
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, DeleteState::InFlight { .. })
    }

    pub fn pending(&self) -> Option<&DeleteTarget> {
        match self {
            DeleteState::ConfirmPending { target } => Some(target),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<&DeleteOutcome> {
        match self {
            DeleteState::Done { outcome } => Some(outcome),
            _ => None,
        }
    }
}

/// What a confirmed delete produced, and where the shell should go next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmed {
    pub outcome: DeleteOutcome,
    pub navigate: Option<Route>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Book,
    Author,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Book => "book",
            Resource::Author => "author",
        }
    }
}

/// Issue the delete. Errors become a `Failed` outcome carrying banner text.
pub async fn execute(
    gateway: &dyn LibraryGateway,
    resource: Resource,
    target: &DeleteTarget,
) -> DeleteOutcome {
    let result = match resource {
        Resource::Book => gateway.delete_book(target.id).await,
        Resource::Author => gateway.delete_author(target.id).await,
    };
    record_delete(resource.as_str(), result.is_ok());

    match result {
        Ok(()) => {
            info!(resource = resource.as_str(), id = target.id, "Deleted");
            DeleteOutcome::Deleted {
                target: target.clone(),
            }
        }
        Err(e) => {
            warn!(resource = resource.as_str(), id = target.id, error = %e, "Delete failed");
            DeleteOutcome::Failed {
                target: target.clone(),
                message: e.user_message(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblioteca_common::{InMemoryGateway, Operation};

    fn dune() -> DeleteTarget {
        DeleteTarget::new(1, "Dune")
    }

    #[test]
    fn test_prompt() {
        assert_eq!(dune().prompt(), "Delete \"Dune\"?");
    }

    #[test]
    fn test_confirm_requires_pending() {
        let mut state = DeleteState::default();
        assert_eq!(state.begin(), None);
        assert_eq!(state, DeleteState::Idle);

        assert!(state.request(dune()));
        assert_eq!(state.pending(), Some(&dune()));
        assert_eq!(state.begin(), Some(dune()));
        assert!(state.is_in_flight());
        assert_eq!(state.begin(), None);
    }

    #[test]
    fn test_in_flight_refuses_request_and_cancel() {
        let mut state = DeleteState::InFlight { target: dune() };
        assert!(!state.request(DeleteTarget::new(2, "Foo")));
        assert!(!state.cancel());
        assert!(state.is_in_flight());

        state.finish(DeleteOutcome::Deleted { target: dune() });
        assert!(state.outcome().is_some_and(DeleteOutcome::is_deleted));
        assert!(state.cancel());
        assert_eq!(state, DeleteState::Idle);
    }

    #[test]
    fn test_state_serializes_tagged() {
        let state = DeleteState::ConfirmPending { target: dune() };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "confirm_pending");
        assert_eq!(json["target"]["label"], "Dune");
    }

    #[tokio::test]
    async fn test_execute_reports_failure_as_outcome() {
        let gateway = InMemoryGateway::new();

        let outcome = execute(&gateway, Resource::Book, &dune()).await;
        let DeleteOutcome::Failed { target, message } = outcome else {
            panic!("deleting a missing book must fail");
        };
        assert_eq!(target, dune());
        assert_eq!(message, "The record no longer exists on the server.");
        assert_eq!(gateway.count(Operation::DeleteBook), 1);
    }
}
