//! Structured per-interface operation results.
//!
//! Quarantine and restore never abort on a single interface failure;
//! they report, per interface, whether the membership replacement was
//! applied or why it failed. The caller is responsible for alerting on
//! `Failed` entries and re-driving the operation.

use serde::{Deserialize, Serialize};

use crate::record::IsolationState;

/// Outcome of one interface membership replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// Memberships were replaced.
    Applied,
    /// Replacement failed; the interface keeps whatever memberships it
    /// had when the call failed.
    Failed {
        /// Human-readable failure reason.
        reason: String,
    },
}

/// Result entry for a single interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceOutcome {
    /// Interface identifier.
    pub interface_id: String,
    /// Applied or failed.
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl InterfaceOutcome {
    /// Creates an applied outcome.
    pub fn applied(interface_id: impl Into<String>) -> Self {
        Self {
            interface_id: interface_id.into(),
            status: OutcomeStatus::Applied,
        }
    }

    /// Creates a failed outcome.
    pub fn failed(interface_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            interface_id: interface_id.into(),
            status: OutcomeStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    /// Returns true if the replacement was applied.
    pub fn is_applied(&self) -> bool {
        self.status == OutcomeStatus::Applied
    }
}

/// Structured result of a quarantine or restore operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// The host operated on.
    pub host_id: String,
    /// The state persisted by this operation.
    pub state: IsolationState,
    /// Per-interface outcomes, in stable interface-ID order.
    pub interfaces: Vec<InterfaceOutcome>,
}

impl OperationResult {
    /// Builds a result, sorting outcomes by interface ID so
    /// aggregation is deterministic regardless of mutation order.
    pub fn new(
        host_id: impl Into<String>,
        state: IsolationState,
        mut interfaces: Vec<InterfaceOutcome>,
    ) -> Self {
        interfaces.sort_by(|a, b| a.interface_id.cmp(&b.interface_id));
        Self {
            host_id: host_id.into(),
            state,
            interfaces,
        }
    }

    /// Returns true if every interface outcome is `Applied`.
    pub fn is_fully_applied(&self) -> bool {
        self.interfaces.iter().all(InterfaceOutcome::is_applied)
    }

    /// Iterates over the failed outcomes.
    pub fn failed(&self) -> impl Iterator<Item = &InterfaceOutcome> {
        self.interfaces.iter().filter(|o| !o.is_applied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_result_sorted_by_interface_id() {
        let result = OperationResult::new(
            "i-0abc",
            IsolationState::Quarantined,
            vec![
                InterfaceOutcome::failed("eni-2", "timeout"),
                InterfaceOutcome::applied("eni-1"),
            ],
        );

        let ids: Vec<_> = result
            .interfaces
            .iter()
            .map(|o| o.interface_id.as_str())
            .collect();
        assert_eq!(ids, vec!["eni-1", "eni-2"]);
    }

    #[test]
    fn test_fully_applied_and_failed() {
        let partial = OperationResult::new(
            "i-0abc",
            IsolationState::Quarantined,
            vec![
                InterfaceOutcome::applied("eni-1"),
                InterfaceOutcome::failed("eni-2", "timeout"),
            ],
        );
        assert!(!partial.is_fully_applied());
        assert_eq!(partial.failed().count(), 1);

        let full = OperationResult::new(
            "i-0abc",
            IsolationState::Restored,
            vec![InterfaceOutcome::applied("eni-1")],
        );
        assert!(full.is_fully_applied());
        assert_eq!(full.failed().count(), 0);
    }

    #[test]
    fn test_outcome_json_shape() {
        let outcome = InterfaceOutcome::failed("eni-2", "timeout");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["interface_id"], "eni-2");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "timeout");

        let applied = InterfaceOutcome::applied("eni-1");
        let json = serde_json::to_value(&applied).unwrap();
        assert_eq!(json["status"], "applied");
    }
}
