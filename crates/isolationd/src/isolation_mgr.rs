//! IsolationMgr - the quarantine/restore state machine.
//!
//! Operation flow:
//! 1. Quarantine: enumerate live interfaces, capture the membership
//!    snapshot, persist it, then move every interface into the
//!    quarantine group.
//! 2. Restore: replay the persisted snapshot onto the interfaces and
//!    mark the record restored.
//!
//! Per-interface mutations are independent: a failure is recorded in
//! the structured result and the batch continues. Partial isolation is
//! strictly better than none during incident response, and a clearly
//! reported partial result can be re-driven by the operator. The
//! controller never retries automatically.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use netisol_common::{
    InterfaceOutcome, IsolationError, IsolationRecord, IsolationResult, IsolationState,
    OperationResult, ResourceControl, Snapshot,
};

use crate::config::IsolationConfig;
use crate::state_store::StateStore;

/// Orchestrates host quarantine and restore.
pub struct IsolationMgr {
    client: Arc<dyn ResourceControl>,
    store: Box<dyn StateStore>,
    config: IsolationConfig,
}

impl IsolationMgr {
    /// Creates a controller over the given client and state store.
    pub fn new(
        client: Arc<dyn ResourceControl>,
        store: Box<dyn StateStore>,
        config: IsolationConfig,
    ) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    /// Runs a resource-control call under the configured per-call
    /// timeout. A timed-out call surfaces as a `Backend` failure, not
    /// a crash.
    async fn bounded<T, F>(&self, operation: &str, fut: F) -> IsolationResult<T>
    where
        F: Future<Output = IsolationResult<T>>,
    {
        match tokio::time::timeout(self.config.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(IsolationError::backend(
                operation,
                format!("timed out after {:?}", self.config.op_timeout),
            )),
        }
    }

    /// Replaces one interface's memberships, folding any error into a
    /// per-interface outcome.
    async fn replace_groups(
        &self,
        interface_id: &str,
        groups: &BTreeSet<String>,
    ) -> InterfaceOutcome {
        let call = self.client.set_interface_groups(interface_id, groups);
        match self.bounded("set_interface_groups", call).await {
            Ok(()) => {
                info!(interface = interface_id, "replaced group memberships");
                InterfaceOutcome::applied(interface_id)
            }
            Err(e) => {
                warn!(interface = interface_id, error = %e, "membership replacement failed");
                InterfaceOutcome::failed(interface_id, e.to_string())
            }
        }
    }

    /// Quarantines a host: every interface is moved into the
    /// configured quarantine group, with prior memberships recorded
    /// first so the action is reversible.
    ///
    /// Legal from any state. A quarantine while already `Quarantined`
    /// overwrites the snapshot with the live memberships observed now.
    #[instrument(skip(self))]
    pub async fn quarantine(&self, host_id: &str) -> IsolationResult<OperationResult> {
        // Configuration precondition, checked before any call is made.
        let quarantine_group = self.config.quarantine_group()?.to_string();

        // State-store traffic goes to the same backend as interface
        // mutations, so it gets the same per-call bound.
        let prior = self
            .bounded("read_state", self.store.read_state(host_id))
            .await?;
        if !prior.state.safe_to_quarantine() {
            warn!(
                host = host_id,
                "host already quarantined; snapshot will be overwritten with live memberships"
            );
        }

        let interfaces = self
            .bounded("list_interfaces", self.client.list_interfaces(host_id))
            .await?;
        if interfaces.is_empty() {
            return Err(IsolationError::NotFound {
                resource: "network interfaces for host".to_string(),
                id: host_id.to_string(),
            });
        }

        // Full snapshot before any mutation.
        let snapshot: Snapshot = interfaces
            .into_iter()
            .map(|eni| (eni.id, eni.groups))
            .collect();

        // Persist the snapshot before fanning out mutations: once the
        // record is durable, a cancelled or crashed operation leaves a
        // recoverable host. The episode guard refuses to overwrite a
        // snapshot written by another in-flight operation.
        let episode = Uuid::new_v4().to_string();
        let record = IsolationRecord::quarantined(snapshot.clone(), &episode);
        self.bounded(
            "write_state",
            self.store
                .write_state(host_id, &record, prior.episode.as_deref()),
        )
        .await?;
        info!(
            host = host_id,
            episode = %episode,
            interfaces = snapshot.len(),
            "snapshot persisted, isolating interfaces"
        );

        let quarantine_groups: BTreeSet<String> = BTreeSet::from([quarantine_group]);

        let mut outcomes = Vec::with_capacity(snapshot.len());
        for interface_id in snapshot.keys() {
            outcomes.push(self.replace_groups(interface_id, &quarantine_groups).await);
        }

        let result = OperationResult::new(host_id, IsolationState::Quarantined, outcomes);
        if result.is_fully_applied() {
            info!(host = host_id, "host quarantined");
        } else {
            warn!(
                host = host_id,
                failed = result.failed().count(),
                "host partially quarantined; re-drive to isolate remaining interfaces"
            );
        }
        Ok(result)
    }

    /// Restores a host's interfaces to their pre-quarantine
    /// memberships from the recorded snapshot.
    ///
    /// Refused with `NoPriorState` unless the host is `Quarantined`
    /// with a non-empty snapshot; restore never defaults to
    /// "open all groups". The record is marked `Restored` even when
    /// some interfaces failed to revert, so it reflects that a restore
    /// was attempted; the result lists what actually reverted.
    #[instrument(skip(self))]
    pub async fn restore(&self, host_id: &str) -> IsolationResult<OperationResult> {
        let record = self
            .bounded("read_state", self.store.read_state(host_id))
            .await?;
        if !record.restorable() {
            return Err(IsolationError::no_prior_state(host_id));
        }

        let mut outcomes = Vec::with_capacity(record.snapshot.len());
        for (interface_id, groups) in &record.snapshot {
            // An interface removed since quarantine folds into the
            // result as a per-interface failure.
            outcomes.push(self.replace_groups(interface_id, groups).await);
        }

        self.bounded(
            "write_state",
            self.store
                .write_state(host_id, &IsolationRecord::restored(), record.episode.as_deref()),
        )
        .await?;

        let result = OperationResult::new(host_id, IsolationState::Restored, outcomes);
        if result.is_fully_applied() {
            info!(host = host_id, "host restored to pre-quarantine memberships");
        } else {
            warn!(
                host = host_id,
                failed = result.failed().count(),
                "restore attempted with per-interface failures"
            );
        }
        Ok(result)
    }
}
