//! In-memory mock of the resource-control backend.
//!
//! Holds a small inventory of hosts, interfaces and tags behind a
//! mutex, records every membership replacement, and supports scripted
//! per-interface failure injection (always-fail and fail-once) so
//! partial-failure paths can be exercised deterministically.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use netisol_common::{IsolationError, IsolationResult, NetworkInterface, ResourceControl};

#[derive(Debug, Default, Clone)]
struct MockHost {
    interfaces: BTreeMap<String, BTreeSet<String>>,
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct MockState {
    hosts: BTreeMap<String, MockHost>,
    /// interface -> failure reason, applied to every set_interface_groups
    fail_always: BTreeMap<String, String>,
    /// interface -> failure reason, consumed by the next set_interface_groups
    fail_once: BTreeMap<String, String>,
    /// Fail the next set_tags call with this reason
    fail_next_set_tags: Option<String>,
    /// Tags injected onto a host when the next set_interface_groups
    /// call runs, simulating an out-of-band writer racing the caller
    inject_tags_on_set_groups: Option<(String, BTreeMap<String, String>)>,
    /// Every successful set_interface_groups call, in order
    set_groups_calls: Vec<(String, BTreeSet<String>)>,
}

/// Scriptable `ResourceControl` implementation for tests.
#[derive(Debug, Default)]
pub struct MockResourceControl {
    state: Mutex<MockState>,
}

impl MockResourceControl {
    /// Creates an empty mock with no hosts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a host (no interfaces, no tags).
    pub fn with_host(self, host_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .hosts
            .insert(host_id.to_string(), MockHost::default());
        self
    }

    /// Adds an interface with initial group memberships to a host.
    /// The host is created if absent.
    pub fn with_interface<I, S>(self, host_id: &str, interface_id: &str, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut state = self.state.lock().unwrap();
            state
                .hosts
                .entry(host_id.to_string())
                .or_default()
                .interfaces
                .insert(
                    interface_id.to_string(),
                    groups.into_iter().map(Into::into).collect(),
                );
        }
        self
    }

    /// Makes every membership replacement on `interface_id` fail.
    pub fn fail_set_groups(&self, interface_id: &str, reason: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_always
            .insert(interface_id.to_string(), reason.to_string());
    }

    /// Makes only the next membership replacement on `interface_id` fail.
    pub fn fail_set_groups_once(&self, interface_id: &str, reason: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_once
            .insert(interface_id.to_string(), reason.to_string());
    }

    /// Stops injecting failures for `interface_id`.
    pub fn clear_failure(&self, interface_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.fail_always.remove(interface_id);
        state.fail_once.remove(interface_id);
    }

    /// Makes the next `set_tags` call fail.
    pub fn fail_next_set_tags(&self, reason: &str) {
        self.state.lock().unwrap().fail_next_set_tags = Some(reason.to_string());
    }

    /// Schedules tags to be written onto `host_id` when the next
    /// `set_interface_groups` call runs, simulating a concurrent
    /// writer racing an in-flight operation.
    pub fn inject_tags_on_next_set_groups(&self, host_id: &str, tags: BTreeMap<String, String>) {
        self.state.lock().unwrap().inject_tags_on_set_groups =
            Some((host_id.to_string(), tags));
    }

    /// Returns the live memberships of an interface, if it exists.
    pub fn interface_groups(&self, host_id: &str, interface_id: &str) -> Option<BTreeSet<String>> {
        self.state
            .lock()
            .unwrap()
            .hosts
            .get(host_id)?
            .interfaces
            .get(interface_id)
            .cloned()
    }

    /// Returns the host's current tags.
    pub fn host_tags(&self, host_id: &str) -> Option<BTreeMap<String, String>> {
        self.state
            .lock()
            .unwrap()
            .hosts
            .get(host_id)
            .map(|h| h.tags.clone())
    }

    /// Merges tags onto the host directly, bypassing `set_tags`
    /// failure injection (simulating out-of-band writes). Existing
    /// keys not named in `tags` are left in place.
    pub fn seed_tags(&self, host_id: &str, tags: BTreeMap<String, String>) {
        if let Some(host) = self.state.lock().unwrap().hosts.get_mut(host_id) {
            host.tags.extend(tags);
        }
    }

    /// Removes an interface (simulating deletion between quarantine
    /// and restore).
    pub fn remove_interface(&self, host_id: &str, interface_id: &str) {
        if let Some(host) = self.state.lock().unwrap().hosts.get_mut(host_id) {
            host.interfaces.remove(interface_id);
        }
    }

    /// Returns the successful membership replacements, in call order.
    pub fn set_groups_calls(&self) -> Vec<(String, BTreeSet<String>)> {
        self.state.lock().unwrap().set_groups_calls.clone()
    }
}

#[async_trait]
impl ResourceControl for MockResourceControl {
    async fn list_interfaces(&self, host_id: &str) -> IsolationResult<Vec<NetworkInterface>> {
        let state = self.state.lock().unwrap();
        let host = state
            .hosts
            .get(host_id)
            .ok_or_else(|| IsolationError::host_not_found(host_id))?;
        Ok(host
            .interfaces
            .iter()
            .map(|(id, groups)| NetworkInterface {
                id: id.clone(),
                groups: groups.clone(),
            })
            .collect())
    }

    async fn set_interface_groups(
        &self,
        interface_id: &str,
        groups: &BTreeSet<String>,
    ) -> IsolationResult<()> {
        let mut state = self.state.lock().unwrap();

        if let Some((host_id, tags)) = state.inject_tags_on_set_groups.take() {
            if let Some(host) = state.hosts.get_mut(&host_id) {
                host.tags.extend(tags);
            }
        }

        if let Some(reason) = state.fail_once.remove(interface_id) {
            return Err(IsolationError::backend("set_interface_groups", reason));
        }
        if let Some(reason) = state.fail_always.get(interface_id).cloned() {
            return Err(IsolationError::backend("set_interface_groups", reason));
        }

        match state
            .hosts
            .values_mut()
            .find_map(|h| h.interfaces.get_mut(interface_id))
        {
            Some(current) => *current = groups.clone(),
            None => return Err(IsolationError::interface_not_found(interface_id)),
        }
        state
            .set_groups_calls
            .push((interface_id.to_string(), groups.clone()));
        Ok(())
    }

    async fn get_tags(&self, host_id: &str) -> IsolationResult<BTreeMap<String, String>> {
        let state = self.state.lock().unwrap();
        state
            .hosts
            .get(host_id)
            .map(|h| h.tags.clone())
            .ok_or_else(|| IsolationError::host_not_found(host_id))
    }

    async fn set_tags(
        &self,
        host_id: &str,
        tags: BTreeMap<String, String>,
    ) -> IsolationResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.fail_next_set_tags.take() {
            return Err(IsolationError::backend("set_tags", reason));
        }
        let host = state
            .hosts
            .get_mut(host_id)
            .ok_or_else(|| IsolationError::host_not_found(host_id))?;
        host.tags.extend(tags);
        Ok(())
    }
}
