//! Provider-neutral resource-control interface.
//!
//! The isolation controller never talks to a vendor API directly; it
//! operates on this trait. A backend must be able to enumerate a
//! host's network interfaces, replace an interface's group
//! memberships, and read/write opaque key-value tags on the host
//! resource (the storage medium for the isolation record).

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::IsolationResult;
use crate::types::NetworkInterface;

/// Abstract control over hosts, their interfaces and their tags.
///
/// Implementations must be `Send + Sync`; the daemon shares one client
/// across operations on independent hosts.
#[async_trait]
pub trait ResourceControl: Send + Sync {
    /// Enumerates the host's network interfaces with their live group
    /// memberships.
    ///
    /// Fails with `NotFound` if the host does not exist, `Backend` on
    /// transient API failure.
    async fn list_interfaces(&self, host_id: &str) -> IsolationResult<Vec<NetworkInterface>>;

    /// Replaces an interface's group memberships with exactly `groups`.
    ///
    /// Fails with `NotFound` if the interface no longer exists,
    /// `Backend` on transient API failure.
    async fn set_interface_groups(
        &self,
        interface_id: &str,
        groups: &BTreeSet<String>,
    ) -> IsolationResult<()>;

    /// Reads all tags on the host resource.
    async fn get_tags(&self, host_id: &str) -> IsolationResult<BTreeMap<String, String>>;

    /// Writes the given tags on the host resource. Keys not present in
    /// `tags` are left untouched; all keys in `tags` land in one call.
    async fn set_tags(
        &self,
        host_id: &str,
        tags: BTreeMap<String, String>,
    ) -> IsolationResult<()>;
}
