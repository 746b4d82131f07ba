//! Core type definitions for the isolation subsystem.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A network interface attached to a host, together with its current
/// group memberships.
///
/// Interfaces are always enumerated fresh from the resource-control
/// backend; memberships may change between calls and are never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    /// Interface identifier (opaque, e.g. "eni-0abc").
    pub id: String,
    /// Current group memberships. Ordered set so result aggregation
    /// and serialization stay deterministic.
    pub groups: BTreeSet<String>,
}

impl NetworkInterface {
    /// Creates a new interface description.
    pub fn new<I, S>(id: impl Into<String>, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_new() {
        let eni = NetworkInterface::new("eni-1", ["sg-web", "sg-app"]);
        assert_eq!(eni.id, "eni-1");
        assert!(eni.groups.contains("sg-web"));
        assert!(eni.groups.contains("sg-app"));
        assert_eq!(eni.groups.len(), 2);
    }

    #[test]
    fn test_interface_groups_deduplicated() {
        let eni = NetworkInterface::new("eni-1", ["sg-a", "sg-a"]);
        assert_eq!(eni.groups.len(), 1);
    }
}
