//! File-backed resource-control implementation.
//!
//! Operates on a JSON host inventory and persists every mutation back
//! to the file, giving the CLI a working provider-neutral backend.
//! Cloud-vendor clients implement [`ResourceControl`] out of tree and
//! slot into the same controller.
//!
//! Inventory layout:
//!
//! ```json
//! {
//!   "hosts": {
//!     "i-0abc": {
//!       "interfaces": { "eni-1": ["sg-web", "sg-app"] },
//!       "tags": {}
//!     }
//!   }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use netisol_common::{IsolationError, IsolationResult, NetworkInterface, ResourceControl};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HostEntry {
    #[serde(default)]
    interfaces: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Inventory {
    hosts: BTreeMap<String, HostEntry>,
}

/// `ResourceControl` over a JSON inventory file.
#[derive(Debug)]
pub struct FileResourceControl {
    path: PathBuf,
    inventory: Mutex<Inventory>,
}

impl FileResourceControl {
    /// Opens an inventory file.
    pub async fn open(path: impl AsRef<Path>) -> IsolationResult<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            IsolationError::backend("open_inventory", format!("{}: {}", path.display(), e))
        })?;
        let inventory: Inventory = serde_json::from_str(&raw).map_err(|e| {
            IsolationError::backend("parse_inventory", format!("{}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), hosts = inventory.hosts.len(), "inventory loaded");
        Ok(Self {
            path,
            inventory: Mutex::new(inventory),
        })
    }

    async fn persist(&self, inventory: &Inventory) -> IsolationResult<()> {
        let raw = serde_json::to_string_pretty(inventory)
            .map_err(|e| IsolationError::backend("encode_inventory", e.to_string()))?;
        tokio::fs::write(&self.path, raw).await.map_err(|e| {
            IsolationError::backend("write_inventory", format!("{}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl ResourceControl for FileResourceControl {
    async fn list_interfaces(&self, host_id: &str) -> IsolationResult<Vec<NetworkInterface>> {
        let inventory = self.inventory.lock().await;
        let host = inventory
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
        let mut inventory = self.inventory.lock().await;
        let entry = inventory
            .hosts
            .values_mut()
            .find_map(|h| h.interfaces.get_mut(interface_id))
            .ok_or_else(|| IsolationError::interface_not_found(interface_id))?;
        *entry = groups.clone();
        let snapshot = inventory.clone();
        self.persist(&snapshot).await
    }

    async fn get_tags(&self, host_id: &str) -> IsolationResult<BTreeMap<String, String>> {
        let inventory = self.inventory.lock().await;
        inventory
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
        let mut inventory = self.inventory.lock().await;
        let host = inventory
            .hosts
            .get_mut(host_id)
            .ok_or_else(|| IsolationError::host_not_found(host_id))?;
        host.tags.extend(tags);
        let snapshot = inventory.clone();
        self.persist(&snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn inventory_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const SAMPLE: &str = r#"{
        "hosts": {
            "i-1": {
                "interfaces": { "eni-1": ["sg-web", "sg-app"], "eni-2": ["sg-db"] },
                "tags": {}
            }
        }
    }"#;

    #[tokio::test]
    async fn test_list_interfaces() {
        let file = inventory_file(SAMPLE);
        let backend = FileResourceControl::open(file.path()).await.unwrap();

        let mut enis = backend.list_interfaces("i-1").await.unwrap();
        enis.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(enis.len(), 2);
        assert_eq!(enis[0].id, "eni-1");
        assert!(enis[0].groups.contains("sg-web"));
    }

    #[tokio::test]
    async fn test_mutations_persist_across_reopen() {
        let file = inventory_file(SAMPLE);

        {
            let backend = FileResourceControl::open(file.path()).await.unwrap();
            let groups: BTreeSet<String> = ["sg-quarantine".to_string()].into_iter().collect();
            backend.set_interface_groups("eni-1", &groups).await.unwrap();

            let mut tags = BTreeMap::new();
            tags.insert("IR_State".to_string(), "quarantined".to_string());
            backend.set_tags("i-1", tags).await.unwrap();
        }

        let reopened = FileResourceControl::open(file.path()).await.unwrap();
        let enis = reopened.list_interfaces("i-1").await.unwrap();
        let eni1 = enis.iter().find(|e| e.id == "eni-1").unwrap();
        assert_eq!(eni1.groups.len(), 1);
        assert!(eni1.groups.contains("sg-quarantine"));

        let tags = reopened.get_tags("i-1").await.unwrap();
        assert_eq!(tags.get("IR_State").unwrap(), "quarantined");
    }

    #[tokio::test]
    async fn test_unknown_host_and_interface() {
        let file = inventory_file(SAMPLE);
        let backend = FileResourceControl::open(file.path()).await.unwrap();

        assert!(matches!(
            backend.list_interfaces("i-missing").await.unwrap_err(),
            IsolationError::NotFound { .. }
        ));

        let groups = BTreeSet::new();
        assert!(matches!(
            backend
                .set_interface_groups("eni-missing", &groups)
                .await
                .unwrap_err(),
            IsolationError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_malformed_inventory_is_backend_error() {
        let file = inventory_file("not json");
        let err = FileResourceControl::open(file.path()).await.unwrap_err();
        assert!(matches!(err, IsolationError::Backend { .. }));
    }
}
