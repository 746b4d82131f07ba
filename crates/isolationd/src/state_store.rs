//! Pluggable persistence for per-host isolation records.
//!
//! The state machine does not care where records live. The production
//! implementation stores them as tags on the host resource itself (no
//! separate database); a map-backed implementation exists for local
//! use and testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

use netisol_common::{IsolationError, IsolationRecord, IsolationResult, ResourceControl};

/// Storage for the per-host [`IsolationRecord`].
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Reads the host's isolation record.
    ///
    /// Fails with `NotFound` only if the host itself does not exist;
    /// an absent or malformed record reads as `Normal` with an empty
    /// snapshot so never-quarantined hosts are handled uniformly.
    async fn read_state(&self, host_id: &str) -> IsolationResult<IsolationRecord>;

    /// Writes the host's isolation record atomically (from the
    /// caller's point of view the full record lands or none of it).
    ///
    /// `expected_episode` is the episode token observed when the
    /// operation began. If the currently persisted episode differs, a
    /// concurrent operation has written a snapshot in the meantime;
    /// the write is refused with `ConcurrentModification` rather than
    /// silently overwriting it.
    async fn write_state(
        &self,
        host_id: &str,
        record: &IsolationRecord,
        expected_episode: Option<&str>,
    ) -> IsolationResult<()>;
}

/// State store backed by tags on the host resource.
pub struct TagStateStore {
    client: Arc<dyn ResourceControl>,
}

impl TagStateStore {
    /// Creates a tag-backed store over the given resource-control client.
    pub fn new(client: Arc<dyn ResourceControl>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StateStore for TagStateStore {
    async fn read_state(&self, host_id: &str) -> IsolationResult<IsolationRecord> {
        let tags = self.client.get_tags(host_id).await?;
        if IsolationRecord::is_malformed(&tags) {
            warn!(host = host_id, "malformed isolation tags; treating as Normal");
        }
        Ok(IsolationRecord::from_tags(&tags))
    }

    async fn write_state(
        &self,
        host_id: &str,
        record: &IsolationRecord,
        expected_episode: Option<&str>,
    ) -> IsolationResult<()> {
        let current = self.read_state(host_id).await?;
        if current.episode.as_deref() != expected_episode {
            return Err(IsolationError::concurrent_modification(
                host_id,
                format!(
                    "episode changed from {:?} to {:?} while the operation was in flight",
                    expected_episode, current.episode
                ),
            ));
        }
        self.client.set_tags(host_id, record.to_tags()).await
    }
}

/// Trivial state store backed by a local key-value table.
///
/// Every host is known to this store; reading a host with no record
/// yields `Normal`.
#[derive(Default)]
pub struct MemoryStateStore {
    records: Mutex<HashMap<String, IsolationRecord>>,
}

impl MemoryStateStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn read_state(&self, host_id: &str) -> IsolationResult<IsolationRecord> {
        let records = self.records.lock().expect("state store mutex poisoned");
        Ok(records.get(host_id).cloned().unwrap_or_default())
    }

    async fn write_state(
        &self,
        host_id: &str,
        record: &IsolationRecord,
        expected_episode: Option<&str>,
    ) -> IsolationResult<()> {
        let mut records = self.records.lock().expect("state store mutex poisoned");
        let current_episode = records.get(host_id).and_then(|r| r.episode.clone());
        if current_episode.as_deref() != expected_episode {
            return Err(IsolationError::concurrent_modification(
                host_id,
                format!(
                    "episode changed from {:?} to {:?} while the operation was in flight",
                    expected_episode, current_episode
                ),
            ));
        }
        records.insert(host_id.to_string(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netisol_common::{tags, IsolationState, Snapshot};
    use netisol_test::MockResourceControl;
    use pretty_assertions::assert_eq;
    use std::collections::{BTreeMap, BTreeSet};

    fn snapshot_fixture() -> Snapshot {
        let mut snap = Snapshot::new();
        snap.insert(
            "eni-1".to_string(),
            BTreeSet::from(["sg-web".to_string(), "sg-app".to_string()]),
        );
        snap
    }

    #[tokio::test]
    async fn test_tag_store_round_trip() {
        let client = Arc::new(MockResourceControl::new().with_host("i-1"));
        let store = TagStateStore::new(client.clone());

        let record = IsolationRecord::quarantined(snapshot_fixture(), "ep-1");
        store.write_state("i-1", &record, None).await.unwrap();

        let read_back = store.read_state("i-1").await.unwrap();
        assert_eq!(read_back, record);

        let tags_on_host = client.host_tags("i-1").unwrap();
        assert_eq!(tags_on_host.get(tags::IR_STATE).unwrap(), "quarantined");
    }

    #[tokio::test]
    async fn test_tag_store_absent_record_is_normal() {
        let client = Arc::new(MockResourceControl::new().with_host("i-1"));
        let store = TagStateStore::new(client);

        let record = store.read_state("i-1").await.unwrap();
        assert_eq!(record.state, IsolationState::Normal);
        assert!(record.snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_tag_store_malformed_record_is_normal() {
        let client = Arc::new(MockResourceControl::new().with_host("i-1"));
        let mut bad = BTreeMap::new();
        bad.insert(tags::IR_STATE.to_string(), "quarantined".to_string());
        bad.insert(tags::IR_PREVIOUS_GROUPS.to_string(), "garbage".to_string());
        client.seed_tags("i-1", bad);

        let store = TagStateStore::new(client);
        let record = store.read_state("i-1").await.unwrap();
        assert_eq!(record.state, IsolationState::Normal);
    }

    #[tokio::test]
    async fn test_tag_store_missing_host_is_not_found() {
        let client = Arc::new(MockResourceControl::new());
        let store = TagStateStore::new(client);
        let err = store.read_state("i-missing").await.unwrap_err();
        assert!(matches!(err, IsolationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_tag_store_episode_conflict() {
        let client = Arc::new(MockResourceControl::new().with_host("i-1"));
        let store = TagStateStore::new(client);

        let first = IsolationRecord::quarantined(snapshot_fixture(), "ep-1");
        store.write_state("i-1", &first, None).await.unwrap();

        // A second writer that began before the first landed expects
        // no episode; the overwrite must be refused.
        let second = IsolationRecord::quarantined(snapshot_fixture(), "ep-2");
        let err = store.write_state("i-1", &second, None).await.unwrap_err();
        assert!(matches!(err, IsolationError::ConcurrentModification { .. }));

        // Expecting the live episode succeeds.
        store
            .write_state("i-1", &second, Some("ep-1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_memory_store_round_trip_and_conflict() {
        let store = MemoryStateStore::new();
        assert_eq!(
            store.read_state("i-1").await.unwrap().state,
            IsolationState::Normal
        );

        let record = IsolationRecord::quarantined(snapshot_fixture(), "ep-1");
        store.write_state("i-1", &record, None).await.unwrap();
        assert_eq!(store.read_state("i-1").await.unwrap(), record);

        let err = store
            .write_state("i-1", &IsolationRecord::restored(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, IsolationError::ConcurrentModification { .. }));

        store
            .write_state("i-1", &IsolationRecord::restored(), Some("ep-1"))
            .await
            .unwrap();
        assert!(!store.read_state("i-1").await.unwrap().restorable());
    }
}
