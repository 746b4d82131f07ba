//! Persisted isolation state for a host.
//!
//! The `IsolationRecord` is stored as opaque tags on the host resource
//! itself; there is no separate database. The tag layout is the wire
//! contract between daemon runs:
//!
//! - `IR_State` — `"quarantined"` or `"restored"`
//! - `IR_PreviousGroups` — JSON object mapping interface ID to an
//!   array of group IDs
//! - `IR_Episode` — UUID identifying the quarantine episode that wrote
//!   the snapshot
//!
//! Absence of all keys is equivalent to the `Normal` state.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// Tag keys used to persist the isolation record.
pub mod tags {
    /// State tag key.
    pub const IR_STATE: &str = "IR_State";

    /// Pre-isolation membership snapshot tag key.
    pub const IR_PREVIOUS_GROUPS: &str = "IR_PreviousGroups";

    /// Quarantine episode token tag key.
    pub const IR_EPISODE: &str = "IR_Episode";
}

/// Pre-isolation membership snapshot: interface ID -> group IDs.
pub type Snapshot = BTreeMap<String, BTreeSet<String>>;

/// Isolation state of a host.
///
/// `Normal` and `Restored` are both safe to quarantine; the cycle
/// `Normal -> Quarantined -> Restored -> Quarantined -> ...` repeats
/// across incident episodes with no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationState {
    /// Host was never quarantined (or its record is absent/unreadable).
    Normal,
    /// Host is isolated; a snapshot of prior memberships is recorded.
    Quarantined,
    /// A restore was attempted; the host is safe to quarantine again.
    Restored,
}

impl IsolationState {
    /// Returns the state name as persisted in the `IR_State` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            IsolationState::Normal => "normal",
            IsolationState::Quarantined => "quarantined",
            IsolationState::Restored => "restored",
        }
    }

    /// Returns true if a new quarantine may begin from this state.
    pub fn safe_to_quarantine(&self) -> bool {
        matches!(self, IsolationState::Normal | IsolationState::Restored)
    }
}

impl FromStr for IsolationState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quarantined" => Ok(IsolationState::Quarantined),
            "restored" => Ok(IsolationState::Restored),
            "normal" => Ok(IsolationState::Normal),
            _ => Err(()),
        }
    }
}

/// The persisted isolation record for a single host.
///
/// At most one record exists per host at a time; it is the sole source
/// of truth for "what groups were here before". Invariant: `snapshot`
/// is non-empty if and only if `state` is `Quarantined`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolationRecord {
    /// Current isolation state.
    pub state: IsolationState,
    /// Pre-isolation memberships captured at quarantine time.
    pub snapshot: Snapshot,
    /// Episode token of the quarantine that wrote the snapshot.
    /// `None` when state is `Normal` or after a restore.
    pub episode: Option<String>,
}

impl IsolationRecord {
    /// The record for a host that was never quarantined.
    pub fn normal() -> Self {
        Self {
            state: IsolationState::Normal,
            snapshot: Snapshot::new(),
            episode: None,
        }
    }

    /// A freshly quarantined record.
    pub fn quarantined(snapshot: Snapshot, episode: impl Into<String>) -> Self {
        Self {
            state: IsolationState::Quarantined,
            snapshot,
            episode: Some(episode.into()),
        }
    }

    /// The record written after a restore attempt. The snapshot is
    /// cleared: it has been consumed and must not be restored twice.
    pub fn restored() -> Self {
        Self {
            state: IsolationState::Restored,
            snapshot: Snapshot::new(),
            episode: None,
        }
    }

    /// Returns true if a restore may proceed from this record.
    pub fn restorable(&self) -> bool {
        self.state == IsolationState::Quarantined && !self.snapshot.is_empty()
    }

    /// Decodes a record from a host's tag map.
    ///
    /// Absent or malformed tags decode to `Normal` with an empty
    /// snapshot; hosts that were never quarantined are handled
    /// uniformly and a corrupt record is never a hard failure. The
    /// caller is expected to log when `is_malformed` reports corruption.
    pub fn from_tags(tags: &BTreeMap<String, String>) -> Self {
        let state = tags
            .get(tags::IR_STATE)
            .and_then(|v| v.parse::<IsolationState>().ok());

        let snapshot: Option<Snapshot> = tags
            .get(tags::IR_PREVIOUS_GROUPS)
            .and_then(|v| serde_json::from_str(v).ok());

        match (state, snapshot) {
            (Some(IsolationState::Quarantined), Some(snapshot)) if !snapshot.is_empty() => {
                IsolationRecord {
                    state: IsolationState::Quarantined,
                    snapshot,
                    episode: tags.get(tags::IR_EPISODE).cloned(),
                }
            }
            (Some(IsolationState::Restored), _) => IsolationRecord::restored(),
            // Quarantined without a readable snapshot is corrupt; treat
            // as Normal so the host can be re-quarantined cleanly.
            _ => IsolationRecord::normal(),
        }
    }

    /// Returns true if the tag map carries isolation keys that do not
    /// decode to a coherent record.
    pub fn is_malformed(tags: &BTreeMap<String, String>) -> bool {
        if !tags.contains_key(tags::IR_STATE) && !tags.contains_key(tags::IR_PREVIOUS_GROUPS) {
            return false;
        }
        let decoded = Self::from_tags(tags);
        if decoded.state != IsolationState::Normal {
            return false;
        }
        // Keys present but decoded to Normal: corrupt.
        true
    }

    /// Encodes the record into its tag representation.
    ///
    /// The whole record always lands in one map so a single `set_tags`
    /// call persists it atomically: state, snapshot and episode
    /// together. A cleared snapshot is written as `{}` rather than
    /// left out, overwriting any stale value from a prior episode.
    pub fn to_tags(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert(tags::IR_STATE.to_string(), self.state.as_str().to_string());
        map.insert(
            tags::IR_PREVIOUS_GROUPS.to_string(),
            serde_json::to_string(&self.snapshot).unwrap_or_else(|_| "{}".to_string()),
        );
        map.insert(
            tags::IR_EPISODE.to_string(),
            self.episode.clone().unwrap_or_default(),
        );
        map
    }
}

impl Default for IsolationRecord {
    fn default() -> Self {
        Self::normal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot_fixture() -> Snapshot {
        let mut snap = Snapshot::new();
        snap.insert(
            "eni-1".to_string(),
            ["sg-web", "sg-app"].iter().map(|s| s.to_string()).collect(),
        );
        snap.insert(
            "eni-2".to_string(),
            ["sg-db"].iter().map(|s| s.to_string()).collect(),
        );
        snap
    }

    #[test]
    fn test_state_round_trip() {
        assert_eq!(
            "quarantined".parse::<IsolationState>(),
            Ok(IsolationState::Quarantined)
        );
        assert_eq!(
            "restored".parse::<IsolationState>(),
            Ok(IsolationState::Restored)
        );
        assert!("bogus".parse::<IsolationState>().is_err());
        assert_eq!(IsolationState::Quarantined.as_str(), "quarantined");
    }

    #[test]
    fn test_safe_to_quarantine() {
        assert!(IsolationState::Normal.safe_to_quarantine());
        assert!(IsolationState::Restored.safe_to_quarantine());
        assert!(!IsolationState::Quarantined.safe_to_quarantine());
    }

    #[test]
    fn test_tag_round_trip() {
        let record = IsolationRecord::quarantined(snapshot_fixture(), "ep-1234");
        let tags = record.to_tags();

        assert_eq!(tags.get(tags::IR_STATE).unwrap(), "quarantined");
        assert_eq!(tags.get(tags::IR_EPISODE).unwrap(), "ep-1234");

        let decoded = IsolationRecord::from_tags(&tags);
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_absent_tags_decode_to_normal() {
        let decoded = IsolationRecord::from_tags(&BTreeMap::new());
        assert_eq!(decoded, IsolationRecord::normal());
        assert!(!IsolationRecord::is_malformed(&BTreeMap::new()));
    }

    #[test]
    fn test_malformed_snapshot_decodes_to_normal() {
        let mut tags_map = BTreeMap::new();
        tags_map.insert(tags::IR_STATE.to_string(), "quarantined".to_string());
        tags_map.insert(tags::IR_PREVIOUS_GROUPS.to_string(), "not json".to_string());

        let decoded = IsolationRecord::from_tags(&tags_map);
        assert_eq!(decoded.state, IsolationState::Normal);
        assert!(decoded.snapshot.is_empty());
        assert!(IsolationRecord::is_malformed(&tags_map));
    }

    #[test]
    fn test_quarantined_with_empty_snapshot_is_corrupt() {
        let mut tags_map = BTreeMap::new();
        tags_map.insert(tags::IR_STATE.to_string(), "quarantined".to_string());
        tags_map.insert(tags::IR_PREVIOUS_GROUPS.to_string(), "{}".to_string());

        let decoded = IsolationRecord::from_tags(&tags_map);
        assert_eq!(decoded.state, IsolationState::Normal);
        assert!(IsolationRecord::is_malformed(&tags_map));
    }

    #[test]
    fn test_restored_record_clears_snapshot() {
        let record = IsolationRecord::quarantined(snapshot_fixture(), "ep-1");
        let tags_map = record.to_tags();
        let mut after = tags_map.clone();
        after.extend(IsolationRecord::restored().to_tags());

        let decoded = IsolationRecord::from_tags(&after);
        assert_eq!(decoded.state, IsolationState::Restored);
        assert!(decoded.snapshot.is_empty());
        assert!(!decoded.restorable());
    }

    #[test]
    fn test_restorable() {
        assert!(IsolationRecord::quarantined(snapshot_fixture(), "ep-1").restorable());
        assert!(!IsolationRecord::normal().restorable());
        assert!(!IsolationRecord::restored().restorable());
    }
}
