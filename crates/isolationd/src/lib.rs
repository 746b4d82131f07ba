//! isolationd - host network-isolation daemon
//!
//! Quarantines a compromised host by replacing every network
//! interface's group memberships with a single restrictive quarantine
//! group, persisting the prior memberships as tags on the host so the
//! action is reversible, and restores them on demand. Partial failure
//! across interfaces is tolerated and reported, never retried
//! silently.

mod config;
mod file_backend;
mod isolation_mgr;
mod state_store;

pub use config::{IsolationConfig, DEFAULT_OP_TIMEOUT, QUARANTINE_GROUP_ENV};
pub use file_backend::FileResourceControl;
pub use isolation_mgr::IsolationMgr;
pub use state_store::{MemoryStateStore, StateStore, TagStateStore};
