//! Shared infrastructure for the netisol host-isolation daemons.
//!
//! This crate provides the pieces every isolation component depends on:
//!
//! - [`error`]: the isolation error taxonomy
//! - [`types`]: host/interface data model
//! - [`record`]: the persisted [`IsolationRecord`] and its tag codec
//! - [`resource`]: the provider-neutral [`ResourceControl`] trait
//! - [`outcome`]: structured per-interface operation results
//!
//! # Architecture
//!
//! The isolation controller quarantines a host by replacing each of
//! its network interfaces' group memberships with a single restrictive
//! quarantine group, recording the prior memberships as tags on the
//! host resource so the action is reversible. No vendor API shape is
//! assumed here: backends implement [`ResourceControl`] and everything
//! above it is provider-neutral.

pub mod error;
pub mod outcome;
pub mod record;
pub mod resource;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{IsolationError, IsolationResult};
pub use outcome::{InterfaceOutcome, OperationResult, OutcomeStatus};
pub use record::{tags, IsolationRecord, IsolationState, Snapshot};
pub use resource::ResourceControl;
pub use types::NetworkInterface;
