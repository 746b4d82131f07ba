//! Test infrastructure for the netisol isolation daemons
//!
//! Provides:
//! - A scriptable in-memory `ResourceControl` mock with per-interface
//!   failure injection
//! - Reusable host fixtures for quarantine/restore scenarios

pub mod fixtures;
pub mod mock;

pub use fixtures::*;
pub use mock::MockResourceControl;
