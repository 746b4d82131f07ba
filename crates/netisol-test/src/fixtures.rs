//! Reusable host fixtures for isolation testing.

use crate::mock::MockResourceControl;

/// Host ID used by the standard fixtures.
pub const FIXTURE_HOST: &str = "i-0incident";

/// Quarantine group used by the standard fixtures.
pub const FIXTURE_QUARANTINE_GROUP: &str = "sg-quarantine";

/// A two-interface host: `eni-1` in `{sg-web, sg-app}`, `eni-2` in
/// `{sg-db}`. The canonical quarantine/restore scenario.
pub fn two_interface_host() -> MockResourceControl {
    MockResourceControl::new()
        .with_interface(FIXTURE_HOST, "eni-1", ["sg-web", "sg-app"])
        .with_interface(FIXTURE_HOST, "eni-2", ["sg-db"])
}

/// A single-interface host with one permissive group.
pub fn single_interface_host(host_id: &str) -> MockResourceControl {
    MockResourceControl::new().with_interface(host_id, "eni-1", ["sg-open"])
}

/// A host that exists but has no interfaces attached.
pub fn bare_host(host_id: &str) -> MockResourceControl {
    MockResourceControl::new().with_host(host_id)
}
