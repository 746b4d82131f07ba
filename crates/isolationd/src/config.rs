//! Daemon configuration.

use std::time::Duration;

use netisol_common::{IsolationError, IsolationResult};

/// Environment variable naming the quarantine group.
pub const QUARANTINE_GROUP_ENV: &str = "QUARANTINE_GROUP_ID";

/// Default per-call timeout for resource-control operations.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the isolation controller.
#[derive(Debug, Clone)]
pub struct IsolationConfig {
    /// The restrictive group every interface is moved into on
    /// quarantine. Only required for quarantine; its absence there is
    /// a fatal configuration error raised before any call is made.
    quarantine_group: Option<String>,
    /// Upper bound on each individual resource-control call.
    pub op_timeout: Duration,
}

impl IsolationConfig {
    /// Creates a validated configuration.
    pub fn new(
        quarantine_group: Option<String>,
        op_timeout: Duration,
    ) -> IsolationResult<Self> {
        if let Some(group) = &quarantine_group {
            if group.trim().is_empty() {
                return Err(IsolationError::config(
                    "quarantine_group",
                    "must not be empty",
                ));
            }
        }
        if op_timeout.is_zero() {
            return Err(IsolationError::config(
                "op_timeout",
                "per-call timeout must be positive",
            ));
        }
        Ok(Self {
            quarantine_group,
            op_timeout,
        })
    }

    /// Returns the quarantine group, or a fatal configuration error
    /// when it was never supplied.
    pub fn quarantine_group(&self) -> IsolationResult<&str> {
        self.quarantine_group.as_deref().ok_or_else(|| {
            IsolationError::config(
                "quarantine_group",
                format!("not set (supply --quarantine-group or {})", QUARANTINE_GROUP_ENV),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let cfg =
            IsolationConfig::new(Some("sg-quarantine".to_string()), DEFAULT_OP_TIMEOUT).unwrap();
        assert_eq!(cfg.quarantine_group().unwrap(), "sg-quarantine");
        assert_eq!(cfg.op_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_group_is_config_error() {
        let cfg = IsolationConfig::new(None, DEFAULT_OP_TIMEOUT).unwrap();
        let err = cfg.quarantine_group().unwrap_err();
        assert!(matches!(err, IsolationError::Config { .. }));
        assert!(err.to_string().contains("QUARANTINE_GROUP_ID"));
    }

    #[test]
    fn test_empty_group_rejected() {
        let err =
            IsolationConfig::new(Some("  ".to_string()), DEFAULT_OP_TIMEOUT).unwrap_err();
        assert!(matches!(err, IsolationError::Config { .. }));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = IsolationConfig::new(Some("sg-q".to_string()), Duration::ZERO).unwrap_err();
        assert!(matches!(err, IsolationError::Config { .. }));
    }
}
