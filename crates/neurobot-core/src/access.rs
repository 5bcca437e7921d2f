//! Administrator access gate.

use crate::error::{NeurobotError, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Privilege level of the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Clearance {
    /// Regular chat user.
    Guest,
    /// Unlocked administrator: bypasses maintenance mode, may edit and
    /// delete turns, and may change the generation config.
    Admin,
}

impl Clearance {
    pub fn is_admin(&self) -> bool {
        matches!(self, Clearance::Admin)
    }
}

/// Compares a submitted code against a single static secret.
///
/// # Security Note
///
/// This is a low-assurance placeholder, not access control. The secret
/// lives in local configuration, the elevation is client-local, never
/// expires and is not backed by any server-side session. Anyone with access
/// to the settings file can read the code.
#[derive(Debug)]
pub struct AccessGate {
    secret: Option<String>,
    privileged: AtomicBool,
}

impl AccessGate {
    /// Creates a gate that unlocks with `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            privileged: AtomicBool::new(false),
        }
    }

    /// Creates a gate with no secret configured; nothing unlocks it.
    pub fn disabled() -> Self {
        Self {
            secret: None,
            privileged: AtomicBool::new(false),
        }
    }

    /// Creates a gate from an optional configured secret.
    pub fn from_secret(secret: Option<String>) -> Self {
        match secret {
            Some(secret) if !secret.is_empty() => Self::new(secret),
            _ => Self::disabled(),
        }
    }

    /// Checks `code` against the secret.
    ///
    /// The comparison is exact: case and whitespace differences fail. A
    /// success elevates the process for the rest of its lifetime; a failure
    /// never elevates and never revokes an earlier elevation.
    pub fn authenticate(&self, code: &str) -> bool {
        let matched = match &self.secret {
            Some(secret) => secret == code,
            None => false,
        };

        if matched {
            self.privileged.store(true, Ordering::SeqCst);
            tracing::info!("[AccessGate] Administrator mode unlocked");
        } else if self.secret.is_none() {
            tracing::warn!("[AccessGate] Login attempted but no admin code is configured");
        } else {
            tracing::warn!("[AccessGate] Rejected admin code");
        }
        matched
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged.load(Ordering::SeqCst)
    }

    pub fn clearance(&self) -> Clearance {
        if self.is_privileged() {
            Clearance::Admin
        } else {
            Clearance::Guest
        }
    }

    /// Fails with `AccessDenied` unless the process is elevated.
    pub fn require_admin(&self, action: &str) -> Result<()> {
        if self.is_privileged() {
            Ok(())
        } else {
            Err(NeurobotError::access_denied(format!(
                "'{action}' requires administrator mode"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_elevates() {
        let gate = AccessGate::new("Secret42");
        assert_eq!(gate.clearance(), Clearance::Guest);

        assert!(gate.authenticate("Secret42"));
        assert_eq!(gate.clearance(), Clearance::Admin);
        assert!(gate.require_admin("edit").is_ok());
    }

    #[test]
    fn test_mismatch_does_not_elevate() {
        let gate = AccessGate::new("Secret42");
        for attempt in ["secret42", "Secret42 ", " Secret42", "Secret4", ""] {
            assert!(!gate.authenticate(attempt), "accepted {attempt:?}");
        }
        assert!(!gate.is_privileged());
        assert!(gate.require_admin("edit").unwrap_err().is_access_denied());
    }

    #[test]
    fn test_failed_attempt_keeps_existing_elevation() {
        let gate = AccessGate::new("Secret42");
        assert!(gate.authenticate("Secret42"));
        assert!(!gate.authenticate("wrong"));
        assert!(gate.is_privileged());
    }

    #[test]
    fn test_disabled_gate_never_unlocks() {
        let gate = AccessGate::from_secret(Some(String::new()));
        assert!(!gate.authenticate(""));
        assert!(!gate.is_privileged());

        let gate = AccessGate::from_secret(None);
        assert!(!gate.authenticate("anything"));
    }
}
