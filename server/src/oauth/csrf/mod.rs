//! One-time CSRF state tokens for the OAuth authorization flow
//!
//! A state binds an authorization callback to the login request that
//! initiated it. Each token is random, expires after ten minutes, and is
//! consumed on first validation so a replayed callback always fails.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

use super::token::now_epoch_secs;

/// How long an issued state stays valid
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(600);

/// Entropy of each state token, before encoding
const STATE_BYTES: usize = 32;

pub struct CsrfStateGuard {
    ttl_secs: u64,
    entries: Mutex<HashMap<String, u64>>,
}

impl CsrfStateGuard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl_secs: ttl.as_secs(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a fresh state token and record its expiry
    ///
    /// Expired entries are swept here, so abandoned login attempts cannot
    /// grow the map without bound.
    pub fn issue(&self) -> String {
        let mut bytes = [0u8; STATE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let state = URL_SAFE_NO_PAD.encode(bytes);

        let now = now_epoch_secs();
        let mut entries = self.entries.lock().expect("csrf state lock poisoned");
        entries.retain(|_, expires_at| *expires_at > now);
        entries.insert(state.clone(), now + self.ttl_secs);

        state
    }

    /// Validate a state and consume it in the same critical section
    ///
    /// Removal happens before the expiry check, so an expired entry is gone
    /// after the first lookup and two concurrent callbacks can never both
    /// pass validation for the same state.
    pub fn validate_and_consume(&self, state: &str) -> bool {
        let mut entries = self.entries.lock().expect("csrf state lock poisoned");
        match entries.remove(state) {
            Some(expires_at) => expires_at > now_epoch_secs(),
            None => false,
        }
    }
}

impl Default for CsrfStateGuard {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_state_validates_once() {
        let guard = CsrfStateGuard::default();
        let state = guard.issue();

        assert!(guard.validate_and_consume(&state));
        // Replay of a consumed state is rejected
        assert!(!guard.validate_and_consume(&state));
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        let guard = CsrfStateGuard::default();
        guard.issue();

        assert!(!guard.validate_and_consume("never-issued"));
    }

    #[test]
    fn test_expired_state_is_rejected_even_if_never_consumed() {
        let guard = CsrfStateGuard::new(Duration::from_secs(0));
        let state = guard.issue();

        assert!(!guard.validate_and_consume(&state));
    }

    #[test]
    fn test_expired_entries_are_swept_on_issue() {
        let guard = CsrfStateGuard::new(Duration::from_secs(0));
        for _ in 0..8 {
            guard.issue();
        }

        guard.issue();
        assert_eq!(guard.entries.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_states_are_distinct_and_url_safe() {
        let guard = CsrfStateGuard::default();
        let a = guard.issue();
        let b = guard.issue();

        assert_ne!(a, b);
        // 32 bytes of entropy encode to 43 unpadded base64url characters
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
