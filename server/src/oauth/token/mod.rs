use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Current time as seconds since the Unix epoch
pub fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// The complete set of credentials for one authenticated LinkedIn session
///
/// Created empty at process start (or loaded from the token store) and
/// overwritten as a unit by the token manager after every exchange or
/// refresh. `person_urn` is only ever set by a successful code exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBundle {
    /// The bearer access token for API requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Refresh token for obtaining a new access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// When the access token expires (as Unix timestamp)
    #[serde(default)]
    pub expires_at: u64,
    /// The LinkedIn member URN this session is associated with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_urn: Option<String>,
}

impl CredentialBundle {
    /// Whether a successful exchange or refresh produced this bundle
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Whether the access token is still usable without a refresh,
    /// keeping `margin_secs` of safety before the actual expiry
    pub fn is_fresh(&self, margin_secs: u64) -> bool {
        now_epoch_secs() < self.expires_at.saturating_sub(margin_secs)
    }
}
