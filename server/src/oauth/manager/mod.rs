//! OAuth token lifecycle against LinkedIn's token endpoint
//!
//! The manager owns every mutation of the credential bundle: exchanging an
//! authorization code, refreshing a stale access token, and persisting the
//! result through the token store. Callers that need a usable token go
//! through [`TokenManager::refresh_if_needed`] and never touch the wire
//! contract themselves.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::config::Config;
use crate::errors::ApiError;

use super::store::TokenStore;
use super::token::{now_epoch_secs, CredentialBundle};

/// Refresh this many seconds before the real expiry
const REFRESH_MARGIN_SECS: u64 = 60;

/// Assumed token lifetime when the provider omits `expires_in`
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Token endpoint response for both the exchange and refresh grants
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
    id_token: Option<String>,
}

#[derive(Serialize)]
struct AuthorizeParams<'a> {
    response_type: &'static str,
    client_id: &'a str,
    redirect_uri: &'a str,
    scope: &'a str,
    state: &'a str,
}

#[derive(Serialize)]
struct ExchangeForm<'a> {
    grant_type: &'static str,
    code: &'a str,
    redirect_uri: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Serialize)]
struct RefreshForm<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

pub struct TokenManager {
    config: Arc<Config>,
    store: Arc<dyn TokenStore>,
    http: reqwest::Client,
    /// Serializes the stale-check/refresh/persist sequence so two callers
    /// cannot race each other into duplicate refresh requests
    refresh_gate: Mutex<()>,
}

impl TokenManager {
    pub fn new(config: Arc<Config>, store: Arc<dyn TokenStore>, http: reqwest::Client) -> Self {
        Self {
            config,
            store,
            http,
            refresh_gate: Mutex::new(()),
        }
    }

    /// The stored bundle as-is, with no freshness guarantee
    pub async fn current(&self) -> CredentialBundle {
        self.store.get().await
    }

    /// Build the provider authorization URL carrying the given CSRF state
    pub fn authorize_url(&self, state: &str) -> Result<String, ApiError> {
        let params = AuthorizeParams {
            response_type: "code",
            client_id: &self.config.client_id,
            redirect_uri: &self.config.redirect_uri,
            scope: &self.config.scopes,
            state,
        };
        let query = serde_urlencoded::to_string(&params)
            .map_err(|err| ApiError::Protocol(format!("failed to encode authorize URL: {err}")))?;

        Ok(format!("{}?{}", self.config.auth_url, query))
    }

    /// Exchange an authorization code for a full credential bundle
    ///
    /// Decodes the id_token claims to derive the member URN, computes the
    /// absolute expiry, and persists the bundle before returning it.
    pub async fn exchange_code(&self, code: &str) -> Result<CredentialBundle, ApiError> {
        let form = ExchangeForm {
            grant_type: "authorization_code",
            code,
            redirect_uri: &self.config.redirect_uri,
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
        };

        let payload = self.token_request(&form).await?;

        let id_token = payload.id_token.ok_or_else(|| {
            ApiError::Protocol(
                "no id_token returned; ensure 'openid profile email' scope is granted".to_string(),
            )
        })?;
        let claims = decode_unverified_claims(&id_token)?;
        let sub = claims
            .get("sub")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ApiError::Protocol("id_token missing 'sub' claim".to_string()))?;

        let mut bundle = self.store.get().await;
        bundle.access_token = Some(payload.access_token);
        bundle.expires_at =
            now_epoch_secs() + payload.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        bundle.refresh_token = payload.refresh_token;
        bundle.person_urn = Some(format!("urn:li:person:{sub}"));
        self.store.set(&bundle).await?;

        info!(author = ?bundle.person_urn, "Authentication successful");
        Ok(bundle)
    }

    /// Return a bundle that is guaranteed usable for at least a minute
    ///
    /// The fast path is a pure read: a fresh bundle comes back unchanged
    /// with no network call. A stale bundle is refreshed with the
    /// refresh-token grant, keeping the old refresh token unless the
    /// provider rotated it.
    pub async fn refresh_if_needed(&self) -> Result<CredentialBundle, ApiError> {
        let _gate = self.refresh_gate.lock().await;

        let mut bundle = self.store.get().await;
        if bundle.is_fresh(REFRESH_MARGIN_SECS) {
            return Ok(bundle);
        }

        let Some(refresh_token) = bundle.refresh_token.clone() else {
            return Err(ApiError::SessionExpired);
        };

        let form = RefreshForm {
            grant_type: "refresh_token",
            refresh_token: &refresh_token,
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
        };

        let payload = self.token_request(&form).await?;

        bundle.access_token = Some(payload.access_token);
        bundle.expires_at =
            now_epoch_secs() + payload.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        // Rotation is optional per provider semantics
        if let Some(rotated) = payload.refresh_token {
            bundle.refresh_token = Some(rotated);
        }
        self.store.set(&bundle).await?;

        info!("Access token refreshed");
        Ok(bundle)
    }

    async fn token_request<F: Serialize>(&self, form: &F) -> Result<TokenResponse, ApiError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            error!(%status, "Token request failed: {body}");
            return Err(ApiError::UpstreamAuth { status, body });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|err| ApiError::Protocol(format!("malformed token response: {err}")))
    }
}

/// Decode the claims segment of a JWT without verifying its signature
///
/// The token arrives straight from the TLS-authenticated token endpoint,
/// and LinkedIn signing-key discovery is out of scope here, so the payload
/// is trusted transport-side rather than cryptographically.
fn decode_unverified_claims(id_token: &str) -> Result<serde_json::Value, ApiError> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| ApiError::Protocol("id_token is not a JWT".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|err| ApiError::Protocol(format!("id_token payload is not base64url: {err}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|err| ApiError::Protocol(format!("id_token claims are not JSON: {err}")))
}
