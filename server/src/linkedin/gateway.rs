//! Authenticated wrapper around LinkedIn REST calls
//!
//! Every request goes through the token manager's freshness guarantee
//! first, then carries the standard header set: bearer authorization, the
//! Rest.li protocol version, and the dated API version fixed at process
//! start. Upstream rejections surface with their status, headers, and raw
//! body so callers can branch on them.

use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::error;

use crate::errors::ApiError;
use crate::oauth::TokenManager;

/// Outbound request body variants the platform contract needs
pub enum RequestBody {
    /// JSON payload, with JSON accept/content-type headers
    Json(Value),
    /// Raw bytes with a caller-declared MIME type (image upload PUT)
    Binary { bytes: Vec<u8>, mime: &'static str },
}

/// A platform response reduced to what callers need
///
/// LinkedIn "create" responses are often header-only, so the identifier is
/// pulled from `x-restli-id` or `location` when no JSON body exists.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub id: Option<String>,
    pub body: Option<Value>,
}

impl ApiResponse {
    /// The JSON to hand back to our own caller
    pub fn into_body(self) -> Value {
        match self.body {
            Some(body) => body,
            None => json!({
                "status_code": self.status,
                "id": self.id,
                "note": "Created (no JSON body).",
            }),
        }
    }
}

pub struct ApiGateway {
    manager: Arc<TokenManager>,
    http: reqwest::Client,
    version: String,
}

impl ApiGateway {
    pub fn new(manager: Arc<TokenManager>, http: reqwest::Client, version: String) -> Self {
        Self {
            manager,
            http,
            version,
        }
    }

    /// Issue an authenticated call with a guaranteed-fresh token
    ///
    /// Binary uploads accept only 200/201; everything else accepts any 2xx.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: RequestBody,
    ) -> Result<ApiResponse, ApiError> {
        let bundle = self.manager.refresh_if_needed().await?;
        let Some(access_token) = bundle.access_token else {
            return Err(ApiError::SessionExpired);
        };

        let is_binary = matches!(body, RequestBody::Binary { .. });
        let request = self
            .http
            .request(method, url)
            .bearer_auth(&access_token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .header("LinkedIn-Version", &self.version);
        let request = match body {
            RequestBody::Json(value) => request.header(ACCEPT, "application/json").json(&value),
            RequestBody::Binary { bytes, mime } => request.header(CONTENT_TYPE, mime).body(bytes),
        };

        let response = request.send().await?;

        let status = response.status();
        let accepted = if is_binary {
            matches!(status.as_u16(), 200 | 201)
        } else {
            status.is_success()
        };
        if !accepted {
            let headers = response.headers().clone();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            error!(%status, url, "LinkedIn request rejected: {body}");
            return Err(ApiError::UpstreamApi {
                status,
                headers,
                body,
            });
        }

        parse_response(response).await
    }
}

async fn parse_response(response: reqwest::Response) -> Result<ApiResponse, ApiError> {
    let status = response.status().as_u16();
    let headers = response.headers();
    let id = headers
        .get("x-restli-id")
        .or_else(|| headers.get(LOCATION))
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false);

    let bytes = response.bytes().await?;
    let body = if is_json && !bytes.is_empty() {
        Some(serde_json::from_slice(&bytes).map_err(|err| {
            ApiError::Protocol(format!("malformed JSON in LinkedIn response: {err}"))
        })?)
    } else {
        None
    };

    Ok(ApiResponse { status, id, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_only_response_synthesizes_a_body() {
        let response = ApiResponse {
            status: 201,
            id: Some("urn:li:share:999".to_string()),
            body: None,
        };

        let body = response.into_body();
        assert_eq!(body["status_code"], 201);
        assert_eq!(body["id"], "urn:li:share:999");
    }

    #[test]
    fn test_json_body_passes_through_unchanged() {
        let response = ApiResponse {
            status: 200,
            id: None,
            body: Some(json!({ "value": 1 })),
        };

        assert_eq!(response.into_body(), json!({ "value": 1 }));
    }
}
