use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};

/// Everything that can go wrong between a request and LinkedIn
///
/// Upstream rejections carry the upstream status and raw body so callers
/// can distinguish quota, auth, and validation failures without this
/// service guessing for them. Nothing in here is retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// CSRF state was absent, expired, or already consumed
    #[error("invalid or expired 'state' parameter")]
    InvalidState,

    /// Callback arrived without an authorization code
    #[error("missing 'code' parameter")]
    MissingCode,

    /// The provider redirected back with an error instead of a code
    #[error("authorization failed: {error}")]
    AuthorizationFailed {
        error: String,
        description: Option<String>,
    },

    /// The token endpoint rejected an exchange or refresh
    #[error("token endpoint rejected request with status {status}")]
    UpstreamAuth { status: StatusCode, body: String },

    /// Token response was missing fields the flow cannot work without
    #[error("{0}")]
    Protocol(String),

    /// A refresh was needed but no refresh token is available
    #[error("token expired and no refresh_token available")]
    SessionExpired,

    /// A REST call to the platform was rejected
    #[error("LinkedIn rejected request with status {status}")]
    UpstreamApi {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    },

    /// The post payload failed validation
    #[error("{0}")]
    InvalidPost(String),

    /// Network-level failure talking to the platform
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The token store could not persist the bundle
    #[error("failed to persist credentials: {0}")]
    Storage(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidState
            | Self::MissingCode
            | Self::AuthorizationFailed { .. }
            | Self::Protocol(_)
            | Self::InvalidPost(_) => StatusCode::BAD_REQUEST,
            Self::SessionExpired => StatusCode::UNAUTHORIZED,
            Self::UpstreamAuth { status, .. } | Self::UpstreamApi { status, .. } => *status,
            Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::AuthorizationFailed { error, description } => json!({
                "oauth_error": error,
                "description": description,
            }),
            Self::UpstreamAuth { status, body } | Self::UpstreamApi { status, body, .. } => json!({
                "status": status.as_u16(),
                "error": upstream_body(body),
            }),
            other => json!({ "error": other.to_string() }),
        }
    }
}

/// Pass upstream error bodies through verbatim, structured when they parse
fn upstream_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = ?self, "Request Error");

        (self.status_code(), Json(self.body())).into_response()
    }
}
