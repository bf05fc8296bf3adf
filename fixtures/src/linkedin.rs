//! Stub LinkedIn API for local development
//!
//! Implements just enough of the OAuth and REST surface for the poster
//! service to run a full login-and-publish loop without touching the real
//! platform: the authorization redirect, the token endpoint for both
//! grants, post creation, and the two-step image upload.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::routing::{get, post, put};
use axum::{Form, Json, Router};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Serialize;
use serde_json::json;
use tracing::info;

// Server state to hold issued identifiers
#[derive(Clone)]
pub struct StubState {
    base_url: String,
    next_id: Arc<AtomicU64>,
    uploads: Arc<Mutex<HashMap<String, usize>>>,
}

#[derive(Serialize)]
struct OAuthRedirectParams<'a> {
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
}

/// Build the stub router, advertising `base_url` in upload URLs
pub fn router(base_url: String) -> Router {
    let state = StubState {
        base_url,
        next_id: Arc::new(AtomicU64::new(1)),
        uploads: Arc::new(Mutex::new(HashMap::new())),
    };

    Router::new()
        // OAuth endpoints
        .route("/oauth/v2/authorization", get(authorize))
        .route("/oauth/v2/accessToken", post(access_token))
        // REST endpoints
        .route("/rest/posts", post(create_post))
        .route("/rest/images", post(initialize_upload))
        .route("/images/upload/:id", put(upload_image))
        .with_state(state)
}

/// An unsigned JWT carrying the fixture member's claims
fn fixture_id_token() -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "none", "typ": "JWT"}).to_string());
    let payload = URL_SAFE_NO_PAD.encode(
        json!({
            "sub": "fixture-member",
            "name": "Fixture Operator",
            "email": "operator@fixture.test",
        })
        .to_string(),
    );
    format!("{header}.{payload}.")
}

// Handler implementations

async fn authorize(
    Query(params): Query<HashMap<String, String>>,
) -> Result<Redirect, (StatusCode, String)> {
    let redirect_uri = params.get("redirect_uri").ok_or((
        StatusCode::BAD_REQUEST,
        "missing redirect_uri".to_string(),
    ))?;

    let redirect_params = OAuthRedirectParams {
        code: "fixture-auth-code",
        state: params.get("state").map(String::as_str),
    };
    let query = serde_urlencoded::to_string(&redirect_params)
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    info!("Authorization request approved, redirecting back");
    Ok(Redirect::to(&format!("{redirect_uri}?{query}")))
}

async fn access_token(Form(form): Form<HashMap<String, String>>) -> impl IntoResponse {
    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") => {
            info!("Issuing tokens for code: {:?}", form.get("code"));
            Json(json!({
                "access_token": "fixture-access-token",
                "expires_in": 3600,
                "refresh_token": "fixture-refresh-token",
                "id_token": fixture_id_token(),
            }))
            .into_response()
        }
        Some("refresh_token") => {
            info!("Refreshing tokens for: {:?}", form.get("refresh_token"));
            Json(json!({
                "access_token": "fixture-access-token-refreshed",
                "expires_in": 3600,
            }))
            .into_response()
        }
        other => {
            info!("Rejecting unsupported grant_type: {other:?}");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "unsupported_grant_type"})),
            )
                .into_response()
        }
    }
}

async fn initialize_upload(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    if params.get("action").map(String::as_str) != Some("initializeUpload") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "unknown action"})),
        )
            .into_response();
    }
    if body["initializeUploadRequest"]["owner"].as_str().is_none() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"message": "initializeUploadRequest.owner is required"})),
        )
            .into_response();
    }

    let id = state.next_id.fetch_add(1, Ordering::Relaxed);
    info!("Registered image upload slot {id}");
    Json(json!({
        "value": {
            "uploadUrl": format!("{}/images/upload/{id}", state.base_url),
            "image": format!("urn:li:image:{id}"),
        }
    }))
    .into_response()
}

async fn upload_image(
    State(state): State<StubState>,
    Path(id): Path<String>,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    info!("Received {} bytes for image {id}", body.len());
    state
        .uploads
        .lock()
        .expect("uploads lock poisoned")
        .insert(id, body.len());

    StatusCode::CREATED
}

async fn create_post(
    State(state): State<StubState>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    if body["author"].as_str().is_none() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"message": "author is required"})),
        )
            .into_response();
    }

    // Posts referencing an image must have uploaded it first
    if let Some(image_urn) = body["content"]["media"]["id"].as_str() {
        let uploaded = image_urn
            .rsplit(':')
            .next()
            .map(|id| {
                state
                    .uploads
                    .lock()
                    .expect("uploads lock poisoned")
                    .contains_key(id)
            })
            .unwrap_or(false);
        if !uploaded {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"message": format!("unknown image {image_urn}")})),
            )
                .into_response();
        }
    }

    let id = state.next_id.fetch_add(1, Ordering::Relaxed);
    info!("Created post urn:li:share:{id}");
    (
        StatusCode::CREATED,
        [("x-restli-id", format!("urn:li:share:{id}"))],
    )
        .into_response()
}
