use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use serde_json::{json, Value};

use crate::state::AppState;

pub mod auth;
pub mod posts;

/// Build the application router with all routes
pub fn routes(app_state: AppState) -> axum::Router {
    axum::Router::new()
        // Service health
        .route("/health", get(health))
        .route("/health/env-check", get(env_check))
        // OAuth flow
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/status", get(auth::status))
        // Publishing
        .route("/posts", post(posts::create_post))
        .route("/posts/image", post(posts::create_image_post))
        // Add trace layer for debugging
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": state.config.service_name,
        "ts_utc": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    }))
}

/// Report whether the OAuth application is configured, without echoing secrets
async fn env_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "client_id_set": !state.config.client_id.is_empty(),
        "redirect_uri": state.config.redirect_uri,
    }))
}
