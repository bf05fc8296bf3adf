//! OAuth login, callback, and session status routes

use axum::extract::{Query, State};
use axum::response::{Json, Redirect};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Start the login flow: issue a CSRF state and send the operator to LinkedIn
pub async fn login(State(app): State<AppState>) -> Result<Redirect, ApiError> {
    let state = app.csrf.issue();
    let url = app.manager.authorize_url(&state)?;

    Ok(Redirect::to(&url))
}

/// Complete the login flow when LinkedIn redirects back
///
/// Provider errors are rejected first, then the CSRF state is validated and
/// consumed before the authorization code is touched.
pub async fn callback(
    State(app): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<Value>, ApiError> {
    info!(
        "Callback received: code present: {}, state present: {}, error: {:?}",
        params.code.is_some(),
        params.state.is_some(),
        params.error
    );

    if let Some(error) = params.error {
        return Err(ApiError::AuthorizationFailed {
            error,
            description: params.error_description,
        });
    }

    let state_valid = params
        .state
        .as_deref()
        .map(|state| app.csrf.validate_and_consume(state))
        .unwrap_or(false);
    if !state_valid {
        return Err(ApiError::InvalidState);
    }

    let code = params.code.ok_or(ApiError::MissingCode)?;
    let bundle = app.manager.exchange_code(&code).await?;

    Ok(Json(json!({
        "message": "LinkedIn connected",
        "author": bundle.person_urn,
    })))
}

/// Report the current session state, refreshing first when logged in
pub async fn status(State(app): State<AppState>) -> Result<Json<Value>, ApiError> {
    let current = app.manager.current().await;
    let bundle = if current.is_authenticated() {
        app.manager.refresh_if_needed().await?
    } else {
        current
    };

    Ok(Json(json!({
        "logged_in": bundle.is_authenticated(),
        "has_refresh": bundle.refresh_token.is_some(),
        "expires_at": bundle.expires_at,
        "author": bundle.person_urn,
    })))
}
