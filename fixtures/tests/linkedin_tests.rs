//! In-process tests for the stub LinkedIn server

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::{json, Value};

/// Serve the stub router on an ephemeral port and return its base URL
async fn start_stub() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind ephemeral port");
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let app = fixtures::linkedin::router(base_url.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub server died");
    });

    base_url
}

#[tokio::test]
async fn test_authorization_redirects_back_with_code_and_state() {
    let base_url = start_stub().await;
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let response = client
        .get(format!("{base_url}/oauth/v2/authorization"))
        .query(&[
            ("response_type", "code"),
            ("client_id", "client123"),
            ("redirect_uri", "http://localhost:8000/auth/callback"),
            ("state", "state-token"),
        ])
        .send()
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(location.starts_with("http://localhost:8000/auth/callback?"));
    assert!(location.contains("code=fixture-auth-code"));
    assert!(location.contains("state=state-token"));
}

#[tokio::test]
async fn test_token_endpoint_issues_a_decodable_id_token() {
    let base_url = start_stub().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base_url}/oauth/v2/accessToken"))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", "fixture-auth-code"),
            ("redirect_uri", "http://localhost:8000/auth/callback"),
            ("client_id", "client123"),
            ("client_secret", "secret456"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["access_token"], "fixture-access-token");
    assert_eq!(body["expires_in"], 3600);

    // The id_token claims decode like a real JWT payload
    let id_token = body["id_token"].as_str().unwrap();
    let payload = id_token.split('.').nth(1).unwrap();
    let claims: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
    assert_eq!(claims["sub"], "fixture-member");
}

#[tokio::test]
async fn test_token_endpoint_handles_refresh_and_rejects_unknown_grants() {
    let base_url = start_stub().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base_url}/oauth/v2/accessToken"))
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", "fixture-refresh-token"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["access_token"], "fixture-access-token-refreshed");

    let response = client
        .post(format!("{base_url}/oauth/v2/accessToken"))
        .form(&[("grant_type", "password")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_image_publish_loop() {
    let base_url = start_stub().await;
    let client = reqwest::Client::new();

    // Register an upload slot
    let response = client
        .post(format!("{base_url}/rest/images?action=initializeUpload"))
        .json(&json!({"initializeUploadRequest": {"owner": "urn:li:person:fixture-member"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let upload_url = body["value"]["uploadUrl"].as_str().unwrap().to_string();
    let image_urn = body["value"]["image"].as_str().unwrap().to_string();

    // Upload the raw bytes
    let response = client
        .put(&upload_url)
        .header("content-type", "image/png")
        .body(vec![0x89, b'P', b'N', b'G'])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    // Create the post referencing the uploaded image
    let response = client
        .post(format!("{base_url}/rest/posts"))
        .json(&json!({
            "author": "urn:li:person:fixture-member",
            "commentary": "hello",
            "content": {"media": {"id": image_urn}},
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let post_id = response
        .headers()
        .get("x-restli-id")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(post_id.starts_with("urn:li:share:"));
}

#[tokio::test]
async fn test_post_referencing_missing_image_is_rejected() {
    let base_url = start_stub().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base_url}/rest/posts"))
        .json(&json!({
            "author": "urn:li:person:fixture-member",
            "commentary": "hello",
            "content": {"media": {"id": "urn:li:image:999"}},
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
}
