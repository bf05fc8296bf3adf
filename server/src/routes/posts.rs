//! Post publishing routes: JSON text posts and multipart image posts

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::ApiError;
use crate::linkedin::{ImageUpload, Post, Visibility};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub text: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub hashtags: Option<String>,
}

/// Publish a text post
pub async fn create_post(
    State(app): State<AppState>,
    Json(request): Json<CreatePostRequest>,
) -> Result<Json<Value>, ApiError> {
    let post = Post::new(&request.text, request.visibility, request.hashtags)?;
    let response = app.publisher.create_text_post(&post).await?;

    Ok(Json(response.into_body()))
}

/// Publish an image post from a multipart form (`text` + `file`, with
/// optional `visibility` and `hashtags` fields)
pub async fn create_image_post(
    State(app): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut text: Option<Vec<u8>> = None;
    let mut visibility = Visibility::default();
    let mut hashtags: Option<String> = None;
    let mut file: Option<(Vec<u8>, Option<String>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            // Text arrives as raw bytes so undecodable input can be
            // replaced instead of rejected
            "text" => text = Some(field.bytes().await.map_err(bad_multipart)?.to_vec()),
            "visibility" => {
                visibility = field.text().await.map_err(bad_multipart)?.parse()?;
            }
            "hashtags" => hashtags = Some(field.text().await.map_err(bad_multipart)?),
            "file" => {
                let declared_mime = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(bad_multipart)?.to_vec();
                file = Some((bytes, declared_mime));
            }
            other => {
                tracing::debug!("Ignoring unexpected multipart field '{other}'");
            }
        }
    }

    let text = text.ok_or_else(|| ApiError::InvalidPost("missing 'text' field".to_string()))?;
    let (bytes, declared_mime) =
        file.ok_or_else(|| ApiError::InvalidPost("missing 'file' field".to_string()))?;

    let post = Post::from_raw_bytes(&text, visibility, hashtags)?;
    let image = ImageUpload::new(bytes, declared_mime.as_deref())?;
    let response = app.publisher.create_image_post(&post, &image).await?;

    Ok(Json(response.into_body()))
}

fn bad_multipart(err: MultipartError) -> ApiError {
    ApiError::InvalidPost(format!("malformed multipart request: {err}"))
}
