//! Post publishing choreography
//!
//! Text posts are a single create call. Image posts are a three-step
//! sequence (register upload slot, binary PUT, create post) where any
//! failure aborts the rest: no post is ever created without its image.

use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;

use crate::config::Config;
use crate::errors::ApiError;
use crate::oauth::TokenManager;

use super::gateway::{ApiGateway, ApiResponse, RequestBody};
use super::post::{ImageUpload, Post};

pub struct PostPublisher {
    config: Arc<Config>,
    manager: Arc<TokenManager>,
    gateway: Arc<ApiGateway>,
}

impl PostPublisher {
    pub fn new(config: Arc<Config>, manager: Arc<TokenManager>, gateway: Arc<ApiGateway>) -> Self {
        Self {
            config,
            manager,
            gateway,
        }
    }

    /// Publish a text-only post to the author's main feed
    pub async fn create_text_post(&self, post: &Post) -> Result<ApiResponse, ApiError> {
        self.create_post(post, None).await
    }

    /// Publish a post with an attached image
    ///
    /// Registration or upload failures propagate immediately and the
    /// create-post step is never attempted after one.
    pub async fn create_image_post(
        &self,
        post: &Post,
        image: &ImageUpload,
    ) -> Result<ApiResponse, ApiError> {
        let author = self.current_author().await?;

        let (upload_url, image_urn) = self.register_image_upload(&author).await?;
        self.upload_image(&upload_url, image).await?;
        info!(%image_urn, "Image uploaded");

        self.create_post(post, Some(&image_urn)).await
    }

    async fn create_post(
        &self,
        post: &Post,
        image_urn: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let author = self.current_author().await?;
        let payload = build_post_payload(&author, post, image_urn);

        self.gateway
            .request(Method::POST, &self.config.posts_url, RequestBody::Json(payload))
            .await
    }

    /// Ask the platform for an upload slot owned by the author
    ///
    /// Returns the upload URL and the image URN the post will reference.
    async fn register_image_upload(&self, author: &str) -> Result<(String, String), ApiError> {
        let payload = json!({ "initializeUploadRequest": { "owner": author } });
        let response = self
            .gateway
            .request(
                Method::POST,
                &self.config.register_upload_url,
                RequestBody::Json(payload),
            )
            .await?;

        let body = response.body.ok_or_else(|| {
            ApiError::Protocol("initializeUpload response had no JSON body".to_string())
        })?;
        let upload_url = body["value"]["uploadUrl"]
            .as_str()
            .ok_or_else(|| {
                ApiError::Protocol("initializeUpload response missing value.uploadUrl".to_string())
            })?
            .to_string();
        let image_urn = body["value"]["image"]
            .as_str()
            .ok_or_else(|| {
                ApiError::Protocol("initializeUpload response missing value.image".to_string())
            })?
            .to_string();

        Ok((upload_url, image_urn))
    }

    async fn upload_image(&self, upload_url: &str, image: &ImageUpload) -> Result<(), ApiError> {
        self.gateway
            .request(
                Method::PUT,
                upload_url,
                RequestBody::Binary {
                    bytes: image.bytes().to_vec(),
                    mime: image.mime_type().as_str(),
                },
            )
            .await?;

        Ok(())
    }

    async fn current_author(&self) -> Result<String, ApiError> {
        let bundle = self.manager.refresh_if_needed().await?;
        bundle.person_urn.ok_or(ApiError::SessionExpired)
    }
}

/// The post entity LinkedIn expects, with fixed distribution settings
fn build_post_payload(author: &str, post: &Post, image_urn: Option<&str>) -> Value {
    let mut payload = json!({
        "author": author,
        "commentary": post.commentary(),
        "visibility": post.visibility(),
        "distribution": {
            "feedDistribution": "MAIN_FEED",
            "targetEntities": [],
            "thirdPartyDistributionChannels": [],
        },
        "lifecycleState": "PUBLISHED",
    });

    if let Some(urn) = image_urn {
        payload["content"] = json!({ "media": { "id": urn } });
    }

    payload
}
