//! LinkedIn REST integration: the authenticated gateway, the post payload
//! model, and the publishing choreography built on top of them.

mod gateway;
mod post;
mod publisher;

pub use gateway::{ApiGateway, ApiResponse, RequestBody};
pub use post::{ImageMimeType, ImageUpload, Post, Visibility, MAX_TEXT_CHARS};
pub use publisher::PostPublisher;
