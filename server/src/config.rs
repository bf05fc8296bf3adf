use std::env;
use std::path::PathBuf;

use color_eyre::eyre::eyre;

/// Which backend the token store should use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStoreKind {
    /// Durable JSON file, survives restarts
    File,
    /// Process memory, lost on restart
    Memory,
}

/// Immutable service configuration, read from the environment once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// LinkedIn OAuth application client id
    pub client_id: String,
    /// LinkedIn OAuth application client secret
    pub client_secret: String,
    /// Redirect URI registered with the OAuth application
    pub redirect_uri: String,
    /// Space-separated OAuth scopes to request
    pub scopes: String,
    /// Authorization endpoint
    pub auth_url: String,
    /// Token exchange/refresh endpoint
    pub token_url: String,
    /// Post creation endpoint
    pub posts_url: String,
    /// Image upload registration endpoint
    pub register_upload_url: String,
    /// Dated API version header value (YYYYMM), fixed for the process lifetime
    pub linkedin_version: String,
    /// Service name reported by the health endpoint
    pub service_name: String,
    /// Path of the durable token file (file-backed store only)
    pub tokens_path: PathBuf,
    /// Selected token store backend
    pub token_store: TokenStoreKind,
    /// Address the HTTP server binds to
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> color_eyre::Result<Self> {
        let client_id = env::var("LI_CLIENT_ID")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().to_string())
            .ok_or_else(|| eyre!("LI_CLIENT_ID environment variable not set"))?;
        let client_secret = env::var("LI_CLIENT_SECRET")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().to_string())
            .ok_or_else(|| eyre!("LI_CLIENT_SECRET environment variable not set"))?;

        let token_store = match env::var("TOKEN_STORE").as_deref() {
            Ok("memory") => TokenStoreKind::Memory,
            _ => TokenStoreKind::File,
        };

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri: env::var("LI_REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:8000/auth/callback".to_string()),
            scopes: env::var("LI_SCOPES")
                .unwrap_or_else(|_| "openid profile email w_member_social".to_string()),
            auth_url: env::var("LI_AUTH_URL")
                .unwrap_or_else(|_| "https://www.linkedin.com/oauth/v2/authorization".to_string()),
            token_url: env::var("LI_TOKEN_URL")
                .unwrap_or_else(|_| "https://www.linkedin.com/oauth/v2/accessToken".to_string()),
            posts_url: env::var("LI_POSTS_URL")
                .unwrap_or_else(|_| "https://api.linkedin.com/rest/posts".to_string()),
            register_upload_url: env::var("LI_REGISTER_UPLOAD_URL").unwrap_or_else(|_| {
                "https://api.linkedin.com/rest/images?action=initializeUpload".to_string()
            }),
            linkedin_version: env::var("LINKEDIN_VERSION")
                .unwrap_or_else(|_| chrono::Utc::now().format("%Y%m").to_string()),
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "linkedin-poster-api".to_string()),
            tokens_path: env::var("TOKENS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".tokens.json")),
            token_store,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
        })
    }
}
