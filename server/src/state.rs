use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, TokenStoreKind};
use crate::linkedin::{ApiGateway, PostPublisher};
use crate::oauth::{CsrfStateGuard, FileTokenStore, MemoryTokenStore, TokenManager, TokenStore};

/// Outbound calls give up after this long; failures are never retried here
const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

/// Everything request handlers need, wired together once at startup
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub manager: Arc<TokenManager>,
    pub csrf: Arc<CsrfStateGuard>,
    pub publisher: Arc<PostPublisher>,
}

impl AppState {
    pub fn from_env() -> color_eyre::Result<Self> {
        Self::new(Arc::new(Config::from_env()?))
    }

    pub fn new(config: Arc<Config>) -> color_eyre::Result<Self> {
        let http = reqwest::ClientBuilder::new()
            .timeout(HTTP_TIMEOUT)
            .use_rustls_tls()
            .build()?;

        let store: Arc<dyn TokenStore> = match config.token_store {
            TokenStoreKind::Memory => Arc::new(MemoryTokenStore::new()),
            TokenStoreKind::File => Arc::new(FileTokenStore::new(config.tokens_path.clone())),
        };

        let manager = Arc::new(TokenManager::new(config.clone(), store, http.clone()));
        let gateway = Arc::new(ApiGateway::new(
            manager.clone(),
            http,
            config.linkedin_version.clone(),
        ));
        let publisher = Arc::new(PostPublisher::new(
            config.clone(),
            manager.clone(),
            gateway,
        ));

        Ok(Self {
            config,
            manager,
            csrf: Arc::new(CsrfStateGuard::default()),
            publisher,
        })
    }
}
