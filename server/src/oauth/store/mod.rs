//! Pluggable persistence for the credential bundle
//!
//! Two backends behind one trait: a durable JSON file that survives
//! restarts, and plain process memory. The backend is chosen once at
//! startup; callers only see `get`/`set` with read-your-writes semantics.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use super::token::CredentialBundle;

/// Storage for the single credential bundle of this process
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Read the current bundle; an empty bundle if nothing was stored yet
    async fn get(&self) -> CredentialBundle;

    /// Overwrite the stored bundle
    async fn set(&self, bundle: &CredentialBundle) -> std::io::Result<()>;
}

/// In-memory store, lost on restart
#[derive(Default)]
pub struct MemoryTokenStore {
    bundle: RwLock<CredentialBundle>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self) -> CredentialBundle {
        self.bundle.read().await.clone()
    }

    async fn set(&self, bundle: &CredentialBundle) -> std::io::Result<()> {
        *self.bundle.write().await = bundle.clone();
        Ok(())
    }
}

/// File-backed store holding the bundle as pretty-printed JSON
///
/// A missing or unreadable file reads as the empty bundle, so a fresh
/// deployment and a corrupted file both land in the unauthenticated state
/// instead of failing startup.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self) -> CredentialBundle {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(_) => return CredentialBundle::default(),
        };

        match serde_json::from_slice(&contents) {
            Ok(bundle) => bundle,
            Err(err) => {
                warn!(path = %self.path.display(), "Ignoring unparseable token file: {err}");
                CredentialBundle::default()
            }
        }
    }

    async fn set(&self, bundle: &CredentialBundle) -> std::io::Result<()> {
        let contents = serde_json::to_vec_pretty(bundle)?;
        tokio::fs::write(&self.path, contents).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bundle() -> CredentialBundle {
        CredentialBundle {
            access_token: Some("access".to_string()),
            refresh_token: Some("refresh".to_string()),
            expires_at: 1_700_000_000,
            person_urn: Some("urn:li:person:abc".to_string()),
        }
    }

    #[tokio::test]
    async fn test_memory_store_read_your_writes() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get().await, CredentialBundle::default());

        store.set(&sample_bundle()).await.unwrap();
        assert_eq!(store.get().await, sample_bundle());
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));

        store.set(&sample_bundle()).await.unwrap();
        assert_eq!(store.get().await, sample_bundle());

        // A second store on the same path sees the same data
        let reopened = FileTokenStore::new(dir.path().join("tokens.json"));
        assert_eq!(reopened.get().await, sample_bundle());
    }

    #[tokio::test]
    async fn test_file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("does-not-exist.json"));

        assert_eq!(store.get().await, CredentialBundle::default());
    }

    #[tokio::test]
    async fn test_file_store_corrupted_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = FileTokenStore::new(path);
        assert_eq!(store.get().await, CredentialBundle::default());
    }
}
