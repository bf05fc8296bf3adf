//! OAuth module for the LinkedIn authorization-code flow
//! This covers the credential bundle, its persistence, CSRF state
//! handling, and the token lifecycle manager.

pub mod csrf;
pub mod manager;
pub mod store;
pub mod token;

// Re-export main types
pub use csrf::{CsrfStateGuard, DEFAULT_STATE_TTL};
pub use manager::TokenManager;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::CredentialBundle;
