//! Staff authentication
//!
//! The admin API accepts SHA-256 hashed API keys, looked up first in memory
//! (the bootstrap key) and then in the `staff_api_keys` table.
//!
//! # Configuration
//!
//! - `AUTH_MODE`: `required` (default) or `disabled` for development
//! - `BOOTSTRAP_ADMIN_API_KEY`: Initial admin key for setup

mod api_key;
mod middleware;

pub use api_key::*;
pub use middleware::*;

/// Authenticated staff member, attached to admin requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub username: String,
}

impl AuthContext {
    /// Context used when authentication is disabled.
    pub fn anonymous_admin() -> Self {
        Self {
            username: "admin".to_string(),
        }
    }
}

/// Authentication error
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing authentication")]
    MissingAuth,

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("key store unavailable: {0}")]
    Store(String),
}
