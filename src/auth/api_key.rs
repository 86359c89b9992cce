//! Staff API keys
//!
//! Keys are formatted as `rz_<random>`; only their SHA-256 hash is stored.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{AuthContext, AuthError};

/// API key prefix
pub const API_KEY_PREFIX: &str = "rz_";

/// API key metadata stored in database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffKeyRecord {
    /// Hash of the API key (never store plaintext)
    pub key_hash: String,

    /// Staff member the key was issued to; recorded as audit actor
    pub username: String,

    pub active: bool,

    pub created_at: DateTime<Utc>,
}

impl StaffKeyRecord {
    pub fn new(key_hash: String, username: impl Into<String>) -> Self {
        Self {
            key_hash,
            username: username.into(),
            active: true,
            created_at: Utc::now(),
        }
    }
}

/// In-memory key registry, used for the bootstrap key.
pub struct ApiKeyValidator {
    keys: RwLock<HashMap<String, StaffKeyRecord>>,
}

impl ApiKeyValidator {
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Generate a new API key
    ///
    /// Returns (plaintext_key, key_hash)
    pub fn generate_key() -> (String, String) {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        let random_bytes: [u8; 24] = rng.gen();
        let random_part = base64::Engine::encode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            random_bytes,
        );

        let plaintext_key = format!("{API_KEY_PREFIX}{random_part}");
        let key_hash = Self::hash_key(&plaintext_key);

        (plaintext_key, key_hash)
    }

    /// Hash an API key for storage
    pub fn hash_key(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn register_key(&self, record: StaffKeyRecord) {
        let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        keys.insert(record.key_hash.clone(), record);
    }

    /// `Ok(None)` when the key is well-formed but unknown here.
    pub fn lookup(&self, key: &str) -> Result<Option<AuthContext>, AuthError> {
        if !key.starts_with(API_KEY_PREFIX) {
            return Err(AuthError::InvalidApiKey);
        }

        let key_hash = Self::hash_key(key);
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        match keys.get(&key_hash) {
            Some(record) if record.active => Ok(Some(AuthContext {
                username: record.username.clone(),
            })),
            Some(_) => Err(AuthError::InvalidApiKey),
            None => Ok(None),
        }
    }

    pub fn revoke(&self, key_hash: &str) {
        let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(record) = keys.get_mut(key_hash) {
            record.active = false;
        }
    }
}

impl Default for ApiKeyValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Database-backed API key store trait
#[async_trait::async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn get_by_hash(&self, key_hash: &str) -> Result<Option<StaffKeyRecord>, AuthError>;

    async fn store(&self, record: &StaffKeyRecord) -> Result<(), AuthError>;

    async fn revoke(&self, key_hash: &str) -> Result<(), AuthError>;
}
