//! Field-level encryption at rest (AES-256-GCM).
//!
//! Stored format: `FIELD_ATREST_MAGIC_V1 || nonce(12) || ciphertext_with_tag`.
//! The AAD is a SHA-256 digest over a domain prefix, the owning row id and
//! the column name, so a ciphertext copied into another row or column fails
//! to decrypt.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Encryption key (32 bytes for AES-256)
pub type EncryptionKey = [u8; 32];

/// 32-byte SHA-256 digest
pub type Hash256 = [u8; 32];

/// Nonce size for AES-GCM (12 bytes)
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size (16 bytes)
pub const TAG_SIZE: usize = 16;

/// Domain prefix for sensitive-field AAD.
pub const DOMAIN_FIELD_ATREST_AAD_V1: &[u8] = b"REJS_FIELD_ATREST_AAD_V1";

/// Magic prefix for encrypted field blobs.
pub const FIELD_ATREST_MAGIC_V1: &[u8; 4] = b"RZF1";

#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("invalid ciphertext length")]
    InvalidCiphertext,

    #[error("invalid payload format")]
    InvalidPayloadFormat,

    #[error("no encryption keys configured")]
    NoKeys,
}

/// Length-prefixed UTF-8: `U32_BE(len) || bytes`.
fn encode_string(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(4 + bytes.len());
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
    out
}

/// AAD binding a ciphertext to `(table, row id, column)`.
pub fn compute_field_aad(table: &str, row_id: i64, column: &str) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_FIELD_ATREST_AAD_V1);
    hasher.update(encode_string(table));
    hasher.update(row_id.to_be_bytes());
    hasher.update(encode_string(column));
    hasher.finalize().into()
}

pub fn is_field_encrypted(data: &[u8]) -> bool {
    data.len() >= FIELD_ATREST_MAGIC_V1.len()
        && &data[..FIELD_ATREST_MAGIC_V1.len()] == FIELD_ATREST_MAGIC_V1
}

pub fn encrypt_field(
    key: &EncryptionKey,
    aad: &Hash256,
    plaintext: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext_with_tag = cipher
        .encrypt(
            nonce,
            aes_gcm::aead::Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

    let mut result =
        Vec::with_capacity(FIELD_ATREST_MAGIC_V1.len() + NONCE_SIZE + ciphertext_with_tag.len());
    result.extend_from_slice(FIELD_ATREST_MAGIC_V1);
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext_with_tag);
    Ok(result)
}

pub fn decrypt_field(
    key: &EncryptionKey,
    aad: &Hash256,
    ciphertext: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    let header_len = FIELD_ATREST_MAGIC_V1.len() + NONCE_SIZE;
    if ciphertext.len() < header_len + TAG_SIZE {
        return Err(EncryptionError::InvalidCiphertext);
    }
    if !is_field_encrypted(ciphertext) {
        return Err(EncryptionError::InvalidPayloadFormat);
    }

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| EncryptionError::DecryptionFailed(e.to_string()))?;

    let nonce = Nonce::from_slice(&ciphertext[FIELD_ATREST_MAGIC_V1.len()..header_len]);

    cipher
        .decrypt(
            nonce,
            aes_gcm::aead::Payload {
                msg: &ciphertext[header_len..],
                aad,
            },
        )
        .map_err(|e| EncryptionError::DecryptionFailed(e.to_string()))
}

/// Generate a new random encryption key
pub fn generate_key() -> EncryptionKey {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    key
}
