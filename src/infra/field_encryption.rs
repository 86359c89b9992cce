//! Keyring and helpers for encrypting sensitive columns at rest.
//!
//! The first key of the keyring encrypts; decryption tries every key in
//! order so that rotating in a new key keeps older rows readable until they
//! are re-encrypted (`rejs-admin reencrypt-sensitive-data`).

use crate::crypto::{
    compute_field_aad, decrypt_field, encrypt_field, generate_key, EncryptionError, EncryptionKey,
};
use crate::infra::{RejsError, Result};

#[derive(Clone)]
pub struct FieldEncryption {
    keys: Vec<EncryptionKey>,
}

impl std::fmt::Debug for FieldEncryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldEncryption")
            .field("keys", &self.keys.len())
            .finish()
    }
}

impl FieldEncryption {
    pub fn new(keys: Vec<EncryptionKey>) -> Result<Self> {
        if keys.is_empty() {
            return Err(RejsError::Configuration(
                "field encryption keyring is empty".to_string(),
            ));
        }
        Ok(Self { keys })
    }

    /// Single random key; data encrypted with it is lost on restart.
    pub fn ephemeral() -> Self {
        Self {
            keys: vec![generate_key()],
        }
    }

    /// `FIELD_ENCRYPTION_KEYS` (comma-separated, current first) or
    /// `FIELD_ENCRYPTION_KEY`. Keys are 32 bytes, hex or base64.
    pub fn from_env() -> Result<Self> {
        let keys = match std::env::var("FIELD_ENCRYPTION_KEYS") {
            Ok(keys) => parse_keyring_list(&keys)?,
            Err(_) => {
                let key_str = std::env::var("FIELD_ENCRYPTION_KEY").map_err(|_| {
                    RejsError::Configuration(
                        "FIELD_ENCRYPTION_KEY (or FIELD_ENCRYPTION_KEYS) is required".to_string(),
                    )
                })?;
                vec![parse_32_byte_key(&key_str)?]
            }
        };
        Self::new(keys)
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn encrypt_str(
        &self,
        table: &str,
        row_id: i64,
        column: &str,
        plaintext: &str,
    ) -> Result<Vec<u8>> {
        let aad = compute_field_aad(table, row_id, column);
        encrypt_field(&self.keys[0], &aad, plaintext.as_bytes())
            .map_err(|e| RejsError::Encryption(e.to_string()))
    }

    pub fn decrypt_str(
        &self,
        table: &str,
        row_id: i64,
        column: &str,
        ciphertext: &[u8],
    ) -> Result<String> {
        let aad = compute_field_aad(table, row_id, column);

        let mut last_error: Option<EncryptionError> = None;
        for key in &self.keys {
            match decrypt_field(key, &aad, ciphertext) {
                Ok(plaintext) => {
                    return String::from_utf8(plaintext)
                        .map_err(|e| RejsError::Encryption(format!("invalid UTF-8: {e}")));
                }
                Err(e @ EncryptionError::DecryptionFailed(_)) => {
                    last_error = Some(e);
                }
                Err(e) => return Err(RejsError::Encryption(e.to_string())),
            }
        }

        Err(RejsError::Encryption(
            last_error
                .unwrap_or(EncryptionError::NoKeys)
                .to_string(),
        ))
    }

    /// Whether the current (first) key decrypts `ciphertext`.
    pub fn is_current(&self, table: &str, row_id: i64, column: &str, ciphertext: &[u8]) -> bool {
        let aad = compute_field_aad(table, row_id, column);
        decrypt_field(&self.keys[0], &aad, ciphertext).is_ok()
    }
}

pub fn parse_32_byte_key(s: &str) -> Result<EncryptionKey> {
    let trimmed = s.trim();
    let hex_str = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if hex_str.len() == 64 && hex_str.chars().all(|c| c.is_ascii_hexdigit()) {
        let bytes = hex::decode(hex_str).map_err(|e| {
            RejsError::Configuration(format!("invalid FIELD_ENCRYPTION_KEY hex: {e}"))
        })?;
        return bytes.try_into().map_err(|_| {
            RejsError::Configuration("FIELD_ENCRYPTION_KEY must be 32 bytes".to_string())
        });
    }

    let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, trimmed)
        .or_else(|_| {
            base64::Engine::decode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, trimmed)
        })
        .map_err(|e| {
            RejsError::Configuration(format!("invalid FIELD_ENCRYPTION_KEY base64: {e}"))
        })?;

    bytes.try_into().map_err(|_| {
        RejsError::Configuration("FIELD_ENCRYPTION_KEY must be 32 bytes".to_string())
    })
}

pub fn parse_keyring_list(s: &str) -> Result<Vec<EncryptionKey>> {
    let keys: Vec<&str> = s
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect();
    if keys.is_empty() {
        return Err(RejsError::Configuration(
            "FIELD_ENCRYPTION_KEYS must contain at least one key".to_string(),
        ));
    }
    keys.into_iter().map(parse_32_byte_key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrypt_tries_every_key() {
        let key_old = generate_key();
        let key_new = generate_key();

        let old = FieldEncryption::new(vec![key_old]).unwrap();
        let ciphertext = old.encrypt_str("sensitive_data", 5, "pesel", "90021401384").unwrap();

        let rotated = FieldEncryption::new(vec![key_new, key_old]).unwrap();
        assert_eq!(
            rotated
                .decrypt_str("sensitive_data", 5, "pesel", &ciphertext)
                .unwrap(),
            "90021401384"
        );
        assert!(!rotated.is_current("sensitive_data", 5, "pesel", &ciphertext));
        assert!(old.is_current("sensitive_data", 5, "pesel", &ciphertext));
    }

    #[test]
    fn unknown_key_is_an_error() {
        let a = FieldEncryption::ephemeral();
        let b = FieldEncryption::ephemeral();
        let ciphertext = a.encrypt_str("t", 1, "c", "x").unwrap();
        assert!(matches!(
            b.decrypt_str("t", 1, "c", &ciphertext),
            Err(RejsError::Encryption(_))
        ));
    }

    #[test]
    fn parses_hex_and_base64_keys() {
        let key = generate_key();
        let hex_key = hex::encode(key);
        let b64_key = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, key);

        assert_eq!(parse_32_byte_key(&hex_key).unwrap(), key);
        assert_eq!(parse_32_byte_key(&format!("0x{hex_key}")).unwrap(), key);
        assert_eq!(parse_32_byte_key(&b64_key).unwrap(), key);
        assert!(parse_32_byte_key("abcd").is_err());

        let ring = parse_keyring_list(&format!("{hex_key}, {b64_key}")).unwrap();
        assert_eq!(ring.len(), 2);
        assert!(parse_keyring_list(" , ").is_err());
    }

    #[test]
    fn empty_keyring_is_rejected() {
        assert!(FieldEncryption::new(Vec::new()).is_err());
    }
}
