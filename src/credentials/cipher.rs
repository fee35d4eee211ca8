//! Credential encryption.
//!
//! Credential payloads are stored as AES-256-GCM ciphertext, encoded as
//! `base64(nonce || ciphertext || tag)`.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Size of the AES-256-GCM nonce (IV) in bytes.
const NONCE_SIZE: usize = 12;

/// Size of the AES-256 key in bytes.
const KEY_SIZE: usize = 32;

#[derive(Error, Debug)]
pub enum CipherError {
    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encrypts and decrypts credential payloads.
pub trait CredentialCipher: Send + Sync {
    fn encrypt(&self, data: &Value) -> Result<String, CipherError>;

    fn decrypt(&self, encrypted: &str) -> Result<Value, CipherError>;
}

/// AES-256-GCM cipher keyed by SHA-256 of the instance encryption key.
#[derive(Clone)]
pub struct AesGcmCipher {
    key: [u8; KEY_SIZE],
}

impl AesGcmCipher {
    pub fn new(encryption_key: &str) -> Self {
        Self {
            key: derive_key(encryption_key),
        }
    }

    fn cipher(&self) -> Result<Aes256Gcm, CipherError> {
        Aes256Gcm::new_from_slice(&self.key).map_err(|e| CipherError::InvalidFormat(e.to_string()))
    }
}

impl CredentialCipher for AesGcmCipher {
    fn encrypt(&self, data: &Value) -> Result<String, CipherError> {
        let plaintext = serde_json::to_vec(data)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
            .map_err(|e| CipherError::Encryption(e.to_string()))?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(&combined))
    }

    fn decrypt(&self, encrypted: &str) -> Result<Value, CipherError> {
        let combined = BASE64.decode(encrypted)?;
        if combined.len() < NONCE_SIZE {
            return Err(CipherError::InvalidFormat(
                "Encrypted data too short".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| CipherError::Decryption(e.to_string()))?;

        Ok(serde_json::from_slice(&plaintext)?)
    }
}

fn derive_key(key: &str) -> [u8; KEY_SIZE] {
    let mut key_bytes = [0u8; KEY_SIZE];
    key_bytes.copy_from_slice(&Sha256::digest(key.as_bytes()));
    key_bytes
}

/// Random key for instances started without `N8N_ENCRYPTION_KEY`.
pub fn generate_encryption_key() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE64.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encrypt_decrypt() {
        let cipher = AesGcmCipher::new("test-encryption-key-12345");
        let data = json!({ "user": "admin", "password": "hunter2" });

        let encrypted = cipher.encrypt(&data).unwrap();
        assert!(!encrypted.contains("hunter2"));
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), data);
    }

    #[test]
    fn test_nonce_differs_per_call() {
        let cipher = AesGcmCipher::new("key");
        let data = json!({ "token": "abc" });
        assert_ne!(cipher.encrypt(&data).unwrap(), cipher.encrypt(&data).unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = AesGcmCipher::new("key-one").encrypt(&json!({"a": 1})).unwrap();
        let err = AesGcmCipher::new("key-two").decrypt(&encrypted).unwrap_err();
        assert!(matches!(err, CipherError::Decryption(_)));
    }

    #[test]
    fn test_garbage_input() {
        let cipher = AesGcmCipher::new("key");
        assert!(matches!(cipher.decrypt("!!!").unwrap_err(), CipherError::Base64(_)));
        assert!(matches!(
            cipher.decrypt(&BASE64.encode([1u8; 4])).unwrap_err(),
            CipherError::InvalidFormat(_)
        ));
    }
}
