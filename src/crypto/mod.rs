//! # Vault Cipher
//!
//! AES-256-GCM encryption for vault values. Encrypted strings carry the
//! `VAULT:` prefix followed by base64 of `nonce || ciphertext || tag`;
//! anything without the prefix is treated as plaintext and passed
//! through untouched.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use tracing::warn;

use crate::config::ConfigServerConfig;
use crate::errors::{Error, Result};

/// Marker prefix for encrypted values
pub const ENCRYPTED_PREFIX: &str = "VAULT:";

/// Nonce size for AES-256-GCM (96 bits)
const NONCE_SIZE: usize = 12;

/// Key size for AES-256 (256 bits)
const KEY_SIZE: usize = 32;

/// Symmetric cipher holding the process-wide vault master key.
/// The key is read once at startup and is immutable afterwards.
pub struct Cipher {
    key: [u8; KEY_SIZE],
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher").finish_non_exhaustive()
    }
}

impl Cipher {
    /// Load the master key, preferring the `VAULT_MASTER_KEY` environment
    /// variable over the settings file value. Falling back to the settings
    /// value is allowed but loudly warned about.
    pub fn from_settings(settings: &ConfigServerConfig) -> Result<Self> {
        let env_key = std::env::var("VAULT_MASTER_KEY").ok().filter(|v| !v.trim().is_empty());
        let material = match &env_key {
            Some(value) => value.clone(),
            None => {
                warn!("SECURITY WARNING: VAULT_MASTER_KEY is not set; using the master key from settings");
                warn!("This is not secure for production. Generate a key with: openssl rand -base64 32");
                settings.vault_master_key.clone()
            }
        };

        if material.trim().is_empty() {
            return Err(Error::key_load_failed("No vault master key configured"));
        }

        let bytes = BASE64
            .decode(material.trim())
            .map_err(|e| Error::key_load_failed(format!("Invalid base64 in master key: {}", e)))?;
        let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|b: Vec<u8>| {
            Error::key_load_failed(format!(
                "Invalid master key length. Expected {} bytes (256 bits), got: {}",
                KEY_SIZE,
                b.len()
            ))
        })?;

        Ok(Self { key })
    }

    /// Build a cipher from raw key bytes.
    pub fn from_key(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Encrypt a plaintext value into the `VAULT:` envelope with a fresh
    /// random nonce per call.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        if plaintext.trim().is_empty() {
            return Err(Error::encryption_failed("Cannot encrypt empty text"));
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| Error::key_initialization_failed(format!("Failed to create cipher: {}", e)))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| Error::encryption_failed(format!("Encryption failed: {}", e)))?;

        let mut envelope = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&ciphertext);

        Ok(format!("{}{}", ENCRYPTED_PREFIX, BASE64.encode(envelope)))
    }

    /// Decrypt a `VAULT:`-prefixed value. Values without the prefix are
    /// returned unchanged.
    pub fn decrypt(&self, value: &str) -> Result<String> {
        if !Self::is_encrypted(value) {
            return Ok(value.to_string());
        }

        let envelope = BASE64
            .decode(&value[ENCRYPTED_PREFIX.len()..])
            .map_err(|e| Error::decryption_failed(format!("Invalid base64 payload: {}", e)))?;
        if envelope.len() <= NONCE_SIZE {
            return Err(Error::decryption_failed("Encrypted payload too short"));
        }

        let (nonce_bytes, ciphertext) = envelope.split_at(NONCE_SIZE);
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| Error::key_initialization_failed(format!("Failed to create cipher: {}", e)))?;

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| Error::decryption_failed(format!("Decryption failed: {}", e)))?;

        String::from_utf8(plaintext)
            .map_err(|e| Error::decryption_failed(format!("Invalid UTF-8 in decrypted value: {}", e)))
    }

    /// Prefix test only; makes no claim about payload integrity.
    pub fn is_encrypted(value: &str) -> bool {
        value.starts_with(ENCRYPTED_PREFIX)
    }
}
