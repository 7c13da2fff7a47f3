//! AES-256-GCM encryption for cached token fields.
//!
//! The key is derived from the user identifier with SHA-256, so a cache file
//! written for one user cannot be read back under another. Each value is
//! encrypted with its own random nonce which is stored in front of the
//! ciphertext: `base64(nonce || ciphertext)`.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Size of the nonce in bytes (96 bits, standard for GCM)
const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag in bytes
const TAG_SIZE: usize = 16;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("encryption key must not be empty")]
    InvalidKey,
    #[error("encryption failed")]
    Encryption,
    #[error("decryption failed: {0}")]
    Decryption(&'static str),
}

fn cipher_for(key: &str) -> Result<Aes256Gcm, CipherError> {
    if key.is_empty() {
        return Err(CipherError::InvalidKey);
    }
    let digest = Sha256::digest(key.as_bytes());
    Aes256Gcm::new_from_slice(&digest).map_err(|_| CipherError::InvalidKey)
}

/// Encrypts `plaintext` with a key derived from `key`.
///
/// # Arguments
/// * `plaintext` - Value to encrypt (e.g. an access token)
/// * `key` - Key material, the user identifier in practice
///
/// # Returns
/// * `Ok(String)` - Base64 of the nonce followed by the ciphertext
/// * `Err` - If the key is empty or encryption fails
pub fn encrypt(plaintext: &str, key: &str) -> Result<String, CipherError> {
    let cipher = cipher_for(key)?;

    // Fresh nonce per value, never reused
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|_| CipherError::Encryption)?;

    let mut payload = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    payload.extend_from_slice(&nonce);
    payload.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(payload))
}

/// Decrypts a value produced by [`encrypt`].
///
/// # Returns
/// * `Ok(String)` - The original plaintext
/// * `Err` - Wrong key, malformed input, tampered data or non UTF-8 output
pub fn decrypt(ciphertext: &str, key: &str) -> Result<String, CipherError> {
    let cipher = cipher_for(key)?;

    let payload = BASE64
        .decode(ciphertext.trim())
        .map_err(|_| CipherError::Decryption("invalid base64"))?;

    if payload.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CipherError::Decryption("ciphertext too short"));
    }

    let (nonce_bytes, sealed) = payload.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext = cipher
        .decrypt(nonce, sealed)
        .map_err(|_| CipherError::Decryption("wrong key or corrupted data"))?;

    String::from_utf8(plaintext).map_err(|_| CipherError::Decryption("plaintext is not UTF-8"))
}
