use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::{
    crypto,
    error::AuthError,
    types::{CachedToken, Token},
};

/// Result of reading a user's cache file.
#[derive(Debug)]
pub enum CacheLookup {
    Found(Token),
    NotFound,
    /// The file exists but cannot be parsed or decrypted.
    Corrupted(String),
}

/// Encrypted per-user credential files in a single directory.
#[derive(Debug, Clone)]
pub struct CredentialCache {
    dir: PathBuf,
}

impl CredentialCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CredentialCache { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for `user_id`, named after the hex SHA-256 of the id so any
    /// two distinct ids get distinct files.
    pub fn path_for(&self, user_id: &str) -> PathBuf {
        let digest = Sha256::digest(user_id.as_bytes());
        self.dir.join(format!("token-{digest:x}.json"))
    }

    pub async fn load(&self, user_id: &str) -> CacheLookup {
        let path = self.path_for(user_id);
        let content = match async_fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheLookup::NotFound,
            Err(e) => return CacheLookup::Corrupted(format!("unreadable cache file: {e}")),
        };

        let cached: CachedToken = match serde_json::from_str(&content) {
            Ok(cached) => cached,
            Err(e) => return CacheLookup::Corrupted(format!("invalid JSON: {e}")),
        };

        let access_token = match crypto::decrypt(&cached.access_token, user_id) {
            Ok(token) => token,
            Err(e) => return CacheLookup::Corrupted(format!("access_token: {e}")),
        };

        let refresh_token = match cached.refresh_token.as_deref() {
            Some(ciphertext) => match crypto::decrypt(ciphertext, user_id) {
                Ok(token) => Some(token),
                Err(e) => return CacheLookup::Corrupted(format!("refresh_token: {e}")),
            },
            None => None,
        };

        CacheLookup::Found(Token {
            access_token,
            refresh_token,
            issued_at: cached.issued_at,
            expires_in: cached.expires_in,
            scope: cached.scope,
        })
    }

    /// Encrypts the token fields and replaces the user's cache file.
    ///
    /// The record is written to a temporary sibling first and renamed over
    /// the target, so a crash never leaves a half-written file behind.
    pub async fn store(&self, user_id: &str, token: &Token) -> Result<(), AuthError> {
        let encrypt = |plaintext: &str| {
            crypto::encrypt(plaintext, user_id)
                .map_err(|e| AuthError::CacheCorrupted(format!("cannot encrypt token: {e}")))
        };

        let cached = CachedToken {
            access_token: encrypt(&token.access_token)?,
            refresh_token: token.refresh_token.as_deref().map(encrypt).transpose()?,
            issued_at: token.issued_at,
            expires_in: token.expires_in,
            scope: token.scope.clone(),
        };

        async_fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(user_id);
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&cached)?;

        async_fs::write(&tmp_path, json).await?;
        if let Err(e) = async_fs::rename(&tmp_path, &path).await {
            let _ = async_fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), "credential cache written");
        Ok(())
    }

    /// Deletes the user's cache file; a missing file is not an error.
    pub async fn remove(&self, user_id: &str) -> Result<(), AuthError> {
        match async_fs::remove_file(self.path_for(user_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
