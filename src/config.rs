//! Configuration management for the playlist organizer.
//!
//! This module loads `.env` files and turns environment variables into the
//! [`AuthSettings`] value handed to the credential core. The core itself never
//! reads the environment; everything it needs arrives through that struct.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory, then in the working directory
//! 3. Application defaults (where applicable)

use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use crate::error::AuthError;

pub const DEFAULT_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Scopes needed to read the user's playlists and add tracks to them.
pub const DEFAULT_SCOPES: [&str; 4] = [
    "playlist-modify-public",
    "playlist-modify-private",
    "playlist-read-private",
    "playlist-read-collaborative",
];

/// Everything the credential core needs from its environment.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// Cache key and encryption key for the cached credential.
    pub user_id: String,
    pub authorize_url: String,
    pub token_url: String,
    pub cache_dir: PathBuf,
    pub request_timeout: Duration,
    /// Upper bound for the interactive redirect step; `None` waits forever.
    pub auth_timeout: Option<Duration>,
    /// When set, the redirect is captured by a local callback server.
    pub callback_addr: Option<SocketAddr>,
}

impl AuthSettings {
    /// Settings with Spotify defaults and empty client credentials.
    pub fn new(user_id: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            user_id: user_id.into(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            cache_dir: cache_dir.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            auth_timeout: None,
            callback_addr: None,
        }
    }

    /// Reads client credentials and endpoints from the environment.
    ///
    /// Missing client credentials are left empty; the authorization engine
    /// reports them as `MissingConfiguration` before touching the network.
    pub fn from_env(user_id: impl Into<String>) -> Self {
        let mut settings = Self::new(user_id, cache_dir());
        settings.client_id = var_or_empty("SPOTIFY_CLIENT_ID");
        settings.client_secret = var_or_empty("SPOTIFY_CLIENT_SECRET");
        settings.redirect_uri = var_or_empty("SPOTIFY_REDIRECT_URI");

        if let Some(url) = non_empty_var("SPOTIFY_API_AUTH_URL") {
            settings.authorize_url = url;
        }
        if let Some(url) = non_empty_var("SPOTIFY_API_TOKEN_URL") {
            settings.token_url = url;
        }
        if let Some(secs) = secs_var("PLORG_REQUEST_TIMEOUT_SECS") {
            settings.request_timeout = Duration::from_secs(secs);
        }
        settings.auth_timeout = secs_var("PLORG_AUTH_TIMEOUT_SECS").map(Duration::from_secs);
        settings.callback_addr = server_addr();
        settings
    }
}

/// Loads environment variables from `.env` files.
///
/// Looks in the platform-specific local data directory first
/// (`~/.local/share/plorg/.env` on Linux), creating the directory if needed,
/// then in the current working directory. Missing files are skipped.
///
/// # Errors
///
/// Returns an error if the data directory cannot be created or an existing
/// `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), AuthError> {
    let mut path = data_dir();
    async_fs::create_dir_all(&path).await?;
    path.push(".env");

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| {
            AuthError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{}: {}", path.display(), e),
            ))
        })?;
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    if dotenv::dotenv().is_ok() {
        tracing::debug!("loaded .env from working directory");
    }
    Ok(())
}

/// Base directory for plorg's local files.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("plorg");
    path
}

/// Directory holding the encrypted credential files.
///
/// `PLORG_CACHE_DIR` overrides the default `<data dir>/plorg/cache`.
pub fn cache_dir() -> PathBuf {
    match non_empty_var("PLORG_CACHE_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => data_dir().join("cache"),
    }
}

/// Returns the Spotify Web API base URL (`SPOTIFY_API_URL`).
pub fn api_url() -> String {
    non_empty_var("SPOTIFY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Optional search market (`SPOTIFY_MARKET`, e.g. `ES`).
pub fn market() -> Option<String> {
    non_empty_var("SPOTIFY_MARKET")
}

/// Optional default user (`SPOTIFY_USER_ID`); accepts links and URIs too.
pub fn spotify_user() -> Option<String> {
    non_empty_var("SPOTIFY_USER_ID")
}

/// Address of the local OAuth callback server (`SERVER_ADDRESS`).
pub fn server_addr() -> Option<SocketAddr> {
    let raw = non_empty_var("SERVER_ADDRESS")?;
    match raw.parse() {
        Ok(addr) => Some(addr),
        Err(e) => {
            tracing::warn!(value = %raw, error = %e, "ignoring unparsable SERVER_ADDRESS");
            None
        }
    }
}

fn var_or_empty(name: &str) -> String {
    env::var(name).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn non_empty_var(name: &str) -> Option<String> {
    Some(var_or_empty(name)).filter(|v| !v.is_empty())
}

fn secs_var(name: &str) -> Option<u64> {
    let raw = non_empty_var(name)?;
    match raw.parse() {
        Ok(secs) => Some(secs),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "ignoring non-numeric timeout");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_settings_use_spotify_defaults() {
        let settings = AuthSettings::new("alice", "/tmp/plorg");
        assert_eq!(settings.authorize_url, DEFAULT_AUTHORIZE_URL);
        assert_eq!(settings.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(settings.scopes.len(), DEFAULT_SCOPES.len());
        assert!(settings.client_id.is_empty());
        assert!(settings.auth_timeout.is_none());
    }
}
