use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// The credential held in memory and returned by the authorization engine.
///
/// A token is replaced wholesale on every exchange or refresh, never edited
/// field by field. Not serializable: only [`CachedToken`] goes to disk.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub issued_at: i64,
    pub expires_in: i64,
    pub scope: String,
}

impl Token {
    /// Valid iff `now < issued_at + expires_in`.
    pub fn is_valid_at(&self, now: i64) -> bool {
        now < self.issued_at.saturating_add(self.expires_in)
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now().timestamp())
    }

    /// Refresh token, if one is present and non-empty.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

// Tokens must never end up in logs, so Debug only shows masked values.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &crate::utils::mask_token(&self.access_token))
            .field(
                "refresh_token",
                &self.refresh_token.as_deref().map(crate::utils::mask_token),
            )
            .field("issued_at", &self.issued_at)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// On-disk form of a [`Token`]: both token fields hold ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub issued_at: i64,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: String,
}

/// Success body of the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

/// Error body of the token endpoint (RFC 6749 section 5.2).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl fmt::Display for TokenErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{} ({})", self.error, description),
            None => write!(f, "{}", self.error),
        }
    }
}

/// What the user landed on after the consent screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    Code { code: String, state: String },
    Denied(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserPlaylistsResponse {
    pub items: Vec<Playlist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistResponse {
    pub snapshot_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub tracks: Tracks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tracks {
    pub items: Vec<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub uri: String,
}

#[derive(Tabled)]
pub struct PlaylistSummaryRow {
    pub playlist: String,
    pub added: usize,
    pub missing: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(issued_at: i64, expires_in: i64) -> Token {
        Token {
            access_token: "access-token-value".to_string(),
            refresh_token: Some("refresh-token-value".to_string()),
            issued_at,
            expires_in,
            scope: "playlist-read-private".to_string(),
        }
    }

    #[test]
    fn validity_boundary_is_exclusive() {
        let t = token(1_000, 3_600);
        assert!(t.is_valid_at(1_000));
        assert!(t.is_valid_at(4_599));
        assert!(!t.is_valid_at(4_600));
        assert!(!t.is_valid_at(10_000));
    }

    #[test]
    fn blank_refresh_token_counts_as_absent() {
        let mut t = token(0, 0);
        t.refresh_token = Some("  ".to_string());
        assert_eq!(t.refresh_token(), None);
        t.refresh_token = None;
        assert_eq!(t.refresh_token(), None);
    }

    #[test]
    fn debug_output_masks_tokens() {
        let rendered = format!("{:?}", token(0, 3_600));
        assert!(!rendered.contains("access-token-value"));
        assert!(!rendered.contains("refresh-token-value"));
    }

    #[test]
    fn cached_token_without_refresh_token_parses() {
        let json = r#"{"access_token":"abc","issued_at":1,"expires_in":3600,"scope":"x"}"#;
        let cached: CachedToken = serde_json::from_str(json).unwrap();
        assert!(cached.refresh_token.is_none());
    }
}
