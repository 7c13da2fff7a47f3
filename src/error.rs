//! Error types for the credential lifecycle and the Spotify client.
//!
//! The variants fall in two groups an operator can act on differently:
//! configuration and consent problems (`MissingConfiguration`,
//! `AuthorizationDenied`, `StateMismatch`) need the user to fix something,
//! while HTTP and network failures can simply be retried later.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing configuration value: {0}")]
    MissingConfiguration(&'static str),

    #[error("authorization was denied by the user or provider: {0}")]
    AuthorizationDenied(String),

    /// The `state` echoed by the redirect differs from the one we sent.
    /// Never retried.
    #[error("state parameter mismatch in authorization redirect, aborting (possible forged request)")]
    StateMismatch,

    #[error("authorization redirect is not usable: {0}")]
    InvalidRedirect(String),

    #[error("timed out waiting for the authorization redirect")]
    AuthorizationTimedOut,

    /// `status` is `None` when the token endpoint never answered.
    #[error("token exchange failed: {detail}")]
    TokenExchangeFailed { status: Option<u16>, detail: String },

    #[error("token refresh failed: {detail}")]
    RefreshFailed { status: Option<u16>, detail: String },

    #[error("credential cache is corrupted: {0}")]
    CacheCorrupted(String),

    #[error("request was rejected as unauthorized even after re-authenticating")]
    AuthorizationFailureAfterRetry,

    #[error("unexpected HTTP status {0}")]
    UnexpectedHttpStatus(u16),

    #[error("terminal prompt failed: {0}")]
    Prompt(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl AuthError {
    /// Whether the same operation may succeed if simply run again.
    ///
    /// A token endpoint rejecting the request with a 4xx status points at
    /// the credentials or the grant, not at a passing outage.
    pub fn is_retryable(&self) -> bool {
        match self {
            AuthError::TokenExchangeFailed { status, .. }
            | AuthError::RefreshFailed { status, .. } => is_transient_status(*status),
            AuthError::AuthorizationTimedOut | AuthError::Http(_) | AuthError::Io(_) => true,
            _ => false,
        }
    }
}

fn is_transient_status(status: Option<u16>) -> bool {
    match status {
        None => true,
        Some(code) => code == 429 || code >= 500,
    }
}
