use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::{error::AuthError, management::TokenManager};

/// Sends authorized requests to the Spotify Web API.
///
/// When a request comes back `401 Unauthorized`, the client asks the
/// [`TokenManager`] for a fresh authorization and sends the rebuilt request
/// exactly once more. Other statuses are handed back untouched.
#[derive(Clone)]
pub struct SpotifyClient {
    manager: Arc<TokenManager>,
    base_url: String,
}

impl SpotifyClient {
    pub fn new(manager: Arc<TokenManager>, base_url: impl Into<String>) -> Self {
        SpotifyClient {
            manager,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn manager(&self) -> &TokenManager {
        &self.manager
    }

    /// Absolute URL for an API path such as `/me/playlists`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Builds the request with `build`, attaches the bearer token and sends it.
    ///
    /// `build` may run twice, so it must not carry state between calls.
    ///
    /// # Errors
    ///
    /// - Any failure to obtain a token from the manager
    /// - Network errors from sending the request
    /// - `AuthorizationFailureAfterRetry` when the retried request is also
    ///   rejected with `401`
    pub async fn call<F>(&self, build: F) -> Result<Response, AuthError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let http = self.manager.http();

        let token = self.manager.get_access_token(false).await?;
        let response = build(http).bearer_auth(&token).send().await?;
        if !is_authorization_failure(&response) {
            return Ok(response);
        }

        tracing::info!(
            url = %response.url(),
            "request rejected as unauthorized, re-authenticating"
        );
        let token = self.manager.reauthenticate(&token).await?;

        let response = build(http).bearer_auth(&token).send().await?;
        if is_authorization_failure(&response) {
            tracing::error!(url = %response.url(), "request rejected again after re-authenticating");
            return Err(AuthError::AuthorizationFailureAfterRetry);
        }
        Ok(response)
    }
}

fn is_authorization_failure(response: &Response) -> bool {
    response.status() == StatusCode::UNAUTHORIZED
}

/// Maps a non-success status to `UnexpectedHttpStatus`.
pub fn ensure_success(response: Response) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AuthError::UnexpectedHttpStatus(status.as_u16()))
    }
}
