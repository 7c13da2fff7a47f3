use std::{collections::HashMap, net::SocketAddr};

use async_trait::async_trait;
use chrono::Utc;
use dialoguer::Input;
use reqwest::{Client, StatusCode, Url};

use crate::{
    config::AuthSettings,
    error::AuthError,
    server,
    types::{RedirectOutcome, Token, TokenErrorResponse, TokenResponse},
    utils, warning,
};

/// Presents the authorization URL to the user and returns what the
/// provider redirected them to (full URL or query string).
#[async_trait]
pub trait RedirectSource: Send + Sync {
    async fn capture(&self, authorize_url: &Url) -> Result<String, AuthError>;
}

/// Opens the browser and asks the user to paste the URL they landed on.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptRedirect;

#[async_trait]
impl RedirectSource for PromptRedirect {
    async fn capture(&self, authorize_url: &Url) -> Result<String, AuthError> {
        open_in_browser(authorize_url);

        tokio::task::spawn_blocking(|| {
            Input::<String>::new()
                .with_prompt("Paste the URL you were redirected to")
                .interact_text()
                .map_err(|e| AuthError::Prompt(e.to_string()))
        })
        .await
        .map_err(|e| AuthError::Prompt(e.to_string()))?
    }
}

/// Captures the redirect with a short-lived local HTTP server.
#[derive(Debug, Clone)]
pub struct CallbackServerRedirect {
    pub addr: SocketAddr,
    pub path: String,
}

impl CallbackServerRedirect {
    /// Listens on `addr` for the path component of `redirect_uri`.
    pub fn new(addr: SocketAddr, redirect_uri: &str) -> Self {
        let path = Url::parse(redirect_uri)
            .map(|url| url.path().to_string())
            .unwrap_or_else(|_| "/callback".to_string());
        CallbackServerRedirect { addr, path }
    }
}

#[async_trait]
impl RedirectSource for CallbackServerRedirect {
    async fn capture(&self, authorize_url: &Url) -> Result<String, AuthError> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        open_in_browser(authorize_url);
        server::capture_callback(listener, &self.path).await
    }
}

fn open_in_browser(authorize_url: &Url) {
    if webbrowser::open(authorize_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            authorize_url
        );
    } else {
        crate::info!(
            "Opened the Spotify login page in your browser. If nothing happened, visit:\n{}",
            authorize_url
        );
    }
}

/// Runs the authorization-code exchange and the refresh grant.
///
/// One `authorize` call walks `INIT -> AWAITING_REDIRECT -> EXCHANGING_CODE`
/// and ends either with a fresh [`Token`] or a typed failure. The caller
/// persists the token.
pub struct AuthorizationEngine {
    settings: AuthSettings,
    http: Client,
    redirect: Box<dyn RedirectSource>,
}

impl AuthorizationEngine {
    pub fn new(settings: AuthSettings, http: Client, redirect: Box<dyn RedirectSource>) -> Self {
        AuthorizationEngine {
            settings,
            http,
            redirect,
        }
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    pub async fn authorize(&self) -> Result<Token, AuthError> {
        // INIT
        self.validate()?;
        let state_nonce = utils::generate_state_nonce();
        let authorize_url = build_authorize_url(&self.settings, &state_nonce)?;

        // AWAITING_REDIRECT
        tracing::info!("waiting for the user to complete the authorization redirect");
        let captured = match self.settings.auth_timeout {
            Some(limit) => tokio::time::timeout(limit, self.redirect.capture(&authorize_url))
                .await
                .map_err(|_| AuthError::AuthorizationTimedOut)??,
            None => self.redirect.capture(&authorize_url).await?,
        };

        let code = match parse_redirect(&captured)? {
            RedirectOutcome::Denied(reason) => {
                tracing::warn!(%reason, "authorization denied");
                return Err(AuthError::AuthorizationDenied(reason));
            }
            RedirectOutcome::Code { code, state } => {
                if !utils::constant_time_eq(state.as_bytes(), state_nonce.as_bytes()) {
                    tracing::error!("authorization redirect carried an unexpected state value");
                    return Err(AuthError::StateMismatch);
                }
                code
            }
        };

        // EXCHANGING_CODE
        let response = self
            .http
            .post(&self.settings.token_url)
            .basic_auth(&self.settings.client_id, Some(&self.settings.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed {
                status: None,
                detail: format!("request failed: {e}"),
            })?;

        let token = read_token_response(response, None).await.map_err(|f| {
            AuthError::TokenExchangeFailed {
                status: f.status,
                detail: f.detail,
            }
        })?;
        tracing::info!(scope = %token.scope, "authorization code exchanged");
        Ok(token)
    }

    /// Trades `previous`'s refresh token for a new access token.
    ///
    /// When the provider does not rotate the refresh token, the previous one
    /// is carried over into the new record.
    pub async fn refresh(&self, previous: &Token) -> Result<Token, AuthError> {
        let refresh_token = previous
            .refresh_token()
            .ok_or_else(|| AuthError::RefreshFailed {
                status: None,
                detail: "no refresh token available".to_string(),
            })?;
        self.validate()?;

        let response = self
            .http
            .post(&self.settings.token_url)
            .basic_auth(&self.settings.client_id, Some(&self.settings.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed {
                status: None,
                detail: format!("request failed: {e}"),
            })?;

        let mut token = read_token_response(response, Some(&previous.scope))
            .await
            .map_err(|f| AuthError::RefreshFailed {
                status: f.status,
                detail: f.detail,
            })?;
        if token.refresh_token().is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }
        tracing::info!("access token refreshed");
        Ok(token)
    }

    fn validate(&self) -> Result<(), AuthError> {
        if self.settings.client_id.trim().is_empty() {
            return Err(AuthError::MissingConfiguration("client_id"));
        }
        if self.settings.client_secret.trim().is_empty() {
            return Err(AuthError::MissingConfiguration("client_secret"));
        }
        if self.settings.redirect_uri.trim().is_empty() {
            return Err(AuthError::MissingConfiguration("redirect_uri"));
        }
        Ok(())
    }
}

pub fn build_authorize_url(settings: &AuthSettings, state: &str) -> Result<Url, AuthError> {
    let scope = settings.scopes.join(" ");
    Url::parse_with_params(
        &settings.authorize_url,
        &[
            ("client_id", settings.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", settings.redirect_uri.as_str()),
            ("state", state),
            ("scope", scope.as_str()),
        ],
    )
    .map_err(|e| AuthError::InvalidRedirect(format!("invalid authorize url: {e}")))
}

/// Parses the redirect the user landed on.
///
/// Accepts a full URL, `?code=..&state=..` or `code=..&state=..`. An
/// `error` parameter takes precedence over a code.
pub fn parse_redirect(captured: &str) -> Result<RedirectOutcome, AuthError> {
    let captured = captured.trim();
    let url = match Url::parse(captured) {
        Ok(url) => url,
        Err(_) => Url::parse(&format!(
            "http://localhost/?{}",
            captured.trim_start_matches('?')
        ))
        .map_err(|e| AuthError::InvalidRedirect(e.to_string()))?,
    };

    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    if let Some(error) = params.get("error") {
        return Ok(RedirectOutcome::Denied(error.clone()));
    }

    let state = params
        .get("state")
        .ok_or_else(|| AuthError::InvalidRedirect("missing state parameter".to_string()))?;
    let code = params
        .get("code")
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AuthError::InvalidRedirect("missing code parameter".to_string()))?;

    Ok(RedirectOutcome::Code {
        code: code.clone(),
        state: state.clone(),
    })
}

/// Why the token endpoint did not hand out a token.
struct EndpointFailure {
    /// `None` when the response body could not be read.
    status: Option<u16>,
    detail: String,
}

impl EndpointFailure {
    fn new(status: Option<u16>, detail: String) -> Self {
        EndpointFailure { status, detail }
    }
}

/// Turns a token endpoint response into a [`Token`] issued now.
///
/// The caller picks the matching error variant for the grant.
async fn read_token_response(
    response: reqwest::Response,
    fallback_scope: Option<&str>,
) -> Result<Token, EndpointFailure> {
    let status = response.status();
    let code = Some(status.as_u16());
    let body = response
        .text()
        .await
        .map_err(|e| EndpointFailure::new(None, format!("cannot read response body: {e}")))?;

    if status != StatusCode::OK {
        let detail = match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) => format!("status {}: {}", status.as_u16(), err),
            Err(_) => format!("status {}", status.as_u16()),
        };
        return Err(EndpointFailure::new(code, detail));
    }

    let json: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| EndpointFailure::new(code, format!("invalid JSON response: {e}")))?;
    if json.get("error").is_some() {
        let err: TokenErrorResponse = serde_json::from_value(json)
            .map_err(|e| EndpointFailure::new(code, format!("invalid error response: {e}")))?;
        return Err(EndpointFailure::new(code, err.to_string()));
    }

    let parsed: TokenResponse = serde_json::from_value(json)
        .map_err(|e| EndpointFailure::new(code, format!("invalid token response: {e}")))?;

    Ok(Token {
        access_token: parsed.access_token,
        refresh_token: parsed.refresh_token.filter(|t| !t.trim().is_empty()),
        issued_at: Utc::now().timestamp(),
        expires_in: parsed.expires_in,
        scope: parsed
            .scope
            .or_else(|| fallback_scope.map(str::to_string))
            .unwrap_or_default(),
    })
}
