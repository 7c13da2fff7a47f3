use reqwest::Client;
use tokio::sync::Mutex;

use crate::{
    config::AuthSettings,
    error::AuthError,
    management::cache::{CacheLookup, CredentialCache},
    spotify::auth::{AuthorizationEngine, RedirectSource},
    types::Token,
    utils::mask_token,
};

/// Owns the active credential for one user and keeps it usable.
///
/// Every entry point takes the same lock, so a refresh or re-authorization
/// started by one caller is seen by all later callers instead of starting a
/// second flow.
pub struct TokenManager {
    engine: AuthorizationEngine,
    cache: CredentialCache,
    user_id: String,
    http: Client,
    active: Mutex<Option<Token>>,
}

impl TokenManager {
    pub fn new(
        settings: AuthSettings,
        redirect: Box<dyn RedirectSource>,
    ) -> Result<Self, AuthError> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self::with_client(settings, http, redirect))
    }

    pub fn with_client(
        settings: AuthSettings,
        http: Client,
        redirect: Box<dyn RedirectSource>,
    ) -> Self {
        let cache = CredentialCache::new(settings.cache_dir.clone());
        let user_id = settings.user_id.clone();
        TokenManager {
            engine: AuthorizationEngine::new(settings, http.clone(), redirect),
            cache,
            user_id,
            http,
            active: Mutex::new(None),
        }
    }

    /// HTTP client shared with the authorization engine.
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns a bearer token, reusing, refreshing or re-authorizing as needed.
    ///
    /// With `force_reauth == false` a still valid token (in memory or in the
    /// cache) is returned without any network call. Each invocation performs
    /// at most one refresh and at most one full authorization.
    pub async fn get_access_token(&self, force_reauth: bool) -> Result<String, AuthError> {
        let mut active = self.active.lock().await;
        self.resolve(&mut active, force_reauth).await
    }

    /// Forces a full authorization unless another caller already replaced
    /// `rejected` with a newer token, in which case that token is returned.
    pub async fn reauthenticate(&self, rejected: &str) -> Result<String, AuthError> {
        let mut active = self.active.lock().await;
        if let Some(current) = active.as_ref() {
            if current.access_token != rejected && current.is_valid() {
                tracing::debug!(
                    token = %mask_token(&current.access_token),
                    "token already replaced by a concurrent caller"
                );
                return Ok(current.access_token.clone());
            }
        }
        self.resolve(&mut active, true).await
    }

    /// Drops the in-memory token and deletes the cache file.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let mut active = self.active.lock().await;
        *active = None;
        self.cache.remove(&self.user_id).await
    }

    async fn resolve(
        &self,
        active: &mut Option<Token>,
        force_reauth: bool,
    ) -> Result<String, AuthError> {
        let mut candidate: Option<Token> = None;

        if !force_reauth {
            if let Some(token) = active.as_ref().filter(|t| t.is_valid()) {
                return Ok(token.access_token.clone());
            }

            match self.cache.load(&self.user_id).await {
                CacheLookup::Found(token) if token.is_valid() => {
                    tracing::debug!("using cached access token");
                    let access_token = token.access_token.clone();
                    *active = Some(token);
                    return Ok(access_token);
                }
                CacheLookup::Found(token) => {
                    tracing::debug!("cached access token expired");
                    candidate = Some(token);
                }
                CacheLookup::NotFound => {
                    tracing::debug!("no cached credentials");
                }
                CacheLookup::Corrupted(reason) => {
                    tracing::warn!(%reason, "discarding unreadable credential cache");
                }
            }

            if candidate.is_none() {
                candidate = active.take();
            }
        }

        if let Some(expired) = candidate.filter(|t| t.refresh_token().is_some()) {
            match self.engine.refresh(&expired).await {
                Ok(token) => return self.install(active, token).await,
                Err(e) => {
                    tracing::warn!(error = %e, "refresh failed, falling back to full authorization");
                }
            }
        }

        let token = self.engine.authorize().await?;
        self.install(active, token).await
    }

    async fn install(
        &self,
        active: &mut Option<Token>,
        token: Token,
    ) -> Result<String, AuthError> {
        let access_token = token.access_token.clone();
        if let Err(e) = self.cache.store(&self.user_id, &token).await {
            // The token is still good for this session.
            tracing::warn!(error = %e, "could not persist credentials");
        }
        *active = Some(token);
        Ok(access_token)
    }
}
