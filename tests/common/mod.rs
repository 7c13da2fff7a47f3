#![allow(dead_code)]

use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use plorg::{
    config::AuthSettings,
    error::AuthError,
    management::{CredentialCache, TokenManager},
    spotify::auth::RedirectSource,
    types::Token,
};
use reqwest::Url;

pub const USER_ID: &str = "alice";
pub const BASIC_AUTH: &str = "Basic Y2xpZW50LWFiYzpzZWNyZXQteHl6";

/// Stands in for the user: answers the authorization URL with a redirect
/// built from the `state` it was given.
pub struct FakeRedirect {
    calls: Arc<AtomicUsize>,
    respond: Box<dyn Fn(&str) -> String + Send + Sync>,
}

impl FakeRedirect {
    /// Echoes the state back together with `code`.
    pub fn echo(code: &str) -> (Self, Arc<AtomicUsize>) {
        let code = code.to_string();
        Self::with(move |state| {
            format!("http://127.0.0.1:8888/callback?code={code}&state={state}")
        })
    }

    pub fn with(
        respond: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let redirect = FakeRedirect {
            calls: Arc::clone(&calls),
            respond: Box::new(respond),
        };
        (redirect, calls)
    }
}

#[async_trait]
impl RedirectSource for FakeRedirect {
    async fn capture(&self, authorize_url: &Url) -> Result<String, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = authorize_url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        Ok((self.respond)(&state))
    }
}

/// Never returns, like a user who walked away from the prompt.
pub struct PendingRedirect;

#[async_trait]
impl RedirectSource for PendingRedirect {
    async fn capture(&self, _authorize_url: &Url) -> Result<String, AuthError> {
        std::future::pending::<()>().await;
        unreachable!()
    }
}

pub fn settings(server_url: &str, cache_dir: &Path) -> AuthSettings {
    let mut settings = AuthSettings::new(USER_ID, cache_dir);
    settings.client_id = "client-abc".to_string();
    settings.client_secret = "secret-xyz".to_string();
    settings.redirect_uri = "http://127.0.0.1:8888/callback".to_string();
    settings.authorize_url = format!("{server_url}/authorize");
    settings.token_url = format!("{server_url}/api/token");
    settings
}

pub fn manager(
    server_url: &str,
    cache_dir: &Path,
    redirect: impl RedirectSource + 'static,
) -> TokenManager {
    TokenManager::new(settings(server_url, cache_dir), Box::new(redirect))
        .expect("http client should build")
}

pub fn token(access: &str, refresh: Option<&str>, age_secs: i64, expires_in: i64) -> Token {
    Token {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        issued_at: Utc::now().timestamp() - age_secs,
        expires_in,
        scope: "playlist-read-private playlist-modify-public".to_string(),
    }
}

pub async fn seed_cache(cache_dir: &Path, token: &Token) {
    CredentialCache::new(cache_dir)
        .store(USER_ID, token)
        .await
        .expect("cache write should succeed");
}

pub fn token_body(access: &str, refresh: Option<&str>) -> String {
    let mut body = serde_json::json!({
        "access_token": access,
        "token_type": "Bearer",
        "expires_in": 3600,
        "scope": "playlist-read-private playlist-modify-public",
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = serde_json::Value::from(refresh);
    }
    body.to_string()
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
