//! # CLI Module
//!
//! User-facing commands of plorg. The commands only build a session and call
//! into the credential core ([`crate::management::TokenManager`]) and the
//! Spotify client; no authorization logic lives here.
//!
//! ## Commands
//!
//! - [`auth`] - Signs in (or reuses the cached sign-in) and reports the result
//! - [`organize`] - Sorts the tracks of an assignment file into playlists
//!
//! ## Usage Patterns
//!
//! ```bash
//! plorg auth                              # Sign in once, token is cached
//! plorg auth --force                      # Ignore the cache and sign in again
//! plorg organize tracks.txt               # Sort tracks into playlists
//! plorg organize tracks.txt --user spotify:user:alice
//! ```

mod auth;
mod organize;

use std::sync::Arc;

use dialoguer::Input;

use crate::{
    config::{self, AuthSettings},
    error,
    error::AuthError,
    management::TokenManager,
    spotify::auth::{CallbackServerRedirect, PromptRedirect, RedirectSource},
    utils,
};

pub use auth::auth;
pub use organize::organize;

/// Picks the user id from the flag, `SPOTIFY_USER_ID` or an interactive prompt.
fn resolve_user(user: Option<String>) -> String {
    let raw = match user.or_else(config::spotify_user) {
        Some(raw) => raw,
        None => match Input::<String>::new()
            .with_prompt("Link or URI of your Spotify profile (Profile > Share > Copy link)")
            .interact_text()
        {
            Ok(raw) => raw,
            Err(e) => error!("Cannot read Spotify user: {}", e),
        },
    };

    let user_id = utils::parse_user_id(&raw);
    if user_id.is_empty() {
        error!("Spotify user id must not be empty");
    }
    user_id
}

fn session(user_id: &str) -> Arc<TokenManager> {
    let settings = AuthSettings::from_env(user_id);
    let redirect: Box<dyn RedirectSource> = match settings.callback_addr {
        Some(addr) => Box::new(CallbackServerRedirect::new(addr, &settings.redirect_uri)),
        None => Box::new(PromptRedirect),
    };

    match TokenManager::new(settings, redirect) {
        Ok(manager) => Arc::new(manager),
        Err(e) => error!("Cannot set up HTTP client: {}", e),
    }
}

fn fail(e: AuthError) -> ! {
    let hint = if e.is_retryable() {
        "This looks temporary, please try again."
    } else {
        "Check your Spotify app settings in the .env file and sign in again."
    };
    error!("{}\n{}", e, hint)
}
