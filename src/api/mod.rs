//! # API Module
//!
//! HTTP endpoint served by the local callback server while the user signs in
//! with Spotify.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives the authorization redirect and forwards its raw
//!   query string to the waiting authorization engine. Code exchange and
//!   `state` validation happen in [`crate::spotify::auth`], not here, so the
//!   paste-back and callback-server flows share the same checks.
//!
//! ## Related Modules
//!
//! - [`crate::server`] - Starts and stops the callback server
//! - [`crate::spotify::auth`] - Authorization engine consuming the redirect

mod callback;

pub use callback::{CallbackSender, callback};
