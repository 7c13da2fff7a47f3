//! # Spotify Integration Module
//!
//! This module talks to Spotify's accounts service and Web API. It is split in
//! two layers with a single seam between them:
//!
//! ```text
//! Application Layer (CLI, assignment file processing)
//!          ↓
//! Resource calls (playlist) ── SpotifyClient::call
//!          ↓                          ↓ on 401
//! HTTP Layer (reqwest)          TokenManager ── AuthorizationEngine
//!          ↓                                        ↓
//! Spotify Web API               Spotify accounts service
//! ```
//!
//! ## Core Modules
//!
//! ### Authorization Module
//!
//! [`auth`] - Authorization-code flow with client secret:
//! - **State Nonce**: Random `state` compared in constant time against the
//!   redirect; a mismatch aborts the flow
//! - **Redirect Capture**: Either pasted back by the user or received by a
//!   temporary local callback server
//! - **Token Exchange**: `POST` to the token endpoint with HTTP Basic auth
//! - **Refresh**: `grant_type=refresh_token`, keeping the previous refresh
//!   token when Spotify does not rotate it
//!
//! ### Client Module
//!
//! [`client`] - Authorized request wrapper. Obtains a token from the
//! [`crate::management::TokenManager`], retries exactly once after
//! re-authenticating on `401 Unauthorized` and returns every other status to
//! the caller.
//!
//! ### Playlist Module
//!
//! [`playlist`] - The handful of Web API calls the organizer needs:
//! - `GET /me/playlists` - User's playlists by name
//! - `GET /search` - Best matching track URI
//! - `POST /users/{user_id}/playlists` - Create a playlist
//! - `POST /playlists/{playlist_id}/tracks` - Add tracks in batches of 100
//!
//! ## Error Types
//!
//! Everything returns [`crate::error::AuthError`]. Non-success statuses from
//! resource calls surface as `UnexpectedHttpStatus` so callers can tell a
//! search miss from a server error.

pub mod auth;
pub mod client;
pub mod playlist;
