//! Spotify Playlist Organizer Library
//!
//! This library sorts the tracks listed in a plain text assignment file into
//! the user's Spotify playlists. Its core is the credential lifecycle: the
//! authorization-code exchange, an encrypted on-disk token cache, refresh
//! handling and a call wrapper that re-authenticates once when the API
//! rejects a token.
//!
//! # Modules
//!
//! - `api` - HTTP endpoint for the local OAuth callback server
//! - `assignments` - Parser for the track/playlist assignment file
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `crypto` - Field encryption for cached tokens
//! - `error` - Error types shared across the crate
//! - `management` - Token cache and lifecycle management
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify authorization engine and Web API client
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use plorg::{config, management::TokenManager, spotify::auth::PromptRedirect};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), plorg::error::AuthError> {
//!     config::load_env().await?;
//!     let settings = config::AuthSettings::from_env("my-user-id");
//!     let manager = TokenManager::new(settings, Box::new(PromptRedirect))?;
//!     let token = manager.get_access_token(false).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod assignments;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// Prints an informational message with a blue bullet point.
///
/// Creates a formatted output line with a distinctive blue "o" indicator
/// followed by the provided message. Used for general information and
/// status updates throughout the application.
///
/// # Example
///
/// ```
/// info!("Starting authentication process...");
/// info!("Found {} playlists", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Authentication completed successfully");
/// success!("Added {} tracks", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Terminates the program with exit code 1. Only the binary layer uses this;
/// library code returns errors instead.
///
/// # Example
///
/// ```
/// error!("Failed to load configuration");
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues, like a track that could not be found.
///
/// # Example
///
/// ```
/// warning!("Cached credentials are unreadable, signing in again");
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
