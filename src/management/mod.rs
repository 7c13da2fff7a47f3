mod auth;
mod cache;

pub use auth::TokenManager;
pub use cache::CacheLookup;
pub use cache::CredentialCache;
