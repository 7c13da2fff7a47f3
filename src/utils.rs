use rand::{Rng, distr::Alphanumeric};
use subtle::ConstantTimeEq;

const STATE_NONCE_LEN: usize = 43;
const TOKEN_MASK_PREFIX_LEN: usize = 6;
const TOKEN_MASK_SUFFIX_LEN: usize = 4;

/// Random `state` value for the authorization request.
///
/// 43 alphanumeric characters carry roughly 256 bits of entropy.
pub fn generate_state_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_NONCE_LEN)
        .map(char::from)
        .collect()
}

pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

pub fn mask_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let len = trimmed.len();
    if len <= TOKEN_MASK_PREFIX_LEN + TOKEN_MASK_SUFFIX_LEN || !trimmed.is_ascii() {
        return "*".repeat(len.min(8));
    }

    let prefix = &trimmed[..TOKEN_MASK_PREFIX_LEN];
    let suffix = &trimmed[len - TOKEN_MASK_SUFFIX_LEN..];
    format!("{prefix}...{suffix}")
}

/// Extracts the user id from a profile link, a `spotify:user:` URI or a bare id.
pub fn parse_user_id(raw: &str) -> String {
    let raw = raw.trim();
    if let Some((_, rest)) = raw.split_once("open.spotify.com/user/") {
        let id = rest.split(['?', '/', '#']).next().unwrap_or_default();
        return id.to_string();
    }
    if let Some(id) = raw.strip_prefix("spotify:user:") {
        return id.to_string();
    }
    raw.to_string()
}
