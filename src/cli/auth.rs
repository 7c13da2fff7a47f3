use crate::{info, success, utils};

pub async fn auth(force: bool, reset: bool, user: Option<String>) {
    let user_id = super::resolve_user(user);
    let manager = super::session(&user_id);

    if reset {
        if let Err(e) = manager.sign_out().await {
            super::fail(e);
        }
        success!("Removed cached credentials for {}", user_id);
        if !force {
            return;
        }
    }

    info!("Authorizing {} with Spotify...", user_id);
    match manager.get_access_token(force).await {
        Ok(token) => success!(
            "Authentication successful! Using token {}",
            utils::mask_token(&token)
        ),
        Err(e) => super::fail(e),
    }
}
