use std::sync::Arc;

use axum::{Extension, extract::RawQuery, response::Html};
use tokio::sync::{Mutex, oneshot};

/// One-shot channel the callback hands the captured query string to.
pub type CallbackSender = Arc<Mutex<Option<oneshot::Sender<String>>>>;

pub async fn callback(
    RawQuery(query): RawQuery,
    Extension(sender): Extension<CallbackSender>,
) -> Html<&'static str> {
    let Some(query) = query.filter(|q| q.contains("code=") || q.contains("error=")) else {
        return Html("<h4>Missing authorization response.</h4>");
    };

    let Some(tx) = sender.lock().await.take() else {
        return Html("<h4>Authorization response was already received.</h4>");
    };

    let denied = query.contains("error=");
    if tx.send(query).is_err() {
        tracing::warn!("authorization callback arrived after the login flow ended");
    }

    if denied {
        Html("<h4>Login failed.</h4><p>Return to the terminal for details.</p>")
    } else {
        Html("<h2>Authorization received.</h2><p>Close this browser window.</p>")
    }
}
