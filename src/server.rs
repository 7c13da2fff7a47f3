use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tokio::{
    net::TcpListener,
    sync::{Mutex, oneshot},
};

use crate::{
    api::{self, CallbackSender},
    error::AuthError,
};

/// Serves `path` on `listener` until one authorization redirect arrives and
/// returns its raw query string.
pub async fn capture_callback(listener: TcpListener, path: &str) -> Result<String, AuthError> {
    let (tx, rx) = oneshot::channel::<String>();
    let sender: CallbackSender = Arc::new(Mutex::new(Some(tx)));
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    let app = Router::new().route(&path, get(api::callback).layer(Extension(sender)));

    if let Ok(addr) = listener.local_addr() {
        tracing::debug!(%addr, %path, "callback server listening");
    }

    tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::warn!(error = %e, "callback server stopped with an error");
        }
    });

    let query = rx.await.map_err(|_| {
        AuthError::InvalidRedirect("callback server stopped before a redirect arrived".to_string())
    });
    let _ = shutdown_tx.send(());
    query.map(|q| format!("?{q}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_query_of_first_redirect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let capture = tokio::spawn(async move { capture_callback(listener, "/callback").await });

        let client = reqwest::Client::new();
        let without_query = client
            .get(format!("http://{addr}/callback"))
            .send()
            .await
            .unwrap();
        assert!(without_query.status().is_success());

        let body = client
            .get(format!("http://{addr}/callback?code=abc&state=xyz"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("Authorization received"));

        let query = capture.await.unwrap().unwrap();
        assert_eq!(query, "?code=abc&state=xyz");
    }
}
