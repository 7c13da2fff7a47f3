mod common;

use std::sync::Arc;

use common::*;
use mockito::{Matcher, Server, ServerGuard};
use plorg::{
    error::AuthError,
    spotify::{client::SpotifyClient, playlist},
};

const PLAYLISTS_BODY: &str = r#"{"items":[{"id":"pl-1","name":"rock","uri":"spotify:playlist:pl-1"}]}"#;

struct Fixture {
    server: ServerGuard,
    client: SpotifyClient,
    redirects: Arc<std::sync::atomic::AtomicUsize>,
    _dir: tempfile::TempDir,
}

/// A client whose cache holds a still valid `old-token` and whose token
/// endpoint hands out `new-token` on a fresh authorization.
async fn fixture() -> Fixture {
    let server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    seed_cache(dir.path(), &token("old-token", None, 0, 3600)).await;

    let (redirect, redirects) = FakeRedirect::echo("code-1");
    let manager = Arc::new(manager(&server.url(), dir.path(), redirect));
    let client = SpotifyClient::new(manager, format!("{}/v1", server.url()));

    Fixture {
        server,
        client,
        redirects,
        _dir: dir,
    }
}

fn limit_query() -> Matcher {
    Matcher::UrlEncoded("limit".into(), "50".into())
}

#[tokio::test]
async fn unauthorized_response_is_retried_once_with_new_token() {
    let mut f = fixture().await;

    let rejected = f
        .server
        .mock("GET", "/v1/me/playlists")
        .match_query(limit_query())
        .match_header("authorization", "Bearer old-token")
        .with_status(401)
        .with_body(r#"{"error":{"status":401,"message":"The access token expired"}}"#)
        .expect(1)
        .create_async()
        .await;
    let accepted = f
        .server
        .mock("GET", "/v1/me/playlists")
        .match_query(limit_query())
        .match_header("authorization", "Bearer new-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PLAYLISTS_BODY)
        .expect(1)
        .create_async()
        .await;
    let exchange = f
        .server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_body(token_body("new-token", Some("new-refresh")))
        .expect(1)
        .create_async()
        .await;

    let playlists = playlist::current_user_playlists(&f.client).await.unwrap();
    assert_eq!(playlists.get("rock").map(String::as_str), Some("pl-1"));

    rejected.assert_async().await;
    accepted.assert_async().await;
    exchange.assert_async().await;
    assert_eq!(calls(&f.redirects), 1);
}

#[tokio::test]
async fn second_unauthorized_response_fails_without_third_attempt() {
    let mut f = fixture().await;

    let api = f
        .server
        .mock("GET", "/v1/me/playlists")
        .match_query(limit_query())
        .with_status(401)
        .expect(2)
        .create_async()
        .await;
    let exchange = f
        .server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_body(token_body("new-token", None))
        .expect(1)
        .create_async()
        .await;

    assert!(matches!(
        playlist::current_user_playlists(&f.client).await,
        Err(AuthError::AuthorizationFailureAfterRetry)
    ));

    api.assert_async().await;
    exchange.assert_async().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_reauthentication() {
    let mut f = fixture().await;

    // Depending on timing a caller may already pick up the new token.
    let rejected = f
        .server
        .mock("GET", "/v1/me/playlists")
        .match_query(limit_query())
        .match_header("authorization", "Bearer old-token")
        .with_status(401)
        .expect_at_least(1)
        .expect_at_most(3)
        .create_async()
        .await;
    let accepted = f
        .server
        .mock("GET", "/v1/me/playlists")
        .match_query(limit_query())
        .match_header("authorization", "Bearer new-token")
        .with_status(200)
        .with_body(PLAYLISTS_BODY)
        .expect(3)
        .create_async()
        .await;
    let exchange = f
        .server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_body(token_body("new-token", Some("new-refresh")))
        .expect(1)
        .create_async()
        .await;

    let (a, b, c) = tokio::join!(
        playlist::current_user_playlists(&f.client),
        playlist::current_user_playlists(&f.client),
        playlist::current_user_playlists(&f.client),
    );
    for result in [a, b, c] {
        assert_eq!(result.unwrap().get("rock").map(String::as_str), Some("pl-1"));
    }

    rejected.assert_async().await;
    accepted.assert_async().await;
    exchange.assert_async().await;
    assert_eq!(calls(&f.redirects), 1);
}

#[tokio::test]
async fn other_error_statuses_are_not_retried() {
    let mut f = fixture().await;

    let api = f
        .server
        .mock("GET", "/v1/me/playlists")
        .match_query(limit_query())
        .with_status(404)
        .expect(1)
        .create_async()
        .await;
    let exchange = f
        .server
        .mock("POST", "/api/token")
        .expect(0)
        .create_async()
        .await;

    assert!(matches!(
        playlist::current_user_playlists(&f.client).await,
        Err(AuthError::UnexpectedHttpStatus(404))
    ));

    api.assert_async().await;
    exchange.assert_async().await;
    assert_eq!(calls(&f.redirects), 0);
}

#[tokio::test]
async fn search_returns_first_hit_uri() {
    let mut f = fixture().await;

    let search = f
        .server
        .mock("GET", "/v1/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "Bohemian Rhapsody".into()),
            Matcher::UrlEncoded("type".into(), "track".into()),
            Matcher::UrlEncoded("limit".into(), "1".into()),
            Matcher::UrlEncoded("market".into(), "DE".into()),
        ]))
        .match_header("authorization", "Bearer old-token")
        .with_status(200)
        .with_body(
            r#"{"tracks":{"items":[{"id":"t1","name":"Bohemian Rhapsody","uri":"spotify:track:t1"}]}}"#,
        )
        .create_async()
        .await;

    let uri = playlist::search_track(&f.client, "Bohemian Rhapsody", Some("DE"))
        .await
        .unwrap();
    assert_eq!(uri.as_deref(), Some("spotify:track:t1"));
    search.assert_async().await;
}

#[tokio::test]
async fn search_without_hits_returns_none() {
    let mut f = fixture().await;

    f.server
        .mock("GET", "/v1/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"tracks":{"items":[]}}"#)
        .create_async()
        .await;

    let uri = playlist::search_track(&f.client, "No Such Song", None)
        .await
        .unwrap();
    assert_eq!(uri, None);
}

#[tokio::test]
async fn create_playlist_posts_public_playlist() {
    let mut f = fixture().await;

    let create = f
        .server
        .mock("POST", "/v1/users/alice/playlists")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "name": "road-trip",
            "public": true,
            "collaborative": false,
        })))
        .with_status(201)
        .with_body(r#"{"id":"pl-9","name":"road-trip","uri":"spotify:playlist:pl-9"}"#)
        .create_async()
        .await;

    let created = playlist::create_playlist(&f.client, USER_ID, "road-trip")
        .await
        .unwrap();
    assert_eq!(created.id, "pl-9");
    create.assert_async().await;
}

#[tokio::test]
async fn add_tracks_sends_chunks_of_one_hundred() {
    let mut f = fixture().await;

    let add = f
        .server
        .mock("POST", "/v1/playlists/pl-1/tracks")
        .with_status(201)
        .with_body(r#"{"snapshot_id":"snap"}"#)
        .expect(2)
        .create_async()
        .await;

    let uris: Vec<String> = (0..150).map(|i| format!("spotify:track:{i}")).collect();
    let snapshot = playlist::add_tracks(&f.client, "pl-1", &uris).await.unwrap();

    assert_eq!(snapshot.as_deref(), Some("snap"));
    add.assert_async().await;
}
