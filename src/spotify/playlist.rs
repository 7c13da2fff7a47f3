use std::collections::HashMap;

use crate::{
    error::AuthError,
    spotify::client::{SpotifyClient, ensure_success},
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, CreatePlaylistRequest,
        GetUserPlaylistsResponse, Playlist, SearchResponse,
    },
};

const PLAYLIST_PAGE_LIMIT: u32 = 50;
const ADD_TRACKS_CHUNK: usize = 100;

/// Returns the current user's playlists keyed by name.
///
/// Only the first page (50 playlists) is read.
pub async fn current_user_playlists(
    client: &SpotifyClient,
) -> Result<HashMap<String, String>, AuthError> {
    let url = client.url("/me/playlists");
    let response = client
        .call(|http| {
            http.get(&url)
                .query(&[("limit", PLAYLIST_PAGE_LIMIT.to_string())])
        })
        .await?;

    let res = ensure_success(response)?
        .json::<GetUserPlaylistsResponse>()
        .await?;

    Ok(res
        .items
        .into_iter()
        .map(|playlist| (playlist.name, playlist.id))
        .collect())
}

/// Searches for a track and returns the URI of the best match.
///
/// # Returns
///
/// - `Ok(Some(uri))` - URI of the first search hit
/// - `Ok(None)` - The search had no results
pub async fn search_track(
    client: &SpotifyClient,
    query: &str,
    market: Option<&str>,
) -> Result<Option<String>, AuthError> {
    let url = client.url("/search");
    let mut params = vec![
        ("q", query.to_string()),
        ("type", "track".to_string()),
        ("limit", "1".to_string()),
    ];
    if let Some(market) = market {
        params.push(("market", market.to_string()));
    }

    let response = client.call(|http| http.get(&url).query(&params)).await?;
    let res = ensure_success(response)?.json::<SearchResponse>().await?;

    Ok(res.tracks.items.into_iter().next().map(|track| track.uri))
}

/// Creates a public, non-collaborative playlist for `user_id`.
pub async fn create_playlist(
    client: &SpotifyClient,
    user_id: &str,
    name: &str,
) -> Result<Playlist, AuthError> {
    let url = client.url(&format!("/users/{user_id}/playlists"));
    let body = CreatePlaylistRequest {
        name: name.to_string(),
        description: String::new(),
        public: true,
        collaborative: false,
    };

    let response = client.call(|http| http.post(&url).json(&body)).await?;
    Ok(ensure_success(response)?.json::<Playlist>().await?)
}

/// Adds tracks to a playlist, 100 per request.
///
/// Returns the snapshot id of the last request, or `None` for an empty list.
pub async fn add_tracks(
    client: &SpotifyClient,
    playlist_id: &str,
    uris: &[String],
) -> Result<Option<String>, AuthError> {
    let url = client.url(&format!("/playlists/{playlist_id}/tracks"));
    let mut snapshot = None;

    for chunk in uris.chunks(ADD_TRACKS_CHUNK) {
        let body = AddTrackToPlaylistRequest {
            uris: chunk.to_vec(),
        };
        let response = client.call(|http| http.post(&url).json(&body)).await?;
        let res = ensure_success(response)?
            .json::<AddTrackToPlaylistResponse>()
            .await?;
        snapshot = Some(res.snapshot_id);
    }

    Ok(snapshot)
}
