use std::{collections::HashMap, path::Path, time::Duration};

use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    assignments::Assignments,
    config, error,
    error::AuthError,
    info,
    spotify::{client::SpotifyClient, playlist},
    success,
    types::PlaylistSummaryRow,
    warning,
};

pub async fn organize(file: &Path, user: Option<String>) {
    let assignments = match Assignments::from_file(file).await {
        Ok(assignments) => assignments,
        Err(e) => error!("{}: {}", file.display(), e),
    };

    if assignments.playlists.is_empty() {
        warning!("No songs found in {}", file.display());
        return;
    }
    if !assignments.artists.is_empty() {
        info!(
            "Ignoring {} artist entries, only songs are organized",
            assignments.artists.len()
        );
    }

    let user_id = super::resolve_user(user);
    let client = SpotifyClient::new(super::session(&user_id), config::api_url());
    let market = config::market();

    let mut existing = match playlist::current_user_playlists(&client).await {
        Ok(existing) => existing,
        Err(e) => super::fail(e),
    };
    info!("Found {} existing playlists", existing.len());

    let mut summary = Vec::new();
    for (name, assignment) in &assignments.playlists {
        let playlist_id =
            match resolve_playlist(&client, &user_id, name, assignment.create, &mut existing)
                .await
            {
                Ok(Some(id)) => id,
                Ok(None) => {
                    warning!("Skipping playlist {}", name);
                    continue;
                }
                Err(e) => super::fail(e),
            };

        let (uris, missing) = search_tracks(&client, &assignment.tracks, market.as_deref()).await;

        if !uris.is_empty() {
            match playlist::add_tracks(&client, &playlist_id, &uris).await {
                Ok(_) => success!("Added {} tracks to {}", uris.len(), name),
                Err(e @ AuthError::UnexpectedHttpStatus(_)) => {
                    warning!("Failed to add tracks to {}: {}", name, e);
                    continue;
                }
                Err(e) => super::fail(e),
            }
        }

        summary.push(PlaylistSummaryRow {
            playlist: name.clone(),
            added: uris.len(),
            missing,
        });
    }

    if !summary.is_empty() {
        println!("{}", Table::new(summary));
    }
    success!("Successful");
}

/// What to do about an assigned playlist that does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissingPlaylist {
    Create,
    Skip,
    Rename,
}

impl MissingPlaylist {
    const OPTIONS: [(&'static str, MissingPlaylist); 3] = [
        ("Create it", MissingPlaylist::Create),
        ("Skip it", MissingPlaylist::Skip),
        ("Use another playlist", MissingPlaylist::Rename),
    ];

    fn from_choice(index: usize) -> Self {
        Self::OPTIONS
            .get(index)
            .map_or(MissingPlaylist::Skip, |(_, action)| *action)
    }
}

/// Finds or creates the playlist for `name`, asking the user when it does
/// not exist and was not marked for creation. `None` means skip.
async fn resolve_playlist(
    client: &SpotifyClient,
    user_id: &str,
    name: &str,
    create: bool,
    existing: &mut HashMap<String, String>,
) -> Result<Option<String>, AuthError> {
    let mut target = name.to_string();

    loop {
        if let Some(id) = existing.get(&target) {
            return Ok(Some(id.clone()));
        }

        if !create {
            let labels = MissingPlaylist::OPTIONS.map(|(label, _)| label);
            let choice = Select::new()
                .with_prompt(format!(
                    "Playlist {} does not exist and is not marked to be created",
                    target
                ))
                .items(&labels[..])
                .default(0)
                .interact()
                .map_err(|e| AuthError::Prompt(e.to_string()))?;

            match MissingPlaylist::from_choice(choice) {
                MissingPlaylist::Create => {}
                MissingPlaylist::Skip => return Ok(None),
                MissingPlaylist::Rename => {
                    target = Input::<String>::new()
                        .with_prompt("Name of the playlist to use instead")
                        .interact_text()
                        .map_err(|e| AuthError::Prompt(e.to_string()))?;
                    continue;
                }
            }
        }

        let created = playlist::create_playlist(client, user_id, &target).await?;
        success!("Created playlist {}", created.name);
        existing.insert(created.name.clone(), created.id.clone());
        return Ok(Some(created.id));
    }
}

/// Looks up every track; misses are reported and skipped.
async fn search_tracks(
    client: &SpotifyClient,
    tracks: &[String],
    market: Option<&str>,
) -> (Vec<String>, usize) {
    let pb = ProgressBar::new(tracks.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg} [{pos}/{len}]") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut uris = Vec::new();
    let mut missing = 0;

    for track in tracks {
        pb.set_message(format!("Searching {}", track));
        match playlist::search_track(client, track, market).await {
            Ok(Some(uri)) => uris.push(uri),
            Ok(None) => {
                missing += 1;
                pb.suspend(|| {
                    warning!(
                        "{} either does not exist or the search was too far from the original name, skipping",
                        track
                    )
                });
            }
            Err(e @ AuthError::UnexpectedHttpStatus(_)) => {
                missing += 1;
                pb.suspend(|| warning!("Search for {} failed: {}", track, e));
            }
            Err(e) => {
                pb.finish_and_clear();
                super::fail(e);
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    (uris, missing)
}

#[cfg(test)]
mod tests {
    use super::MissingPlaylist;

    #[test]
    fn prompt_choices_map_to_actions() {
        assert_eq!(MissingPlaylist::from_choice(0), MissingPlaylist::Create);
        assert_eq!(MissingPlaylist::from_choice(1), MissingPlaylist::Skip);
        assert_eq!(MissingPlaylist::from_choice(2), MissingPlaylist::Rename);
        assert_eq!(MissingPlaylist::from_choice(7), MissingPlaylist::Skip);
    }
}
