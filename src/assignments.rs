//! Parser for the track assignment file.
//!
//! ```text
//! Songs
//! Bohemian Rhapsody / rock +road-trip
//! Clair de Lune / calm !songs
//! Artists
//! Queen
//! ```
//!
//! Every song lands in the default `songs` playlist unless `!songs` is listed.
//! A `+` prefix marks a playlist that may be created without asking.

use std::collections::BTreeMap;

use thiserror::Error;

pub const DEFAULT_PLAYLIST: &str = "songs";
const EXCLUDE_DEFAULT: &str = "!songs";
const SONGS_HEADER: &str = "Songs";
const ARTISTS_HEADER: &str = "Artists";

#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("assignment file must contain a \"Songs\" and an \"Artists\" section")]
    InvalidFormat,
    #[error("cannot read assignment file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistAssignment {
    pub tracks: Vec<String>,
    /// At least one line asked for the playlist with a `+` prefix.
    pub create: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignments {
    pub playlists: BTreeMap<String, PlaylistAssignment>,
    pub artists: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Songs,
    Artists,
}

impl Assignments {
    pub async fn from_file(path: &std::path::Path) -> Result<Self, AssignmentError> {
        let content = async_fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, AssignmentError> {
        if !content.contains(SONGS_HEADER) || !content.contains(ARTISTS_HEADER) {
            return Err(AssignmentError::InvalidFormat);
        }

        let mut assignments = Assignments::default();
        let mut section = Section::None;

        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if line.contains(SONGS_HEADER) {
                section = Section::Songs;
                continue;
            }
            if line.contains(ARTISTS_HEADER) {
                section = Section::Artists;
                continue;
            }

            match section {
                Section::Songs => assignments.add_song_line(line),
                Section::Artists => assignments.artists.push(line.to_string()),
                Section::None => {}
            }
        }

        Ok(assignments)
    }

    fn add_song_line(&mut self, line: &str) {
        let (song, targets): (&str, Vec<&str>) = match line.split_once(" / ") {
            Some((song, targets)) => (song.trim(), targets.split_whitespace().collect()),
            None => (line, Vec::new()),
        };
        if song.is_empty() {
            return;
        }

        let mut to_default = true;
        for target in targets {
            if target == EXCLUDE_DEFAULT {
                to_default = false;
                continue;
            }
            let (name, create) = match target.strip_prefix('+') {
                Some(name) => (name, true),
                None => (target, false),
            };
            if name.is_empty() {
                continue;
            }
            self.assign(name, song, create);
        }

        if to_default {
            self.assign(DEFAULT_PLAYLIST, song, false);
        }
    }

    fn assign(&mut self, playlist: &str, song: &str, create: bool) {
        let entry = self
            .playlists
            .entry(playlist.to_string())
            .or_insert_with(|| PlaylistAssignment {
                tracks: Vec::new(),
                create: false,
            });
        entry.create |= create;
        if !entry.tracks.iter().any(|t| t == song) {
            entry.tracks.push(song.to_string());
        }
    }
}
