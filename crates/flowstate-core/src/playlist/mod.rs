//! Shuffled, filterable playlist per timer mode.
//!
//! A [`Playlist`] is rebuilt at every mode change: the mode's catalog minus
//! the disabled tracks, shuffled, cursor at 0. If filtering removes every
//! track the unfiltered catalog is used instead, so disabling everything never
//! silences playback. Only an empty catalog yields an empty playlist.

pub mod catalog;

use std::collections::HashSet;
use std::path::Path;

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::storage::MusicConfig;
use crate::timer::TimerMode;

/// A track id (path relative to the music directory).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Track(String);

impl Track {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    /// File stem of the id, e.g. `focus/deep-space.mp3` -> `deep-space`.
    pub fn display_name(&self) -> &str {
        let name = self.0.rsplit('/').next().unwrap_or(&self.0);
        match name.strip_suffix(".mp3") {
            Some(stem) if !stem.is_empty() => stem,
            Some(_) => "Unknown Track",
            None if name.is_empty() => "Unknown Track",
            None => name,
        }
    }

    /// Absolute location under `music_dir`.
    pub fn resolve(&self, music_dir: &Path) -> std::path::PathBuf {
        music_dir.join(&self.0)
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The static per-mode track sets, independent of user preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    focus: Vec<Track>,
    rest: Vec<Track>,
}

impl Catalog {
    pub fn new(focus: Vec<Track>, rest: Vec<Track>) -> Self {
        Self { focus, rest }
    }

    pub fn from_config(music: &MusicConfig) -> Self {
        Self {
            focus: music.focus_tracks.iter().map(Track::new).collect(),
            rest: music.break_tracks.iter().map(Track::new).collect(),
        }
    }

    pub fn tracks(&self, mode: TimerMode) -> &[Track] {
        match mode {
            TimerMode::Focus => &self.focus,
            TimerMode::Break => &self.rest,
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            focus: catalog::FOCUS_TRACKS.iter().copied().map(Track::new).collect(),
            rest: catalog::BREAK_TRACKS.iter().copied().map(Track::new).collect(),
        }
    }
}

/// Ordered track sequence for one mode with a forward-only, wrapping cursor.
#[derive(Debug, Clone)]
pub struct Playlist {
    mode: TimerMode,
    tracks: Vec<Track>,
    cursor: usize,
}

impl Playlist {
    /// Build with fresh entropy, or reproducibly when `seed` is set.
    pub fn build(
        mode: TimerMode,
        catalog: &Catalog,
        disabled: &HashSet<String>,
        seed: Option<u64>,
    ) -> Self {
        let mut rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self::build_with_rng(mode, catalog, disabled, &mut rng)
    }

    pub fn build_with_rng<R: Rng + ?Sized>(
        mode: TimerMode,
        catalog: &Catalog,
        disabled: &HashSet<String>,
        rng: &mut R,
    ) -> Self {
        let mut seen = HashSet::new();
        let source: Vec<Track> = catalog
            .tracks(mode)
            .iter()
            .filter(|t| seen.insert(t.id().to_string()))
            .cloned()
            .collect();

        let enabled: Vec<Track> = source
            .iter()
            .filter(|t| !disabled.contains(t.id()))
            .cloned()
            .collect();

        let mut tracks = if enabled.is_empty() { source } else { enabled };
        // Fisher-Yates.
        tracks.shuffle(rng);

        Self {
            mode,
            tracks,
            cursor: 0,
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.cursor)
    }

    /// Move to the next track, wrapping to 0 after the last.
    pub fn advance(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.tracks.len();
        self.current()
    }
}
