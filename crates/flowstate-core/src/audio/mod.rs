//! Background music output.
//!
//! [`AudioController`] is the only thing allowed to start or stop playback.
//! It owns one [`AudioSink`] and plays the playlist's current track while
//! music is enabled *and* the timer is running, pausing otherwise.

mod rodio_sink;

pub use rodio_sink::RodioSink;

use tracing::{debug, warn};

use crate::error::AudioError;
use crate::playlist::{Playlist, Track};

/// A playback device.
pub trait AudioSink: Send {
    /// Load `track` and play it from the start. End of playback must be
    /// reported as `Signal::TrackEnded { generation }`.
    fn play(&mut self, track: &Track, generation: u64) -> Result<(), AudioError>;
    fn resume(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self);
    fn stop(&mut self);
    /// One-shot notification sound, independent of the music.
    fn play_cue(&mut self) -> Result<(), AudioError>;
}

/// Sink for machines without an output device.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, _track: &Track, _generation: u64) -> Result<(), AudioError> {
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn stop(&mut self) {}

    fn play_cue(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

pub struct AudioController {
    sink: Box<dyn AudioSink>,
    music_enabled: bool,
    cue_enabled: bool,
    loaded: Option<Track>,
    playing: bool,
    generation: u64,
}

impl AudioController {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            music_enabled: false,
            cue_enabled: true,
            loaded: None,
            playing: false,
            generation: 0,
        }
    }

    pub fn with_cue(mut self, enabled: bool) -> Self {
        self.cue_enabled = enabled;
        self
    }

    pub fn music_enabled(&self) -> bool {
        self.music_enabled
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn loaded(&self) -> Option<&Track> {
        self.loaded.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Flip the user's mute toggle. Takes effect at the next [`sync`](Self::sync).
    pub fn toggle_music(&mut self) -> bool {
        self.music_enabled = !self.music_enabled;
        self.music_enabled
    }

    pub fn set_music_enabled(&mut self, enabled: bool) {
        self.music_enabled = enabled;
    }

    /// Bring playback in line with the toggle, the timer and the playlist.
    pub fn sync(&mut self, playlist: &Playlist, timer_running: bool) {
        if !(self.music_enabled && timer_running) {
            if self.playing {
                self.sink.pause();
                self.playing = false;
            }
            return;
        }

        let Some(track) = playlist.current() else {
            debug!("no audio available for {} mode", playlist.mode());
            return;
        };

        if self.loaded.as_ref() == Some(track) {
            if !self.playing {
                match self.sink.resume() {
                    Ok(()) => self.playing = true,
                    Err(e) => warn!("audio resume failed: {e}"),
                }
            }
            return;
        }

        self.generation += 1;
        match self.sink.play(track, self.generation) {
            Ok(()) => {
                debug!(track = track.id(), "playing");
                self.loaded = Some(track.clone());
                self.playing = true;
            }
            Err(e) => {
                warn!("audio playback failed: {e}");
                self.loaded = None;
                self.playing = false;
            }
        }
    }

    /// Natural end of the loaded track. Stale reports (from a track that was
    /// since stopped or replaced) are ignored. Returns true when the playlist
    /// advanced.
    pub fn on_track_ended(
        &mut self,
        generation: u64,
        playlist: &mut Playlist,
        timer_running: bool,
    ) -> bool {
        if generation != self.generation || self.loaded.is_none() {
            debug!(generation, current = self.generation, "stale track end ignored");
            return false;
        }
        self.loaded = None;
        self.playing = false;
        playlist.advance();
        self.sync(playlist, timer_running);
        true
    }

    /// Stop at once; used when the playlist is about to be rebuilt.
    pub fn interrupt(&mut self) {
        self.generation += 1;
        self.sink.stop();
        self.loaded = None;
        self.playing = false;
    }

    /// Play the notification cue if enabled.
    pub fn notify(&mut self) {
        if !self.cue_enabled {
            return;
        }
        if let Err(e) = self.sink.play_cue() {
            warn!("notification cue failed: {e}");
        }
    }
}

impl Drop for AudioController {
    fn drop(&mut self) {
        self.sink.stop();
    }
}
