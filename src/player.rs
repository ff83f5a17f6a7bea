//! Playback controller: owns the audio channel and the Idle/Playing state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use rand::Rng;

use crate::audio::AudioChannel;
use crate::library;

/// The file currently looping on the channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub path: PathBuf,
}

impl Track {
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

pub struct PlaybackController<C, R> {
    channel: C,
    rng: R,
    media_dir: PathBuf,
    fade_out: Duration,
    current: Option<Track>,
}

impl<C: AudioChannel, R: Rng> PlaybackController<C, R> {
    pub fn new(channel: C, rng: R, media_dir: PathBuf, fade_out: Duration) -> Self {
        PlaybackController {
            channel,
            rng,
            media_dir,
            fade_out,
            current: None,
        }
    }

    /// Start looping a random track from the media directory.
    ///
    /// Returns `true` if playing afterwards. Already playing is a no-op that
    /// keeps the current track. A missing or empty directory, or a track that
    /// fails to load, is logged and leaves the controller idle.
    pub fn start(&mut self) -> bool {
        if self.current.is_some() {
            return true;
        }

        let tracks = match library::list_tracks(&self.media_dir) {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("No media directory: {e}");
                return false;
            }
        };
        let Some(path) = library::pick_track(&tracks, &mut self.rng) else {
            warn!("No audio files in {}", self.media_dir.display());
            return false;
        };

        let track = Track { path: path.clone() };
        if let Err(e) = self.channel.play_looped(&track.path) {
            warn!("Failed to play {}: {e}", track.name());
            self.channel.halt();
            return false;
        }

        info!("Playing {}", track.name());
        self.current = Some(track);
        true
    }

    /// Fade out and halt. No-op when idle.
    pub fn stop(&mut self) {
        let Some(track) = self.current.take() else {
            return;
        };

        info!("Fading out {} over {}ms", track.name(), self.fade_out.as_millis());
        if let Err(e) = self.channel.fade_out(self.fade_out) {
            warn!("Fade-out failed, stopping hard: {e}");
        }
        self.channel.halt();
    }

    /// Stop without fading, for shutdown.
    pub fn halt(&mut self) {
        if self.current.take().is_some() {
            self.channel.halt();
        }
    }

    /// Whether a track is loaded and the channel is still producing output.
    pub fn is_playing(&self) -> bool {
        self.current.is_some() && self.channel.is_active()
    }

    /// Drop back to Idle if the channel went silent on its own (for example a
    /// track that fails mid-stream). Returns `true` when that happened.
    pub fn refresh(&mut self) -> bool {
        if self.current.is_none() || self.channel.is_active() {
            return false;
        }
        if let Some(track) = self.current.take() {
            warn!("Playback of {} ended unexpectedly", track.name());
        }
        self.channel.halt();
        true
    }

    #[cfg(test)]
    pub(crate) fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }
}
