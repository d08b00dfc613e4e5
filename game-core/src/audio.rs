use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_COUNTDOWN_TRACK: &str = "/countdown-music.mp3";
pub const DEFAULT_VOLUME: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrack {
    pub src: String,
    pub volume: f32,
    pub looped: bool,
}

impl AudioTrack {
    pub fn new(src: impl Into<String>, volume: f32) -> Self {
        Self {
            src: src.into(),
            volume: volume.clamp(0.0, 1.0),
            looped: true,
        }
    }
}

impl Default for AudioTrack {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN_TRACK, DEFAULT_VOLUME)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AudioError {
    #[error("audio output unavailable")]
    Unavailable,
    #[error("playback failed: {0}")]
    Playback(String),
}

/// Where audio commands end up: a browser, a sound device, a test recorder.
pub trait AudioOutput {
    fn play(&mut self, track: &AudioTrack) -> Result<(), AudioError>;
    fn pause(&mut self, track: &AudioTrack) -> Result<(), AudioError>;
    fn stop(&mut self, track: &AudioTrack) -> Result<(), AudioError>;
}

/// The countdown music. Output failures are logged and swallowed so the game
/// keeps going in silence.
pub struct AudioCue<O: AudioOutput> {
    track: AudioTrack,
    output: O,
    playing: bool,
}

impl<O: AudioOutput> AudioCue<O> {
    pub fn new(track: AudioTrack, output: O) -> Self {
        Self {
            track,
            output,
            playing: false,
        }
    }

    /// Plays from the start, even when already playing.
    pub fn play(&mut self) {
        match self.output.play(&self.track) {
            Ok(()) => self.playing = true,
            Err(err) => {
                tracing::warn!(error = %err, src = %self.track.src, "audio play failed");
                self.playing = false;
            }
        }
    }

    pub fn pause(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;
        if let Err(err) = self.output.pause(&self.track) {
            tracing::warn!(error = %err, "audio pause failed");
        }
    }

    pub fn stop(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;
        if let Err(err) = self.output.stop(&self.track) {
            tracing::warn!(error = %err, "audio stop failed");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn track(&self) -> &AudioTrack {
        &self.track
    }
}

impl<O: AudioOutput> Drop for AudioCue<O> {
    fn drop(&mut self) {
        self.stop();
    }
}
