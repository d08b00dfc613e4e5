//! Startup configuration read from the environment.
//!
//! - `BIND_ADDR`: listen address, default `0.0.0.0:3000`
//! - `PERSIST_PATH`: JSON file holding the participant list; in-memory when unset
//! - `PICKER_NAMES`: comma-separated default participants
//! - `WAIT_SECS`, `COUNTDOWN_SECS`, `SETTLE_MS`: turn timings
//! - `AUDIO_SRC`, `AUDIO_VOLUME`: countdown music
//! - `PICKER_SEED`: fixed seed for reproducible draws

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use game_core::{AudioTrack, GameConfig};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_NAMES: &[&str] = &[
    "Anna", "Bram", "Cas", "Daan", "Eva", "Fleur", "Gijs", "Hanna", "Ivo", "Julia",
];

#[derive(Debug, Clone)]
pub struct PickerConfig {
    pub bind_addr: String,
    pub persist_path: Option<PathBuf>,
    pub default_names: Vec<String>,
    pub game: GameConfig,
    pub audio: AudioTrack,
    pub seed: Option<u64>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            persist_path: None,
            default_names: DEFAULT_NAMES.iter().map(|n| n.to_string()).collect(),
            game: GameConfig::default(),
            audio: AudioTrack::default(),
            seed: None,
        }
    }
}

impl PickerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let default_track = AudioTrack::default();

        let default_names = lookup("PICKER_NAMES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|names| !names.is_empty())
            .unwrap_or(defaults.default_names);

        let game = GameConfig {
            wait_secs: parse_secs(&lookup, "WAIT_SECS", defaults.game.wait_secs),
            countdown_secs: parse_secs(&lookup, "COUNTDOWN_SECS", defaults.game.countdown_secs),
            settle: Duration::from_millis(parse_or(
                &lookup,
                "SETTLE_MS",
                defaults.game.settle.as_millis() as u64,
            )),
        };

        let audio = AudioTrack::new(
            lookup("AUDIO_SRC").unwrap_or(default_track.src),
            parse_or(&lookup, "AUDIO_VOLUME", default_track.volume),
        );

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            persist_path: lookup("PERSIST_PATH").map(PathBuf::from),
            default_names,
            game,
            audio,
            seed: lookup("PICKER_SEED").and_then(|v| v.parse().ok()),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "unparseable setting, using default");
            default
        }),
        None => default,
    }
}

/// A zero-length timer would never complete, so zero falls back too.
fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> u32 {
    match NonZeroU32::new(default) {
        Some(fallback) => parse_or(lookup, key, fallback).get(),
        None => default,
    }
}
