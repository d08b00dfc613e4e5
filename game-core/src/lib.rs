pub mod audio;
pub mod config;
pub mod engine;
pub mod orchestrator;
pub mod roster;
pub mod timer;
pub mod view;

pub use audio::{AudioCue, AudioError, AudioOutput, AudioTrack};
pub use config::GameConfig;
pub use engine::{PickerError, SelectionEngine};
pub use orchestrator::{Effect, Event, Intent, Orchestrator, Phase};
pub use roster::{Roster, RosterError};
pub use timer::{Countdown, Tick};
pub use view::{GameView, PhaseTag, Prompt, TimerKind, TimerView, Urgency};
