use serde::{Deserialize, Serialize};

use crate::timer::Countdown;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseTag {
    Idle,
    Spinning,
    Revealed,
    Waiting,
    Countdown,
    Modal,
}

/// Which label the pick button shows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
    RoundComplete,
    FirstPick,
    NextPlayer,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Wait,
    Countdown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Wait,
    Normal,
    Warning,
    Urgent,
    Critical,
}

impl Urgency {
    pub fn of(kind: TimerKind, remaining: u32) -> Self {
        match (kind, remaining) {
            (TimerKind::Wait, _) => Urgency::Wait,
            (TimerKind::Countdown, 0..=3) => Urgency::Critical,
            (TimerKind::Countdown, 4..=5) => Urgency::Urgent,
            (TimerKind::Countdown, 6..=10) => Urgency::Warning,
            (TimerKind::Countdown, _) => Urgency::Normal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerView {
    pub kind: TimerKind,
    pub remaining: u32,
    pub total: u32,
    pub progress: f32,
    pub urgency: Urgency,
}

impl TimerView {
    pub fn new(kind: TimerKind, timer: &Countdown) -> Self {
        Self {
            kind,
            remaining: timer.remaining(),
            total: timer.total(),
            progress: timer.progress(),
            urgency: Urgency::of(kind, timer.remaining()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameView {
    pub phase: PhaseTag,
    pub target_name: Option<String>,
    pub current_name: Option<String>,
    /// Keep the drawn name visible in the animation.
    pub show_result: bool,
    /// Names the animation cycles through.
    pub reel_names: Vec<String>,
    pub available: Vec<String>,
    pub remaining: usize,
    pub picked: Vec<String>,
    pub picked_count: usize,
    pub total_names: usize,
    pub progress: f32,
    pub protected: Vec<String>,
    pub round: u32,
    pub can_protect: bool,
    pub pick_enabled: bool,
    pub can_continue: bool,
    pub is_round_complete: bool,
    pub is_game_complete: bool,
    pub prompt: Prompt,
    pub show_current_player: bool,
    pub timer: Option<TimerView>,
    pub audio_playing: bool,
}
