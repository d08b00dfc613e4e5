use std::time::Duration;

pub const WAIT_SECS: u32 = 5;
pub const COUNTDOWN_SECS: u32 = 15;
pub const SETTLE: Duration = Duration::from_millis(1000);

/// Turn timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// "Get ready" countdown after the name is revealed.
    pub wait_secs: u32,
    /// Time the player has to unwrap or steal; the music plays during it.
    pub countdown_secs: u32,
    /// Pause between the reveal and the wait countdown.
    pub settle: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            wait_secs: WAIT_SECS,
            countdown_secs: COUNTDOWN_SECS,
            settle: SETTLE,
        }
    }
}
