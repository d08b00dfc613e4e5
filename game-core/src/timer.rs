use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The countdown was stopped; nothing changed.
    Ignored,
    /// One second elapsed; seconds left.
    Running(u32),
    /// Reached zero on this tick and stopped.
    Completed,
}

/// Whole-second countdown without its own clock: the caller ticks it once a
/// second and completion is the return value of the last tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    initial: u32,
    total: u32,
    remaining: u32,
    running: bool,
}

impl Countdown {
    pub fn new(initial: u32) -> Self {
        Self {
            initial,
            total: initial,
            remaining: initial,
            running: false,
        }
    }

    /// Starts counting. Returns `false` when already running or nothing is
    /// left to count.
    pub fn start(&mut self) -> bool {
        if self.running || self.remaining == 0 {
            return false;
        }
        self.running = true;
        true
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Stops and restores the initial duration.
    pub fn reset(&mut self) {
        self.reset_to(self.initial);
    }

    /// Stops and sets a new duration for the next run.
    pub fn reset_to(&mut self, secs: u32) {
        self.running = false;
        self.total = secs;
        self.remaining = secs;
    }

    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Ignored;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            Tick::Completed
        } else {
            Tick::Running(self.remaining)
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Duration of the current run, used for progress rendering.
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn initial(&self) -> u32 {
        self.initial
    }

    /// Fraction of the run still left, `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.remaining as f32 / self.total as f32
        }
    }
}
