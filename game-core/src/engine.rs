use rand::Rng;
use thiserror::Error;

use crate::roster::Roster;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PickerError {
    #[error("a draw is already pending")]
    DrawAlreadyPending,
    #[error("no names available in this round")]
    NoNamesAvailable,
    #[error("no pending selection to confirm")]
    NoPendingSelection,
    #[error("round cannot advance")]
    InvalidRoundAdvance,
}

/// Draws without replacement. Round 1 draws from every participant, later
/// rounds only from those whose gift is not protected. A draw stays pending
/// until confirmed so the picked list holds still during the reveal.
#[derive(Debug, Clone)]
pub struct SelectionEngine<R> {
    participants: Roster,
    available: Vec<String>,
    picked: Vec<String>,
    pending: Option<String>,
    current: Option<String>,
    protected: Vec<String>,
    round: u32,
    rng: R,
}

impl<R> SelectionEngine<R> {
    pub fn new(participants: Roster, rng: R) -> Self {
        Self {
            available: participants.names().to_vec(),
            participants,
            picked: Vec::new(),
            pending: None,
            current: None,
            protected: Vec::new(),
            round: 1,
            rng,
        }
    }

    /// Commits the pending selection to the picked list and makes it the
    /// current name.
    pub fn confirm(&mut self) -> Result<&str, PickerError> {
        let name = self.pending.take().ok_or(PickerError::NoPendingSelection)?;
        self.picked.push(name.clone());
        Ok(self.current.insert(name).as_str())
    }

    /// Protects the current player's gift. Returns `true` only when the
    /// protected set actually grew.
    pub fn protect_current(&mut self) -> bool {
        match &self.current {
            Some(name) if !self.protected.contains(name) => {
                self.protected.push(name.clone());
                true
            }
            _ => false,
        }
    }

    pub fn advance_round(&mut self) -> Result<u32, PickerError> {
        if !self.is_round_complete() || self.is_game_complete() {
            return Err(PickerError::InvalidRoundAdvance);
        }
        self.round += 1;
        self.available = self.unprotected_participants().cloned().collect();
        self.picked.clear();
        Ok(self.round)
    }

    pub fn reset(&mut self) {
        self.available = self.participants.names().to_vec();
        self.picked.clear();
        self.pending = None;
        self.current = None;
        self.protected.clear();
        self.round = 1;
    }

    /// Starts over with a different participant list, keeping the random
    /// source.
    pub fn restart_with(&mut self, participants: Roster) {
        self.participants = participants;
        self.reset();
    }

    pub fn is_round_complete(&self) -> bool {
        self.available.is_empty() && self.pending.is_none()
    }

    pub fn unprotected_participants(&self) -> impl Iterator<Item = &String> + '_ {
        self.participants
            .names()
            .iter()
            .filter(move |name| !self.protected.contains(*name))
    }

    pub fn unprotected_count(&self) -> usize {
        self.unprotected_participants().count()
    }

    pub fn is_game_complete(&self) -> bool {
        self.unprotected_participants().next().is_none()
    }

    pub fn can_protect(&self) -> bool {
        self.round > 1
            && self
                .current
                .as_ref()
                .is_some_and(|name| !self.protected.contains(name))
    }

    pub fn participants(&self) -> &[String] {
        self.participants.names()
    }

    pub fn roster(&self) -> &Roster {
        &self.participants
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn picked(&self) -> &[String] {
        &self.picked
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn protected(&self) -> &[String] {
        &self.protected
    }

    pub fn round(&self) -> u32 {
        self.round
    }
}

impl<R: Rng> SelectionEngine<R> {
    /// Removes a uniformly random name from the available pool and holds it
    /// as the pending selection.
    pub fn draw(&mut self) -> Result<&str, PickerError> {
        if self.pending.is_some() {
            return Err(PickerError::DrawAlreadyPending);
        }
        if self.available.is_empty() {
            return Err(PickerError::NoNamesAvailable);
        }
        let index = self.rng.gen_range(0..self.available.len());
        let name = self.available.remove(index);
        Ok(self.pending.insert(name).as_str())
    }
}
