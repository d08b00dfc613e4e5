use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_NAME_LEN: usize = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("at least one participant is required")]
    Empty,
    #[error("name required")]
    EmptyName,
    #[error("name longer than {MAX_NAME_LEN} characters")]
    NameTooLong,
    #[error("name already taken: {0}")]
    DuplicateName(String),
    #[error("unknown participant: {0}")]
    UnknownName(String),
    #[error("cannot remove the last participant")]
    LastParticipant,
}

/// Ordered, de-duplicated list of participant display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Roster {
    names: Vec<String>,
}

impl Roster {
    pub fn new<I, S>(names: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roster = Self { names: Vec::new() };
        for name in names {
            roster.add(name.as_ref())?;
        }
        if roster.names.is_empty() {
            return Err(RosterError::Empty);
        }
        Ok(roster)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Appends a trimmed name. Returns the name as stored.
    pub fn add(&mut self, name: &str) -> Result<&str, RosterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(RosterError::NameTooLong);
        }
        if self.contains(name) {
            return Err(RosterError::DuplicateName(name.to_string()));
        }
        self.names.push(name.to_string());
        Ok(self.names.last().map(String::as_str).unwrap_or_default())
    }

    pub fn remove(&mut self, name: &str) -> Result<(), RosterError> {
        let index = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| RosterError::UnknownName(name.to_string()))?;
        if self.names.len() <= 1 {
            return Err(RosterError::LastParticipant);
        }
        self.names.remove(index);
        Ok(())
    }
}

impl TryFrom<Vec<String>> for Roster {
    type Error = RosterError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<Roster> for Vec<String> {
    fn from(roster: Roster) -> Self {
        roster.names
    }
}
