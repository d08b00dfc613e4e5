use std::path::PathBuf;

use game_core::Roster;

/// Keeps the participant list across restarts when a path is configured.
#[derive(Debug, Clone, Default)]
pub struct RosterStore {
    path: Option<PathBuf>,
}

impl RosterStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub async fn load(&self) -> Option<Roster> {
        let path = self.path.as_ref()?;
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "could not read saved names");
                return None;
            }
        };
        match serde_json::from_slice::<Roster>(&bytes) {
            Ok(roster) => Some(roster),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring invalid saved names");
                None
            }
        }
    }

    pub async fn save(&self, roster: &Roster) {
        let Some(path) = &self.path else {
            return;
        };
        match serde_json::to_vec_pretty(roster) {
            Ok(json) => {
                if let Err(err) = tokio::fs::write(path, json).await {
                    tracing::warn!(path = %path.display(), error = %err, "persist error");
                }
            }
            Err(err) => tracing::warn!(error = %err, "could not encode names"),
        }
    }
}
