//! Lifecycle events emitted by the sync engine

use std::fmt;

use serde::Serialize;

/// What a completed sync cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SyncAction {
    /// The checkout was absent and has been cloned
    Cloned,
    /// The checkout was present and has been pulled
    Updated,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cloned => write!(f, "Cloned"),
            Self::Updated => write!(f, "Updated"),
        }
    }
}

/// Immutable record of one completed sync cycle.
///
/// Displays as `"<Action> <repository>"`, which is what the default webhook
/// template sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    repository: String,
    branch: String,
    action: SyncAction,
}

impl Event {
    pub fn new(repository: impl Into<String>, branch: impl Into<String>, action: SyncAction) -> Self {
        Self {
            repository: repository.into(),
            branch: branch.into(),
            action,
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn action(&self) -> SyncAction {
        self.action
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action, self.repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_display() {
        assert_eq!(SyncAction::Cloned.to_string(), "Cloned");
        assert_eq!(SyncAction::Updated.to_string(), "Updated");
    }

    #[test]
    fn test_display_is_action_then_repository() {
        let event = Event::new("https://example.com/org/site.git", "main", SyncAction::Cloned);
        assert_eq!(event.to_string(), "Cloned https://example.com/org/site.git");
    }
}
