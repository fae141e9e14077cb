//! Shared data model for ChatWarden.

mod conversation;
mod moderation;
mod settings;

pub use conversation::{ContextMessage, ContextRole, Conversation};
pub use moderation::{ModerationAction, ModerationActionKind};
pub use settings::Settings;

use serde::{Deserialize, Serialize};

/// A chat user, created on the first observed message from a new author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
    /// Timestamp (milliseconds since epoch) of the first observed message.
    pub first_seen: i64,
}

impl User {
    pub fn new(id: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            id: id.into(),
            display_name,
            first_seen: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new("user-1", Some("Alice".to_string()));
        assert_eq!(user.id, "user-1");
        assert_eq!(user.display_name.as_deref(), Some("Alice"));
        assert!(user.first_seen > 0);
    }
}
