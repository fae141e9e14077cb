//! Conversation models for bounded per-user context.

use serde::{Deserialize, Serialize};

/// Role of a message inside a conversation window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContextRole {
    User,
    Assistant,
    System,
}

/// Single message in a conversation window.
///
/// Timestamps are non-decreasing within a conversation; appends clamp the
/// new timestamp to the last stored one when the wall clock steps backward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextMessage {
    pub role: ContextRole,
    pub content: String,
    /// Milliseconds since epoch.
    pub timestamp: i64,
}

impl ContextMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(ContextRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(ContextRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(ContextRole::System, content)
    }

    fn with_role(role: ContextRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// A persisted conversation: at most one active per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub window: Vec<ContextMessage>,
    pub active: bool,
    /// Milliseconds since epoch of the last window mutation.
    pub last_updated: i64,
}

impl Conversation {
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            window: Vec::new(),
            active: true,
            last_updated: now,
        }
    }

    /// Append a message, clamping its timestamp so the window stays ordered.
    pub fn push(&mut self, mut message: ContextMessage) {
        if let Some(last) = self.window.last() {
            if message.timestamp < last.timestamp {
                message.timestamp = last.timestamp;
            }
        }
        self.last_updated = message.timestamp.max(self.last_updated);
        self.window.push(message);
    }

    /// Keep only the most recent `max` messages.
    pub fn truncate_to(&mut self, max: usize) {
        if self.window.len() > max {
            let drop = self.window.len() - max;
            self.window.drain(..drop);
        }
    }
}
