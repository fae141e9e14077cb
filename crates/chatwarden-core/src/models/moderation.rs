//! Moderation action log entries.

use serde::{Deserialize, Serialize};

/// Kind of moderation action taken against a user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModerationActionKind {
    Warn,
    Mute,
    Kick,
    Ban,
}

impl ModerationActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Mute => "mute",
            Self::Kick => "kick",
            Self::Ban => "ban",
        }
    }
}

impl std::fmt::Display for ModerationActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only moderation record, written before the side effect is attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationAction {
    pub id: String,
    pub user_id: String,
    pub kind: ModerationActionKind,
    pub reason: String,
    /// Milliseconds since epoch.
    pub created_at: i64,
}

impl ModerationAction {
    pub fn new(
        user_id: impl Into<String>,
        kind: ModerationActionKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            kind,
            reason: reason.into(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
