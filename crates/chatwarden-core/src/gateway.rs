//! Gateway contract: inbound events and per-message side-effect actions.
//!
//! Transport plumbing (connection lifecycle, reconnection, wire formats)
//! lives outside the core; the dispatcher only sees one delivered event plus
//! an actions handle scoped to that message.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Capability flags exposed by the gateway connection.
#[derive(Debug, Clone, Copy)]
pub struct GatewayCaps {
    /// Whether message bodies are readable at all. When false the dispatcher
    /// never inspects content and answers mentions/DMs with a fixed template.
    pub has_privileged_content: bool,
}

impl Default for GatewayCaps {
    fn default() -> Self {
        Self {
            has_privileged_content: true,
        }
    }
}

/// One inbound message event as delivered by the gateway adapter.
#[derive(Debug, Clone)]
pub struct GatewayEvent {
    pub author_id: String,
    pub author_name: Option<String>,
    pub is_bot_author: bool,
    pub content: String,
    pub is_mentioned: bool,
    pub is_dm: bool,
    /// Whether the message carries a guild context; member-level effects
    /// (timeout, kick, ban) require one.
    pub has_guild_context: bool,
}

impl GatewayEvent {
    pub fn new(author_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
            author_name: None,
            is_bot_author: false,
            content: content.into(),
            is_mentioned: false,
            is_dm: false,
            has_guild_context: false,
        }
    }

    pub fn with_author_name(mut self, name: impl Into<String>) -> Self {
        self.author_name = Some(name.into());
        self
    }

    pub fn from_bot(mut self) -> Self {
        self.is_bot_author = true;
        self
    }

    pub fn mentioned(mut self) -> Self {
        self.is_mentioned = true;
        self
    }

    pub fn dm(mut self) -> Self {
        self.is_dm = true;
        self
    }

    pub fn in_guild(mut self) -> Self {
        self.has_guild_context = true;
        self
    }
}

/// Side effects available for one delivered message.
///
/// Every call is failable; callers treat failures as logged, non-fatal
/// outcomes. Implementations must not retry internally on behalf of the core.
#[async_trait]
pub trait EventActions: Send + Sync {
    /// Reply in the channel the message arrived on.
    async fn reply(&self, text: &str) -> Result<()>;

    /// Send a private notice to the author.
    async fn reply_privately(&self, text: &str) -> Result<()>;

    /// Delete the offending message.
    async fn delete_message(&self) -> Result<()>;

    /// Time the author out for `duration`.
    async fn timeout_author(&self, duration: Duration, reason: &str) -> Result<()>;

    /// Kick the author from the guild.
    async fn kick_author(&self, reason: &str) -> Result<()>;

    /// Ban the author from the guild.
    async fn ban_author(&self, reason: &str) -> Result<()>;
}

/// Recording mock for unit tests.
#[cfg(test)]
pub mod mock {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Mutex;

    /// Everything the dispatcher or classifier did to one message.
    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedEffect {
        Reply(String),
        PrivateReply(String),
        Delete,
        Timeout { duration: Duration, reason: String },
        Kick(String),
        Ban(String),
    }

    /// An [`EventActions`] implementation that records effects and can be
    /// told to fail member-level effects (simulating missing permissions or
    /// absent guild context).
    pub struct RecordingActions {
        pub effects: Mutex<Vec<RecordedEffect>>,
        fail_effects: AtomicBool,
    }

    impl RecordingActions {
        pub fn new() -> Self {
            Self {
                effects: Mutex::new(Vec::new()),
                fail_effects: AtomicBool::new(false),
            }
        }

        /// Make delete/timeout/kick/ban fail while replies keep working.
        pub fn failing_effects() -> Self {
            let actions = Self::new();
            actions.fail_effects.store(true, Ordering::SeqCst);
            actions
        }

        pub async fn recorded(&self) -> Vec<RecordedEffect> {
            self.effects.lock().await.clone()
        }

        async fn record(&self, effect: RecordedEffect, is_member_effect: bool) -> Result<()> {
            if is_member_effect && self.fail_effects.load(Ordering::SeqCst) {
                return Err(anyhow!("missing permission"));
            }
            self.effects.lock().await.push(effect);
            Ok(())
        }
    }

    #[async_trait]
    impl EventActions for RecordingActions {
        async fn reply(&self, text: &str) -> Result<()> {
            self.record(RecordedEffect::Reply(text.to_string()), false).await
        }

        async fn reply_privately(&self, text: &str) -> Result<()> {
            self.record(RecordedEffect::PrivateReply(text.to_string()), false)
                .await
        }

        async fn delete_message(&self) -> Result<()> {
            self.record(RecordedEffect::Delete, true).await
        }

        async fn timeout_author(&self, duration: Duration, reason: &str) -> Result<()> {
            self.record(
                RecordedEffect::Timeout {
                    duration,
                    reason: reason.to_string(),
                },
                true,
            )
            .await
        }

        async fn kick_author(&self, reason: &str) -> Result<()> {
            self.record(RecordedEffect::Kick(reason.to_string()), true).await
        }

        async fn ban_author(&self, reason: &str) -> Result<()> {
            self.record(RecordedEffect::Ban(reason.to_string()), true).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{RecordedEffect, RecordingActions};
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = GatewayEvent::new("user-1", "hello")
            .with_author_name("Alice")
            .mentioned()
            .in_guild();
        assert_eq!(event.author_id, "user-1");
        assert!(event.is_mentioned);
        assert!(!event.is_dm);
        assert!(event.has_guild_context);
        assert!(!event.is_bot_author);
    }

    #[tokio::test]
    async fn test_recording_actions() {
        let actions = RecordingActions::new();
        actions.reply("hi").await.unwrap();
        actions.delete_message().await.unwrap();

        let recorded = actions.recorded().await;
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0], RecordedEffect::Reply("hi".to_string()));
        assert_eq!(recorded[1], RecordedEffect::Delete);
    }

    #[tokio::test]
    async fn test_failing_effects_still_allow_replies() {
        let actions = RecordingActions::failing_effects();
        assert!(actions.delete_message().await.is_err());
        assert!(actions.timeout_author(Duration::from_secs(1), "x").await.is_err());
        assert!(actions.reply("still works").await.is_ok());
    }
}
