//! Global bot settings snapshot.

use serde::{Deserialize, Serialize};

/// Read-mostly global configuration.
///
/// A snapshot is fetched from the store once per inbound event; components
/// never cache it across events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// When false, no conversation context is read or written.
    pub context_awareness: bool,
    /// When false, the dispatcher never consults the moderation classifier.
    pub auto_moderation: bool,
    /// Number of recent messages handed to generation; windows hold at most
    /// twice this many.
    pub context_size: usize,
    /// Model identifier passed to the generation backend.
    pub nlp_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Prefix marking a message as a command invocation.
    pub command_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            context_awareness: true,
            auto_moderation: true,
            context_size: 10,
            nlp_model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 512,
            command_prefix: "!".to_string(),
        }
    }
}

impl Settings {
    /// Upper bound on stored window length.
    pub fn window_limit(&self) -> usize {
        self.context_size.saturating_mul(2)
    }
}
