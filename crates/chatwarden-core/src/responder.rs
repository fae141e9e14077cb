//! Reply-generation contract consumed by the dispatcher.
//!
//! The concrete implementation (including the Live/Fallback availability
//! machine) lives in the `chatwarden-ai` crate; the dispatcher only needs
//! the seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sentiment estimate for a piece of text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Sentiment {
    /// In `[1, 5]`.
    pub rating: u8,
    /// In `[0, 1]`.
    pub confidence: f32,
}

impl Sentiment {
    pub fn neutral() -> Self {
        Self {
            rating: 3,
            confidence: 0.5,
        }
    }
}

/// Generates natural-language replies.
///
/// Every method answers; failures inside the implementation degrade to
/// apologies or deterministic fallbacks rather than propagating.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Contextual reply for one user message.
    async fn respond(&self, user_id: &str, prompt: &str) -> String;

    /// Context-free completion for ad hoc testing.
    async fn generate_standalone(&self, prompt: &str) -> String;

    /// Sentiment estimate for arbitrary text.
    async fn analyze_sentiment(&self, text: &str) -> Sentiment;
}
