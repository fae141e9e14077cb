//! Moderation severity classifier.
//!
//! Maps content-safety scores onto a discrete action. The auto-moderation
//! gate lives in the dispatcher; this module only decides and enforces.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::gateway::{EventActions, GatewayEvent};
use crate::models::{ModerationAction, ModerationActionKind};
use crate::store::ChatStore;

/// Fixed content-safety taxonomy shared with the scorer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "harassment")]
    Harassment,
    #[serde(rename = "harassment/threatening")]
    HarassmentThreatening,
    #[serde(rename = "hate")]
    Hate,
    #[serde(rename = "hate/threatening")]
    HateThreatening,
    #[serde(rename = "self-harm")]
    SelfHarm,
    #[serde(rename = "sexual")]
    Sexual,
    #[serde(rename = "sexual/minors")]
    SexualMinors,
    #[serde(rename = "violence")]
    Violence,
    #[serde(rename = "violence/graphic")]
    ViolenceGraphic,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Harassment,
        Category::HarassmentThreatening,
        Category::Hate,
        Category::HateThreatening,
        Category::SelfHarm,
        Category::Sexual,
        Category::SexualMinors,
        Category::Violence,
        Category::ViolenceGraphic,
    ];

    /// Categories that escalate straight to a mute regardless of score.
    pub fn is_high_severity(&self) -> bool {
        matches!(
            self,
            Category::HarassmentThreatening
                | Category::HateThreatening
                | Category::SelfHarm
                | Category::SexualMinors
                | Category::ViolenceGraphic
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Harassment => "harassment",
            Category::HarassmentThreatening => "harassment/threatening",
            Category::Hate => "hate",
            Category::HateThreatening => "hate/threatening",
            Category::SelfHarm => "self-harm",
            Category::Sexual => "sexual",
            Category::SexualMinors => "sexual/minors",
            Category::Violence => "violence",
            Category::ViolenceGraphic => "violence/graphic",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-category score reported by the content-safety scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub flagged: bool,
    /// In `[0, 1]`.
    pub score: f32,
}

/// Full scorer output for one message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryScores {
    pub scores: Vec<CategoryScore>,
}

impl CategoryScores {
    pub fn flagged(&self) -> impl Iterator<Item = &CategoryScore> {
        self.scores.iter().filter(|s| s.flagged)
    }
}

/// External content-safety scorer.
#[async_trait]
pub trait ContentScorer: Send + Sync {
    async fn score(&self, text: &str) -> Result<CategoryScores>;
}

/// Classifier outcome for one message; absent means monitor only.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub kind: ModerationActionKind,
    pub flagged: Vec<Category>,
    pub max_score: f32,
}

impl Verdict {
    /// Comma-joined flagged category names, used as the recorded reason.
    pub fn reason(&self) -> String {
        self.flagged
            .iter()
            .map(Category::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Duration of the timeout applied on a mute verdict.
pub const MUTE_DURATION: Duration = Duration::from_secs(10 * 60);

const WARN_THRESHOLD: f32 = 0.7;
const MUTE_THRESHOLD: f32 = 0.9;

const WARN_NOTICE: &str =
    "Your recent message was removed for violating the server rules. Please keep it civil.";
const MUTE_NOTICE: &str =
    "Your recent message violated the server rules and you have been timed out for 10 minutes.";

/// Maps scorer output to an action and applies it.
pub struct ModerationClassifier {
    scorer: Arc<dyn ContentScorer>,
    store: Arc<dyn ChatStore>,
}

impl ModerationClassifier {
    pub fn new(scorer: Arc<dyn ContentScorer>, store: Arc<dyn ChatStore>) -> Self {
        Self { scorer, store }
    }

    /// Pure decision policy over one scorer report.
    ///
    /// No flagged category yields no verdict. Otherwise a high-severity flag
    /// or a max score above 0.9 mutes, a max score above 0.7 warns, and
    /// anything lower is monitor-only.
    pub fn decide(scores: &CategoryScores) -> Option<Verdict> {
        let flagged: Vec<&CategoryScore> = scores.flagged().collect();
        if flagged.is_empty() {
            return None;
        }

        let max_score = flagged.iter().map(|s| s.score).fold(0.0_f32, f32::max);
        let high_severity = flagged.iter().any(|s| s.category.is_high_severity());
        let categories: Vec<Category> = flagged.iter().map(|s| s.category).collect();

        let kind = if high_severity || max_score > MUTE_THRESHOLD {
            ModerationActionKind::Mute
        } else if max_score > WARN_THRESHOLD {
            ModerationActionKind::Warn
        } else {
            return None;
        };

        Some(Verdict {
            kind,
            flagged: categories,
            max_score,
        })
    }

    /// Score `content` and decide. Only called by the dispatcher when
    /// auto-moderation is enabled.
    pub async fn classify(&self, content: &str) -> Result<Option<Verdict>> {
        let scores = self.scorer.score(content).await?;
        Ok(Self::decide(&scores))
    }

    /// Record the action, then attempt the side effects.
    ///
    /// The record is written first and remains authoritative even when every
    /// effect fails; effect failures are logged and never propagated.
    pub async fn enforce(
        &self,
        verdict: &Verdict,
        event: &GatewayEvent,
        actions: &dyn EventActions,
    ) -> Result<()> {
        let record = ModerationAction::new(&event.author_id, verdict.kind, verdict.reason());
        self.store.record_moderation_action(&record)?;
        info!(
            user_id = %event.author_id,
            kind = %verdict.kind,
            reason = %record.reason,
            "moderation action recorded"
        );

        if let Err(e) = actions.delete_message().await {
            warn!(user_id = %event.author_id, error = %e, "failed to delete message");
        }

        match verdict.kind {
            ModerationActionKind::Warn => {
                if let Err(e) = actions.reply_privately(WARN_NOTICE).await {
                    warn!(user_id = %event.author_id, error = %e, "failed to deliver warn notice");
                }
            }
            ModerationActionKind::Mute => {
                if !event.has_guild_context {
                    warn!(user_id = %event.author_id, "no guild context, timeout skipped");
                } else if let Err(e) = actions.timeout_author(MUTE_DURATION, &record.reason).await {
                    warn!(user_id = %event.author_id, error = %e, "failed to timeout author");
                }
                if let Err(e) = actions.reply_privately(MUTE_NOTICE).await {
                    warn!(user_id = %event.author_id, error = %e, "failed to deliver mute notice");
                }
            }
            // Kick and ban are operator-initiated; the classifier never
            // produces them.
            ModerationActionKind::Kick | ModerationActionKind::Ban => {}
        }

        Ok(())
    }
}
