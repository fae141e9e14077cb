//! Content-safety scorer backed by the OpenAI moderation endpoint.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use chatwarden_core::{Category, CategoryScore, CategoryScores, ContentScorer};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// HTTP implementation of the [`ContentScorer`] contract.
pub struct OpenAiModerationScorer {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiModerationScorer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Serialize)]
struct ModerationRequest<'a> {
    input: &'a str,
}

#[derive(Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationResult>,
}

#[derive(Deserialize)]
struct ModerationResult {
    categories: HashMap<String, bool>,
    category_scores: HashMap<String, f32>,
}

fn into_scores(result: &ModerationResult) -> CategoryScores {
    let scores = Category::ALL
        .iter()
        .map(|category| {
            let name = category.as_str();
            CategoryScore {
                category: *category,
                flagged: result.categories.get(name).copied().unwrap_or(false),
                score: result.category_scores.get(name).copied().unwrap_or(0.0),
            }
        })
        .collect();
    CategoryScores { scores }
}

#[async_trait]
impl ContentScorer for OpenAiModerationScorer {
    async fn score(&self, text: &str) -> Result<CategoryScores> {
        let response = self
            .client
            .post(format!("{}/moderations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&ModerationRequest { input: text })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("moderation request failed: {}", response.status()));
        }

        let parsed: ModerationResponse = response.json().await?;
        let result = parsed
            .results
            .first()
            .ok_or_else(|| anyhow!("empty moderation response"))?;

        Ok(into_scores(result))
    }
}
