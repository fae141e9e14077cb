//! NLP responder: contextual replies with a one-way degradation path.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use chatwarden_core::{
    ChatStore, ContextManager, ContextMessage, ContextRole, Responder, Sentiment, Settings,
};

use crate::availability::NlpAvailability;
use crate::fallback::FallbackResponder;
use crate::llm::{CompletionBackend, CompletionRequest, Message, Role};

const SYSTEM_PROMPT: &str =
    "You are a helpful, concise assistant in a chat server. Answer in a friendly tone \
     and keep replies short enough to read in a chat window.";

const SENTIMENT_PROMPT: &str =
    "Rate the sentiment of the user's message. Respond with only a JSON object of the form \
     {\"rating\": <integer 1-5>, \"confidence\": <number 0-1>} and nothing else.";

const TRANSIENT_APOLOGY: &str =
    "I'm having trouble reaching my language model right now. Please try again in a moment.";

/// Generates replies, owning the Live/Fallback availability machine.
pub struct NlpResponder {
    backend: Arc<dyn CompletionBackend>,
    store: Arc<dyn ChatStore>,
    context: ContextManager,
    availability: Arc<NlpAvailability>,
    fallback: FallbackResponder,
}

impl NlpResponder {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        store: Arc<dyn ChatStore>,
        availability: Arc<NlpAvailability>,
    ) -> Self {
        let context = ContextManager::new(store.clone());
        Self {
            backend,
            store,
            context,
            availability,
            fallback: FallbackResponder::new(),
        }
    }

    pub fn availability(&self) -> &NlpAvailability {
        &self.availability
    }

    pub fn context(&self) -> &ContextManager {
        &self.context
    }

    fn settings(&self) -> Settings {
        match self.store.get_settings() {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "settings unavailable, using defaults");
                Settings::default()
            }
        }
    }

    /// Record the permanent demotion on a quota/rate-limit failure.
    fn demote(&self, cause: &crate::error::BackendError) {
        if self.availability.demote() {
            error!(error = %cause, "generation backend exhausted, switching to fallback mode permanently");
        }
    }

    /// Answer from the deterministic matcher, recording the assistant turn.
    fn fallback_reply(&self, user_id: &str, prompt: &str) -> String {
        let text = self.fallback.reply(prompt);
        if let Err(e) = self.context.append_assistant(user_id, &text) {
            warn!(user_id, error = %e, "failed to persist assistant turn");
        }
        text
    }

    fn to_backend_message(message: &ContextMessage) -> Message {
        let role = match message.role {
            ContextRole::User => Role::User,
            ContextRole::Assistant => Role::Assistant,
            ContextRole::System => Role::System,
        };
        Message {
            role,
            content: message.content.clone(),
        }
    }

    fn conversation_messages(&self, user_id: &str, prompt: &str) -> Vec<Message> {
        let mut messages = match self.context.format_for_generation(user_id, SYSTEM_PROMPT) {
            Ok(formatted) => formatted.iter().map(Self::to_backend_message).collect(),
            Err(e) => {
                warn!(user_id, error = %e, "context unavailable, generating without history");
                vec![Message::system(SYSTEM_PROMPT)]
            }
        };

        // With context awareness off (or a persistence hiccup) the window
        // does not contain the current prompt; the backend still needs it.
        let ends_with_prompt = messages
            .last()
            .map(|m| m.role == Role::User && m.content == prompt)
            .unwrap_or(false);
        if !ends_with_prompt {
            messages.push(Message::user(prompt));
        }
        messages
    }
}

#[async_trait]
impl Responder for NlpResponder {
    async fn respond(&self, user_id: &str, prompt: &str) -> String {
        // The user turn is recorded first, even in fallback mode.
        if let Err(e) = self.context.append_user(user_id, prompt) {
            warn!(user_id, error = %e, "failed to persist user turn");
        }

        if !self.availability.is_live() {
            return self.fallback_reply(user_id, prompt);
        }

        let settings = self.settings();
        let request = CompletionRequest::new(
            settings.nlp_model.clone(),
            self.conversation_messages(user_id, prompt),
        )
        .with_temperature(settings.temperature)
        .with_max_tokens(settings.max_tokens);

        match self.backend.complete(request).await {
            Ok(text) => {
                if let Err(e) = self.context.append_assistant(user_id, &text) {
                    warn!(user_id, error = %e, "failed to persist assistant turn");
                }
                text
            }
            Err(e) if e.demotes() => {
                self.demote(&e);
                // Answer this same call from the fallback path; no retry.
                self.fallback_reply(user_id, prompt)
            }
            Err(e) => {
                warn!(user_id, error = %e, "transient backend failure");
                TRANSIENT_APOLOGY.to_string()
            }
        }
    }

    async fn generate_standalone(&self, prompt: &str) -> String {
        if !self.availability.is_live() {
            return self.fallback.reply(prompt);
        }

        let settings = self.settings();
        let request = CompletionRequest::new(
            settings.nlp_model.clone(),
            vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)],
        )
        .with_temperature(settings.temperature)
        .with_max_tokens(settings.max_tokens);

        match self.backend.complete(request).await {
            Ok(text) => text,
            Err(e) if e.demotes() => {
                self.demote(&e);
                self.fallback.reply(prompt)
            }
            Err(e) => {
                warn!(error = %e, "transient backend failure");
                TRANSIENT_APOLOGY.to_string()
            }
        }
    }

    async fn analyze_sentiment(&self, text: &str) -> Sentiment {
        if !self.availability.is_live() {
            return self.fallback.sentiment(text);
        }

        let settings = self.settings();
        let request = CompletionRequest::new(
            settings.nlp_model.clone(),
            vec![Message::system(SENTIMENT_PROMPT), Message::user(text)],
        )
        .with_max_tokens(64);

        match self.backend.complete(request).await {
            Ok(raw) => match parse_sentiment(&raw) {
                Some(sentiment) => sentiment,
                None => {
                    info!("unparseable sentiment response, using keyword estimate");
                    self.fallback.sentiment(text)
                }
            },
            Err(e) if e.demotes() => {
                self.demote(&e);
                self.fallback.sentiment(text)
            }
            Err(e) => {
                warn!(error = %e, "transient backend failure");
                self.fallback.sentiment(text)
            }
        }
    }
}

#[derive(Deserialize)]
struct SentimentPayload {
    rating: f32,
    confidence: f32,
}

/// Extract and clamp a `{rating, confidence}` object from model output.
fn parse_sentiment(raw: &str) -> Option<Sentiment> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    let payload: SentimentPayload = serde_json::from_str(&raw[start..=end]).ok()?;

    Some(Sentiment {
        rating: payload.rating.round().clamp(1.0, 5.0) as u8,
        confidence: payload.confidence.clamp(0.0, 1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::llm::MockBackend;
    use chatwarden_core::MemoryStore;

    fn responder_with(
        backend: MockBackend,
        availability: NlpAvailability,
    ) -> (NlpResponder, Arc<MemoryStore>, Arc<MockBackend>) {
        let store = Arc::new(MemoryStore::new());
        let backend = Arc::new(backend);
        let responder = NlpResponder::new(
            backend.clone(),
            store.clone(),
            Arc::new(availability),
        );
        (responder, store, backend)
    }

    fn window_of(store: &MemoryStore, user_id: &str) -> Vec<ContextMessage> {
        store
            .get_active_conversation(user_id)
            .unwrap()
            .map(|c| c.window)
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_live_success_appends_both_turns() {
        let backend = MockBackend::from_steps(vec![Ok("sure thing".to_string())]);
        let (responder, store, _) = responder_with(backend, NlpAvailability::live());

        let reply = responder.respond("user-1", "can you help?").await;
        assert_eq!(reply, "sure thing");

        let window = window_of(&store, "user-1");
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].role, ContextRole::User);
        assert_eq!(window[1].role, ContextRole::Assistant);
        assert_eq!(window[1].content, "sure thing");
    }

    #[tokio::test]
    async fn test_quota_failure_demotes_and_still_answers() {
        let backend =
            MockBackend::from_steps(vec![Err(BackendError::Quota("spent".to_string()))]);
        let (responder, _, backend) = responder_with(backend, NlpAvailability::live());

        let reply = responder.respond("user-1", "hello").await;
        // The triggering call still gets a non-empty deterministic answer.
        assert!(!reply.is_empty());
        assert!(!responder.availability().is_live());

        // A subsequent call makes no backend attempt and answers the same way.
        let again = responder.respond("user-1", "hello").await;
        assert_eq!(again, reply);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_also_demotes() {
        let backend = MockBackend::from_steps(vec![Err(BackendError::RateLimited {
            retry_after_secs: Some(10),
        })]);
        let (responder, _, _) = responder_with(backend, NlpAvailability::live());

        responder.respond("user-1", "hello").await;
        assert!(!responder.availability().is_live());
    }

    #[tokio::test]
    async fn test_transient_failure_apologizes_without_state_change() {
        let backend =
            MockBackend::from_steps(vec![Err(BackendError::Transient("503".to_string()))]);
        let (responder, store, _) = responder_with(backend, NlpAvailability::live());

        let reply = responder.respond("user-1", "hello").await;
        assert_eq!(reply, TRANSIENT_APOLOGY);
        assert!(responder.availability().is_live());

        // The user turn was recorded; no assistant turn was.
        let window = window_of(&store, "user-1");
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].role, ContextRole::User);
    }

    #[tokio::test]
    async fn test_fallback_appends_user_turn_first() {
        let backend = MockBackend::new();
        let (responder, store, backend) = responder_with(backend, NlpAvailability::fallback());

        let reply = responder.respond("user-1", "hello").await;
        assert!(!reply.is_empty());
        assert_eq!(backend.calls(), 0);

        let window = window_of(&store, "user-1");
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].role, ContextRole::User);
        assert_eq!(window[0].content, "hello");
        assert_eq!(window[1].role, ContextRole::Assistant);
    }

    #[tokio::test]
    async fn test_standalone_is_deterministic_in_fallback() {
        let backend = MockBackend::new();
        let (responder, _, backend) = responder_with(backend, NlpAvailability::fallback());

        let first = responder.generate_standalone("hello").await;
        let second = responder.generate_standalone("hello").await;
        assert_eq!(first, second);
        assert!(!first.is_empty());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_standalone_quota_failure_falls_back_same_call() {
        let backend =
            MockBackend::from_steps(vec![Err(BackendError::Quota("spent".to_string()))]);
        let (responder, _, backend) = responder_with(backend, NlpAvailability::live());

        let reply = responder.generate_standalone("hello").await;
        assert!(!reply.is_empty());
        assert_ne!(reply, TRANSIENT_APOLOGY);
        assert_eq!(backend.calls(), 1);
        assert!(!responder.availability().is_live());
    }

    #[tokio::test]
    async fn test_sentiment_live_parses_and_clamps() {
        let backend = MockBackend::from_steps(vec![Ok(
            r#"{"rating": 9, "confidence": 1.4}"#.to_string()
        )]);
        let (responder, _, _) = responder_with(backend, NlpAvailability::live());

        let sentiment = responder.analyze_sentiment("superb").await;
        assert_eq!(sentiment.rating, 5);
        assert_eq!(sentiment.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_sentiment_unparseable_uses_keyword_estimate() {
        let backend = MockBackend::from_steps(vec![Ok("no json here".to_string())]);
        let (responder, _, _) = responder_with(backend, NlpAvailability::live());

        let sentiment = responder.analyze_sentiment("neutral words only").await;
        assert_eq!(sentiment, Sentiment::neutral());
        assert!(responder.availability().is_live());
    }

    #[tokio::test]
    async fn test_sentiment_in_fallback_counts_keywords() {
        let backend = MockBackend::new();
        let (responder, _, backend) = responder_with(backend, NlpAvailability::fallback());

        let sentiment = responder.analyze_sentiment("great great awesome day").await;
        assert!(sentiment.rating > 3);
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_parse_sentiment_extracts_embedded_json() {
        let raw = "Here you go: {\"rating\": 2, \"confidence\": 0.6} hope that helps";
        let sentiment = parse_sentiment(raw).unwrap();
        assert_eq!(sentiment.rating, 2);
        assert!((sentiment.confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_parse_sentiment_rejects_garbage() {
        assert!(parse_sentiment("not json").is_none());
        assert!(parse_sentiment("{\"rating\": \"x\"}").is_none());
    }
}
