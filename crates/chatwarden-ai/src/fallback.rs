//! Deterministic offline replies and sentiment.
//!
//! Everything here is pure and total over lower-cased input: the same text
//! always produces the same output, with no I/O and no shared state.

use chatwarden_core::Sentiment;

const GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "howdy", "greetings"];
const GREETING_PHRASES: &[&str] = &["good morning", "good afternoon", "good evening"];
const FAREWELL_WORDS: &[&str] = &["bye", "goodbye", "goodnight"];

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "love", "awesome", "excellent", "happy", "nice", "amazing", "wonderful",
    "fantastic", "thanks", "thank", "cool", "best", "perfect",
];
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "hate", "awful", "horrible", "sad", "angry", "worst", "annoying", "broken",
    "disappointed", "useless", "slow", "wrong",
];

const GREETING_REPLY: &str = "Hello! I'm running in a limited mode right now, but I'm listening.";
const FAREWELL_REPLY: &str = "Goodbye! Talk to you later.";
const HELP_REPLY: &str =
    "I can run commands (try the command prefix) and chat when my language model is available. \
     Right now I'm answering from a small set of built-in replies.";
const THANKS_REPLY: &str = "You're welcome!";
const WEATHER_REPLY: &str =
    "I can't check live weather in offline mode. Try the weather command once \
     the service is back.";
const NEWS_REPLY: &str = "I can't fetch news in offline mode.";
const TIME_REPLY: &str = "I can't look up the time for your region in offline mode.";
const OFFLINE_REPLY: &str =
    "I'm currently operating in offline mode and can only give simple answers. \
     Please try again later.";

/// Keyword-matching responder used whenever the backend is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackResponder;

impl FallbackResponder {
    pub fn new() -> Self {
        Self
    }

    /// Canned reply for one input. First matching rule wins, checked in a
    /// fixed order, so outputs are stable across calls.
    pub fn reply(&self, input: &str) -> String {
        let lower = input.to_lowercase();
        let words = tokenize(&lower);
        let has_word = |set: &[&str]| words.iter().any(|w| set.contains(&w.as_str()));

        let reply = if has_word(GREETING_WORDS)
            || GREETING_PHRASES.iter().any(|p| lower.contains(p))
        {
            GREETING_REPLY
        } else if has_word(FAREWELL_WORDS) {
            FAREWELL_REPLY
        } else if lower.contains("help") || lower.contains("what can you do") {
            HELP_REPLY
        } else if words.iter().any(|w| w == "thanks" || w == "thank") {
            THANKS_REPLY
        } else if lower.contains("weather") {
            WEATHER_REPLY
        } else if lower.contains("news") {
            NEWS_REPLY
        } else if lower.contains("time") {
            TIME_REPLY
        } else {
            OFFLINE_REPLY
        };

        reply.to_string()
    }

    /// Keyword-count sentiment estimate.
    ///
    /// Equal positive and negative counts (including none at all) are
    /// neutral at `{3, 0.5}`. Otherwise the rating shifts from 3 by
    /// `round(|Δ| / 2)` toward the dominant polarity, clamped to `[1, 5]`,
    /// and confidence is `min(0.7, hits / words) + 0.1`.
    pub fn sentiment(&self, text: &str) -> Sentiment {
        let lower = text.to_lowercase();
        let words = tokenize(&lower);

        let positive = words
            .iter()
            .filter(|w| POSITIVE_WORDS.contains(&w.as_str()))
            .count() as i64;
        let negative = words
            .iter()
            .filter(|w| NEGATIVE_WORDS.contains(&w.as_str()))
            .count() as i64;

        if positive == negative {
            return Sentiment::neutral();
        }

        let delta = positive - negative;
        let shift = (delta.abs() as f32 / 2.0).round() as i64;
        let rating = if delta > 0 { 3 + shift } else { 3 - shift }.clamp(1, 5) as u8;

        let word_count = words.len().max(1) as f32;
        let hits = (positive + negative) as f32;
        let confidence = (hits / word_count).min(0.7) + 0.1;

        Sentiment { rating, confidence }
    }
}

fn tokenize(lower: &str) -> Vec<String> {
    lower
        .split_whitespace()
        .map(|token| {
            token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_string()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_input_same_output() {
        let fallback = FallbackResponder::new();
        let a = fallback.reply("hello there");
        let b = fallback.reply("hello there");
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_greeting_and_help_and_topics() {
        let fallback = FallbackResponder::new();
        assert_eq!(fallback.reply("Hello!"), GREETING_REPLY);
        assert_eq!(fallback.reply("good MORNING everyone"), GREETING_REPLY);
        assert_eq!(fallback.reply("can you help me?"), HELP_REPLY);
        assert_eq!(fallback.reply("what's the weather like"), WEATHER_REPLY);
        assert_eq!(fallback.reply("any news today"), NEWS_REPLY);
    }

    #[test]
    fn test_unmatched_input_gets_offline_notice() {
        let fallback = FallbackResponder::new();
        let reply = fallback.reply("quaternion interpolation artifacts");
        assert_eq!(reply, OFFLINE_REPLY);
        assert!(reply.contains("offline mode"));
    }

    #[test]
    fn test_greeting_word_requires_word_boundary() {
        let fallback = FallbackResponder::new();
        // "hi" inside "this" must not read as a greeting.
        assert_eq!(fallback.reply("this thing broke again"), OFFLINE_REPLY);
    }

    #[test]
    fn test_sentiment_equal_counts_is_neutral() {
        let fallback = FallbackResponder::new();
        assert_eq!(fallback.sentiment("just some words"), Sentiment::neutral());
        assert_eq!(
            fallback.sentiment("good stuff but bad timing"),
            Sentiment::neutral()
        );
    }

    #[test]
    fn test_sentiment_dominant_positive() {
        let fallback = FallbackResponder::new();
        // positive=3, negative=1, delta=2 -> shift 1 -> rating 4.
        let s = fallback.sentiment("great great great bad day overall");
        assert_eq!(s.rating, 4);
        // hits=4, words=6 -> min(0.7, 0.666..) + 0.1
        assert!((s.confidence - (4.0_f32 / 6.0 + 0.1).min(0.8)).abs() < 1e-5);
    }

    #[test]
    fn test_sentiment_single_word_delta_rounds_up() {
        let fallback = FallbackResponder::new();
        // delta=1 -> round(0.5) = 1 -> rating 4.
        let s = fallback.sentiment("this release is great overall");
        assert_eq!(s.rating, 4);
    }

    #[test]
    fn test_sentiment_dominant_negative_clamps() {
        let fallback = FallbackResponder::new();
        // negative=6 -> delta=-6 -> shift 3 -> 3-3=0 clamped to 1.
        let s = fallback.sentiment("bad awful terrible horrible worst useless");
        assert_eq!(s.rating, 1);
        // Every word is a hit: confidence capped at 0.7 + 0.1.
        assert!((s.confidence - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_sentiment_empty_text_is_neutral() {
        let fallback = FallbackResponder::new();
        assert_eq!(fallback.sentiment(""), Sentiment::neutral());
    }
}
