//! ChatWarden AI: generation backend clients, the Live/Fallback availability
//! machine, deterministic offline replies and the NLP responder.

pub mod availability;
pub mod error;
pub mod fallback;
pub mod llm;
pub mod responder;
pub mod scorer;

pub use availability::{AvailabilityState, NlpAvailability};
pub use error::{BackendError, Result};
pub use fallback::FallbackResponder;
pub use llm::{CompletionBackend, CompletionRequest, Message, MockBackend, OpenAiBackend, Role};
pub use responder::NlpResponder;
pub use scorer::OpenAiModerationScorer;
