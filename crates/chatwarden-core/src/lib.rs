//! ChatWarden core: dispatch, context, moderation and command primitives.
//!
//! The core sits between a chat gateway adapter and a text-generation
//! backend. It owns the routing decision for each inbound message, the
//! bounded per-user conversation window, the moderation severity policy and
//! the command registry; transports, persistence engines and LLM providers
//! plug in through the traits defined here.

pub mod command;
pub mod context;
pub mod dispatcher;
pub mod gateway;
pub mod models;
pub mod moderation;
pub mod responder;
pub mod schedule;
pub mod store;

pub use command::{Command, CommandContext, CommandHandler, CommandRegistry};
pub use context::ContextManager;
pub use dispatcher::{Dispatcher, Route, APOLOGY};
pub use gateway::{EventActions, GatewayCaps, GatewayEvent};
pub use models::{
    ContextMessage, ContextRole, Conversation, ModerationAction, ModerationActionKind, Settings,
    User,
};
pub use moderation::{
    Category, CategoryScore, CategoryScores, ContentScorer, ModerationClassifier, Verdict,
    MUTE_DURATION,
};
pub use responder::{Responder, Sentiment};
pub use schedule::{Clock, ReminderScheduler, ReminderSink, ScheduledTask, SystemClock};
pub use store::{ChatStore, MemoryStore};
