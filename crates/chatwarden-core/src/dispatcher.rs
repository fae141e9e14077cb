//! Dispatch decision logic.
//!
//! One inbound event maps to exactly one route. The dispatcher never blocks
//! other users: `handle` spawns one task per event, and every route
//! execution is wrapped so no downstream error escapes.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::command::{CommandContext, CommandRegistry};
use crate::gateway::{EventActions, GatewayCaps, GatewayEvent};
use crate::moderation::{ModerationClassifier, Verdict};
use crate::responder::Responder;
use crate::schedule::ReminderScheduler;
use crate::store::ChatStore;

/// The single handling route chosen for one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Ignore,
    Command { name: String, args: Vec<String> },
    Moderate(Verdict),
    Respond { capability_limited: bool },
}

/// Sent when a route fails after the point of no return.
pub const APOLOGY: &str = "Sorry, something went wrong while handling that message.";

/// Sent for mentions/DMs when message bodies are not readable.
const CAPABILITY_LIMITED_REPLY: &str =
    "I can see you reached out, but I am not able to read message content right now. \
     Try a slash command or contact the server admins.";

/// Routes inbound events and executes the chosen handler.
pub struct Dispatcher {
    store: Arc<dyn ChatStore>,
    registry: Arc<CommandRegistry>,
    classifier: Arc<ModerationClassifier>,
    responder: Arc<dyn Responder>,
    scheduler: Arc<ReminderScheduler>,
    caps: GatewayCaps,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn ChatStore>,
        registry: Arc<CommandRegistry>,
        classifier: Arc<ModerationClassifier>,
        responder: Arc<dyn Responder>,
        scheduler: Arc<ReminderScheduler>,
        caps: GatewayCaps,
    ) -> Self {
        Self {
            store,
            registry,
            classifier,
            responder,
            scheduler,
            caps,
        }
    }

    /// Fire-and-forget entry point: one spawned task per event, so slow
    /// handlers for one user never delay another user's messages.
    pub fn handle(self: Arc<Self>, event: GatewayEvent, actions: Arc<dyn EventActions>) {
        tokio::spawn(async move {
            self.dispatch(event, actions.as_ref()).await;
        });
    }

    /// One sequential unit of work: bookkeeping, route resolution, route
    /// execution. Never returns an error.
    pub async fn dispatch(&self, event: GatewayEvent, actions: &dyn EventActions) {
        // Best-effort user bookkeeping; a storage hiccup must not drop the
        // message.
        if !event.is_bot_author {
            if let Err(e) = self
                .store
                .ensure_user(&event.author_id, event.author_name.as_deref())
            {
                warn!(user_id = %event.author_id, error = %e, "user bookkeeping failed");
            }
        }

        let route = self.resolve_route(&event).await;
        debug!(user_id = %event.author_id, ?route, "resolved route");

        if let Err(e) = self.execute(&route, &event, actions).await {
            error!(user_id = %event.author_id, error = %e, "route execution failed");
            if let Err(e) = actions.reply(APOLOGY).await {
                warn!(user_id = %event.author_id, error = %e, "apology undeliverable");
            }
        }
    }

    /// Resolution order: bot author, capability gate, command prefix,
    /// auto-moderation, mention/DM, ignore.
    pub async fn resolve_route(&self, event: &GatewayEvent) -> Route {
        if event.is_bot_author {
            return Route::Ignore;
        }

        if !self.caps.has_privileged_content {
            // Content is never inspected on this branch.
            return if event.is_mentioned || event.is_dm {
                Route::Respond {
                    capability_limited: true,
                }
            } else {
                Route::Ignore
            };
        }

        let settings = match self.store.get_settings() {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "settings unavailable, using defaults");
                Default::default()
            }
        };

        if let Some(rest) = event.content.strip_prefix(&settings.command_prefix) {
            let mut tokens = rest.split_whitespace();
            if let Some(name) = tokens.next() {
                return Route::Command {
                    name: name.to_lowercase(),
                    args: tokens.map(str::to_string).collect(),
                };
            }
        }

        if settings.auto_moderation {
            match self.classifier.classify(&event.content).await {
                Ok(Some(verdict)) => return Route::Moderate(verdict),
                Ok(None) => {}
                Err(e) => {
                    // A scorer outage must not silence or mute anyone.
                    warn!(error = %e, "content scorer unavailable, skipping moderation");
                }
            }
        }

        if event.is_mentioned || event.is_dm {
            return Route::Respond {
                capability_limited: false,
            };
        }

        Route::Ignore
    }

    async fn execute(
        &self,
        route: &Route,
        event: &GatewayEvent,
        actions: &dyn EventActions,
    ) -> anyhow::Result<()> {
        match route {
            Route::Ignore => Ok(()),
            Route::Respond {
                capability_limited: true,
            } => actions.reply(CAPABILITY_LIMITED_REPLY).await,
            Route::Respond {
                capability_limited: false,
            } => self.respond_with(&event.author_id, &event.content, actions).await,
            Route::Moderate(verdict) => self.classifier.enforce(verdict, event, actions).await,
            Route::Command { name, args } => {
                let Some(command) = self.registry.resolve(name) else {
                    // Unresolved names re-route the original text.
                    info!(command = %name, "unknown command, responding instead");
                    return self
                        .respond_with(&event.author_id, &event.content, actions)
                        .await;
                };

                // Usage counts every resolved invocation attempt, before the
                // handler runs.
                if let Err(e) = self.store.record_command_usage(&command.name) {
                    warn!(command = %command.name, error = %e, "usage bookkeeping failed");
                }

                let ctx = CommandContext {
                    user_id: event.author_id.clone(),
                    author_name: event.author_name.clone(),
                    store: self.store.clone(),
                    responder: self.responder.clone(),
                    scheduler: self.scheduler.clone(),
                };
                let reply = command.handler.execute(args, &ctx).await?;
                actions.reply(&reply).await
            }
        }
    }

    async fn respond_with(
        &self,
        user_id: &str,
        prompt: &str,
        actions: &dyn EventActions,
    ) -> anyhow::Result<()> {
        let text = self.responder.respond(user_id, prompt).await;
        actions.reply(&text).await
    }
}
