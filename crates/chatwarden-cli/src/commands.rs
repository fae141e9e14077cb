//! Builtin command handlers.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use chatwarden_core::{CommandContext, CommandHandler, CommandRegistry, ContextManager};

struct PingCommand;

#[async_trait]
impl CommandHandler for PingCommand {
    async fn execute(&self, _args: &[String], _ctx: &CommandContext) -> Result<String> {
        Ok("Pong!".to_string())
    }
}

struct SentimentCommand;

#[async_trait]
impl CommandHandler for SentimentCommand {
    async fn execute(&self, args: &[String], ctx: &CommandContext) -> Result<String> {
        if args.is_empty() {
            return Ok("Usage: sentiment <text>".to_string());
        }
        let text = args.join(" ");
        let sentiment = ctx.responder.analyze_sentiment(&text).await;
        Ok(format!(
            "Sentiment: {}/5 (confidence {:.2})",
            sentiment.rating, sentiment.confidence
        ))
    }
}

struct CloseCommand;

#[async_trait]
impl CommandHandler for CloseCommand {
    async fn execute(&self, _args: &[String], ctx: &CommandContext) -> Result<String> {
        let manager = ContextManager::new(ctx.store.clone());
        if manager.close(&ctx.user_id)? {
            Ok("Conversation closed. The next message starts fresh.".to_string())
        } else {
            Ok("There was no active conversation to close.".to_string())
        }
    }
}

struct RemindCommand;

#[async_trait]
impl CommandHandler for RemindCommand {
    async fn execute(&self, args: &[String], ctx: &CommandContext) -> Result<String> {
        let usage = "Usage: remind <seconds> <message>";
        let Some((delay, message)) = args.split_first() else {
            return Ok(usage.to_string());
        };
        let Ok(seconds) = delay.parse::<u64>() else {
            return Ok(usage.to_string());
        };
        if message.is_empty() {
            return Ok(usage.to_string());
        }

        let task = ctx.scheduler.task_in(
            ctx.user_id.clone(),
            message.join(" "),
            Duration::from_secs(seconds),
        );
        ctx.scheduler.schedule(task);
        Ok(format!("Reminder set for {} seconds from now.", seconds))
    }
}

/// Placeholder for a third-party data integration that is not wired up.
///
/// Real deployments register their weather/news/translation handlers in
/// place of these; without one the command still answers.
struct InactiveIntegrationCommand {
    service: &'static str,
}

#[async_trait]
impl CommandHandler for InactiveIntegrationCommand {
    async fn execute(&self, _args: &[String], _ctx: &CommandContext) -> Result<String> {
        Ok(format!(
            "The {} service is not available right now. Ask the operators to enable it.",
            self.service
        ))
    }
}

struct HelpCommand {
    entries: Vec<(String, String)>,
}

#[async_trait]
impl CommandHandler for HelpCommand {
    async fn execute(&self, _args: &[String], _ctx: &CommandContext) -> Result<String> {
        let mut lines = vec!["Available commands:".to_string()];
        for (name, description) in &self.entries {
            lines.push(format!("  {} - {}", name, description));
        }
        Ok(lines.join("\n"))
    }
}

/// Registry with every builtin command.
pub fn builtin_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register("ping", "check that the bot is alive", Arc::new(PingCommand));
    registry.register(
        "sentiment",
        "estimate the sentiment of a piece of text",
        Arc::new(SentimentCommand),
    );
    registry.register(
        "close",
        "close the current conversation",
        Arc::new(CloseCommand),
    );
    registry.register(
        "remind",
        "schedule a reminder: remind <seconds> <message>",
        Arc::new(RemindCommand),
    );
    registry.register(
        "weather",
        "current weather (external integration)",
        Arc::new(InactiveIntegrationCommand { service: "weather" }),
    );
    registry.register(
        "news",
        "latest headlines (external integration)",
        Arc::new(InactiveIntegrationCommand { service: "news" }),
    );

    let mut entries = registry.list();
    entries.push(("help".to_string(), "list available commands".to_string()));
    entries.sort();
    registry.register("help", "list available commands", Arc::new(HelpCommand { entries }));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatwarden_core::{
        MemoryStore, ReminderScheduler, ReminderSink, Responder, ScheduledTask, Sentiment,
    };

    struct NullSink;

    #[async_trait]
    impl ReminderSink for NullSink {
        async fn deliver(&self, _task: &ScheduledTask) -> Result<()> {
            Ok(())
        }
    }

    struct StaticResponder;

    #[async_trait]
    impl Responder for StaticResponder {
        async fn respond(&self, _user_id: &str, _prompt: &str) -> String {
            "ok".to_string()
        }

        async fn generate_standalone(&self, _prompt: &str) -> String {
            "ok".to_string()
        }

        async fn analyze_sentiment(&self, _text: &str) -> Sentiment {
            Sentiment {
                rating: 4,
                confidence: 0.6,
            }
        }
    }

    fn test_context() -> CommandContext {
        CommandContext {
            user_id: "user-1".to_string(),
            author_name: None,
            store: Arc::new(MemoryStore::new()),
            responder: Arc::new(StaticResponder),
            scheduler: Arc::new(ReminderScheduler::new(Arc::new(NullSink))),
        }
    }

    #[tokio::test]
    async fn test_builtins_are_registered() {
        let registry = builtin_registry();
        for name in ["ping", "help", "sentiment", "close", "remind", "weather", "news"] {
            assert!(registry.resolve(name).is_some(), "missing {}", name);
        }
    }

    #[tokio::test]
    async fn test_help_lists_every_command() {
        let registry = builtin_registry();
        let ctx = test_context();
        let help = registry
            .resolve("help")
            .unwrap()
            .handler
            .execute(&[], &ctx)
            .await
            .unwrap();
        for (name, _) in registry.list() {
            assert!(help.contains(&name), "help misses {}", name);
        }
    }

    #[tokio::test]
    async fn test_inactive_integration_answers_unavailability() {
        let registry = builtin_registry();
        let ctx = test_context();
        let reply = registry
            .resolve("weather")
            .unwrap()
            .handler
            .execute(&["london".to_string()], &ctx)
            .await
            .unwrap();
        assert!(reply.contains("not available"));
    }

    #[tokio::test]
    async fn test_sentiment_command_formats_rating() {
        let registry = builtin_registry();
        let ctx = test_context();
        let reply = registry
            .resolve("sentiment")
            .unwrap()
            .handler
            .execute(&["great".to_string()], &ctx)
            .await
            .unwrap();
        assert!(reply.contains("4/5"));
    }

    #[tokio::test]
    async fn test_remind_rejects_bad_delay() {
        let registry = builtin_registry();
        let ctx = test_context();
        let reply = registry
            .resolve("remind")
            .unwrap()
            .handler
            .execute(&["soon".to_string(), "hi".to_string()], &ctx)
            .await
            .unwrap();
        assert!(reply.starts_with("Usage:"));
    }

    #[tokio::test]
    async fn test_close_without_conversation() {
        let registry = builtin_registry();
        let ctx = test_context();
        let reply = registry
            .resolve("close")
            .unwrap()
            .handler
            .execute(&[], &ctx)
            .await
            .unwrap();
        assert!(reply.contains("no active conversation"));
    }
}
