//! Console gateway: a stdin/stdout stand-in for a real chat transport.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use chatwarden_core::{
    Dispatcher, EventActions, GatewayEvent, ReminderSink, ScheduledTask,
};

/// Actions for a console message. Member-level effects have no real target
/// here; they are acknowledged in the log so moderation flows stay visible.
pub struct ConsoleActions;

#[async_trait]
impl EventActions for ConsoleActions {
    async fn reply(&self, text: &str) -> Result<()> {
        println!("bot> {}", text);
        Ok(())
    }

    async fn reply_privately(&self, text: &str) -> Result<()> {
        println!("bot (private)> {}", text);
        Ok(())
    }

    async fn delete_message(&self) -> Result<()> {
        info!("console: message deleted");
        Ok(())
    }

    async fn timeout_author(&self, duration: Duration, reason: &str) -> Result<()> {
        info!(?duration, reason, "console: author timed out");
        Ok(())
    }

    async fn kick_author(&self, reason: &str) -> Result<()> {
        info!(reason, "console: author kicked");
        Ok(())
    }

    async fn ban_author(&self, reason: &str) -> Result<()> {
        info!(reason, "console: author banned");
        Ok(())
    }
}

/// Prints due reminders to the console.
pub struct ConsoleReminderSink;

#[async_trait]
impl ReminderSink for ConsoleReminderSink {
    async fn deliver(&self, task: &ScheduledTask) -> Result<()> {
        println!("bot (reminder)> {}", task.message);
        Ok(())
    }
}

/// Read lines from stdin and dispatch each as a DM event until EOF or
/// `exit`/`quit`.
pub async fn run(dispatcher: Arc<Dispatcher>, user_id: &str) -> Result<()> {
    println!("ChatWarden console. Type a message, or 'exit' to quit.");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let actions = ConsoleActions;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let event = GatewayEvent::new(user_id, line)
            .with_author_name(user_id)
            .dm();
        // Await the whole unit of work so console output stays ordered.
        dispatcher.dispatch(event, &actions).await;
    }

    println!("bye");
    Ok(())
}
