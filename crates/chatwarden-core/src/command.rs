//! Command registry: case-insensitive name→handler lookup.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::responder::Responder;
use crate::schedule::ReminderScheduler;
use crate::store::ChatStore;

/// Shared collaborators handed to every command handler.
#[derive(Clone)]
pub struct CommandContext {
    pub user_id: String,
    pub author_name: Option<String>,
    pub store: Arc<dyn ChatStore>,
    pub responder: Arc<dyn Responder>,
    pub scheduler: Arc<ReminderScheduler>,
}

/// A command implementation. Failures are caught by the dispatcher wrapper,
/// never by the registry.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(&self, args: &[String], ctx: &CommandContext) -> Result<String>;
}

/// A registered command.
#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub handler: Arc<dyn CommandHandler>,
}

/// Finite registry extended by construction.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. Names are case-insensitive; a later registration
    /// under the same name replaces the earlier one.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) {
        let name = name.into().to_lowercase();
        self.commands.insert(
            name.clone(),
            Command {
                name,
                description: description.into(),
                handler,
            },
        );
    }

    /// Look up a command by name. An absent name is not an error; the
    /// dispatcher re-routes the original text into the respond path.
    pub fn resolve(&self, name: &str) -> Option<&Command> {
        self.commands.get(&name.to_lowercase())
    }

    /// Registered `(name, description)` pairs, sorted by name.
    pub fn list(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .commands
            .values()
            .map(|c| (c.name.clone(), c.description.clone()))
            .collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
