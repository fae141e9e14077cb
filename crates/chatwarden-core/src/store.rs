//! Persistence contract consumed by the core, plus an in-memory
//! implementation used by tests and ephemeral setups.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::{ContextMessage, Conversation, ModerationAction, Settings, User};

/// Persistence operations the core depends on.
///
/// Implementations must keep at most one active conversation per user and
/// treat the moderation log as append-only.
pub trait ChatStore: Send + Sync {
    fn get_settings(&self) -> Result<Settings>;

    fn put_settings(&self, settings: &Settings) -> Result<()>;

    /// Create the user record on first sight; later calls may refresh the
    /// display name but never fail because the user already exists.
    fn ensure_user(&self, id: &str, display_name: Option<&str>) -> Result<()>;

    fn get_user(&self, id: &str) -> Result<Option<User>>;

    fn get_active_conversation(&self, user_id: &str) -> Result<Option<Conversation>>;

    /// Create a new active conversation for the user. If one is already
    /// active it is returned unchanged, preserving the single-active
    /// invariant.
    fn create_conversation(&self, user_id: &str) -> Result<Conversation>;

    fn update_conversation_window(&self, id: &str, window: &[ContextMessage]) -> Result<()>;

    /// Mark a conversation inactive. Returns false if it was not active.
    fn close_conversation(&self, id: &str) -> Result<bool>;

    fn record_moderation_action(&self, action: &ModerationAction) -> Result<()>;

    fn list_moderation_actions(&self, user_id: &str) -> Result<Vec<ModerationAction>>;

    /// Increment and return the usage count for a command name.
    fn record_command_usage(&self, name: &str) -> Result<u64>;

    fn command_usage(&self, name: &str) -> Result<u64>;
}

#[derive(Default)]
struct MemoryInner {
    settings: Option<Settings>,
    users: HashMap<String, User>,
    conversations: HashMap<String, Conversation>,
    /// user_id -> id of the active conversation
    active: HashMap<String, String>,
    moderation_log: Vec<ModerationAction>,
    command_usage: HashMap<String, u64>,
}

/// In-memory [`ChatStore`] for tests and reliability harnesses.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock().unwrap();
            inner.settings = Some(settings);
        }
        store
    }

    /// Number of conversations ever created, active or not.
    pub fn conversation_count(&self) -> usize {
        self.inner.lock().unwrap().conversations.len()
    }
}

impl ChatStore for MemoryStore {
    fn get_settings(&self) -> Result<Settings> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .settings
            .clone()
            .unwrap_or_default())
    }

    fn put_settings(&self, settings: &Settings) -> Result<()> {
        self.inner.lock().unwrap().settings = Some(settings.clone());
        Ok(())
    }

    fn ensure_user(&self, id: &str, display_name: Option<&str>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.users.get_mut(id) {
            Some(user) => {
                if let Some(name) = display_name {
                    user.display_name = Some(name.to_string());
                }
            }
            None => {
                inner.users.insert(
                    id.to_string(),
                    User::new(id, display_name.map(str::to_string)),
                );
            }
        }
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.inner.lock().unwrap().users.get(id).cloned())
    }

    fn get_active_conversation(&self, user_id: &str) -> Result<Option<Conversation>> {
        let inner = self.inner.lock().unwrap();
        let id = match inner.active.get(user_id) {
            Some(id) => id,
            None => return Ok(None),
        };
        Ok(inner.conversations.get(id).cloned())
    }

    fn create_conversation(&self, user_id: &str) -> Result<Conversation> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(id) = inner.active.get(user_id).cloned() {
            if let Some(existing) = inner.conversations.get(&id) {
                return Ok(existing.clone());
            }
        }
        let conversation = Conversation::new(user_id);
        inner
            .active
            .insert(user_id.to_string(), conversation.id.clone());
        inner
            .conversations
            .insert(conversation.id.clone(), conversation.clone());
        Ok(conversation)
    }

    fn update_conversation_window(&self, id: &str, window: &[ContextMessage]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(conversation) = inner.conversations.get_mut(id) {
            conversation.window = window.to_vec();
            conversation.last_updated = chrono::Utc::now().timestamp_millis();
        }
        Ok(())
    }

    fn close_conversation(&self, id: &str) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let Some(conversation) = inner.conversations.get_mut(id) else {
            return Ok(false);
        };
        if !conversation.active {
            return Ok(false);
        }
        conversation.active = false;
        let user_id = conversation.user_id.clone();
        inner.active.remove(&user_id);
        Ok(true)
    }

    fn record_moderation_action(&self, action: &ModerationAction) -> Result<()> {
        self.inner.lock().unwrap().moderation_log.push(action.clone());
        Ok(())
    }

    fn list_moderation_actions(&self, user_id: &str) -> Result<Vec<ModerationAction>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .moderation_log
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    fn record_command_usage(&self, name: &str) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        let count = inner.command_usage.entry(name.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    fn command_usage(&self, name: &str) -> Result<u64> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .command_usage
            .get(name)
            .copied()
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_active_conversation_per_user() {
        let store = MemoryStore::new();
        let first = store.create_conversation("user-1").unwrap();
        let second = store.create_conversation("user-1").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.conversation_count(), 1);
    }

    #[test]
    fn test_close_then_create_makes_new_conversation() {
        let store = MemoryStore::new();
        let first = store.create_conversation("user-1").unwrap();
        assert!(store.close_conversation(&first.id).unwrap());
        assert!(store.get_active_conversation("user-1").unwrap().is_none());

        let second = store.create_conversation("user-1").unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_close_twice_returns_false() {
        let store = MemoryStore::new();
        let conv = store.create_conversation("user-1").unwrap();
        assert!(store.close_conversation(&conv.id).unwrap());
        assert!(!store.close_conversation(&conv.id).unwrap());
    }

    #[test]
    fn test_ensure_user_is_idempotent() {
        let store = MemoryStore::new();
        store.ensure_user("user-1", None).unwrap();
        store.ensure_user("user-1", Some("Alice")).unwrap();
        let user = store.get_user("user-1").unwrap().unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_command_usage_counts() {
        let store = MemoryStore::new();
        assert_eq!(store.command_usage("ping").unwrap(), 0);
        assert_eq!(store.record_command_usage("ping").unwrap(), 1);
        assert_eq!(store.record_command_usage("ping").unwrap(), 2);
        assert_eq!(store.command_usage("ping").unwrap(), 2);
    }

    #[test]
    fn test_moderation_log_filters_by_user() {
        use crate::models::{ModerationAction, ModerationActionKind};

        let store = MemoryStore::new();
        store
            .record_moderation_action(&ModerationAction::new(
                "user-1",
                ModerationActionKind::Warn,
                "hate",
            ))
            .unwrap();
        store
            .record_moderation_action(&ModerationAction::new(
                "user-2",
                ModerationActionKind::Mute,
                "violence",
            ))
            .unwrap();

        let actions = store.list_moderation_actions("user-1").unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ModerationActionKind::Warn);
    }
}
