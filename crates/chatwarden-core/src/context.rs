//! Bounded per-user conversation context.
//!
//! The manager mediates every window mutation so the invariant
//! `window.len() <= 2 * context_size` holds after each one. All state lives
//! in the store; there is no cross-user shared mutable state here, so
//! concurrent invocations keyed by distinct user ids are safe.

use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use crate::models::ContextMessage;
use crate::store::ChatStore;

/// Manages the active conversation window for each user.
#[derive(Clone)]
pub struct ContextManager {
    store: Arc<dyn ChatStore>,
}

impl ContextManager {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    /// Most recent `context_size` messages of the active conversation.
    ///
    /// Returns empty without touching any conversation when context
    /// awareness is off; otherwise lazily creates an empty active
    /// conversation if none exists.
    pub fn get(&self, user_id: &str) -> Result<Vec<ContextMessage>> {
        let settings = self.store.get_settings()?;
        if !settings.context_awareness {
            return Ok(Vec::new());
        }

        let conversation = match self.store.get_active_conversation(user_id)? {
            Some(conversation) => conversation,
            None => self.store.create_conversation(user_id)?,
        };

        let window = conversation.window;
        let skip = window.len().saturating_sub(settings.context_size);
        Ok(window[skip..].to_vec())
    }

    /// Append a user turn. No-op when context awareness is off.
    pub fn append_user(&self, user_id: &str, content: &str) -> Result<()> {
        self.append(user_id, ContextMessage::user(content))
    }

    /// Append an assistant turn. No-op when context awareness is off.
    pub fn append_assistant(&self, user_id: &str, content: &str) -> Result<()> {
        self.append(user_id, ContextMessage::assistant(content))
    }

    fn append(&self, user_id: &str, message: ContextMessage) -> Result<()> {
        let settings = self.store.get_settings()?;
        if !settings.context_awareness {
            return Ok(());
        }

        let mut conversation = match self.store.get_active_conversation(user_id)? {
            Some(conversation) => conversation,
            None => self.store.create_conversation(user_id)?,
        };

        conversation.push(message);
        conversation.truncate_to(settings.window_limit());
        self.store
            .update_conversation_window(&conversation.id, &conversation.window)?;
        Ok(())
    }

    /// Shrink the active window immediately if it exceeds `2 * new_size`.
    pub fn resize(&self, user_id: &str, new_size: usize) -> Result<()> {
        let Some(mut conversation) = self.store.get_active_conversation(user_id)? else {
            return Ok(());
        };

        let limit = new_size.saturating_mul(2);
        if conversation.window.len() > limit {
            conversation.truncate_to(limit);
            self.store
                .update_conversation_window(&conversation.id, &conversation.window)?;
            debug!(user_id, new_size, "resized conversation window");
        }
        Ok(())
    }

    /// Close the active conversation. Returns false if none was active.
    pub fn close(&self, user_id: &str) -> Result<bool> {
        match self.store.get_active_conversation(user_id)? {
            Some(conversation) => self.store.close_conversation(&conversation.id),
            None => Ok(false),
        }
    }

    /// Role-tagged sequence for generation: a fixed system instruction
    /// followed by the stored window. The system turn is never persisted and
    /// never counts against `context_size`.
    pub fn format_for_generation(
        &self,
        user_id: &str,
        system_instruction: &str,
    ) -> Result<Vec<ContextMessage>> {
        let window = self.get(user_id)?;
        let mut messages = Vec::with_capacity(window.len() + 1);
        messages.push(ContextMessage::system(system_instruction));
        messages.extend(window);
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContextRole, Settings};
    use crate::store::MemoryStore;

    fn manager_with(settings: Settings) -> (ContextManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_settings(settings));
        (ContextManager::new(store.clone()), store)
    }

    fn small_settings(context_size: usize) -> Settings {
        Settings {
            context_size,
            ..Settings::default()
        }
    }

    #[test]
    fn test_window_bound_holds_after_every_append() {
        let (manager, store) = manager_with(small_settings(3));

        for i in 0..25 {
            manager.append_user("user-1", &format!("m{}", i)).unwrap();
            let window = store
                .get_active_conversation("user-1")
                .unwrap()
                .unwrap()
                .window;
            assert!(window.len() <= 6, "window grew to {}", window.len());
        }

        let window = store
            .get_active_conversation("user-1")
            .unwrap()
            .unwrap()
            .window;
        assert_eq!(window.len(), 6);
        assert_eq!(window.last().unwrap().content, "m24");
    }

    #[test]
    fn test_get_returns_most_recent_context_size() {
        let (manager, _) = manager_with(small_settings(2));
        for i in 0..4 {
            manager.append_user("user-1", &format!("m{}", i)).unwrap();
        }
        let recent = manager.get("user-1").unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "m2");
        assert_eq!(recent[1].content, "m3");
    }

    #[test]
    fn test_context_awareness_off_reads_empty_and_creates_nothing() {
        let settings = Settings {
            context_awareness: false,
            ..Settings::default()
        };
        let (manager, store) = manager_with(settings);

        assert!(manager.get("user-1").unwrap().is_empty());
        manager.append_user("user-1", "hello").unwrap();
        manager.append_assistant("user-1", "hi").unwrap();

        assert_eq!(store.conversation_count(), 0);
        assert!(store.get_active_conversation("user-1").unwrap().is_none());
    }

    #[test]
    fn test_resize_truncates_immediately() {
        let (manager, store) = manager_with(small_settings(5));
        for i in 0..10 {
            manager.append_user("user-1", &format!("m{}", i)).unwrap();
        }

        manager.resize("user-1", 2).unwrap();
        let window = store
            .get_active_conversation("user-1")
            .unwrap()
            .unwrap()
            .window;
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].content, "m6");
    }

    #[test]
    fn test_close_twice_returns_false() {
        let (manager, _) = manager_with(Settings::default());
        manager.append_user("user-1", "hello").unwrap();

        assert!(manager.close("user-1").unwrap());
        assert!(!manager.close("user-1").unwrap());
    }

    #[test]
    fn test_close_without_conversation_returns_false() {
        let (manager, _) = manager_with(Settings::default());
        assert!(!manager.close("user-1").unwrap());
    }

    #[test]
    fn test_format_prepends_unpersisted_system_turn() {
        let (manager, store) = manager_with(small_settings(4));
        manager.append_user("user-1", "hello").unwrap();

        let messages = manager.format_for_generation("user-1", "be helpful").unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ContextRole::System);
        assert_eq!(messages[0].content, "be helpful");
        assert_eq!(messages[1].content, "hello");

        let window = store
            .get_active_conversation("user-1")
            .unwrap()
            .unwrap()
            .window;
        assert!(window.iter().all(|m| m.role != ContextRole::System));
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let (manager, store) = manager_with(Settings::default());
        for i in 0..5 {
            manager.append_user("user-1", &format!("m{}", i)).unwrap();
        }
        let window = store
            .get_active_conversation("user-1")
            .unwrap()
            .unwrap()
            .window;
        assert!(window.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
