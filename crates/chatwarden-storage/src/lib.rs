//! redb-backed persistence for ChatWarden.
//!
//! One database file holds every table; each concern gets its own storage
//! struct over the shared `Arc<Database>`, and [`Storage`] stitches them
//! into the core's [`ChatStore`] contract.

mod conversation;
mod moderation_log;
mod settings;
mod usage;
mod user;

pub use conversation::ConversationStorage;
pub use moderation_log::ModerationLogStorage;
pub use settings::SettingsStorage;
pub use usage::CommandUsageStorage;
pub use user::UserStorage;

use anyhow::Result;
use redb::Database;
use std::path::Path;
use std::sync::Arc;

use chatwarden_core::{
    ChatStore, ContextMessage, Conversation, ModerationAction, Settings, User,
};

/// All persistent state behind one redb database.
#[derive(Debug, Clone)]
pub struct Storage {
    pub settings: SettingsStorage,
    pub users: UserStorage,
    pub conversations: ConversationStorage,
    pub moderation: ModerationLogStorage,
    pub usage: CommandUsageStorage,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Arc::new(Database::create(path)?);
        Self::with_db(db)
    }

    pub fn with_db(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            settings: SettingsStorage::new(db.clone())?,
            users: UserStorage::new(db.clone())?,
            conversations: ConversationStorage::new(db.clone())?,
            moderation: ModerationLogStorage::new(db.clone())?,
            usage: CommandUsageStorage::new(db)?,
        })
    }
}

impl ChatStore for Storage {
    fn get_settings(&self) -> Result<Settings> {
        self.settings.get()
    }

    fn put_settings(&self, settings: &Settings) -> Result<()> {
        self.settings.put(settings)
    }

    fn ensure_user(&self, id: &str, display_name: Option<&str>) -> Result<()> {
        self.users.ensure(id, display_name)
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.users.get(id)
    }

    fn get_active_conversation(&self, user_id: &str) -> Result<Option<Conversation>> {
        self.conversations.get_active(user_id)
    }

    fn create_conversation(&self, user_id: &str) -> Result<Conversation> {
        self.conversations.create(user_id)
    }

    fn update_conversation_window(&self, id: &str, window: &[ContextMessage]) -> Result<()> {
        self.conversations.update_window(id, window)
    }

    fn close_conversation(&self, id: &str) -> Result<bool> {
        self.conversations.close(id)
    }

    fn record_moderation_action(&self, action: &ModerationAction) -> Result<()> {
        self.moderation.record(action)
    }

    fn list_moderation_actions(&self, user_id: &str) -> Result<Vec<ModerationAction>> {
        self.moderation.list_for_user(user_id)
    }

    fn record_command_usage(&self, name: &str) -> Result<u64> {
        self.usage.increment(name)
    }

    fn command_usage(&self, name: &str) -> Result<u64> {
        self.usage.get(name)
    }
}
