//! Conversation storage with a user→active index.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

use chatwarden_core::{ContextMessage, Conversation};

const CONVERSATIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("conversations");
// user_id -> id of the single active conversation
const ACTIVE_TABLE: TableDefinition<&str, &str> = TableDefinition::new("active_conversations");

/// Conversation persistence enforcing the single-active invariant.
#[derive(Debug, Clone)]
pub struct ConversationStorage {
    db: Arc<Database>,
}

impl ConversationStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(CONVERSATIONS_TABLE)?;
        write_txn.open_table(ACTIVE_TABLE)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    pub fn get(&self, id: &str) -> Result<Option<Conversation>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONVERSATIONS_TABLE)?;

        match table.get(id)? {
            Some(data) => Ok(Some(serde_json::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_active(&self, user_id: &str) -> Result<Option<Conversation>> {
        let active_id = {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(ACTIVE_TABLE)?;
            table.get(user_id)?.map(|guard| guard.value().to_string())
        };

        match active_id {
            Some(id) => self.get(&id),
            None => Ok(None),
        }
    }

    /// Create a new active conversation, or return the existing active one.
    pub fn create(&self, user_id: &str) -> Result<Conversation> {
        if let Some(existing) = self.get_active(user_id)? {
            return Ok(existing);
        }

        let conversation = Conversation::new(user_id);
        let data = serde_json::to_vec(&conversation)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut conversations = write_txn.open_table(CONVERSATIONS_TABLE)?;
            conversations.insert(conversation.id.as_str(), data.as_slice())?;
            let mut active = write_txn.open_table(ACTIVE_TABLE)?;
            active.insert(user_id, conversation.id.as_str())?;
        }
        write_txn.commit()?;

        Ok(conversation)
    }

    pub fn update_window(&self, id: &str, window: &[ContextMessage]) -> Result<()> {
        let Some(mut conversation) = self.get(id)? else {
            return Ok(());
        };

        conversation.window = window.to_vec();
        conversation.last_updated = chrono::Utc::now().timestamp_millis();
        let data = serde_json::to_vec(&conversation)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CONVERSATIONS_TABLE)?;
            table.insert(id, data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Mark a conversation inactive. Returns false if it was not active.
    pub fn close(&self, id: &str) -> Result<bool> {
        let Some(mut conversation) = self.get(id)? else {
            return Ok(false);
        };
        if !conversation.active {
            return Ok(false);
        }

        conversation.active = false;
        let data = serde_json::to_vec(&conversation)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut conversations = write_txn.open_table(CONVERSATIONS_TABLE)?;
            conversations.insert(id, data.as_slice())?;
            let mut active = write_txn.open_table(ACTIVE_TABLE)?;
            active.remove(conversation.user_id.as_str())?;
        }
        write_txn.commit()?;
        Ok(true)
    }
}
