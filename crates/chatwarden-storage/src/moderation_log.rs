//! Append-only moderation action log.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

use chatwarden_core::ModerationAction;

const MODERATION_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("moderation_actions");

/// Moderation record persistence. Records are never updated or deleted.
#[derive(Debug, Clone)]
pub struct ModerationLogStorage {
    db: Arc<Database>,
}

impl ModerationLogStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(MODERATION_TABLE)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    pub fn record(&self, action: &ModerationAction) -> Result<()> {
        let data = serde_json::to_vec(action)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(MODERATION_TABLE)?;
            table.insert(action.id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// All actions for one user, oldest first.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<ModerationAction>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MODERATION_TABLE)?;

        let mut actions = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            let action: ModerationAction = serde_json::from_slice(value.value())?;
            if action.user_id == user_id {
                actions.push(action);
            }
        }

        actions.sort_by_key(|a| a.created_at);
        Ok(actions)
    }
}
