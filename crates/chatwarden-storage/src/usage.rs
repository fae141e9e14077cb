//! Command usage counters.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

const USAGE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("command_usage");

/// Per-command invocation counters.
#[derive(Debug, Clone)]
pub struct CommandUsageStorage {
    db: Arc<Database>,
}

impl CommandUsageStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(USAGE_TABLE)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Increment and return the counter for a command name.
    pub fn increment(&self, name: &str) -> Result<u64> {
        let write_txn = self.db.begin_write()?;
        let count = {
            let mut table = write_txn.open_table(USAGE_TABLE)?;
            let current = table.get(name)?.map(|guard| guard.value()).unwrap_or(0);
            let next = current + 1;
            table.insert(name, next)?;
            next
        };
        write_txn.commit()?;
        Ok(count)
    }

    pub fn get(&self, name: &str) -> Result<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USAGE_TABLE)?;
        Ok(table.get(name)?.map(|guard| guard.value()).unwrap_or(0))
    }
}
