//! Settings storage - single-key snapshot persistence.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

use chatwarden_core::Settings;

const SETTINGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");
const SETTINGS_KEY: &str = "global";

/// Persisted global settings snapshot.
#[derive(Debug, Clone)]
pub struct SettingsStorage {
    db: Arc<Database>,
}

impl SettingsStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(SETTINGS_TABLE)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Stored settings, or defaults when none were saved yet.
    pub fn get(&self) -> Result<Settings> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SETTINGS_TABLE)?;

        if let Some(data) = table.get(SETTINGS_KEY)? {
            Ok(serde_json::from_slice(data.value())?)
        } else {
            Ok(Settings::default())
        }
    }

    pub fn put(&self, settings: &Settings) -> Result<()> {
        let data = serde_json::to_vec(settings)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SETTINGS_TABLE)?;
            table.insert(SETTINGS_KEY, data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
