//! User record storage.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

use chatwarden_core::User;

const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

#[derive(Debug, Clone)]
pub struct UserStorage {
    db: Arc<Database>,
}

impl UserStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(USERS_TABLE)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    pub fn get(&self, id: &str) -> Result<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_TABLE)?;
        match table.get(id)? {
            Some(data) => Ok(Some(serde_json::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// Create on first sight; refresh the display name on later calls.
    pub fn ensure(&self, id: &str, display_name: Option<&str>) -> Result<()> {
        let user = match self.get(id)? {
            Some(mut user) => {
                if let Some(name) = display_name {
                    user.display_name = Some(name.to_string());
                }
                user
            }
            None => User::new(id, display_name.map(str::to_string)),
        };

        let data = serde_json::to_vec(&user)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(USERS_TABLE)?;
            table.insert(id, data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
