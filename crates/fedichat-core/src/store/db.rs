use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use super::{StoreError, StoreResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chats (
    owner_id        INTEGER NOT NULL,
    chat_id         TEXT NOT NULL,
    peer_account_id TEXT NOT NULL,
    unread          INTEGER NOT NULL DEFAULT 0,
    updated_at      INTEGER,
    last_message_id TEXT,
    PRIMARY KEY (owner_id, chat_id)
);

CREATE TABLE IF NOT EXISTS chat_messages (
    owner_id          INTEGER NOT NULL,
    message_id        TEXT NOT NULL,
    chat_id           TEXT NOT NULL,
    sender_account_id TEXT NOT NULL,
    content           TEXT NOT NULL,
    created_at        INTEGER,
    attachment        TEXT,
    emojis            TEXT NOT NULL DEFAULT '[]',
    PRIMARY KEY (owner_id, message_id)
);

CREATE TABLE IF NOT EXISTS accounts (
    owner_id     INTEGER NOT NULL,
    account_id   TEXT NOT NULL,
    display_name TEXT NOT NULL,
    handle       TEXT NOT NULL,
    url          TEXT NOT NULL,
    avatar_url   TEXT NOT NULL,
    bot          INTEGER NOT NULL DEFAULT 0,
    emojis       TEXT NOT NULL DEFAULT '[]',
    PRIMARY KEY (owner_id, account_id)
);

CREATE TABLE IF NOT EXISTS preferences (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Shared handle to the SQLite cache.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(db_dir: P) -> StoreResult<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir)?;
        let conn = Connection::open(db_dir.join("fedichat.db"))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_the_schema_on_disk() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        let conn = db.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM chats", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn open_is_idempotent() {
        let dir = tempdir().unwrap();
        Database::open(dir.path()).unwrap();
        Database::open(dir.path()).unwrap();
    }
}
