//! Data access for the chat cache.
//!
//! Chat ids are decimal strings of varying width, so every range bound
//! and the result order use the same length-then-lexicographic rule as
//! the in-memory list: `LENGTH(chat_id)` first, the text second.

use rusqlite::{named_params, Connection, OptionalExtension};
use thiserror::Error;

use crate::models::{AccountSummary, Attachment, ChatMessage, ChatSummary, Emoji};
use crate::timeline::ListEntry;

use super::Database;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid column data: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("chat {0} not found")]
    ChatNotFound(String),
    #[error("database lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

const RANGE_BOUNDS: &str = r#"
  AND (:max_id IS NULL
       OR LENGTH(c.chat_id) < LENGTH(:max_id)
       OR (LENGTH(c.chat_id) = LENGTH(:max_id) AND c.chat_id < :max_id))
  AND (:since_id IS NULL
       OR LENGTH(c.chat_id) > LENGTH(:since_id)
       OR (LENGTH(c.chat_id) = LENGTH(:since_id) AND c.chat_id > :since_id))
"#;

#[derive(Clone)]
pub struct ChatStore {
    db: Database,
}

impl ChatStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ===== Upserts =====

    pub fn upsert_chat(&self, chat: &ChatSummary) -> StoreResult<()> {
        let conn = self.db.lock()?;
        put_chat(&conn, chat)
    }

    /// Insert only when no row with this key exists yet.
    pub fn insert_chat_if_missing(&self, chat: &ChatSummary) -> StoreResult<()> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO chats
             (owner_id, chat_id, peer_account_id, unread, updated_at, last_message_id)
             VALUES (:owner, :chat, :peer, :unread, :updated, :last_message)",
            named_params! {
                ":owner": chat.owner_id,
                ":chat": chat.chat_id,
                ":peer": chat.peer_account_id,
                ":unread": chat.unread,
                ":updated": chat.updated_at,
                ":last_message": chat.last_message_id,
            },
        )?;
        Ok(())
    }

    pub fn upsert_message(&self, message: &ChatMessage) -> StoreResult<()> {
        let conn = self.db.lock()?;
        put_message(&conn, message)
    }

    pub fn upsert_account(&self, account: &AccountSummary) -> StoreResult<()> {
        let conn = self.db.lock()?;
        put_account(&conn, account)
    }

    /// Write an account, an optional last message, and a chat in one
    /// transaction; either all land or none do.
    pub fn insert_chat_with_refs(
        &self,
        chat: &ChatSummary,
        last_message: Option<&ChatMessage>,
        account: &AccountSummary,
    ) -> StoreResult<()> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        put_account(&tx, account)?;
        if let Some(message) = last_message {
            put_message(&tx, message)?;
        }
        put_chat(&tx, chat)?;
        tx.commit()?;
        Ok(())
    }

    /// Persist a whole fetched page. Placeholder entries become rows with
    /// an empty peer account id, exactly like concrete chats otherwise.
    pub fn insert_page(&self, owner_id: i64, entries: &[ListEntry]) -> StoreResult<()> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        for entry in entries {
            match entry {
                ListEntry::Placeholder { boundary_id, .. } => {
                    let placeholder = ChatSummary::placeholder(owner_id, boundary_id);
                    put_chat(&tx, &placeholder)?;
                }
                ListEntry::Concrete {
                    chat,
                    account,
                    last_message,
                } => {
                    put_account(&tx, account)?;
                    if let Some(message) = last_message {
                        put_message(&tx, message)?;
                    }
                    put_chat(&tx, chat)?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Store a new message and point its chat at it, atomically. Fails
    /// (and rolls the message back) when the chat is unknown.
    pub fn set_last_message(
        &self,
        owner_id: i64,
        chat_id: &str,
        message: &ChatMessage,
    ) -> StoreResult<()> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        put_message(&tx, message)?;
        let updated = tx.execute(
            "UPDATE chats SET last_message_id = :message
             WHERE owner_id = :owner AND chat_id = :chat",
            named_params! {
                ":message": message.message_id,
                ":owner": owner_id,
                ":chat": chat_id,
            },
        )?;
        if updated == 0 {
            return Err(StoreError::ChatNotFound(chat_id.to_string()));
        }
        tx.commit()?;
        Ok(())
    }

    // ===== Queries =====

    /// Up to `limit` list entries for `owner_id`, newest chat id first,
    /// bounded by `chat_id < max_id` and `chat_id > since_id` where given.
    pub fn query_range(
        &self,
        owner_id: i64,
        max_id: Option<&str>,
        since_id: Option<&str>,
        limit: u32,
    ) -> StoreResult<Vec<ListEntry>> {
        let conn = self.db.lock()?;
        let sql = format!(
            "SELECT c.chat_id, c.peer_account_id, c.unread, c.updated_at, c.last_message_id,
                    a.display_name, a.handle, a.url, a.avatar_url, a.bot, a.emojis,
                    m.message_id, m.chat_id, m.sender_account_id, m.content, m.created_at,
                    m.attachment, m.emojis
             FROM chats c
             LEFT JOIN accounts a
               ON a.owner_id = c.owner_id AND a.account_id = c.peer_account_id
             LEFT JOIN chat_messages m
               ON m.owner_id = c.owner_id AND m.message_id = c.last_message_id
             WHERE c.owner_id = :owner
             {RANGE_BOUNDS}
             ORDER BY LENGTH(c.chat_id) DESC, c.chat_id DESC
             LIMIT :limit"
        );
        let mut statement = conn.prepare(&sql)?;
        let rows = statement.query_map(
            named_params! {
                ":owner": owner_id,
                ":max_id": max_id,
                ":since_id": since_id,
                ":limit": limit,
            },
            |row| {
                let chat_id: String = row.get(0)?;
                let peer_account_id: String = row.get(1)?;
                let unread: i64 = row.get(2)?;
                let updated_at: Option<i64> = row.get(3)?;
                let last_message_id: Option<String> = row.get(4)?;

                if peer_account_id.is_empty() {
                    return Ok(ListEntry::placeholder(&chat_id));
                }

                let account = AccountSummary {
                    owner_id,
                    account_id: peer_account_id.clone(),
                    display_name: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    handle: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                    url: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                    avatar_url: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
                    bot: row.get::<_, Option<bool>>(9)?.unwrap_or_default(),
                    emojis: decode_emojis(row.get::<_, Option<String>>(10)?),
                };

                let last_message = match row.get::<_, Option<String>>(11)? {
                    Some(message_id) => Some(ChatMessage {
                        owner_id,
                        message_id,
                        chat_id: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
                        sender_account_id: row
                            .get::<_, Option<String>>(13)?
                            .unwrap_or_default(),
                        content: row.get::<_, Option<String>>(14)?.unwrap_or_default(),
                        created_at: row.get(15)?,
                        attachment: decode_attachment(row.get::<_, Option<String>>(16)?),
                        emojis: decode_emojis(row.get::<_, Option<String>>(17)?),
                    }),
                    None => None,
                };

                Ok(ListEntry::concrete(
                    ChatSummary {
                        owner_id,
                        chat_id,
                        peer_account_id,
                        unread,
                        updated_at,
                        last_message_id,
                    },
                    account,
                    last_message,
                ))
            },
        )?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    // ===== Deletes =====

    /// Delete chats strictly between `min_id` and `max_id`.
    pub fn delete_range(&self, owner_id: i64, min_id: &str, max_id: &str) -> StoreResult<usize> {
        let conn = self.db.lock()?;
        let sql = format!(
            "DELETE FROM chats WHERE owner_id = :owner {}",
            RANGE_BOUNDS.replace("c.chat_id", "chat_id").replace(":since_id", ":min_id")
        );
        let deleted = conn.execute(
            &sql,
            named_params! {
                ":owner": owner_id,
                ":max_id": max_id,
                ":min_id": min_id,
            },
        )?;
        Ok(deleted)
    }

    /// Delete placeholder rows strictly between the bounds; used when a
    /// fetched page covers a previously unfetched range.
    pub fn delete_placeholders_between(
        &self,
        owner_id: i64,
        max_id: &str,
        since_id: &str,
    ) -> StoreResult<usize> {
        let conn = self.db.lock()?;
        let sql = format!(
            "DELETE FROM chats WHERE peer_account_id = '' AND owner_id = :owner {}",
            RANGE_BOUNDS.replace("c.chat_id", "chat_id")
        );
        let deleted = conn.execute(
            &sql,
            named_params! {
                ":owner": owner_id,
                ":max_id": max_id,
                ":since_id": since_id,
            },
        )?;
        Ok(deleted)
    }

    pub fn delete_by_peer(&self, owner_id: i64, peer_account_id: &str) -> StoreResult<usize> {
        let conn = self.db.lock()?;
        let deleted = conn.execute(
            "DELETE FROM chats WHERE owner_id = :owner AND peer_account_id = :peer",
            named_params! { ":owner": owner_id, ":peer": peer_account_id },
        )?;
        Ok(deleted)
    }

    pub fn delete_chat(&self, owner_id: i64, chat_id: &str) -> StoreResult<usize> {
        let conn = self.db.lock()?;
        let deleted = conn.execute(
            "DELETE FROM chats WHERE owner_id = :owner AND chat_id = :chat",
            named_params! { ":owner": owner_id, ":chat": chat_id },
        )?;
        Ok(deleted)
    }

    // ===== Preferences =====

    pub fn get_preference(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.db.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = :key",
                named_params! { ":key": key },
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_preference(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO preferences (key, value) VALUES (:key, :value)",
            named_params! { ":key": key, ":value": value },
        )?;
        Ok(())
    }

    #[cfg(test)]
    fn count(&self, table: &str) -> i64 {
        let conn = self.db.lock().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .unwrap()
    }
}

fn put_chat(conn: &Connection, chat: &ChatSummary) -> StoreResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO chats
         (owner_id, chat_id, peer_account_id, unread, updated_at, last_message_id)
         VALUES (:owner, :chat, :peer, :unread, :updated, :last_message)",
        named_params! {
            ":owner": chat.owner_id,
            ":chat": chat.chat_id,
            ":peer": chat.peer_account_id,
            ":unread": chat.unread,
            ":updated": chat.updated_at,
            ":last_message": chat.last_message_id,
        },
    )?;
    Ok(())
}

fn put_message(conn: &Connection, message: &ChatMessage) -> StoreResult<()> {
    let attachment = message
        .attachment
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    conn.execute(
        "INSERT OR REPLACE INTO chat_messages
         (owner_id, message_id, chat_id, sender_account_id, content, created_at, attachment, emojis)
         VALUES (:owner, :message, :chat, :sender, :content, :created, :attachment, :emojis)",
        named_params! {
            ":owner": message.owner_id,
            ":message": message.message_id,
            ":chat": message.chat_id,
            ":sender": message.sender_account_id,
            ":content": message.content,
            ":created": message.created_at,
            ":attachment": attachment,
            ":emojis": serde_json::to_string(&message.emojis)?,
        },
    )?;
    Ok(())
}

fn put_account(conn: &Connection, account: &AccountSummary) -> StoreResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO accounts
         (owner_id, account_id, display_name, handle, url, avatar_url, bot, emojis)
         VALUES (:owner, :account, :name, :handle, :url, :avatar, :bot, :emojis)",
        named_params! {
            ":owner": account.owner_id,
            ":account": account.account_id,
            ":name": account.display_name,
            ":handle": account.handle,
            ":url": account.url,
            ":avatar": account.avatar_url,
            ":bot": account.bot,
            ":emojis": serde_json::to_string(&account.emojis)?,
        },
    )?;
    Ok(())
}

fn decode_emojis(raw: Option<String>) -> Vec<Emoji> {
    raw.and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default()
}

fn decode_attachment(raw: Option<String>) -> Option<Attachment> {
    raw.and_then(|text| serde_json::from_str(&text).ok())
}
