/// A chat conversation summary, keyed by `(owner_id, chat_id)`.
///
/// Rows with an empty `peer_account_id` are persisted gap placeholders,
/// not real conversations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSummary {
    pub owner_id: i64,
    pub chat_id: String,
    pub peer_account_id: String,
    pub unread: i64,
    /// Epoch millis; `None` when the server timestamp was malformed.
    pub updated_at: Option<i64>,
    pub last_message_id: Option<String>,
}

impl ChatSummary {
    pub fn is_placeholder_row(&self) -> bool {
        self.peer_account_id.is_empty()
    }

    /// A persisted gap marker for the given boundary id.
    pub fn placeholder(owner_id: i64, chat_id: &str) -> Self {
        Self {
            owner_id,
            chat_id: chat_id.to_string(),
            peer_account_id: String::new(),
            unread: 0,
            updated_at: None,
            last_message_id: None,
        }
    }
}
