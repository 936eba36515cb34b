use super::{Attachment, Emoji};

/// A single chat message, keyed by `(owner_id, message_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub owner_id: i64,
    pub message_id: String,
    /// The chat this message belongs to.
    pub chat_id: String,
    pub sender_account_id: String,
    pub content: String,
    /// Epoch millis; `None` when the server timestamp was malformed.
    pub created_at: Option<i64>,
    pub attachment: Option<Attachment>,
    pub emojis: Vec<Emoji>,
}
