use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::Emoji;

/// Presentation-ready projection of a list entry, decoupled from the
/// storage schema. This is what the differ compares and what row
/// binding consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatViewData {
    Placeholder { id: String, loading: bool },
    Concrete(ChatRowData),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRowData {
    pub chat_id: String,
    pub display_name: String,
    pub handle: String,
    pub avatar_url: String,
    pub bot: bool,
    pub account_emojis: Vec<Emoji>,
    /// Last-message preview text, if the chat has a message.
    pub preview: Option<String>,
    pub preview_emojis: Vec<Emoji>,
    pub has_attachment: bool,
    pub unread: i64,
    /// Epoch millis; `None` renders as the fixed missing-timestamp label.
    pub updated_at: Option<i64>,
}

impl ChatViewData {
    /// Stable per-entry key used for identity matching in the differ.
    /// The variant participates in the hash: a placeholder and a concrete
    /// chat sharing an id string are different rows.
    pub fn view_data_id(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match self {
            ChatViewData::Placeholder { id, .. } => {
                0u8.hash(&mut hasher);
                id.hash(&mut hasher);
            }
            ChatViewData::Concrete(row) => {
                1u8.hash(&mut hasher);
                row.chat_id.hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    /// True when every displayed field except the timestamp matches.
    ///
    /// The timestamp is display-volatile (it ages every minute), so it is
    /// excluded here; a pair differing only there gets the lightweight
    /// timestamp-only change payload instead of a full rebind.
    pub fn substantively_equals(&self, other: &ChatViewData) -> bool {
        match (self, other) {
            (
                ChatViewData::Placeholder { id: a, loading: la },
                ChatViewData::Placeholder { id: b, loading: lb },
            ) => a == b && la == lb,
            (ChatViewData::Concrete(a), ChatViewData::Concrete(b)) => {
                a.chat_id == b.chat_id
                    && a.display_name == b.display_name
                    && a.handle == b.handle
                    && a.avatar_url == b.avatar_url
                    && a.bot == b.bot
                    && a.account_emojis == b.account_emojis
                    && a.preview == b.preview
                    && a.preview_emojis == b.preview_emojis
                    && a.has_attachment == b.has_attachment
                    && a.unread == b.unread
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(chat_id: &str, updated_at: i64) -> ChatRowData {
        ChatRowData {
            chat_id: chat_id.to_string(),
            display_name: "Alice".into(),
            handle: "alice@pleroma.example".into(),
            avatar_url: "https://pleroma.example/avatar.png".into(),
            bot: false,
            account_emojis: Vec::new(),
            preview: Some("hi".into()),
            preview_emojis: Vec::new(),
            has_attachment: false,
            unread: 0,
            updated_at: Some(updated_at),
        }
    }

    #[test]
    fn identity_is_stable_per_chat_id() {
        let a = ChatViewData::Concrete(row("7", 1000));
        let b = ChatViewData::Concrete(row("7", 2000));
        assert_eq!(a.view_data_id(), b.view_data_id());
        let c = ChatViewData::Concrete(row("8", 1000));
        assert_ne!(a.view_data_id(), c.view_data_id());
    }

    #[test]
    fn placeholder_and_concrete_with_same_id_are_different_rows() {
        let p = ChatViewData::Placeholder {
            id: "7".into(),
            loading: false,
        };
        let c = ChatViewData::Concrete(row("7", 1000));
        assert_ne!(p.view_data_id(), c.view_data_id());
    }

    #[test]
    fn timestamp_does_not_count_as_substantive() {
        let a = ChatViewData::Concrete(row("7", 1000));
        let b = ChatViewData::Concrete(row("7", 9999));
        assert!(a.substantively_equals(&b));
        assert_ne!(a, b);

        let mut changed = row("7", 1000);
        changed.unread = 3;
        assert!(!a.substantively_equals(&ChatViewData::Concrete(changed)));
    }
}
