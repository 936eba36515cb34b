//! Wire types for the chats endpoints, plus conversions into the cached
//! entities. Field names follow the server payloads; everything the
//! client does not render is simply not deserialized.

use serde::Deserialize;

use crate::models::{self, AccountSummary, Attachment, ChatSummary, Emoji};
use crate::timeline::ListEntry;

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    pub acct: String,
    pub display_name: String,
    pub url: String,
    pub avatar: String,
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub emojis: Vec<Emoji>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub chat_id: String,
    pub account_id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    #[serde(default)]
    pub emojis: Vec<Emoji>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: String,
    pub account: Account,
    #[serde(default)]
    pub unread: i64,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub last_message: Option<ChatMessage>,
}

impl Account {
    pub fn into_summary(self, owner_id: i64) -> AccountSummary {
        AccountSummary {
            owner_id,
            account_id: self.id,
            display_name: self.display_name,
            handle: self.acct,
            url: self.url,
            avatar_url: self.avatar,
            bot: self.bot,
            emojis: self.emojis,
        }
    }
}

impl ChatMessage {
    pub fn into_entity(self, owner_id: i64) -> models::ChatMessage {
        models::ChatMessage {
            owner_id,
            message_id: self.id,
            chat_id: self.chat_id,
            sender_account_id: self.account_id,
            content: self.content.unwrap_or_default(),
            created_at: parse_timestamp(self.created_at.as_deref()),
            attachment: self.attachment,
            emojis: self.emojis,
        }
    }
}

impl Chat {
    pub fn into_entry(self, owner_id: i64) -> ListEntry {
        let last_message = self.last_message.map(|m| m.into_entity(owner_id));
        let chat = ChatSummary {
            owner_id,
            chat_id: self.id,
            peer_account_id: self.account.id.clone(),
            unread: self.unread,
            updated_at: parse_timestamp(self.updated_at.as_deref()),
            last_message_id: last_message.as_ref().map(|m| m.message_id.clone()),
        };
        ListEntry::concrete(chat, self.account.into_summary(owner_id), last_message)
    }
}

/// RFC 3339 server timestamp to epoch millis; malformed input becomes
/// `None` and renders as the missing-timestamp label.
fn parse_timestamp(raw: Option<&str>) -> Option<i64> {
    let parsed = chrono::DateTime::parse_from_rfc3339(raw?).ok()?;
    Some(parsed.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT_JSON: &str = r#"{
        "id": "9y8r7wzFGG71a9zyCa",
        "unread": 2,
        "updated_at": "2020-06-29T18:20:28.000Z",
        "account": {
            "id": "9vMAje3HMWbkdxEaEE",
            "acct": "alice@pleroma.example",
            "display_name": "Alice",
            "url": "https://pleroma.example/users/alice",
            "avatar": "https://pleroma.example/images/avi.png",
            "bot": true,
            "emojis": [{"shortcode": "wave", "url": "https://pleroma.example/emoji/wave.png"}]
        },
        "last_message": {
            "id": "12344321",
            "chat_id": "9y8r7wzFGG71a9zyCa",
            "account_id": "9vMAje3HMWbkdxEaEE",
            "content": "hey you",
            "created_at": "2020-06-29T18:20:28.000Z",
            "attachment": null,
            "emojis": []
        }
    }"#;

    #[test]
    fn chat_payload_becomes_a_concrete_entry() {
        let wire: Chat = serde_json::from_str(CHAT_JSON).unwrap();
        let entry = wire.into_entry(1);
        match entry {
            ListEntry::Concrete {
                chat,
                account,
                last_message,
            } => {
                assert_eq!(chat.chat_id, "9y8r7wzFGG71a9zyCa");
                assert_eq!(chat.peer_account_id, "9vMAje3HMWbkdxEaEE");
                assert_eq!(chat.unread, 2);
                assert_eq!(chat.updated_at, Some(1_593_454_828_000));
                assert_eq!(chat.last_message_id.as_deref(), Some("12344321"));
                assert!(account.bot);
                assert_eq!(account.handle, "alice@pleroma.example");
                assert_eq!(account.emojis[0].shortcode, "wave");
                assert_eq!(last_message.unwrap().content, "hey you");
            }
            other => panic!("expected concrete entry, got {other:?}"),
        }
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let json = r#"{
            "id": "1",
            "account": {
                "id": "2",
                "acct": "bob",
                "display_name": "Bob",
                "url": "https://pleroma.example/users/bob",
                "avatar": ""
            }
        }"#;
        let wire: Chat = serde_json::from_str(json).unwrap();
        let entry = wire.into_entry(1);
        match entry {
            ListEntry::Concrete {
                chat, last_message, ..
            } => {
                assert_eq!(chat.unread, 0);
                assert_eq!(chat.updated_at, None);
                assert!(last_message.is_none());
            }
            other => panic!("expected concrete entry, got {other:?}"),
        }
    }

    #[test]
    fn malformed_timestamp_parses_to_none() {
        assert_eq!(parse_timestamp(Some("not a timestamp")), None);
        assert_eq!(parse_timestamp(None), None);
        assert_eq!(
            parse_timestamp(Some("2020-06-29T18:20:28.000Z")),
            Some(1_593_454_828_000)
        );
    }
}
