//! Binding of a chat-list row's widget state from its view data.
//!
//! A bind with no payload rewrites everything; the timestamp-only payload
//! touches nothing but the timestamp label, so the avatar, name, and
//! preview survive the one-minute refresh untouched.

use chrono::{Local, TimeZone};

use fedichat_core::constants::MISSING_TIMESTAMP;
use fedichat_core::models::ChatViewData;
use fedichat_core::timeline::ChangePayload;
use fedichat_core::DisplayOptions;

use super::format::{absolute_label, format_relative_time};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowKind {
    #[default]
    Chat,
    LoadMore,
}

/// The widget state of one visible row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatRowState {
    pub kind: RowKind,
    pub display_name: String,
    pub handle: String,
    /// Single-cell stand-in for the avatar image.
    pub avatar_glyph: String,
    pub bot_badge: bool,
    pub preview: String,
    pub has_attachment: bool,
    pub unread: i64,
    pub timestamp: String,
    pub loading: bool,
}

/// Bind `data` into `state`. `now_ms` is wall-clock now at bind time.
pub fn bind(
    state: &mut ChatRowState,
    data: &ChatViewData,
    payload: Option<ChangePayload>,
    options: &DisplayOptions,
    now_ms: i64,
) {
    match data {
        ChatViewData::Placeholder { loading, .. } => {
            state.kind = RowKind::LoadMore;
            state.loading = *loading;
        }
        ChatViewData::Concrete(row) => match payload {
            Some(ChangePayload::TimestampOnly) => {
                state.timestamp = timestamp_label(row.updated_at, options, now_ms);
            }
            _ => {
                state.kind = RowKind::Chat;
                state.display_name = row.display_name.clone();
                state.handle = format!("@{}", row.handle);
                state.avatar_glyph = avatar_glyph(row);
                state.bot_badge = options.show_bot_badge && row.bot;
                state.preview = row.preview.clone().unwrap_or_default();
                state.has_attachment = row.has_attachment;
                state.unread = row.unread;
                state.timestamp = timestamp_label(row.updated_at, options, now_ms);
                state.loading = false;
            }
        },
    }
}

fn avatar_glyph(row: &fedichat_core::models::ChatRowData) -> String {
    row.display_name
        .chars()
        .next()
        .or_else(|| row.handle.chars().next())
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn timestamp_label(updated_at: Option<i64>, options: &DisplayOptions, now_ms: i64) -> String {
    let Some(then_ms) = updated_at else {
        return MISSING_TIMESTAMP.to_string();
    };
    if options.absolute_time {
        let (Some(then), Some(now)) = (local_naive(then_ms), local_naive(now_ms)) else {
            return MISSING_TIMESTAMP.to_string();
        };
        absolute_label(then, now)
    } else {
        format_relative_time(then_ms, now_ms)
    }
}

fn local_naive(ms: i64) -> Option<chrono::NaiveDateTime> {
    Local.timestamp_millis_opt(ms).single().map(|dt| dt.naive_local())
}

#[cfg(test)]
mod tests {
    use fedichat_core::models::ChatRowData;

    use super::*;

    fn row_data() -> ChatRowData {
        ChatRowData {
            chat_id: "9".to_string(),
            display_name: "Alice".to_string(),
            handle: "alice@pleroma.example".to_string(),
            avatar_url: "https://pleroma.example/avi.png".to_string(),
            bot: true,
            account_emojis: Vec::new(),
            preview: Some("see you tomorrow".to_string()),
            preview_emojis: Vec::new(),
            has_attachment: true,
            unread: 4,
            updated_at: Some(1_600_000_000_000),
        }
    }

    fn options() -> DisplayOptions {
        DisplayOptions::default()
    }

    #[test]
    fn full_bind_populates_every_field() {
        let mut state = ChatRowState::default();
        let now = 1_600_000_300_000;
        bind(
            &mut state,
            &ChatViewData::Concrete(row_data()),
            None,
            &options(),
            now,
        );
        assert_eq!(state.kind, RowKind::Chat);
        assert_eq!(state.display_name, "Alice");
        assert_eq!(state.handle, "@alice@pleroma.example");
        assert_eq!(state.avatar_glyph, "A");
        assert!(state.bot_badge);
        assert_eq!(state.preview, "see you tomorrow");
        assert!(state.has_attachment);
        assert_eq!(state.unread, 4);
        assert_eq!(state.timestamp, "5m ago");
    }

    #[test]
    fn timestamp_only_payload_touches_nothing_else() {
        let mut state = ChatRowState::default();
        let data = ChatViewData::Concrete(row_data());
        bind(&mut state, &data, None, &options(), 1_600_000_300_000);
        let before = state.clone();

        bind(
            &mut state,
            &data,
            Some(ChangePayload::TimestampOnly),
            &options(),
            1_600_003_600_000,
        );
        assert_eq!(state.timestamp, "1h ago");
        assert_eq!(
            ChatRowState {
                timestamp: before.timestamp.clone(),
                ..state.clone()
            },
            before,
        );
    }

    #[test]
    fn bot_badge_respects_the_display_option() {
        let mut state = ChatRowState::default();
        let mut options = options();
        options.show_bot_badge = false;
        bind(
            &mut state,
            &ChatViewData::Concrete(row_data()),
            None,
            &options,
            0,
        );
        assert!(!state.bot_badge);
    }

    #[test]
    fn missing_timestamp_renders_the_fixed_placeholder() {
        let mut state = ChatRowState::default();
        let mut data = row_data();
        data.updated_at = None;
        bind(
            &mut state,
            &ChatViewData::Concrete(data),
            None,
            &options(),
            0,
        );
        assert_eq!(state.timestamp, MISSING_TIMESTAMP);

        let mut absolute = options();
        absolute.absolute_time = true;
        let mut data = row_data();
        data.updated_at = None;
        bind(
            &mut state,
            &ChatViewData::Concrete(data),
            None,
            &absolute,
            0,
        );
        assert_eq!(state.timestamp, MISSING_TIMESTAMP);
    }

    #[test]
    fn placeholder_binds_to_a_load_more_row() {
        let mut state = ChatRowState::default();
        bind(
            &mut state,
            &ChatViewData::Placeholder {
                id: "5".to_string(),
                loading: true,
            },
            None,
            &options(),
            0,
        );
        assert_eq!(state.kind, RowKind::LoadMore);
        assert!(state.loading);
    }
}
