//! The in-memory chat list: an ordered sequence of concrete chats and
//! gap placeholders, merged from disk and network pages.

use crate::models::{AccountSummary, ChatMessage, ChatRowData, ChatSummary, ChatViewData};

use super::ids::{dec_id, id_gt, id_lt};

/// One row of the chat timeline. Placeholders mark unfetched gaps in an
/// otherwise contiguous reverse-chronological sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEntry {
    Placeholder {
        boundary_id: String,
        loading: bool,
    },
    Concrete {
        chat: ChatSummary,
        account: AccountSummary,
        last_message: Option<ChatMessage>,
    },
}

impl ListEntry {
    pub fn concrete(
        chat: ChatSummary,
        account: AccountSummary,
        last_message: Option<ChatMessage>,
    ) -> Self {
        ListEntry::Concrete {
            chat,
            account,
            last_message,
        }
    }

    pub fn placeholder(boundary_id: &str) -> Self {
        ListEntry::Placeholder {
            boundary_id: boundary_id.to_string(),
            loading: false,
        }
    }

    /// The id this entry occupies in the ordering; a placeholder is keyed
    /// by its boundary id.
    pub fn chat_id(&self) -> &str {
        match self {
            ListEntry::Placeholder { boundary_id, .. } => boundary_id,
            ListEntry::Concrete { chat, .. } => &chat.chat_id,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ListEntry::Placeholder { .. })
    }

    pub fn view_data(&self) -> ChatViewData {
        match self {
            ListEntry::Placeholder {
                boundary_id,
                loading,
            } => ChatViewData::Placeholder {
                id: boundary_id.clone(),
                loading: *loading,
            },
            ListEntry::Concrete {
                chat,
                account,
                last_message,
            } => ChatViewData::Concrete(ChatRowData {
                chat_id: chat.chat_id.clone(),
                display_name: account.display_name.clone(),
                handle: account.handle.clone(),
                avatar_url: account.avatar_url.clone(),
                bot: account.bot,
                account_emojis: account.emojis.clone(),
                preview: last_message.as_ref().map(|m| m.content.clone()),
                preview_emojis: last_message
                    .as_ref()
                    .map(|m| m.emojis.clone())
                    .unwrap_or_default(),
                has_attachment: last_message
                    .as_ref()
                    .is_some_and(|m| m.attachment.is_some()),
                unread: chat.unread,
                updated_at: chat.updated_at,
            }),
        }
    }
}

/// Which end of the list a fetched page belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEnd {
    Top,
    /// Filling the gap behind the placeholder with this boundary id.
    Middle { boundary_id: String },
    Bottom,
}

#[derive(Debug, Default)]
pub struct ChatList {
    entries: Vec<ListEntry>,
}

impl ChatList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    /// Presentation projection of the whole list.
    pub fn view_data(&self) -> Vec<ChatViewData> {
        self.entries.iter().map(ListEntry::view_data).collect()
    }

    /// Replace the whole sequence, e.g. with a page loaded from disk.
    pub fn replace_all(&mut self, entries: Vec<ListEntry>) {
        self.entries = entries;
        self.normalize();
    }

    /// Ids of the first concrete entry and, when the entry right after it
    /// is also concrete, of that one. Used as keyset bounds when fetching
    /// above the known head.
    pub fn top_concrete_ids(&self) -> (Option<String>, Option<String>) {
        let Some(first) = self.entries.iter().position(|e| !e.is_placeholder()) else {
            return (None, None);
        };
        let first_id = self.entries[first].chat_id().to_string();
        let second_id = match self.entries.get(first + 1) {
            Some(entry) if !entry.is_placeholder() => Some(entry.chat_id().to_string()),
            _ => None,
        };
        (Some(first_id), second_id)
    }

    /// Id of the bottom-most concrete entry, the keyset bound for fetching
    /// further down.
    pub fn last_concrete_id(&self) -> Option<String> {
        self.entries
            .iter()
            .rev()
            .find(|e| !e.is_placeholder())
            .map(|e| e.chat_id().to_string())
    }

    /// Ids of the concrete entries adjacent to the given placeholder,
    /// i.e. the keyset bounds of the gap it marks.
    pub fn gap_bounds(&self, boundary_id: &str) -> Option<(Option<String>, Option<String>)> {
        let pos = self.placeholder_position(boundary_id)?;
        let above = self.entries[..pos]
            .iter()
            .rev()
            .find(|e| !e.is_placeholder())
            .map(|e| e.chat_id().to_string());
        let below = self.entries[pos + 1..]
            .iter()
            .find(|e| !e.is_placeholder())
            .map(|e| e.chat_id().to_string());
        Some((above, below))
    }

    pub fn set_loading(&mut self, boundary_id: &str, loading: bool) -> bool {
        for entry in &mut self.entries {
            if let ListEntry::Placeholder {
                boundary_id: id,
                loading: flag,
            } = entry
            {
                if id == boundary_id {
                    *flag = loading;
                    return true;
                }
            }
        }
        false
    }

    /// Merge a fetched page into the sequence. `full_page` means the fetch
    /// returned as many entries as were requested, so more may exist past
    /// its far edge. Returns the boundary id of a gap placeholder the
    /// merge synthesized, if any, so callers can persist it.
    pub fn merge_fetch_result(
        &mut self,
        new_entries: Vec<ListEntry>,
        end: FetchEnd,
        full_page: bool,
    ) -> Option<String> {
        let gap = match end {
            FetchEnd::Top => self.merge_top(new_entries, full_page),
            FetchEnd::Middle { boundary_id } => {
                self.merge_middle(&boundary_id, new_entries, full_page)
            }
            FetchEnd::Bottom => {
                self.merge_bottom(new_entries);
                None
            }
        };
        self.normalize();
        debug_assert!(self.is_ordered());
        // The gap marker may have been collapsed away as redundant.
        gap.filter(|id| self.placeholder_position(id).is_some())
    }

    fn merge_top(&mut self, new_entries: Vec<ListEntry>, full_page: bool) -> Option<String> {
        if new_entries.is_empty() {
            return None;
        }
        if self.entries.is_empty() {
            self.entries = new_entries;
            return None;
        }
        // Everything the fresh page covers is superseded, placeholders included.
        let low = new_entries
            .last()
            .map(|e| e.chat_id().to_string())
            .unwrap_or_default();
        self.entries.retain(|e| id_lt(e.chat_id(), &low));

        let mut merged = new_entries;
        let mut gap = None;
        if full_page && !self.entries.is_empty() {
            // The page may not reach down to what we already had; keep a
            // gap marker just below it.
            let boundary = dec_id(&low);
            merged.push(ListEntry::placeholder(&boundary));
            gap = Some(boundary);
        }
        merged.append(&mut self.entries);
        self.entries = merged;
        gap
    }

    fn merge_middle(
        &mut self,
        boundary_id: &str,
        new_entries: Vec<ListEntry>,
        full_page: bool,
    ) -> Option<String> {
        let Some(pos) = self.placeholder_position(boundary_id) else {
            return None;
        };
        let mut replacement = new_entries;
        let mut gap = None;
        if full_page {
            if let Some(low) = replacement.last().map(|e| e.chat_id().to_string()) {
                let boundary = dec_id(&low);
                replacement.push(ListEntry::placeholder(&boundary));
                gap = Some(boundary);
            }
        }
        self.entries.splice(pos..pos + 1, replacement);
        gap
    }

    fn merge_bottom(&mut self, mut new_entries: Vec<ListEntry>) {
        if let Some(ListEntry::Placeholder { .. }) = self.entries.last() {
            self.entries.pop();
        }
        if let Some(last_id) = self.entries.last().map(|e| e.chat_id().to_string()) {
            new_entries.retain(|e| id_lt(e.chat_id(), &last_id));
        }
        self.entries.append(&mut new_entries);
    }

    /// Insert or replace a single concrete entry at its ordered position.
    /// Used for live updates that bump a chat when a message arrives.
    pub fn upsert_entry(&mut self, entry: ListEntry) {
        let id = entry.chat_id().to_string();
        self.entries
            .retain(|e| e.is_placeholder() || e.chat_id() != id);
        let pos = self.entries.partition_point(|e| id_gt(e.chat_id(), &id));
        self.entries.insert(pos, entry);
        self.normalize();
        debug_assert!(self.is_ordered());
    }

    /// Bulk eviction; placeholders orphaned by the removal are collapsed.
    pub fn remove_where<F: Fn(&ListEntry) -> bool>(&mut self, predicate: F) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !predicate(e));
        self.normalize();
        before - self.entries.len()
    }

    /// Remove the concrete entry with this chat id, if present.
    pub fn remove_by_id(&mut self, chat_id: &str) -> bool {
        let Some(pos) = self
            .entries
            .iter()
            .position(|e| !e.is_placeholder() && e.chat_id() == chat_id)
        else {
            return false;
        };
        self.entries.remove(pos);
        self.normalize();
        true
    }

    fn placeholder_position(&self, boundary_id: &str) -> Option<usize> {
        self.entries.iter().position(
            |e| matches!(e, ListEntry::Placeholder { boundary_id: id, .. } if id == boundary_id),
        )
    }

    /// Restore the list invariants after a structural edit: no two
    /// consecutive placeholders, no placeholder covered by an adjacent
    /// entry with the same id, no duplicate chat ids (concrete wins).
    fn normalize(&mut self) {
        enum Action {
            Push,
            Skip,
            ReplacePrev,
        }
        let mut out: Vec<ListEntry> = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            let action = match out.last() {
                None => Action::Push,
                Some(prev) => {
                    let same_id = prev.chat_id() == entry.chat_id();
                    match &entry {
                        ListEntry::Placeholder { .. } if prev.is_placeholder() || same_id => {
                            Action::Skip
                        }
                        ListEntry::Concrete { .. } if same_id && prev.is_placeholder() => {
                            Action::ReplacePrev
                        }
                        ListEntry::Concrete { .. } if same_id => Action::Skip,
                        _ => Action::Push,
                    }
                }
            };
            match action {
                Action::Push => out.push(entry),
                Action::Skip => {}
                Action::ReplacePrev => {
                    out.pop();
                    out.push(entry);
                }
            }
        }
        self.entries = out;
    }

    fn is_ordered(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| id_gt(w[0].chat_id(), w[1].chat_id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(id: &str) -> ListEntry {
        chat_with_peer(id, "peer")
    }

    fn chat_with_peer(id: &str, peer: &str) -> ListEntry {
        ListEntry::concrete(
            ChatSummary {
                owner_id: 1,
                chat_id: id.to_string(),
                peer_account_id: peer.to_string(),
                unread: 0,
                updated_at: Some(1_000),
                last_message_id: None,
            },
            AccountSummary {
                owner_id: 1,
                account_id: peer.to_string(),
                display_name: peer.to_string(),
                handle: format!("{peer}@pleroma.example"),
                url: format!("https://pleroma.example/users/{peer}"),
                avatar_url: String::new(),
                bot: false,
                emojis: Vec::new(),
            },
            None,
        )
    }

    fn ids(list: &ChatList) -> Vec<String> {
        list.entries()
            .iter()
            .map(|e| {
                if e.is_placeholder() {
                    format!("p{}", e.chat_id())
                } else {
                    e.chat_id().to_string()
                }
            })
            .collect()
    }

    #[test]
    fn top_merge_into_empty_list_keeps_page_as_is() {
        let mut list = ChatList::new();
        list.merge_fetch_result(vec![chat("100"), chat("99")], FetchEnd::Top, true);
        assert_eq!(ids(&list), vec!["100", "99"]);
    }

    #[test]
    fn full_top_page_that_does_not_meet_the_head_leaves_a_gap() {
        let mut list = ChatList::new();
        list.replace_all(vec![chat("50")]);
        list.merge_fetch_result(vec![chat("100"), chat("99")], FetchEnd::Top, true);
        assert_eq!(ids(&list), vec!["100", "99", "p98", "50"]);
    }

    #[test]
    fn contiguous_top_page_leaves_no_gap() {
        let mut list = ChatList::new();
        list.replace_all(vec![chat("99"), chat("50")]);
        list.merge_fetch_result(vec![chat("100")], FetchEnd::Top, true);
        assert_eq!(ids(&list), vec!["100", "99", "50"]);
    }

    #[test]
    fn top_merge_supersedes_overlapping_entries() {
        let mut list = ChatList::new();
        list.replace_all(vec![chat("100"), chat("99"), chat("50")]);
        list.merge_fetch_result(
            vec![chat("101"), chat("100"), chat("99")],
            FetchEnd::Top,
            false,
        );
        assert_eq!(ids(&list), vec!["101", "100", "99", "50"]);
    }

    #[test]
    fn gap_fetch_replaces_exactly_the_matching_placeholder_in_place() {
        let mut list = ChatList::new();
        list.replace_all(vec![chat("100"), ListEntry::placeholder("95"), chat("90")]);
        list.merge_fetch_result(
            vec![chat("95"), chat("93")],
            FetchEnd::Middle {
                boundary_id: "95".to_string(),
            },
            false,
        );
        assert_eq!(ids(&list), vec!["100", "95", "93", "90"]);
        // The concrete entry landed at the placeholder's logical position.
        assert_eq!(list.entries()[1].chat_id(), "95");
        assert!(!list.entries()[1].is_placeholder());
    }

    #[test]
    fn unexhausted_gap_fetch_keeps_a_placeholder_below_the_page() {
        let mut list = ChatList::new();
        list.replace_all(vec![chat("100"), ListEntry::placeholder("95"), chat("50")]);
        list.merge_fetch_result(
            vec![chat("95"), chat("93")],
            FetchEnd::Middle {
                boundary_id: "95".to_string(),
            },
            true,
        );
        assert_eq!(ids(&list), vec!["100", "95", "93", "p92", "50"]);
    }

    #[test]
    fn empty_gap_fetch_drops_the_stale_placeholder() {
        let mut list = ChatList::new();
        list.replace_all(vec![chat("100"), ListEntry::placeholder("95"), chat("90")]);
        list.merge_fetch_result(
            Vec::new(),
            FetchEnd::Middle {
                boundary_id: "95".to_string(),
            },
            false,
        );
        assert_eq!(ids(&list), vec!["100", "90"]);
    }

    #[test]
    fn bottom_merge_appends_and_drops_already_known_ids() {
        let mut list = ChatList::new();
        list.replace_all(vec![chat("100"), chat("90")]);
        list.merge_fetch_result(vec![chat("90"), chat("80")], FetchEnd::Bottom, false);
        assert_eq!(ids(&list), vec!["100", "90", "80"]);
    }

    #[test]
    fn bottom_merge_consumes_a_trailing_placeholder() {
        let mut list = ChatList::new();
        list.replace_all(vec![chat("100"), ListEntry::placeholder("99")]);
        list.merge_fetch_result(vec![chat("90"), chat("80")], FetchEnd::Bottom, false);
        assert_eq!(ids(&list), vec!["100", "90", "80"]);
    }

    #[test]
    fn consecutive_placeholders_collapse() {
        let mut list = ChatList::new();
        list.replace_all(vec![
            chat("100"),
            ListEntry::placeholder("99"),
            ListEntry::placeholder("98"),
            chat("50"),
        ]);
        assert_eq!(ids(&list), vec!["100", "p99", "50"]);
    }

    #[test]
    fn remove_where_evicts_every_entry_for_a_peer() {
        let mut list = ChatList::new();
        list.replace_all(vec![
            chat_with_peer("100", "mallory"),
            chat_with_peer("99", "alice"),
            chat_with_peer("98", "mallory"),
        ]);
        let removed = list.remove_where(|e| {
            matches!(e, ListEntry::Concrete { chat, .. } if chat.peer_account_id == "mallory")
        });
        assert_eq!(removed, 2);
        assert_eq!(ids(&list), vec!["99"]);
    }

    #[test]
    fn remove_by_id_removes_a_single_concrete_entry() {
        let mut list = ChatList::new();
        list.replace_all(vec![chat("100"), chat("99"), chat("98")]);
        assert!(list.remove_by_id("99"));
        assert!(!list.remove_by_id("99"));
        assert_eq!(ids(&list), vec!["100", "98"]);
    }

    #[test]
    fn upsert_moves_a_bumped_chat_to_its_ordered_position() {
        let mut list = ChatList::new();
        list.replace_all(vec![chat("100"), chat("99"), chat("98")]);
        list.upsert_entry(chat("101"));
        assert_eq!(ids(&list), vec!["101", "100", "99", "98"]);
        // Replacing an existing id keeps a single entry for it.
        list.upsert_entry(chat("99"));
        assert_eq!(ids(&list), vec!["101", "100", "99", "98"]);
    }

    #[test]
    fn gap_bounds_reports_the_adjacent_concrete_ids() {
        let mut list = ChatList::new();
        list.replace_all(vec![chat("100"), ListEntry::placeholder("95"), chat("90")]);
        assert_eq!(
            list.gap_bounds("95"),
            Some((Some("100".to_string()), Some("90".to_string())))
        );
        assert_eq!(list.gap_bounds("42"), None);
    }

    #[test]
    fn top_ids_skip_nothing_when_head_entries_are_concrete() {
        let mut list = ChatList::new();
        list.replace_all(vec![chat("100"), chat("99"), chat("98")]);
        assert_eq!(
            list.top_concrete_ids(),
            (Some("100".to_string()), Some("99".to_string()))
        );
    }

    #[test]
    fn top_ids_do_not_pair_across_a_placeholder() {
        let mut list = ChatList::new();
        list.replace_all(vec![chat("100"), ListEntry::placeholder("95"), chat("90")]);
        assert_eq!(list.top_concrete_ids(), (Some("100".to_string()), None));
    }
}
