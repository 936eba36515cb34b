//! Owns the chat list and drives the fetch → merge → write-through →
//! diff cycle. All mutation goes through `&mut self`, so the single-writer
//! discipline is enforced by whoever owns the value (the runtime worker);
//! each method finishes its diff before the next mutation can start.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::api::{types, ChatsApi};
use crate::config::DisplayOptions;
use crate::constants::prefs;
use crate::events::AppEvent;
use crate::models::{ChatMessage, ChatSummary, ChatViewData};
use crate::store::ChatStore;

use super::chat_list::{ChatList, FetchEnd, ListEntry};
use super::diff::{diff, ChangePayload, ListOp};
use super::ids::cmp_ids;

pub struct ChatTimeline {
    owner_id: i64,
    api: Arc<dyn ChatsApi>,
    store: ChatStore,
    options: DisplayOptions,
    page_size: u32,
    list: ChatList,
    /// Projection the presenter last saw; diffs run against this.
    last_view: Vec<ChatViewData>,
    fetch_failed: bool,
    initial_update_failed: bool,
    reached_bottom: bool,
}

impl ChatTimeline {
    pub fn new(
        owner_id: i64,
        api: Arc<dyn ChatsApi>,
        store: ChatStore,
        options: DisplayOptions,
        page_size: u32,
    ) -> Self {
        Self {
            owner_id,
            api,
            store,
            options,
            page_size,
            list: ChatList::new(),
            last_view: Vec::new(),
            fetch_failed: false,
            initial_update_failed: false,
            reached_bottom: false,
        }
    }

    pub fn rows(&self) -> &[ChatViewData] {
        &self.last_view
    }

    pub fn fetch_failed(&self) -> bool {
        self.fetch_failed
    }

    pub fn options(&self) -> DisplayOptions {
        self.options
    }

    /// Load the cached page from disk so there is something on screen
    /// before the first network round trip.
    pub async fn init(&mut self) -> Result<Vec<ListOp>> {
        let store = self.store.clone();
        let owner_id = self.owner_id;
        let page_size = self.page_size;
        let cached = tokio::task::spawn_blocking(move || {
            store.query_range(owner_id, None, None, page_size)
        })
        .await??;
        debug!(rows = cached.len(), "loaded cached chat page");
        self.list.replace_all(cached);
        Ok(self.sync())
    }

    /// Fetch above the newest known chat, or the newest page outright when
    /// the list is empty or the previous initial fetch failed. Bounding on
    /// the second id re-fetches the head entry too, refreshing its unread
    /// count and preview.
    pub async fn refresh(&mut self) -> Result<Vec<ListOp>> {
        let (first, second) = self.list.top_concrete_ids();
        match first {
            Some(first) if !self.initial_update_failed => {
                let since = second.unwrap_or(first);
                let fetched = self.fetch(None, Some(&since)).await;
                self.merge_fetched(fetched, FetchEnd::Top).await
            }
            _ => self.update_current().await,
        }
    }

    /// Replace the visible head with the newest server page, bridging to
    /// older cached entries with a gap placeholder when needed.
    async fn update_current(&mut self) -> Result<Vec<ListOp>> {
        let fetched = self.fetch(None, None).await;
        if fetched.is_none() {
            self.initial_update_failed = true;
            return Ok(self.sync());
        }
        self.initial_update_failed = false;
        self.merge_fetched(fetched, FetchEnd::Top).await
    }

    /// Fetch the page below the bottom-most known chat.
    pub async fn load_older(&mut self) -> Result<Vec<ListOp>> {
        if self.reached_bottom {
            return Ok(Vec::new());
        }
        let max_id = self.list.last_concrete_id();
        let fetched = self.fetch(max_id.as_deref(), None).await;
        if let Some(page) = &fetched {
            if (page.len() as u32) < self.page_size {
                self.reached_bottom = true;
            }
        }
        self.merge_fetched(fetched, FetchEnd::Bottom).await
    }

    /// Mark a gap placeholder as loading (or not). Returns the ops for the
    /// spinner toggle so it can be shown before the fetch completes.
    pub fn set_gap_loading(&mut self, boundary_id: &str, loading: bool) -> Vec<ListOp> {
        self.list.set_loading(boundary_id, loading);
        self.sync()
    }

    /// Fetch the range a placeholder covers and splice the result in.
    pub async fn expand_gap(&mut self, boundary_id: &str) -> Result<Vec<ListOp>> {
        let Some((above, below)) = self.list.gap_bounds(boundary_id) else {
            return Ok(self.sync());
        };
        let fetched = self.fetch(above.as_deref(), below.as_deref()).await;
        if fetched.is_none() {
            // Leave the gap in place, just stop the spinner.
            return Ok(self.set_gap_loading(boundary_id, false));
        }
        let boundary = boundary_id.to_string();

        // The fetched page supersedes whatever placeholder rows covered
        // this range on disk.
        if let (Some(above), Some(below)) = (&above, &below) {
            let store = self.store.clone();
            let owner_id = self.owner_id;
            let (above, below) = (above.clone(), below.clone());
            tokio::task::spawn_blocking(move || {
                store.delete_placeholders_between(owner_id, &above, &below)
            })
            .await??;
        }

        self.merge_fetched(fetched, FetchEnd::Middle {
            boundary_id: boundary,
        })
        .await
    }

    /// Live update: a message arrived for a chat we may already show.
    /// Unknown chats are left for the next refresh to pick up.
    pub async fn apply_new_message(&mut self, message: ChatMessage) -> Result<Vec<ListOp>> {
        let existing = self.list.entries().iter().find_map(|entry| match entry {
            ListEntry::Concrete { chat, account, .. } if chat.chat_id == message.chat_id => {
                Some((chat.clone(), account.clone()))
            }
            _ => None,
        });
        let Some((mut chat, account)) = existing else {
            return Ok(Vec::new());
        };

        chat.last_message_id = Some(message.message_id.clone());
        if let Some(created_at) = message.created_at {
            chat.updated_at = Some(created_at);
        }
        if message.sender_account_id == chat.peer_account_id {
            chat.unread += 1;
        }

        let store = self.store.clone();
        let (chat_for_store, message_for_store) = (chat.clone(), message.clone());
        tokio::task::spawn_blocking(move || {
            store.set_last_message(
                chat_for_store.owner_id,
                &chat_for_store.chat_id,
                &message_for_store,
            )?;
            store.upsert_chat(&chat_for_store)
        })
        .await??;

        self.list
            .upsert_entry(ListEntry::concrete(chat, account, Some(message)));
        Ok(self.sync())
    }

    /// React to an application event delivered over the command channel.
    pub async fn handle_event(&mut self, event: AppEvent) -> Result<Vec<ListOp>> {
        match event {
            AppEvent::PeerBlocked { account_id } | AppEvent::PeerMuted { account_id } => {
                self.list.remove_where(|entry| {
                    matches!(entry, ListEntry::Concrete { chat, .. }
                        if chat.peer_account_id == account_id)
                });
                let store = self.store.clone();
                let owner_id = self.owner_id;
                tokio::task::spawn_blocking(move || store.delete_by_peer(owner_id, &account_id))
                    .await??;
            }
            AppEvent::DomainMuted { domain } => {
                self.list.remove_where(|entry| {
                    matches!(entry, ListEntry::Concrete { account, .. }
                        if account.domain() == Some(domain.as_str()))
                });
            }
            AppEvent::MessageDeleted { status_id } => {
                if self.list.remove_by_id(&status_id) {
                    let store = self.store.clone();
                    let owner_id = self.owner_id;
                    tokio::task::spawn_blocking(move || store.delete_chat(owner_id, &status_id))
                        .await??;
                }
            }
            AppEvent::PreferenceChanged { key } => {
                if key == prefs::ABSOLUTE_TIME || key == prefs::SHOW_BOT_BADGE {
                    let store = self.store.clone();
                    self.options =
                        tokio::task::spawn_blocking(move || DisplayOptions::load(&store)).await?;
                    // Display options affect rendering only, so the
                    // projection is unchanged; rebind every row.
                    return Ok(self.full_rebind());
                }
            }
        }
        Ok(self.sync())
    }

    /// Timestamp-only refresh for every visible concrete row. A no-op in
    /// absolute-time mode, where labels do not age.
    pub fn tick_timestamps(&self) -> Vec<ListOp> {
        if self.options.absolute_time {
            return Vec::new();
        }
        let mut ops: Vec<ListOp> = Vec::new();
        for (position, row) in self.last_view.iter().enumerate() {
            if matches!(row, ChatViewData::Placeholder { .. }) {
                continue;
            }
            match ops.last_mut() {
                Some(ListOp::Change {
                    position: prev,
                    count,
                    ..
                }) if *prev + *count == position => *count += 1,
                _ => ops.push(ListOp::Change {
                    position,
                    count: 1,
                    payload: ChangePayload::TimestampOnly,
                }),
            }
        }
        ops
    }

    fn full_rebind(&mut self) -> Vec<ListOp> {
        self.last_view = self.list.view_data();
        if self.last_view.is_empty() {
            return Vec::new();
        }
        vec![ListOp::Change {
            position: 0,
            count: self.last_view.len(),
            payload: ChangePayload::Full,
        }]
    }

    /// Run the fetch; a failure leaves the list untouched and sets the
    /// retry-failed flag the UI surfaces.
    async fn fetch(&mut self, max_id: Option<&str>, since_id: Option<&str>) -> Option<Vec<ListEntry>> {
        match self
            .api
            .fetch_chats(max_id, since_id, self.page_size)
            .await
        {
            Ok(page) => {
                self.fetch_failed = false;
                let mut entries: Vec<ListEntry> = page
                    .into_iter()
                    .map(|chat: types::Chat| chat.into_entry(self.owner_id))
                    .collect();
                // The server orders by activity; the list and the store
                // order by chat id.
                entries.sort_by(|a, b| cmp_ids(b.chat_id(), a.chat_id()));
                Some(entries)
            }
            Err(err) => {
                warn!(error = %err, "chat fetch failed");
                self.fetch_failed = true;
                None
            }
        }
    }

    /// Merge a fetched page, persist it, and diff.
    async fn merge_fetched(
        &mut self,
        fetched: Option<Vec<ListEntry>>,
        end: FetchEnd,
    ) -> Result<Vec<ListOp>> {
        let Some(entries) = fetched else {
            return Ok(self.sync());
        };
        let full_page = entries.len() as u32 >= self.page_size;
        let page = entries.clone();
        let gap = self.list.merge_fetch_result(entries, end, full_page);

        let store = self.store.clone();
        let owner_id = self.owner_id;
        tokio::task::spawn_blocking(move || -> crate::store::StoreResult<()> {
            // Persisted gap markers covered by the page are stale now;
            // markers equal to a fetched id are overwritten by the upsert.
            let high = page.first().map(|e| e.chat_id().to_string());
            let low = page.last().map(|e| e.chat_id().to_string());
            if let (Some(high), Some(low)) = (high, low) {
                if high != low {
                    store.delete_placeholders_between(owner_id, &high, &low)?;
                }
            }
            store.insert_page(owner_id, &page)?;
            if let Some(boundary) = gap {
                store.upsert_chat(&ChatSummary::placeholder(owner_id, &boundary))?;
            }
            Ok(())
        })
        .await??;

        Ok(self.sync())
    }

    /// Project the list and compute the update instructions since the
    /// projection the presenter last saw.
    fn sync(&mut self) -> Vec<ListOp> {
        let next = self.list.view_data();
        let ops = diff(&self.last_view, &next);
        self.last_view = next;
        ops
    }
}
