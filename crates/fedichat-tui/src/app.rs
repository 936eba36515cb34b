//! UI-side state: the bound row widgets and how timeline updates are
//! applied to them.

use fedichat_core::models::ChatViewData;
use fedichat_core::timeline::ListOp;
use fedichat_core::{DisplayOptions, TimelineUpdate};

use crate::ui::chat_row::{bind, ChatRowState};

pub struct App {
    /// Bound widget state, one per visible row.
    pub rows: Vec<ChatRowState>,
    /// The projection the rows were bound from.
    pub row_data: Vec<ChatViewData>,
    pub selected: usize,
    pub fetch_failed: bool,
    pub options: DisplayOptions,
    pub should_quit: bool,
}

impl App {
    pub fn new(options: DisplayOptions) -> Self {
        Self {
            rows: Vec::new(),
            row_data: Vec::new(),
            selected: 0,
            fetch_failed: false,
            options,
            should_quit: false,
        }
    }

    /// Apply one update batch: structural ops first, then rebinds. Ops
    /// arrive in application order from the differ; a `Change` carries the
    /// payload that decides between a full rebind and a timestamp touch.
    pub fn apply_update(&mut self, update: TimelineUpdate, now_ms: i64) {
        self.options = update.options;
        for op in &update.ops {
            match *op {
                ListOp::Insert { position, count } => {
                    for offset in 0..count {
                        let index = position + offset;
                        let Some(data) = update.rows.get(index) else {
                            continue;
                        };
                        let mut state = ChatRowState::default();
                        bind(&mut state, data, None, &self.options, now_ms);
                        if index <= self.rows.len() {
                            self.rows.insert(index, state);
                        }
                    }
                }
                ListOp::Remove { position, count } => {
                    let end = (position + count).min(self.rows.len());
                    if position < end {
                        self.rows.drain(position..end);
                    }
                }
                ListOp::Move { from, to } => {
                    if from < self.rows.len() && to <= self.rows.len() {
                        let row = self.rows.remove(from);
                        self.rows.insert(to.min(self.rows.len()), row);
                    }
                }
                ListOp::Change {
                    position,
                    count,
                    payload,
                } => {
                    for offset in 0..count {
                        let index = position + offset;
                        let (Some(state), Some(data)) =
                            (self.rows.get_mut(index), update.rows.get(index))
                        else {
                            continue;
                        };
                        bind(state, data, Some(payload), &self.options, now_ms);
                    }
                }
            }
        }
        self.fetch_failed = update.fetch_failed;
        self.row_data = update.rows;
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.rows.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Boundary id of the selected row when it is a gap placeholder.
    pub fn selected_gap(&self) -> Option<String> {
        match self.row_data.get(self.selected) {
            Some(ChatViewData::Placeholder { id, .. }) => Some(id.clone()),
            _ => None,
        }
    }

    pub fn at_bottom(&self) -> bool {
        !self.rows.is_empty() && self.selected + 1 == self.rows.len()
    }
}
