//! Minimal update instructions between two chat-list projections.
//!
//! Rows are matched by `view_data_id()`, never by position. Applying the
//! returned operations to the old sequence, in order, yields the new one;
//! structural operations come first (positions are working coordinates at
//! the time each op applies), changes come last (positions are final
//! coordinates).

use std::collections::{HashMap, HashSet};

use crate::models::ChatViewData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangePayload {
    /// Rebind every field of the row.
    Full,
    /// Only the timestamp label aged; leave all other widget state alone.
    TimestampOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOp {
    Insert {
        position: usize,
        count: usize,
    },
    Remove {
        position: usize,
        count: usize,
    },
    Move {
        from: usize,
        to: usize,
    },
    Change {
        position: usize,
        count: usize,
        payload: ChangePayload,
    },
}

/// Compute the operations that transform `old` into `new`.
pub fn diff(old: &[ChatViewData], new: &[ChatViewData]) -> Vec<ListOp> {
    let old_ids: Vec<u64> = old.iter().map(ChatViewData::view_data_id).collect();
    let new_ids: Vec<u64> = new.iter().map(ChatViewData::view_data_id).collect();
    let new_id_set: HashSet<u64> = new_ids.iter().copied().collect();

    let mut ops: Vec<ListOp> = Vec::new();
    let mut work: Vec<u64> = old_ids;

    // Drop rows whose identity disappeared, batching adjacent runs.
    let mut i = 0;
    while i < work.len() {
        if new_id_set.contains(&work[i]) {
            i += 1;
            continue;
        }
        let mut end = i + 1;
        while end < work.len() && !new_id_set.contains(&work[end]) {
            end += 1;
        }
        ops.push(ListOp::Remove {
            position: i,
            count: end - i,
        });
        work.drain(i..end);
    }

    // Bring the survivors into target order; everything before `target`
    // is already final, so a wanted id found further down is a move and
    // a missing one is an insert.
    for (target, want) in new_ids.iter().enumerate() {
        if work.get(target) == Some(want) {
            continue;
        }
        if let Some(from) = work.iter().position(|id| id == want) {
            ops.push(ListOp::Move { from, to: target });
            let id = work.remove(from);
            work.insert(target, id);
        } else {
            ops.push(ListOp::Insert {
                position: target,
                count: 1,
            });
            work.insert(target, *want);
        }
    }
    debug_assert_eq!(work, new_ids);

    // Content changes for rows present on both sides. A pair differing
    // only in the timestamp gets the lightweight payload; identical pairs
    // produce nothing.
    let old_by_id: HashMap<u64, &ChatViewData> = old
        .iter()
        .map(|item| (item.view_data_id(), item))
        .collect();
    for (position, item) in new.iter().enumerate() {
        let Some(old_item) = old_by_id.get(&new_ids[position]) else {
            continue;
        };
        if *old_item == item {
            continue;
        }
        let payload = if old_item.substantively_equals(item) {
            ChangePayload::TimestampOnly
        } else {
            ChangePayload::Full
        };
        ops.push(ListOp::Change {
            position,
            count: 1,
            payload,
        });
    }

    coalesce(ops)
}

/// Merge adjacent same-kind operations into ranged ones.
fn coalesce(ops: Vec<ListOp>) -> Vec<ListOp> {
    let mut out: Vec<ListOp> = Vec::with_capacity(ops.len());
    for op in ops {
        match (out.last_mut(), &op) {
            (
                Some(ListOp::Insert { position, count }),
                ListOp::Insert {
                    position: next_pos,
                    count: next_count,
                },
            ) if *next_pos == *position + *count => {
                *count += next_count;
            }
            (
                Some(ListOp::Remove { position, count }),
                ListOp::Remove {
                    position: next_pos,
                    count: next_count,
                },
            ) if *next_pos == *position => {
                *count += next_count;
            }
            (
                Some(ListOp::Change {
                    position,
                    count,
                    payload,
                }),
                ListOp::Change {
                    position: next_pos,
                    count: next_count,
                    payload: next_payload,
                },
            ) if *next_pos == *position + *count && next_payload == payload => {
                *count += next_count;
            }
            _ => out.push(op),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRowData;

    fn row(chat_id: &str, unread: i64, updated_at: i64) -> ChatViewData {
        ChatViewData::Concrete(ChatRowData {
            chat_id: chat_id.to_string(),
            display_name: format!("user {chat_id}"),
            handle: format!("user{chat_id}@pleroma.example"),
            avatar_url: String::new(),
            bot: false,
            account_emojis: Vec::new(),
            preview: None,
            preview_emojis: Vec::new(),
            has_attachment: false,
            unread,
            updated_at: Some(updated_at),
        })
    }

    /// Replay structural ops over the old sequence and check the result
    /// matches the new one; changes are validated against final positions.
    fn apply_and_check(old: &[ChatViewData], new: &[ChatViewData], ops: &[ListOp]) {
        let mut work: Vec<ChatViewData> = old.to_vec();
        for op in ops {
            match op {
                ListOp::Insert { position, count } => {
                    for offset in 0..*count {
                        work.insert(position + offset, new[position + offset].clone());
                    }
                }
                ListOp::Remove { position, count } => {
                    work.drain(*position..*position + *count);
                }
                ListOp::Move { from, to } => {
                    let item = work.remove(*from);
                    work.insert(*to, item);
                }
                ListOp::Change {
                    position, count, ..
                } => {
                    for offset in 0..*count {
                        work[position + offset] = new[position + offset].clone();
                    }
                }
            }
        }
        assert_eq!(work, new);
    }

    #[test]
    fn identical_lists_produce_no_ops() {
        let list = vec![row("3", 0, 100), row("2", 0, 90), row("1", 0, 80)];
        assert!(diff(&list, &list).is_empty());
    }

    #[test]
    fn timestamp_only_difference_yields_exactly_one_lightweight_change() {
        let old = vec![row("3", 0, 100), row("2", 0, 90), row("1", 0, 80)];
        let mut new = old.clone();
        new[1] = row("2", 0, 95);
        let ops = diff(&old, &new);
        assert_eq!(
            ops,
            vec![ListOp::Change {
                position: 1,
                count: 1,
                payload: ChangePayload::TimestampOnly,
            }]
        );
        apply_and_check(&old, &new, &ops);
    }

    #[test]
    fn substantive_difference_yields_a_full_change() {
        let old = vec![row("3", 0, 100), row("2", 0, 90)];
        let new = vec![row("3", 0, 100), row("2", 5, 95)];
        let ops = diff(&old, &new);
        assert_eq!(
            ops,
            vec![ListOp::Change {
                position: 1,
                count: 1,
                payload: ChangePayload::Full,
            }]
        );
        apply_and_check(&old, &new, &ops);
    }

    #[test]
    fn bumped_chat_reports_a_move_plus_change() {
        let old = vec![row("3", 0, 100), row("2", 0, 90), row("1", 0, 80)];
        let new = vec![row("2", 1, 120), row("3", 0, 100), row("1", 0, 80)];
        let ops = diff(&old, &new);
        assert_eq!(
            ops,
            vec![
                ListOp::Move { from: 1, to: 0 },
                ListOp::Change {
                    position: 0,
                    count: 1,
                    payload: ChangePayload::Full,
                },
            ]
        );
        apply_and_check(&old, &new, &ops);
    }

    #[test]
    fn inserts_at_the_top_coalesce() {
        let old = vec![row("2", 0, 90), row("1", 0, 80)];
        let new = vec![
            row("5", 0, 130),
            row("4", 0, 120),
            row("2", 0, 90),
            row("1", 0, 80),
        ];
        let ops = diff(&old, &new);
        assert_eq!(
            ops,
            vec![ListOp::Insert {
                position: 0,
                count: 2,
            }]
        );
        apply_and_check(&old, &new, &ops);
    }

    #[test]
    fn removed_run_coalesces() {
        let old = vec![
            row("4", 0, 120),
            row("3", 0, 110),
            row("2", 0, 90),
            row("1", 0, 80),
        ];
        let new = vec![row("4", 0, 120), row("1", 0, 80)];
        let ops = diff(&old, &new);
        assert_eq!(
            ops,
            vec![ListOp::Remove {
                position: 1,
                count: 2,
            }]
        );
        apply_and_check(&old, &new, &ops);
    }

    #[test]
    fn placeholder_replacement_diffs_as_remove_plus_insert_at_the_same_spot() {
        let old = vec![
            row("9", 0, 100),
            ChatViewData::Placeholder {
                id: "5".to_string(),
                loading: false,
            },
            row("3", 0, 80),
        ];
        let new = vec![row("9", 0, 100), row("5", 0, 90), row("3", 0, 80)];
        let ops = diff(&old, &new);
        assert_eq!(
            ops,
            vec![
                ListOp::Remove {
                    position: 1,
                    count: 1,
                },
                ListOp::Insert {
                    position: 1,
                    count: 1,
                },
            ]
        );
        apply_and_check(&old, &new, &ops);
    }

    #[test]
    fn placeholder_loading_toggle_is_a_lightweight_change() {
        let old = vec![ChatViewData::Placeholder {
            id: "5".to_string(),
            loading: false,
        }];
        let new = vec![ChatViewData::Placeholder {
            id: "5".to_string(),
            loading: true,
        }];
        let ops = diff(&old, &new);
        assert_eq!(
            ops,
            vec![ListOp::Change {
                position: 0,
                count: 1,
                payload: ChangePayload::Full,
            }]
        );
        apply_and_check(&old, &new, &ops);
    }

    #[test]
    fn mixed_churn_still_replays_to_the_new_list() {
        let old = vec![
            row("9", 0, 100),
            row("7", 0, 95),
            row("5", 2, 90),
            row("3", 0, 80),
            row("1", 0, 70),
        ];
        let new = vec![
            row("10", 1, 130),
            row("5", 0, 120),
            row("9", 0, 100),
            row("2", 0, 75),
            row("1", 0, 70),
        ];
        let ops = diff(&old, &new);
        apply_and_check(&old, &new, &ops);
    }
}
