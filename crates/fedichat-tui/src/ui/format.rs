use chrono::NaiveDateTime;

/// Truncate string to a max length, adding an ellipsis when truncated.
pub fn truncate_with_ellipsis(s: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }

    if s.chars().count() <= max_len {
        return s.to_string();
    }

    if max_len <= 3 {
        return ".".repeat(max_len);
    }

    let take = max_len - 3;
    let mut truncated: String = s.chars().take(take).collect();
    truncated.push_str("...");
    truncated
}

/// Format a timestamp as relative time against `now_ms` (e.g. "2m ago").
pub fn format_relative_time(then_ms: i64, now_ms: i64) -> String {
    let diff = (now_ms.saturating_sub(then_ms)) / 1000;

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        format!("{}m ago", diff / 60)
    } else if diff < 86400 {
        format!("{}h ago", diff / 3600)
    } else if diff < 604800 {
        format!("{}d ago", diff / 86400)
    } else {
        format!("{}w ago", diff / 604800)
    }
}

/// Clock label for absolute-time mode: time of day for today, month/day
/// plus time of day for anything older.
pub fn absolute_label(ts: NaiveDateTime, now: NaiveDateTime) -> String {
    if ts.date() == now.date() {
        ts.format("%H:%M:%S").to_string()
    } else {
        ts.format("%m/%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn truncation_keeps_short_strings_intact() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
        assert_eq!(truncate_with_ellipsis("hello world", 8), "hello...");
        assert_eq!(truncate_with_ellipsis("hello", 0), "");
    }

    #[test]
    fn relative_labels_scale_with_age() {
        let now = 1_600_000_000_000;
        assert_eq!(format_relative_time(now - 30_000, now), "just now");
        assert_eq!(format_relative_time(now - 5 * 60_000, now), "5m ago");
        assert_eq!(format_relative_time(now - 3 * 3_600_000, now), "3h ago");
        assert_eq!(format_relative_time(now - 2 * 86_400_000, now), "2d ago");
        assert_eq!(format_relative_time(now - 14 * 86_400_000, now), "2w ago");
    }

    #[test]
    fn future_timestamps_clamp_to_just_now() {
        let now = 1_600_000_000_000;
        assert_eq!(format_relative_time(now + 60_000, now), "just now");
    }

    #[test]
    fn same_day_absolute_label_is_time_only() {
        let now = at(2020, 6, 29, 20, 0, 0);
        assert_eq!(absolute_label(at(2020, 6, 29, 18, 20, 28), now), "18:20:28");
    }

    #[test]
    fn other_day_absolute_label_includes_the_date() {
        let now = at(2020, 6, 30, 1, 0, 0);
        assert_eq!(
            absolute_label(at(2020, 6, 29, 18, 20, 28), now),
            "06/29 18:20:28"
        );
    }
}
