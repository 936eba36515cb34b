//! Application-wide constants
//!
//! Centralized location for magic values that are used across
//! multiple modules.

use std::time::Duration;

/// Page size for chat timeline fetches (disk and network).
pub const LOAD_AT_ONCE: u32 = 30;

/// How often visible timestamps are re-rendered while the list is on screen.
pub const TIMESTAMP_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Images larger than this many bytes are downsized before upload.
pub const IMAGE_SIZE_LIMIT: u64 = 8 * 1024 * 1024;

/// Images with more square pixels than this are downsized before upload (4096x4096).
pub const IMAGE_PIXEL_LIMIT: u64 = 16_777_216;

/// Rendered in place of a timestamp that is missing or unrepresentable.
pub const MISSING_TIMESTAMP: &str = "??:??:??";

// Preference keys
pub mod prefs {
    /// "true" renders clock times instead of relative ages.
    pub const ABSOLUTE_TIME: &str = "absolute_time";
    /// "false" hides the bot badge overlay on avatars.
    pub const SHOW_BOT_BADGE: &str = "show_bot_badge";
}
