use serde::{Deserialize, Serialize};

/// A custom emoji usable in display names and message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    pub shortcode: String,
    pub url: String,
}
