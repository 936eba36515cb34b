use std::path::{Path, PathBuf};

use crate::constants::prefs;
use crate::store::ChatStore;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    /// Base URL of the home server, e.g. "https://pleroma.example".
    pub server_url: String,
    pub access_token: String,
    pub page_size: u32,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P, server_url: &str, access_token: &str) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            server_url: server_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            page_size: crate::constants::LOAD_AT_ONCE,
        }
    }

    /// Default data directory under the platform data dir, falling back
    /// to a relative directory when none is available.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("fedichat"))
            .unwrap_or_else(|| PathBuf::from("fedichat_data"))
    }
}

/// Presentation switches for the chat list, persisted as preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub absolute_time: bool,
    pub show_bot_badge: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            absolute_time: false,
            show_bot_badge: true,
        }
    }
}

impl DisplayOptions {
    /// Load from the preferences table, keeping defaults for unset keys.
    pub fn load(store: &ChatStore) -> Self {
        let mut options = Self::default();
        if let Ok(Some(v)) = store.get_preference(prefs::ABSOLUTE_TIME) {
            options.absolute_time = v == "true";
        }
        if let Ok(Some(v)) = store.get_preference(prefs::SHOW_BOT_BADGE) {
            options.show_bot_badge = v != "false";
        }
        options
    }
}
