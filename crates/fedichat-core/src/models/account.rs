use super::Emoji;

/// Cached projection of a remote account, keyed by `(owner_id, account_id)`.
///
/// `owner_id` is the local login the row was cached for; the same remote
/// account may be cached independently per login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub owner_id: i64,
    pub account_id: String,
    pub display_name: String,
    /// Fully qualified handle, e.g. "alice@pleroma.example".
    pub handle: String,
    /// Profile URL on the home instance.
    pub url: String,
    pub avatar_url: String,
    pub bot: bool,
    pub emojis: Vec<Emoji>,
}

impl AccountSummary {
    /// Instance domain extracted from the profile URL.
    pub fn domain(&self) -> Option<&str> {
        let rest = self
            .url
            .strip_prefix("https://")
            .or_else(|| self.url.strip_prefix("http://"))?;
        let host = rest.split('/').next()?;
        if host.is_empty() {
            None
        } else {
            Some(host)
        }
    }
}
