/// Application events the chat timeline reacts to.
///
/// These arrive over the runtime's command channel as explicit messages;
/// the timeline never subscribes to anything itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The user blocked this account; its chats disappear.
    PeerBlocked { account_id: String },
    /// The user muted this account; its chats disappear.
    PeerMuted { account_id: String },
    /// The user muted a whole instance domain.
    DomainMuted { domain: String },
    /// A status referenced by a chat was deleted server-side.
    MessageDeleted { status_id: String },
    /// A persisted preference changed; display options are reloaded.
    PreferenceChanged { key: String },
}
