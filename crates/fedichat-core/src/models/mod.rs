pub mod account;
pub mod attachment;
pub mod chat;
pub mod emoji;
pub mod message;
pub mod view_data;

pub use account::AccountSummary;
pub use attachment::{Attachment, AttachmentKind};
pub use chat::ChatSummary;
pub use emoji::Emoji;
pub use message::ChatMessage;
pub use view_data::{ChatRowData, ChatViewData};
