pub mod chat_list;
pub mod coordinator;
pub mod diff;
pub mod ids;

pub use chat_list::{ChatList, FetchEnd, ListEntry};
pub use coordinator::ChatTimeline;
pub use diff::{diff, ChangePayload, ListOp};
