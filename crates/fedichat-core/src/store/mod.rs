pub mod chat_store;
pub mod db;

pub use chat_store::{ChatStore, StoreError, StoreResult};
pub use db::Database;
