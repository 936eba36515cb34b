pub mod api;
pub mod config;
pub mod constants;
pub mod events;
pub mod media;
pub mod models;
pub mod runtime;
pub mod store;
pub mod timeline;
pub mod tracing_setup;

pub use config::{CoreConfig, DisplayOptions};
pub use events::AppEvent;
pub use runtime::{TimelineCommand, TimelineHandle, TimelineRuntime, TimelineUpdate};
