pub mod uploader;

pub use uploader::{MediaUploader, QueuedMedia, UploadError, UploadEvent};
