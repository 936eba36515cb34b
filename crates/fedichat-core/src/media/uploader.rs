//! Attachment upload pipeline: oversized images are downsized into a
//! scratch file first, then the bytes go up as one multipart POST while
//! progress events stream to the caller.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use futures::Stream;
use reqwest::multipart;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::constants::{IMAGE_PIXEL_LIMIT, IMAGE_SIZE_LIMIT};
use crate::models::Attachment;

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct QueuedMedia {
    pub path: PathBuf,
    pub mime_type: String,
    pub byte_size: u64,
}

impl QueuedMedia {
    pub fn from_path<P: Into<PathBuf>>(path: P) -> std::io::Result<Self> {
        let path = path.into();
        let byte_size = std::fs::metadata(&path)?.len();
        let mime_type = guess_mime(&path).to_string();
        Ok(Self {
            path,
            mime_type,
            byte_size,
        })
    }

    fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    fn extension(&self) -> &str {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("bin")
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Events observed by the caller: any number of advisory progress
/// updates, then exactly one terminal `Finished` or `Failed`.
#[derive(Debug)]
pub enum UploadEvent {
    Progress(u8),
    Finished(Attachment),
    Failed(UploadError),
}

#[derive(Clone)]
pub struct MediaUploader {
    client: Client,
    upload_url: String,
    token: String,
}

impl MediaUploader {
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            client: Client::new(),
            upload_url: format!("{}/api/v1/media", config.server_url),
            token: config.access_token.clone(),
        }
    }

    /// Start the upload in the background and hand back the event stream.
    pub fn upload(&self, media: QueuedMedia) -> mpsc::Receiver<UploadEvent> {
        let (tx, rx) = mpsc::channel(32);
        let uploader = self.clone();
        tokio::spawn(async move {
            let result = uploader.run(media, tx.clone()).await;
            let terminal = match result {
                Ok(attachment) => UploadEvent::Finished(attachment),
                Err(err) => UploadEvent::Failed(err),
            };
            let _ = tx.send(terminal).await;
        });
        rx
    }

    async fn run(
        &self,
        media: QueuedMedia,
        tx: mpsc::Sender<UploadEvent>,
    ) -> Result<Attachment, UploadError> {
        let media = if media.is_image() {
            let pixels = image_pixels(&media);
            if needs_downsize(media.byte_size, pixels) {
                debug!(path = %media.path.display(), "downsizing image before upload");
                tokio::task::spawn_blocking(move || downsize(media)).await??
            } else {
                media
            }
        } else {
            media
        };

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let filename = format!(
            "fedichat_{}_{}.{}",
            millis,
            Uuid::new_v4().simple(),
            media.extension()
        );

        let data = tokio::fs::read(&media.path).await?;
        let total = data.len() as u64;
        let body = reqwest::Body::wrap_stream(progress_chunks(data, tx));
        let part = multipart::Part::stream_with_length(body, total)
            .file_name(filename)
            .mime_str(&media.mime_type)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.upload_url)
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}

/// Chunk the payload and emit a progress event whenever the integer
/// percentage moves. Progress is advisory; the dedup here is the only
/// delivery guarantee.
fn progress_chunks(
    data: Vec<u8>,
    tx: mpsc::Sender<UploadEvent>,
) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> {
    let total = data.len().max(1);
    let chunks: Vec<Vec<u8>> = data
        .chunks(UPLOAD_CHUNK_SIZE)
        .map(|chunk| chunk.to_vec())
        .collect();
    futures::stream::unfold(
        (chunks.into_iter(), 0usize, -1i32, tx),
        move |(mut chunks, sent, last_percent, tx)| async move {
            let chunk = chunks.next()?;
            let sent = sent + chunk.len();
            let percent = ((sent * 100) / total) as i32;
            let mut last_percent = last_percent;
            if percent != last_percent {
                last_percent = percent;
                let _ = tx.send(UploadEvent::Progress(percent as u8)).await;
            }
            Some((Ok(chunk), (chunks, sent, last_percent, tx)))
        },
    )
}

fn needs_downsize(byte_size: u64, pixels: u64) -> bool {
    byte_size > IMAGE_SIZE_LIMIT || pixels > IMAGE_PIXEL_LIMIT
}

fn image_pixels(media: &QueuedMedia) -> u64 {
    image::image_dimensions(&media.path)
        .map(|(w, h)| u64::from(w) * u64::from(h))
        .unwrap_or(0)
}

/// Re-encode the image as JPEG within the pixel limit, into a scratch
/// file that stands in for the source file during the upload.
fn downsize(media: QueuedMedia) -> Result<QueuedMedia, UploadError> {
    let img = image::open(&media.path)?;
    let pixels = u64::from(img.width()) * u64::from(img.height());
    let img = if pixels > IMAGE_PIXEL_LIMIT {
        let scale = (IMAGE_PIXEL_LIMIT as f64 / pixels as f64).sqrt();
        let width = (f64::from(img.width()) * scale).max(1.0) as u32;
        let height = (f64::from(img.height()) * scale).max(1.0) as u32;
        img.thumbnail(width, height)
    } else {
        img
    };

    let scratch = tempfile::Builder::new()
        .prefix("fedichat_")
        .suffix(".jpg")
        .tempfile()?;
    img.to_rgb8().save(scratch.path())?;
    let (_file, path) = scratch.keep().map_err(|e| e.error)?;
    let byte_size = std::fs::metadata(&path)?.len();
    Ok(QueuedMedia {
        path,
        mime_type: "image/jpeg".to_string(),
        byte_size,
    })
}

fn guess_mime(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}
