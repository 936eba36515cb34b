use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::config::CoreConfig;

use super::types;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// The fetch collaborator the timeline talks to. A trait so tests can
/// drive the coordinator without a server.
#[async_trait]
pub trait ChatsApi: Send + Sync {
    /// Fetch a page of chats, newest first, bounded by
    /// `chat_id < max_id` and `chat_id > since_id` where given.
    async fn fetch_chats(
        &self,
        max_id: Option<&str>,
        since_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<types::Chat>, ApiError>;
}

pub struct HttpChatsApi {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpChatsApi {
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.server_url.clone(),
            token: config.access_token.clone(),
        }
    }
}

#[async_trait]
impl ChatsApi for HttpChatsApi {
    async fn fetch_chats(
        &self,
        max_id: Option<&str>,
        since_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<types::Chat>, ApiError> {
        let mut query: Vec<(&str, String)> = vec![("limit", limit.to_string())];
        if let Some(max_id) = max_id {
            query.push(("max_id", max_id.to_string()));
        }
        if let Some(since_id) = since_id {
            query.push(("since_id", since_id.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/api/v1/pleroma/chats", self.base_url))
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}
