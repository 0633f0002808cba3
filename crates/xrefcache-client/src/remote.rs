//! HTTP implementation of [`XrefApi`].
//!
//! # Endpoint Format
//!
//! All paths are resolved below `{base_url}/api/1/`:
//!
//! - GET `entities/{id}`
//! - GET `collections/{id}`
//! - GET `collections/{id}/xref` (index)
//! - GET `collections/{id}/xref/{other}?limit=N` (first match page)
//! - GET `{next}` for continuations, where `next` is the URL the previous
//!   page reported, absolute or relative to the base URL
//!
//! Failures carry the server's `{"status": "error", "message": ...}` body
//! message when one is present.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use xrefcache_config::ApiConfig;
use xrefcache_core::{Collection, Entity, FetchError, IndexEntry};

use crate::error::ClientError;
use crate::traits::XrefApi;
use crate::types::{ErrorBody, MatchesResponse};

/// API path prefix below the base URL.
const API_PREFIX: &str = "api/1/";

/// Longest raw body quoted in an error message.
const MAX_ERROR_BODY: usize = 200;

/// Remote API client over HTTP.
#[derive(Clone)]
pub struct RemoteApi {
    client: Client,
    base_url: Url,
    api_root: Url,
    api_key: Option<String>,
    page_limit: u32,
}

impl RemoteApi {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::build(base_url, None, Duration::from_secs(30), 50)
    }

    /// Create a client from API configuration, resolving the API key.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ClientError> {
        config.validate()?;
        Self::build(
            &config.url,
            config.resolve_api_key(),
            Duration::from_secs(config.timeout_secs),
            config.page_limit,
        )
    }

    fn build(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
        page_limit: u32,
    ) -> Result<Self, ClientError> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base = Url::parse(&normalized)
            .map_err(|e| ClientError::invalid_url(base_url, e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::invalid_url(base_url, "cannot be used as a base"));
        }
        let api_root = base
            .join(API_PREFIX)
            .map_err(|e| ClientError::invalid_url(base_url, e.to_string()))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base,
            api_root,
            api_key,
            page_limit,
        })
    }

    /// Set the API key for authentication.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the number of matches requested per first page.
    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of an API path; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_root.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Resolve a continuation cursor against the base URL.
    fn continuation_url(&self, cursor: &str) -> Result<Url, FetchError> {
        self.base_url.join(cursor).map_err(|e| {
            FetchError::server(0, format!("invalid continuation cursor '{}': {}", cursor, e))
        })
    }

    /// Send a GET request and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!(%url, "GET");

        let mut request = self.client.get(url.clone());
        if let Some(ref api_key) = self.api_key {
            request = request.header("Authorization", format!("ApiKey {}", api_key));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::network(format!("request to {} timed out", url))
            } else if e.is_connect() {
                FetchError::network(format!("connection failed: {}", e))
            } else {
                FetchError::network(format!("request failed: {}", e))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::network(format!("failed to read response: {}", e)))?;
        trace!(%url, status = status.as_u16(), bytes = body.len(), "response");

        if !status.is_success() {
            return Err(FetchError::from_status(
                status.as_u16(),
                error_message(status.canonical_reason(), &body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            FetchError::server(status.as_u16(), format!("invalid response body: {}", e))
        })
    }
}

/// Message for a failed response: the server's message, else the raw body,
/// else the status reason.
fn error_message(reason: Option<&str>, body: &str) -> String {
    if let Ok(ErrorBody {
        message: Some(message),
    }) = serde_json::from_str::<ErrorBody>(body)
    {
        if !message.is_empty() {
            return message;
        }
    }
    let body = body.trim();
    if body.is_empty() {
        return reason.unwrap_or("request failed").to_string();
    }
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[async_trait]
impl XrefApi for RemoteApi {
    async fn fetch_entity(&self, id: &str) -> Result<Entity, FetchError> {
        self.get_json(self.endpoint(&["entities", id])).await
    }

    async fn fetch_collection(&self, id: &str) -> Result<Collection, FetchError> {
        self.get_json(self.endpoint(&["collections", id])).await
    }

    async fn fetch_index(&self, collection_id: &str) -> Result<IndexEntry, FetchError> {
        self.get_json(self.endpoint(&["collections", collection_id, "xref"]))
            .await
    }

    async fn fetch_matches(
        &self,
        collection_id: &str,
        other_id: &str,
        cursor: Option<&str>,
    ) -> Result<MatchesResponse, FetchError> {
        let url = match cursor {
            Some(cursor) => self.continuation_url(cursor)?,
            None => {
                let mut url = self.endpoint(&["collections", collection_id, "xref", other_id]);
                url.query_pairs_mut()
                    .append_pair("limit", &self.page_limit.to_string());
                url
            }
        };
        self.get_json(url).await
    }
}

impl std::fmt::Debug for RemoteApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteApi")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("page_limit", &self.page_limit)
            .finish()
    }
}
