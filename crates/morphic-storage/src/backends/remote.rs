//! Remote preferences server backend.
//!
//! Records live at `<endpoint>/v1/<kind>/<identifier>` and are exchanged as
//! JSON bodies. A 404 means the record is absent; any other non-success
//! status is an [`ErrorKind::ExternalService`] error.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use morphic_core::config::RemoteConfig;
use morphic_core::error::{AppError, ErrorKind};
use morphic_core::result::AppResult;
use morphic_core::traits::RecordBackend;

/// Header carrying the session's auth token.
pub const AUTH_TOKEN_HEADER: &str = "X-Morphic-Auth-Token";

/// API version segment prefixed to every path.
const API_VERSION: &str = "v1";

/// HTTP backend talking to the Morphic preferences server.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: Client,
    base: Url,
}

impl RemoteBackend {
    /// Build a backend from the remote section of the configuration.
    pub fn new(config: &RemoteConfig) -> AppResult<Self> {
        let mut endpoint = config.endpoint.trim().to_string();
        if endpoint.is_empty() {
            return Err(AppError::configuration("Remote endpoint is not set"));
        }
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let base = Url::parse(&endpoint).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Invalid remote endpoint: {}", config.endpoint),
                e,
            )
        })?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.auth_token {
            let value = HeaderValue::from_str(token).map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Invalid remote auth token", e)
            })?;
            headers.insert(AUTH_TOKEN_HEADER, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;

        Ok(Self { client, base })
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Build the URL for a key by appending `v1` and each key segment.
    fn url(&self, key: &str) -> AppResult<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| AppError::configuration("Remote endpoint cannot be a base URL"))?;
            segments.pop_if_empty().push(API_VERSION);
            for segment in key.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    fn request_error(action: &str, key: &str, e: reqwest::Error) -> AppError {
        let kind = if e.is_timeout() {
            ErrorKind::Timeout
        } else {
            ErrorKind::ExternalService
        };
        AppError::with_source(kind, format!("Remote {action} failed for '{key}'"), e)
    }

    fn status_error(action: &str, key: &str, status: StatusCode) -> AppError {
        AppError::external_service(format!(
            "Remote {action} for '{key}' returned HTTP {status}"
        ))
    }
}

#[async_trait]
impl RecordBackend for RemoteBackend {
    fn backend_type(&self) -> &str {
        "remote"
    }

    async fn health_check(&self) -> AppResult<bool> {
        let url = self.url("health")?;
        match self.client.get(url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                debug!(error = %e, "Remote health check failed");
                Ok(false)
            }
        }
    }

    async fn read(&self, key: &str) -> AppResult<Option<Bytes>> {
        let response = self
            .client
            .get(self.url(key)?)
            .send()
            .await
            .map_err(|e| Self::request_error("read", key, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| Self::request_error("read", key, e))?;
                debug!(key, bytes = body.len(), "Fetched remote record");
                Ok(Some(body))
            }
            status => Err(Self::status_error("read", key, status)),
        }
    }

    async fn write(&self, key: &str, data: Bytes) -> AppResult<()> {
        let response = self
            .client
            .put(self.url(key)?)
            .header(CONTENT_TYPE, "application/json")
            .body(data)
            .send()
            .await
            .map_err(|e| Self::request_error("write", key, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error("write", key, status));
        }
        debug!(key, "Pushed record to remote");
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        let response = self
            .client
            .delete(self.url(key)?)
            .send()
            .await
            .map_err(|e| Self::request_error("delete", key, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(Self::status_error("delete", key, status)),
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let response = self
            .client
            .head(self.url(key)?)
            .send()
            .await
            .map_err(|e| Self::request_error("exists", key, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(Self::status_error("exists", key, status)),
        }
    }

    fn contains(&self, _key: &str) -> bool {
        // Nothing is held locally.
        false
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<String>> {
        let (kind, name_prefix) = prefix.split_once('/').unwrap_or((prefix, ""));
        let response = self
            .client
            .get(self.url(kind)?)
            .send()
            .await
            .map_err(|e| Self::request_error("list", prefix, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status if status.is_success() => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| Self::request_error("list", prefix, e))?;
                let identifiers: Vec<String> = serde_json::from_slice(&body)?;
                let mut keys: Vec<String> = identifiers
                    .into_iter()
                    .filter(|id| id.starts_with(name_prefix))
                    .map(|id| format!("{kind}/{id}"))
                    .collect();
                keys.sort();
                Ok(keys)
            }
            status => Err(Self::status_error("list", prefix, status)),
        }
    }
}
