//! HTTP transport for the assistant service.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    error::ErrorBody,
    protocol::{
        ChatRequest, ChatResponse, ConnectRequest, ConnectResponse, HealthResponse,
        UploadResponse, CHAT_PATH, CONNECT_PATH, HEALTH_PATH, UPLOAD_FIELD, UPLOAD_PATH,
    },
};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::upload::FileUpload;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ApiFailure {
    #[error("assistant unreachable: {0}")]
    Transport(String),
    #[error("assistant request timed out")]
    Timeout,
    #[error("assistant returned status {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Backend { status: u16, detail: Option<String> },
    #[error("malformed assistant response: {0}")]
    Decode(String),
}

impl ApiFailure {
    /// Text shown to the operator: the backend's own detail when it sent one, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Backend {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn connect(&self, request: &ConnectRequest) -> Result<ConnectResponse, ApiFailure>;
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ApiFailure>;
    async fn upload(&self, file: FileUpload) -> Result<UploadResponse, ApiFailure>;
    async fn health(&self) -> Result<HealthResponse, ApiFailure>;
}

pub struct HttpAssistantApi {
    http: Client,
    base_url: String,
}

impl HttpAssistantApi {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build assistant http client")?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Validates `raw` as an absolute http(s) URL and strips any trailing slash.
pub fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim();
    let parsed =
        Url::parse(trimmed).with_context(|| format!("invalid assistant base url '{trimmed}'"))?;
    anyhow::ensure!(
        matches!(parsed.scheme(), "http" | "https"),
        "assistant base url must use http or https, got '{}'",
        parsed.scheme()
    );
    Ok(trimmed.trim_end_matches('/').to_string())
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiFailure> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|err| ApiFailure::Decode(err.to_string()));
    }

    let body = response.bytes().await.unwrap_or_default();
    let detail = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|body| body.message());
    debug!(status = status.as_u16(), has_detail = detail.is_some(), "assistant request rejected");
    Err(ApiFailure::Backend {
        status: status.as_u16(),
        detail,
    })
}

#[async_trait]
impl AssistantApi for HttpAssistantApi {
    async fn connect(&self, request: &ConnectRequest) -> Result<ConnectResponse, ApiFailure> {
        let response = self
            .http
            .post(self.endpoint(CONNECT_PATH))
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ApiFailure> {
        let response = self
            .http
            .post(self.endpoint(CHAT_PATH))
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    async fn upload(&self, file: FileUpload) -> Result<UploadResponse, ApiFailure> {
        let part = Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str(&file.mime_type)?;
        let form = Form::new().part(UPLOAD_FIELD, part);
        let response = self
            .http
            .post(self.endpoint(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await?;
        read_json(response).await
    }

    async fn health(&self) -> Result<HealthResponse, ApiFailure> {
        let response = self.http.get(self.endpoint(HEALTH_PATH)).send().await?;
        read_json(response).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
