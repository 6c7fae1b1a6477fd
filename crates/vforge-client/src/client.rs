//! Remote video-generation API client.
//!
//! Thin sequential wrapper over the asynchronous HTTP surface: submit a
//! job, poll its status at a fixed interval, download the finished video.
//! All coordination (concurrency, retries, deadlines across jobs) lives
//! in `vforge-batch`; this client knows about exactly one request at a
//! time.

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Default public API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.vidforge.dev";

/// Per-request HTTP timeout. Generation happens asynchronously remote-side,
/// so individual calls are short; only the download can run long.
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct VideoApiConfig {
    /// API base URL (no trailing slash)
    pub base_url: String,
    /// Opaque bearer credential
    pub api_key: String,
}

impl VideoApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        let api_key = std::env::var("VIDFORGE_API_KEY")
            .map_err(|_| ClientError::config("VIDFORGE_API_KEY not set"))?;
        let base_url = std::env::var("VIDFORGE_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        Self::new(base_url, api_key)
    }

    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> ClientResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| ClientError::config(format!("invalid API base URL: {e}")))?;
        Ok(Self {
            base_url,
            api_key: api_key.into(),
        })
    }
}

/// Payload for generation and image-to-video jobs.
#[derive(Debug, Clone, Serialize)]
pub struct VideoRequest {
    pub prompt: String,
    pub model: String,
    pub duration_seconds: u32,
    pub aspect_ratio: String,
    pub resolution: String,
    /// Present for image-to-video jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Payload for edit jobs.
#[derive(Debug, Clone, Serialize)]
pub struct EditRequest {
    pub prompt: String,
    pub video_url: String,
    pub model: String,
}

/// Remote job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    Queued,
    InProgress,
    Succeeded,
    Failed,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
}

/// Status document returned by `GET /v1/videos/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub id: String,
    pub status: RemoteStatus,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A finished remote job, ready to download.
#[derive(Debug, Clone)]
pub struct CompletedVideo {
    pub request_id: String,
    pub video_url: String,
    pub duration_seconds: Option<f64>,
}

/// Video-generation API client.
#[derive(Clone)]
pub struct VideoApiClient {
    config: VideoApiConfig,
    client: Client,
}

impl VideoApiClient {
    /// Create a new client.
    pub fn new(config: VideoApiConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { config, client })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(VideoApiConfig::from_env()?)
    }

    /// Submit a generation or image-to-video job. Returns the request id.
    pub async fn create_video(&self, request: &VideoRequest) -> ClientResult<String> {
        let url = format!("{}/v1/videos", self.config.base_url);
        debug!(model = request.model.as_str(), "Submitting video job");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await?;
        let created: CreateResponse = Self::parse_response(response).await?;
        info!(request_id = created.id.as_str(), "Video job accepted");
        Ok(created.id)
    }

    /// Submit an edit job against an existing remote video.
    pub async fn create_edit(&self, request: &EditRequest) -> ClientResult<String> {
        let url = format!("{}/v1/videos/edits", self.config.base_url);
        debug!(model = request.model.as_str(), "Submitting edit job");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await?;
        let created: CreateResponse = Self::parse_response(response).await?;
        info!(request_id = created.id.as_str(), "Edit job accepted");
        Ok(created.id)
    }

    /// Fetch the current status of a request.
    pub async fn get_status(&self, request_id: &str) -> ClientResult<StatusResponse> {
        let url = format!("{}/v1/videos/{}", self.config.base_url, request_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Poll a request at a fixed interval until it succeeds, fails, or
    /// the attempt ceiling is reached.
    pub async fn wait_for_completion(
        &self,
        request_id: &str,
        poll_interval: Duration,
        max_poll_attempts: u32,
    ) -> ClientResult<CompletedVideo> {
        for attempt in 1..=max_poll_attempts {
            let status = self.get_status(request_id).await?;
            match status.status {
                RemoteStatus::Succeeded => {
                    let video_url = status.video_url.ok_or_else(|| {
                        ClientError::RemoteFailed(
                            "job succeeded but no video URL was returned".to_string(),
                        )
                    })?;
                    info!(
                        request_id = request_id,
                        attempts = attempt,
                        "Remote job completed"
                    );
                    return Ok(CompletedVideo {
                        request_id: request_id.to_string(),
                        video_url,
                        duration_seconds: status.duration_seconds,
                    });
                }
                RemoteStatus::Failed => {
                    let error = status
                        .error
                        .unwrap_or_else(|| "remote job failed without detail".to_string());
                    warn!(request_id = request_id, error = error.as_str(), "Remote job failed");
                    return Err(ClientError::RemoteFailed(error));
                }
                RemoteStatus::Queued | RemoteStatus::InProgress => {
                    debug!(
                        request_id = request_id,
                        attempt = attempt,
                        progress = status.progress.unwrap_or(0),
                        "Remote job still in progress"
                    );
                }
            }
            tokio::time::sleep(poll_interval).await;
        }

        Err(ClientError::PollExhausted {
            attempts: max_poll_attempts,
        })
    }

    /// Stream a finished video to a local file.
    pub async fn download_video(&self, video_url: &str, dest: &Path) -> ClientResult<()> {
        debug!(url = video_url, dest = %dest.display(), "Downloading video");

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.client.get(video_url).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::download(format!(
                "download returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ClientError::download(e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!(dest = %dest.display(), bytes = written, "Video saved");
        Ok(())
    }

    /// Decode a JSON body on 2xx, otherwise surface the status and body
    /// text as an API error.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> ClientResult<T> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
