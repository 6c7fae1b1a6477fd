//! Executor seam between the scheduler and the remote API.
//!
//! The scheduler only knows `JobExecutor`; the production implementation
//! wires the API client and the storage helper together. Tests substitute
//! instrumented fakes.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use vforge_client::{ClientError, EditRequest, VideoApiClient, VideoRequest};
use vforge_models::{AspectRatio, JobKind, JobSpec, Resolution};
use vforge_storage::{StorageClient, StorageError, UploadedReference};

/// Message-bearing failure of a single execution attempt.
///
/// Retry decisions pattern-match on the rendered text, so conversions
/// keep the source error's full message.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ExecutionError(pub String);

impl From<ClientError> for ExecutionError {
    fn from(e: ClientError) -> Self {
        Self(e.to_string())
    }
}

impl From<StorageError> for ExecutionError {
    fn from(e: StorageError) -> Self {
        Self(e.to_string())
    }
}

/// One job, fully resolved for execution: classification done, defaults
/// applied, output path decided.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub kind: JobKind,
    pub job: JobSpec,
    pub output_path: PathBuf,
    pub model: String,
    pub duration_seconds: u32,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

/// What a completed execution hands back to the scheduler.
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    pub output_path: PathBuf,
    pub remote_url: Option<String>,
    pub video_duration_seconds: Option<f64>,
    pub request_id: Option<String>,
}

/// Capability the scheduler consumes: run one job attempt end to end
/// (create, poll, download).
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionOutput, ExecutionError>;
}

/// Production executor backed by the remote API.
///
/// The storage client is optional: it is only needed for jobs that
/// reference a local image, which must be uploaded so the API can fetch
/// it by URL.
pub struct RemoteJobExecutor {
    api: VideoApiClient,
    storage: Option<StorageClient>,
}

impl RemoteJobExecutor {
    pub fn new(api: VideoApiClient, storage: Option<StorageClient>) -> Self {
        Self { api, storage }
    }

    async fn execute_inner(
        &self,
        request: &ExecutionRequest,
        image_url: Option<String>,
    ) -> Result<ExecutionOutput, ExecutionError> {
        let request_id = match request.kind {
            JobKind::Edit => {
                let video_url = request
                    .job
                    .video_url
                    .clone()
                    .ok_or_else(|| ExecutionError("edit job without video_url".to_string()))?;
                self.api
                    .create_edit(&EditRequest {
                        prompt: request.job.prompt.clone(),
                        video_url,
                        model: request.model.clone(),
                    })
                    .await?
            }
            JobKind::Generation | JobKind::ImageToVideo => {
                self.api
                    .create_video(&VideoRequest {
                        prompt: request.job.prompt.clone(),
                        model: request.model.clone(),
                        duration_seconds: request.duration_seconds,
                        aspect_ratio: request.aspect_ratio.to_string(),
                        resolution: request.resolution.to_string(),
                        image_url,
                    })
                    .await?
            }
        };

        let video = self
            .api
            .wait_for_completion(&request_id, request.poll_interval, request.max_poll_attempts)
            .await?;

        self.api
            .download_video(&video.video_url, &request.output_path)
            .await?;

        Ok(ExecutionOutput {
            output_path: request.output_path.clone(),
            remote_url: Some(video.video_url),
            video_duration_seconds: video.duration_seconds,
            request_id: Some(request_id),
        })
    }

    /// Upload a local reference image, if the job declares one.
    async fn upload_reference(
        &self,
        job: &JobSpec,
    ) -> Result<Option<UploadedReference>, ExecutionError> {
        let Some(path) = &job.image_path else {
            return Ok(None);
        };
        let storage = self.storage.as_ref().ok_or_else(|| {
            ExecutionError(
                "job references a local image but object storage is not configured".to_string(),
            )
        })?;
        Ok(Some(storage.upload_reference_image(path).await?))
    }
}

#[async_trait]
impl JobExecutor for RemoteJobExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionOutput, ExecutionError> {
        let uploaded = self.upload_reference(&request.job).await?;
        let image_url = uploaded
            .as_ref()
            .map(|u| u.url.clone())
            .or_else(|| request.job.image_url.clone());

        let result = self.execute_inner(request, image_url).await;

        // Uploaded references are transient; clean up regardless of outcome.
        if let (Some(uploaded), Some(storage)) = (uploaded, self.storage.as_ref()) {
            if let Err(e) = storage.delete_object(&uploaded.key).await {
                warn!(key = uploaded.key.as_str(), error = %e, "Failed to clean up reference image");
            }
        }

        result
    }
}
