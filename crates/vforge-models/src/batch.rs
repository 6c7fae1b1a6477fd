//! Batch configuration and retry policy.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::{AspectRatio, JobSpec, Resolution};

/// Batch-fatal configuration error, raised before any job starts.
#[derive(Debug, Error)]
#[error("Invalid batch configuration: {0}")]
pub struct ConfigError(String);

/// Default clip duration when neither the job nor the batch sets one.
pub const DEFAULT_DURATION_SECONDS: u32 = 5;

/// Model used when neither the job nor the batch names one.
pub const DEFAULT_MODEL: &str = "vf-video-1";

fn default_max_concurrent() -> usize {
    3
}

fn default_timeout_seconds() -> u64 {
    1800
}

fn default_poll_interval_seconds() -> u64 {
    10
}

fn default_max_poll_attempts() -> u32 {
    120
}

/// Retry policy applied around each job execution.
///
/// A failed attempt is retried only while attempts remain AND the error
/// message contains one of the configured patterns (case-insensitive
/// substring match). The executor surfaces heterogeneous failures as
/// plain text, so matching happens on raw messages rather than on
/// structured codes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt
    #[serde(default = "RetryPolicy::default_max_retries")]
    #[validate(range(max = 5))]
    pub max_retries: u32,

    /// Constant delay between attempts
    #[serde(default = "RetryPolicy::default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Error-message substrings that authorize a retry
    #[serde(default = "RetryPolicy::default_retry_patterns")]
    pub retry_patterns: Vec<String>,
}

impl RetryPolicy {
    fn default_max_retries() -> u32 {
        2
    }

    fn default_retry_delay_ms() -> u64 {
        5000
    }

    fn default_retry_patterns() -> Vec<String> {
        [
            "rate limit",
            "too many requests",
            "429",
            "500",
            "502",
            "503",
            "timeout",
            "timed out",
            "connection",
            "network",
            "temporarily unavailable",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// Decide whether a further attempt is warranted.
    ///
    /// `attempt_index` is zero-based: 0 is the initial attempt. An error
    /// matching no pattern is terminal even when retries remain.
    pub fn should_retry(&self, attempt_index: u32, error_message: &str) -> bool {
        if attempt_index >= self.max_retries {
            return false;
        }
        let message = error_message.to_lowercase();
        self.retry_patterns
            .iter()
            .any(|p| message.contains(&p.to_lowercase()))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::default_max_retries(),
            retry_delay_ms: Self::default_retry_delay_ms(),
            retry_patterns: Self::default_retry_patterns(),
        }
    }
}

/// A validated batch of jobs plus the knobs shared by all of them.
///
/// Every numeric bound is checked by [`Validate::validate`] before any
/// job starts; an invalid configuration is batch-fatal with zero jobs
/// launched.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct BatchConfig {
    /// Ordered jobs; report indices follow this order
    #[validate(length(min = 1, max = 100, message = "a batch holds 1 to 100 jobs"), nested)]
    pub jobs: Vec<JobSpec>,

    /// Model for jobs that do not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    /// Duration for jobs that do not set one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 60))]
    pub default_duration_seconds: Option<u32>,

    /// Aspect ratio for jobs that do not set one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_aspect_ratio: Option<AspectRatio>,

    /// Resolution for jobs that do not set one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_resolution: Option<Resolution>,

    /// Peak number of jobs in flight
    #[serde(default = "default_max_concurrent")]
    #[validate(range(min = 1, max = 10))]
    pub max_concurrent: usize,

    /// Wall-clock budget for the whole batch
    #[serde(default = "default_timeout_seconds")]
    #[validate(range(min = 1))]
    pub timeout_seconds: u64,

    /// Interval between remote status polls
    #[serde(default = "default_poll_interval_seconds")]
    #[validate(range(min = 1))]
    pub poll_interval_seconds: u64,

    /// Poll ceiling per job execution
    #[serde(default = "default_max_poll_attempts")]
    #[validate(range(min = 1))]
    pub max_poll_attempts: u32,

    /// Retry policy shared by every job
    #[serde(default)]
    #[validate(nested)]
    pub retry: RetryPolicy,
}

impl BatchConfig {
    /// Run every structural and range check. Fails fast: a batch with an
    /// invalid configuration starts zero jobs.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate().map_err(|e| ConfigError(e.to_string()))
    }

    /// Build a config over the given jobs with all defaults.
    pub fn new(jobs: Vec<JobSpec>) -> Self {
        Self {
            jobs,
            default_model: None,
            default_duration_seconds: None,
            default_aspect_ratio: None,
            default_resolution: None,
            max_concurrent: default_max_concurrent(),
            timeout_seconds: default_timeout_seconds(),
            poll_interval_seconds: default_poll_interval_seconds(),
            max_poll_attempts: default_max_poll_attempts(),
            retry: RetryPolicy::default(),
        }
    }

    /// Effective duration for a job: job override, then batch default,
    /// then the global default.
    pub fn duration_for(&self, job: &JobSpec) -> u32 {
        job.duration_seconds
            .or(self.default_duration_seconds)
            .unwrap_or(DEFAULT_DURATION_SECONDS)
    }

    /// Effective model for a job.
    pub fn model_for<'a>(&'a self, job: &'a JobSpec) -> &'a str {
        job.model
            .as_deref()
            .or(self.default_model.as_deref())
            .unwrap_or(DEFAULT_MODEL)
    }

    /// Effective aspect ratio for a job.
    pub fn aspect_ratio_for(&self, job: &JobSpec) -> AspectRatio {
        job.aspect_ratio
            .or(self.default_aspect_ratio)
            .unwrap_or_default()
    }

    /// Effective resolution for a job.
    pub fn resolution_for(&self, job: &JobSpec) -> Resolution {
        job.resolution
            .or(self.default_resolution)
            .unwrap_or_default()
    }
}
