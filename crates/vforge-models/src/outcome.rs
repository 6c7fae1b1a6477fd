//! Per-job outcomes and the final batch report.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::CostEstimate;

/// Terminal result of one job.
///
/// The scheduler records exactly one outcome per job; outcomes are never
/// mutated afterwards. `Cancelled` is synthesized at finalization for
/// jobs that had not settled when the batch deadline (plus grace) passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Completed {
        /// Local path the video was written to
        output_path: String,
        /// Remote URL the video was downloaded from
        #[serde(skip_serializing_if = "Option::is_none")]
        remote_url: Option<String>,
        /// Duration reported by the API, seconds
        #[serde(skip_serializing_if = "Option::is_none")]
        video_duration_seconds: Option<f64>,
        /// Remote request identifier, for support lookups
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        /// Dispatch-to-completion wall time, all attempts included
        duration_ms: u64,
    },
    Failed {
        error: String,
        duration_ms: u64,
    },
    Cancelled {
        reason: String,
    },
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, JobOutcome::Failed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobOutcome::Cancelled { .. })
    }
}

/// A job outcome tagged with the job's original 1-based index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobResult {
    pub index: usize,
    #[serde(flatten)]
    pub outcome: JobOutcome,
}

/// Final report for a batch run.
///
/// Assembled once after all jobs settle (or are reconciled as cancelled)
/// and returned to the presentation layer; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchReport {
    /// Correlation id for this run, for log lookups
    pub batch_id: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// One entry per job, ordered by original index
    pub results: Vec<JobResult>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Estimated (not measured) cost for the configured batch
    pub cost: CostEstimate,
}

impl BatchReport {
    /// Tally totals from results already sorted by index.
    pub fn new(
        results: Vec<JobResult>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        cost: CostEstimate,
    ) -> Self {
        let succeeded = results.iter().filter(|r| r.outcome.is_completed()).count();
        let failed = results.iter().filter(|r| r.outcome.is_failed()).count();
        let cancelled = results.iter().filter(|r| r.outcome.is_cancelled()).count();
        let elapsed_ms = (ended_at - started_at).num_milliseconds().max(0) as u64;

        Self {
            batch_id: uuid::Uuid::new_v4().to_string(),
            total: results.len(),
            succeeded,
            failed,
            cancelled,
            results,
            started_at,
            ended_at,
            elapsed_ms,
            cost,
        }
    }

    /// Exit-code convention: success only when nothing failed or was cancelled.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}
