//! Cost estimation for a batch before execution.
//!
//! Estimation shares the job classification rules with the scheduler
//! (both go through [`JobSpec::kind`]), so the per-kind accounting in an
//! estimate always matches what a run would dispatch. The function is
//! pure: identical configs produce identical estimates, which is what
//! makes the `--estimate-only` mode possible without network calls.
//!
//! # Example
//!
//! ```ignore
//! use vforge_models::{estimate_cost, BatchConfig, JobSpec};
//!
//! let config = BatchConfig::new(vec![JobSpec::from_prompt("a quiet forest")]);
//! let estimate = estimate_cost(&config);
//! assert!(estimate.estimated_cost_min <= estimate.estimated_cost_max);
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{BatchConfig, JobKind};

/// Rate per generated second, text-to-video.
pub const GENERATION_RATE_PER_SECOND: f64 = 0.10;

/// Rate per generated second, image-to-video.
pub const IMAGE_TO_VIDEO_RATE_PER_SECOND: f64 = 0.10;

/// Flat per-job surcharge for image-to-video (reference-image ingestion).
pub const IMAGE_TO_VIDEO_JOB_SURCHARGE: f64 = 0.05;

/// Rate per second, video edits.
pub const EDIT_RATE_PER_SECOND: f64 = 0.15;

/// Assumed duration for edit jobs. The true post-edit duration is only
/// known after execution; this is a documented approximation, not a bound.
pub const EDIT_ASSUMED_DURATION_SECONDS: u32 = 5;

/// Margin applied on top of the nominal total to produce the max figure.
pub const ESTIMATE_MARGIN: f64 = 0.20;

// =============================================================================
// Estimate types
// =============================================================================

/// Accumulated totals for one job kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CostBucket {
    pub kind: JobKind,
    /// Jobs of this kind in the batch
    pub count: u32,
    /// Total requested seconds for the kind
    pub duration_seconds: u32,
    /// Nominal cost for the kind in USD
    pub cost_usd: f64,
}

/// Cost estimate for a whole batch.
///
/// Figures are advisory USD estimates, not billing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CostEstimate {
    pub total_jobs: u32,
    pub total_duration_seconds: u32,
    /// Nominal total
    pub estimated_cost_min: f64,
    /// Nominal total plus [`ESTIMATE_MARGIN`]
    pub estimated_cost_max: f64,
    /// Non-empty kinds only, in Generation/ImageToVideo/Edit order
    pub breakdown: Vec<CostBucket>,
}

impl CostEstimate {
    /// One-line human summary, e.g.
    /// `"12 jobs, 74s of video, $7.40-$8.88 (generation: 10, image_to_video: 2)"`.
    pub fn to_description(&self) -> String {
        let kinds: Vec<String> = self
            .breakdown
            .iter()
            .map(|b| format!("{}: {}", b.kind, b.count))
            .collect();
        let job_text = if self.total_jobs == 1 { "job" } else { "jobs" };
        format!(
            "{} {}, {}s of video, ${:.2}-${:.2} ({})",
            self.total_jobs,
            job_text,
            self.total_duration_seconds,
            self.estimated_cost_min,
            self.estimated_cost_max,
            kinds.join(", ")
        )
    }
}

// =============================================================================
// Estimation
// =============================================================================

struct KindTotals {
    count: u32,
    duration_seconds: u32,
}

/// Estimate the cost of running `config`.
///
/// Each job is classified, then its effective duration (edit jobs use
/// [`EDIT_ASSUMED_DURATION_SECONDS`]) is accumulated into a per-kind
/// bucket. Bucket cost is rate x seconds, plus the per-job surcharge for
/// image-to-video.
pub fn estimate_cost(config: &BatchConfig) -> CostEstimate {
    let mut totals = [
        (JobKind::Generation, KindTotals { count: 0, duration_seconds: 0 }),
        (JobKind::ImageToVideo, KindTotals { count: 0, duration_seconds: 0 }),
        (JobKind::Edit, KindTotals { count: 0, duration_seconds: 0 }),
    ];

    for job in &config.jobs {
        let kind = job.kind();
        let duration = match kind {
            JobKind::Edit => EDIT_ASSUMED_DURATION_SECONDS,
            _ => config.duration_for(job),
        };
        let slot = match kind {
            JobKind::Generation => 0,
            JobKind::ImageToVideo => 1,
            JobKind::Edit => 2,
        };
        totals[slot].1.count += 1;
        totals[slot].1.duration_seconds += duration;
    }

    let mut breakdown = Vec::new();
    let mut total_cost = 0.0;
    let mut total_duration = 0;
    let mut total_jobs = 0;

    for (kind, t) in totals {
        if t.count == 0 {
            continue;
        }
        let seconds = f64::from(t.duration_seconds);
        let cost_usd = match kind {
            JobKind::Generation => GENERATION_RATE_PER_SECOND * seconds,
            JobKind::ImageToVideo => {
                IMAGE_TO_VIDEO_RATE_PER_SECOND * seconds
                    + IMAGE_TO_VIDEO_JOB_SURCHARGE * f64::from(t.count)
            }
            JobKind::Edit => EDIT_RATE_PER_SECOND * seconds,
        };
        total_cost += cost_usd;
        total_duration += t.duration_seconds;
        total_jobs += t.count;
        breakdown.push(CostBucket {
            kind,
            count: t.count,
            duration_seconds: t.duration_seconds,
            cost_usd,
        });
    }

    CostEstimate {
        total_jobs,
        total_duration_seconds: total_duration,
        estimated_cost_min: total_cost,
        estimated_cost_max: total_cost * (1.0 + ESTIMATE_MARGIN),
        breakdown,
    }
}

// =============================================================================
// Tests
// =============================================================================
