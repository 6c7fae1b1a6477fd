//! Shared data models for the VidForge batch video-generation client.
//!
//! This crate provides Serde-serializable types for:
//! - Job specifications and derived job kinds
//! - Batch configuration, defaults, and retry policy
//! - Job outcomes and the final batch report
//! - Cost estimation

pub mod batch;
pub mod cost;
pub mod job;
pub mod outcome;
pub mod video;

// Re-export common types
pub use batch::{BatchConfig, ConfigError, RetryPolicy};
pub use cost::{estimate_cost, CostBucket, CostEstimate};
pub use job::{JobKind, JobSpec};
pub use outcome::{BatchReport, JobOutcome, JobResult};
pub use video::{AspectRatio, AspectRatioParseError, Resolution, ResolutionParseError};
