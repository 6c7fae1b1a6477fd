//! Batch execution engine.
//!
//! The scheduler launches one task per job, throttles real concurrency
//! through a counting semaphore, wraps every execution in the configured
//! retry policy, and races the whole batch against a wall-clock deadline.
//! Whatever has not settled after the deadline (plus a short grace
//! period) is reconciled as cancelled, so the report always carries one
//! outcome per job.

pub mod error;
pub mod executor;
pub mod paths;
pub mod scheduler;

pub use error::{BatchError, BatchResult};
pub use executor::{
    ExecutionError, ExecutionOutput, ExecutionRequest, JobExecutor, RemoteJobExecutor,
};
pub use paths::resolve_output_path;
pub use scheduler::{BatchOptions, BatchScheduler};
