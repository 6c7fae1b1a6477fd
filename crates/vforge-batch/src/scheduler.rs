//! Batch scheduler.
//!
//! Launches one task per job immediately and lets a counting semaphore
//! throttle actual concurrency, rather than running a fixed worker pool.
//! All tasks are awaited together against a single wall-clock deadline;
//! when the deadline wins the race, in-flight work gets a short grace
//! period and whatever has not settled is reconciled as cancelled, so
//! the final report always carries exactly one outcome per job.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{Mutex, Semaphore};
use tracing::{error, info, warn};

use vforge_models::{
    estimate_cost, BatchConfig, BatchReport, JobOutcome, JobResult, RetryPolicy,
};

use crate::error::{BatchError, BatchResult};
use crate::executor::{ExecutionRequest, JobExecutor};
use crate::paths::resolve_output_path;

/// Extra wait after the batch deadline before unfinished jobs are
/// reconciled as cancelled. In-flight remote calls are not aborted; this
/// just bounds how long finalization waits for them.
const GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Reason recorded on outcomes synthesized at the deadline.
const TIMED_OUT_REASON: &str = "timed out";

/// Environment-derived settings the scheduler needs beyond the batch
/// file itself. Passed in explicitly so the core never reads ambient
/// process state.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory job outputs resolve against
    pub output_dir: PathBuf,
    /// Permit job-declared absolute paths outside `output_dir`
    pub allow_any_path: bool,
}

/// Coordinates one batch run end to end.
pub struct BatchScheduler {
    config: BatchConfig,
    options: BatchOptions,
    executor: Arc<dyn JobExecutor>,
}

impl BatchScheduler {
    pub fn new(config: BatchConfig, options: BatchOptions, executor: Arc<dyn JobExecutor>) -> Self {
        Self {
            config,
            options,
            executor,
        }
    }

    /// Run every job and assemble the final report.
    ///
    /// Job failures never escape this function; they are recorded as
    /// outcomes. The only errors are an invalid configuration (nothing
    /// started) and scheduler faults such as a panicked task.
    pub async fn run(self) -> BatchResult<BatchReport> {
        self.config.check()?;

        let total = self.config.jobs.len();
        let started_at = Utc::now();
        info!(
            jobs = total,
            max_concurrent = self.config.max_concurrent,
            timeout_secs = self.config.timeout_seconds,
            "Starting batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let results: Arc<Mutex<HashMap<usize, JobOutcome>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let mut handles = Vec::with_capacity(total);

        for (i, job) in self.config.jobs.iter().enumerate() {
            let index = i + 1;
            let output_path = match resolve_output_path(
                job,
                index,
                &self.options.output_dir,
                self.options.allow_any_path,
            ) {
                Ok(path) => path,
                Err(e) => {
                    // Scoped to this job: siblings still run.
                    error!(job = index, error = %e, "Output path rejected");
                    results.lock().await.insert(
                        index,
                        JobOutcome::Failed {
                            error: e.to_string(),
                            duration_ms: 0,
                        },
                    );
                    continue;
                }
            };

            let request = ExecutionRequest {
                kind: job.kind(),
                job: job.clone(),
                output_path,
                model: self.config.model_for(job).to_string(),
                duration_seconds: self.config.duration_for(job),
                aspect_ratio: self.config.aspect_ratio_for(job),
                resolution: self.config.resolution_for(job),
                poll_interval: Duration::from_secs(self.config.poll_interval_seconds),
                max_poll_attempts: self.config.max_poll_attempts,
            };

            let executor = Arc::clone(&self.executor);
            let semaphore = Arc::clone(&semaphore);
            let retry = self.config.retry.clone();
            let results = Arc::clone(&results);

            handles.push(tokio::spawn(async move {
                let outcome = run_job(executor, semaphore, retry, index, request).await;
                results.lock().await.insert(index, outcome);
            }));
        }

        let timeout = Duration::from_secs(self.config.timeout_seconds);
        tokio::select! {
            joined = futures::future::join_all(handles) => {
                for result in joined {
                    result.map_err(|e| BatchError::Join(e.to_string()))?;
                }
            }
            _ = tokio::time::sleep(timeout) => {
                warn!(
                    timeout_secs = self.config.timeout_seconds,
                    "Batch deadline reached; allowing in-flight jobs a grace period"
                );
                tokio::time::sleep(GRACE_PERIOD).await;
            }
        }

        let mut settled = {
            let mut guard = results.lock().await;
            std::mem::take(&mut *guard)
        };
        let results: Vec<JobResult> = (1..=total)
            .map(|index| JobResult {
                index,
                outcome: settled.remove(&index).unwrap_or_else(|| {
                    JobOutcome::Cancelled {
                        reason: TIMED_OUT_REASON.to_string(),
                    }
                }),
            })
            .collect();

        let report = BatchReport::new(results, started_at, Utc::now(), estimate_cost(&self.config));
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            cancelled = report.cancelled,
            elapsed_ms = report.elapsed_ms,
            "Batch finished"
        );
        Ok(report)
    }
}

/// Execute one job: wait on the gate, then run the executor inside the
/// retry loop. The permit is held for the whole protected section and
/// released on every exit path by drop.
async fn run_job(
    executor: Arc<dyn JobExecutor>,
    semaphore: Arc<Semaphore>,
    retry: RetryPolicy,
    index: usize,
    request: ExecutionRequest,
) -> JobOutcome {
    let dispatched = Instant::now();

    let _permit = match Arc::clone(&semaphore).acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            // Only possible if the semaphore is closed, which the
            // scheduler never does.
            return JobOutcome::Failed {
                error: "scheduler gate closed".to_string(),
                duration_ms: elapsed_ms(dispatched),
            };
        }
    };

    let mut attempt: u32 = 0;
    loop {
        info!(job = index, attempt = attempt + 1, kind = %request.kind, "Executing job");
        match executor.execute(&request).await {
            Ok(output) => {
                info!(job = index, output = %output.output_path.display(), "Job completed");
                return JobOutcome::Completed {
                    output_path: output.output_path.display().to_string(),
                    remote_url: output.remote_url,
                    video_duration_seconds: output.video_duration_seconds,
                    request_id: output.request_id,
                    duration_ms: elapsed_ms(dispatched),
                };
            }
            Err(e) => {
                let message = e.to_string();
                if retry.should_retry(attempt, &message) {
                    attempt += 1;
                    warn!(
                        job = index,
                        attempt = attempt,
                        max_retries = retry.max_retries,
                        error = message.as_str(),
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(retry.retry_delay_ms)).await;
                } else {
                    error!(job = index, error = message.as_str(), "Job failed");
                    return JobOutcome::Failed {
                        error: message,
                        duration_ms: elapsed_ms(dispatched),
                    };
                }
            }
        }
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ExecutionError, ExecutionOutput};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use vforge_models::JobSpec;

    /// Executor fake with scripted failures and concurrency instrumentation.
    struct FakeExecutor {
        delay: Duration,
        /// Fail this many calls per job before succeeding
        fail_times: u32,
        error_message: String,
        /// Never resolve at all (for timeout tests)
        hang: bool,
        calls: AtomicU32,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl FakeExecutor {
        fn succeeding(delay: Duration) -> Self {
            Self::failing(0, "", delay)
        }

        fn failing(fail_times: u32, error_message: &str, delay: Duration) -> Self {
            Self {
                delay,
                fail_times,
                error_message: error_message.to_string(),
                hang: false,
                calls: AtomicU32::new(0),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
            }
        }

        fn hanging() -> Self {
            let mut fake = Self::succeeding(Duration::ZERO);
            fake.hang = true;
            fake
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobExecutor for FakeExecutor {
        async fn execute(
            &self,
            request: &ExecutionRequest,
        ) -> Result<ExecutionOutput, ExecutionError> {
            if self.hang {
                futures::future::pending::<()>().await;
            }

            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if call < self.fail_times {
                return Err(ExecutionError(self.error_message.clone()));
            }
            Ok(ExecutionOutput {
                output_path: request.output_path.clone(),
                remote_url: Some("https://cdn.example.com/video.mp4".to_string()),
                video_duration_seconds: Some(5.0),
                request_id: Some(format!("req-{}", call + 1)),
            })
        }
    }

    fn options() -> BatchOptions {
        BatchOptions {
            output_dir: PathBuf::from("/videos"),
            allow_any_path: false,
        }
    }

    fn config_with_jobs(n: usize) -> BatchConfig {
        let jobs = (0..n)
            .map(|i| JobSpec::from_prompt(format!("prompt {i}")))
            .collect();
        let mut config = BatchConfig::new(jobs);
        config.retry.retry_delay_ms = 1;
        config
    }

    async fn run_with(
        config: BatchConfig,
        executor: Arc<FakeExecutor>,
    ) -> BatchReport {
        BatchScheduler::new(config, options(), executor)
            .run()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_one_outcome_per_job_in_input_order() {
        let executor = Arc::new(FakeExecutor::succeeding(Duration::from_millis(5)));
        let report = run_with(config_with_jobs(5), Arc::clone(&executor)).await;

        assert_eq!(report.total, 5);
        assert_eq!(report.succeeded, 5);
        let indices: Vec<usize> = report.results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
        assert!(report.all_succeeded());
    }

    #[tokio::test]
    async fn test_peak_concurrency_never_exceeds_gate() {
        let executor = Arc::new(FakeExecutor::succeeding(Duration::from_millis(20)));
        let mut config = config_with_jobs(8);
        config.max_concurrent = 2;
        run_with(config, Arc::clone(&executor)).await;

        assert_eq!(executor.calls(), 8);
        assert!(executor.peak_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_retryable_failures_then_success() {
        let executor = Arc::new(FakeExecutor::failing(
            2,
            "API error 429: rate limit exceeded",
            Duration::ZERO,
        ));
        let mut config = config_with_jobs(1);
        config.retry.max_retries = 3;
        let report = run_with(config, Arc::clone(&executor)).await;

        assert_eq!(report.succeeded, 1);
        // Two failed attempts plus the successful third
        assert_eq!(executor.calls(), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_counts_attempts() {
        let executor = Arc::new(FakeExecutor::failing(
            u32::MAX,
            "503 service unavailable",
            Duration::ZERO,
        ));
        let mut config = config_with_jobs(1);
        config.retry.max_retries = 2;
        let report = run_with(config, Arc::clone(&executor)).await;

        assert_eq!(report.failed, 1);
        // Initial attempt plus max_retries
        assert_eq!(executor.calls(), 3);
        match &report.results[0].outcome {
            JobOutcome::Failed { error, .. } => assert!(error.contains("503")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_once() {
        let executor = Arc::new(FakeExecutor::failing(
            u32::MAX,
            "invalid prompt: empty storyboard",
            Duration::ZERO,
        ));
        let mut config = config_with_jobs(1);
        config.retry.max_retries = 5;
        let report = run_with(config, Arc::clone(&executor)).await;

        assert_eq!(report.failed, 1);
        assert_eq!(executor.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_cancels_unfinished_jobs() {
        let executor = Arc::new(FakeExecutor::hanging());
        let mut config = config_with_jobs(2);
        config.timeout_seconds = 1;
        let report = run_with(config, executor).await;

        assert_eq!(report.cancelled, 2);
        for result in &report.results {
            assert_eq!(
                result.outcome,
                JobOutcome::Cancelled {
                    reason: "timed out".to_string()
                }
            );
        }
        assert!(!report.all_succeeded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_jobs_keep_outcome_under_timeout() {
        // Job 1 completes immediately; job 2 hangs past the deadline.
        struct SplitExecutor {
            fast: FakeExecutor,
            slow: FakeExecutor,
        }

        #[async_trait]
        impl JobExecutor for SplitExecutor {
            async fn execute(
                &self,
                request: &ExecutionRequest,
            ) -> Result<ExecutionOutput, ExecutionError> {
                if request.job.prompt.contains("fast") {
                    self.fast.execute(request).await
                } else {
                    self.slow.execute(request).await
                }
            }
        }

        let executor = Arc::new(SplitExecutor {
            fast: FakeExecutor::succeeding(Duration::ZERO),
            slow: FakeExecutor::hanging(),
        });
        let mut config = BatchConfig::new(vec![
            JobSpec::from_prompt("fast job"),
            JobSpec::from_prompt("slow job"),
        ]);
        config.timeout_seconds = 1;

        let report = BatchScheduler::new(config, options(), executor)
            .run()
            .await
            .unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.cancelled, 1);
        assert!(report.results[0].outcome.is_completed());
        assert!(report.results[1].outcome.is_cancelled());
    }

    #[tokio::test]
    async fn test_invalid_config_starts_nothing() {
        let executor = Arc::new(FakeExecutor::succeeding(Duration::ZERO));
        let mut config = config_with_jobs(1);
        config.max_concurrent = 0;

        let exec: Arc<dyn JobExecutor> = executor.clone();
        let err = BatchScheduler::new(config, options(), exec)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Config(_)));
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_path_escape_fails_only_that_job() {
        let executor = Arc::new(FakeExecutor::succeeding(Duration::ZERO));
        let mut config = config_with_jobs(2);
        config.jobs[0].output = Some("/etc/evil.mp4".to_string());
        let report = run_with(config, Arc::clone(&executor)).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.succeeded, 1);
        assert!(report.results[0].outcome.is_failed());
        assert!(report.results[1].outcome.is_completed());
        // The rejected job never reached the executor.
        assert_eq!(executor.calls(), 1);
    }

    #[tokio::test]
    async fn test_serialized_run_takes_at_least_sum_of_delays() {
        let per_job = Duration::from_millis(30);
        let executor = Arc::new(FakeExecutor::succeeding(per_job));
        let mut config = config_with_jobs(3);
        config.max_concurrent = 1;

        let started = Instant::now();
        let report = run_with(config, executor).await;
        let elapsed = started.elapsed();

        assert_eq!(report.succeeded, 3);
        assert!(
            elapsed >= per_job * 3,
            "serialized batch finished too quickly: {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_duration_includes_retries() {
        let executor = Arc::new(FakeExecutor::failing(
            1,
            "timeout contacting API",
            Duration::from_millis(10),
        ));
        let mut config = config_with_jobs(1);
        config.retry.max_retries = 1;
        config.retry.retry_delay_ms = 20;
        let report = run_with(config, executor).await;

        match &report.results[0].outcome {
            JobOutcome::Completed { duration_ms, .. } => {
                // Two 10ms attempts plus a 20ms retry delay
                assert!(*duration_ms >= 40);
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }
}
