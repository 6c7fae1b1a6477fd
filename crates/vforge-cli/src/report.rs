//! Report rendering for terminal output.

use vforge_models::{BatchReport, CostEstimate, JobOutcome};

/// Human-readable batch summary.
pub fn render_report(report: &BatchReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Batch {}: {} succeeded, {} failed, {} cancelled ({} total) in {}\n",
        report.batch_id,
        report.succeeded,
        report.failed,
        report.cancelled,
        report.total,
        format_elapsed(report.elapsed_ms),
    ));

    for result in &report.results {
        let line = match &result.outcome {
            JobOutcome::Completed {
                output_path,
                request_id,
                duration_ms,
                ..
            } => {
                let request = request_id
                    .as_deref()
                    .map(|id| format!(", req {id}"))
                    .unwrap_or_default();
                format!(
                    "  {:>3}. completed  {} ({}{})",
                    result.index,
                    output_path,
                    format_elapsed(*duration_ms),
                    request
                )
            }
            JobOutcome::Failed { error, duration_ms } => format!(
                "  {:>3}. failed     {} ({})",
                result.index,
                error,
                format_elapsed(*duration_ms)
            ),
            JobOutcome::Cancelled { reason } => {
                format!("  {:>3}. cancelled  {}", result.index, reason)
            }
        };
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str(&format!("Estimated cost: {}\n", report.cost.to_description()));
    out
}

/// Human-readable cost estimate.
pub fn render_estimate(estimate: &CostEstimate) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", estimate.to_description()));
    for bucket in &estimate.breakdown {
        out.push_str(&format!(
            "  {:<16} {:>3} job(s), {:>4}s, ${:.2}\n",
            bucket.kind.to_string(),
            bucket.count,
            bucket.duration_seconds,
            bucket.cost_usd
        ));
    }
    out
}

fn format_elapsed(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vforge_models::{estimate_cost, BatchConfig, BatchReport, JobResult, JobSpec};

    fn sample_report() -> BatchReport {
        let config = BatchConfig::new(vec![
            JobSpec::from_prompt("one"),
            JobSpec::from_prompt("two"),
        ]);
        let now = Utc::now();
        BatchReport::new(
            vec![
                JobResult {
                    index: 1,
                    outcome: JobOutcome::Completed {
                        output_path: "output/001_one.mp4".to_string(),
                        remote_url: None,
                        video_duration_seconds: Some(5.0),
                        request_id: Some("req-1".to_string()),
                        duration_ms: 8200,
                    },
                },
                JobResult {
                    index: 2,
                    outcome: JobOutcome::Cancelled {
                        reason: "timed out".to_string(),
                    },
                },
            ],
            now,
            now,
            estimate_cost(&config),
        )
    }

    #[test]
    fn test_report_lists_every_job() {
        let text = render_report(&sample_report());
        assert!(text.contains("1 succeeded, 0 failed, 1 cancelled (2 total)"));
        assert!(text.contains("completed  output/001_one.mp4 (8.2s, req req-1)"));
        assert!(text.contains("cancelled  timed out"));
        assert!(text.contains("Estimated cost:"));
    }

    #[test]
    fn test_estimate_lists_buckets() {
        let config = BatchConfig::new(vec![JobSpec::from_prompt("one")]);
        let text = render_estimate(&estimate_cost(&config));
        assert!(text.contains("generation"));
        assert!(text.contains("$0.50"));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(250), "250ms");
        assert_eq!(format_elapsed(8200), "8.2s");
    }
}
