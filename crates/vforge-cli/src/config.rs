//! CLI configuration from environment variables.

use std::path::PathBuf;

/// Environment-derived defaults, read once at startup and passed down
/// explicitly.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Directory job outputs resolve against
    pub output_dir: PathBuf,
    /// Poll interval for single-job runs
    pub poll_interval_seconds: u64,
    /// Poll ceiling for single-job runs
    pub max_poll_attempts: u32,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            poll_interval_seconds: 10,
            max_poll_attempts: 120,
        }
    }
}

impl CliConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            output_dir: std::env::var("VIDFORGE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("output")),
            poll_interval_seconds: std::env::var("VIDFORGE_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            max_poll_attempts: std::env::var("VIDFORGE_MAX_POLL_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(120),
        }
    }
}
