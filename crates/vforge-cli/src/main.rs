//! VidForge command-line binary.

mod cli;
mod config;
mod report;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vforge_batch::{BatchOptions, BatchScheduler, RemoteJobExecutor};
use vforge_client::VideoApiClient;
use vforge_models::{estimate_cost, BatchConfig, JobSpec};
use vforge_storage::StorageClient;

use crate::cli::{Cli, Command};
use crate::config::CliConfig;
use crate::report::{render_estimate, render_report};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let env_config = CliConfig::from_env();

    match cli.command {
        Command::Generate {
            prompt,
            image_url,
            image_path,
            video_url,
            output,
            model,
            duration,
            aspect_ratio,
            resolution,
            allow_any_path,
        } => {
            let job = JobSpec {
                prompt,
                output,
                model,
                duration_seconds: duration,
                aspect_ratio,
                resolution,
                image_url,
                image_path,
                video_url,
            };

            // A single job runs through the same engine as a batch of one,
            // so validation, retries, and the timeout all apply.
            let mut config = BatchConfig::new(vec![job]);
            config.max_concurrent = 1;
            config.poll_interval_seconds = env_config.poll_interval_seconds;
            config.max_poll_attempts = env_config.max_poll_attempts;

            run_batch(config, &env_config.output_dir, allow_any_path, false).await
        }
        Command::Batch {
            file,
            estimate_only,
            json,
            output_dir,
            max_concurrent,
            timeout,
            allow_any_path,
        } => {
            let mut config = load_batch_file(&file)?;
            if let Some(limit) = max_concurrent {
                config.max_concurrent = limit;
            }
            if let Some(secs) = timeout {
                config.timeout_seconds = secs;
            }

            if estimate_only {
                return print_estimate(&config, json);
            }

            let output_dir = output_dir.unwrap_or_else(|| env_config.output_dir.clone());
            run_batch(config, &output_dir, allow_any_path, json).await
        }
        Command::Estimate { file, json } => {
            let config = load_batch_file(&file)?;
            print_estimate(&config, json)
        }
    }
}

async fn run_batch(
    config: BatchConfig,
    output_dir: &Path,
    allow_any_path: bool,
    json: bool,
) -> anyhow::Result<i32> {
    config.check()?;

    let api = VideoApiClient::from_env().context("API client configuration")?;
    let storage = if config.jobs.iter().any(|j| j.image_path.is_some()) {
        Some(StorageClient::from_env().context(
            "a job references a local image; object storage must be configured",
        )?)
    } else {
        None
    };
    let executor = Arc::new(RemoteJobExecutor::new(api, storage));

    let options = BatchOptions {
        output_dir: output_dir.to_path_buf(),
        allow_any_path,
    };
    let report = BatchScheduler::new(config, options, executor).run().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }

    Ok(if report.all_succeeded() { 0 } else { 1 })
}

fn print_estimate(config: &BatchConfig, json: bool) -> anyhow::Result<i32> {
    config.check()?;
    let estimate = estimate_cost(config);
    info!(jobs = config.jobs.len(), "Estimate only; no jobs submitted");
    if json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
    } else {
        print!("{}", render_estimate(&estimate));
    }
    Ok(0)
}

fn load_batch_file(file: &Path) -> anyhow::Result<BatchConfig> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read batch file {}", file.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse batch file {}", file.display()))
}
