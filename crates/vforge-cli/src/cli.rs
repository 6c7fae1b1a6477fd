//! Command-line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use vforge_models::{AspectRatio, Resolution};

#[derive(Parser)]
#[command(name = "vforge")]
#[command(about = "Generate, animate, and edit videos through the VidForge API.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a single job: submit, poll to completion, download.
    Generate {
        /// Generation prompt
        #[arg(long)]
        prompt: String,

        /// Reference image URL (image-to-video)
        #[arg(long, conflicts_with = "image_path")]
        image_url: Option<String>,

        /// Local reference image, uploaded to object storage first
        #[arg(long)]
        image_path: Option<String>,

        /// Source video URL; makes this an edit job
        #[arg(long)]
        video_url: Option<String>,

        /// Output file (default: derived from the prompt)
        #[arg(long)]
        output: Option<String>,

        /// Model name
        #[arg(long)]
        model: Option<String>,

        /// Clip duration in seconds
        #[arg(long)]
        duration: Option<u32>,

        /// Aspect ratio: 16:9, 9:16, or 1:1
        #[arg(long)]
        aspect_ratio: Option<AspectRatio>,

        /// Resolution: 480p, 720p, or 1080p
        #[arg(long)]
        resolution: Option<Resolution>,

        /// Permit an output path outside the output directory
        #[arg(long)]
        allow_any_path: bool,
    },
    /// Run every job in a batch file under shared concurrency, retry,
    /// and timeout policy.
    Batch {
        /// Batch description (JSON)
        file: PathBuf,

        /// Only estimate the cost; no network calls
        #[arg(long)]
        estimate_only: bool,

        /// Emit the report as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Directory job outputs resolve against
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Override the batch file's concurrency limit
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Override the batch file's timeout (seconds)
        #[arg(long)]
        timeout: Option<u64>,

        /// Permit job-declared absolute paths outside the output directory
        #[arg(long)]
        allow_any_path: bool,
    },
    /// Estimate a batch file's cost without running it.
    Estimate {
        /// Batch description (JSON)
        file: PathBuf,

        /// Emit the estimate as JSON
        #[arg(long)]
        json: bool,
    },
}
