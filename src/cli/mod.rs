pub mod adapt;
pub mod run;
pub mod schema;
pub mod validate;

use crate::content::ContentType;
use crate::transform::{DepthLevel, Voice};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "briefcraft")]
#[command(
    author,
    version,
    about = "Assessment-to-report pipeline: scores submissions and adapts the findings into audience-specific documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline and write the report documents
    Run(RunArgs),

    /// Pre-flight check a submission file without running the pipeline
    Validate(ValidateArgs),

    /// Adapt a single markup fragment to a depth and voice (debugging aid)
    Adapt(AdaptArgs),

    /// Print JSON Schema for config validation
    Schema,
}

#[derive(Parser, Clone)]
pub struct RunArgs {
    /// Submission JSON file
    #[arg(value_name = "SUBMISSION")]
    pub input: PathBuf,

    /// Path to config file (defaults are used if the file does not exist)
    #[arg(short, long, default_value = "briefcraft.yaml")]
    pub config: PathBuf,

    /// Override output directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Override registry file
    #[arg(long)]
    pub registry: Option<PathBuf>,

    /// Show the execution plan without running
    #[arg(long)]
    pub dry_run: bool,

    /// Log a progress line after every pipeline state change
    #[arg(long)]
    pub progress: bool,
}

#[derive(Parser, Clone)]
pub struct ValidateArgs {
    /// Submission JSON file
    #[arg(value_name = "SUBMISSION")]
    pub input: PathBuf,
}

#[derive(Parser, Clone)]
pub struct AdaptArgs {
    /// File holding the markup fragment
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Target depth: headline, summary, standard, detailed
    #[arg(long, default_value = "summary")]
    pub depth: DepthLevel,

    /// Target voice: owner, executive, manager, employee
    #[arg(long, default_value = "owner")]
    pub voice: Voice,

    /// Content type the fragment represents
    #[arg(long, default_value = "recommendation")]
    pub content_type: ContentType,
}
