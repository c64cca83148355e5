use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod assessment;
mod cli;
mod config;
mod content;
mod error;
mod metrics;
mod output;
mod pipeline;
mod registry;
mod transform;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing - only show logs with --verbose
    let filter = if cli.verbose {
        EnvFilter::new("briefcraft=debug")
    } else {
        EnvFilter::new("briefcraft=warn")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Run(args) => cli::run::execute(args).await,
        Commands::Validate(args) => cli::validate::execute(args),
        Commands::Adapt(args) => cli::adapt::execute(args),
        Commands::Schema => cli::schema::execute(),
    }
}
