//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use std::io::IsTerminal;

use crate::config::Config;
use crate::logging;
use crate::output::OutputFormat;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::path()?,
    };
    let config = Config::load_from(&config_path)?;

    let color = !cli.no_color && std::io::stderr().is_terminal();
    if cli.no_color || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let level = logging::level(
        cli.verbose,
        cli.quiet,
        std::env::var(logging::LOG_LEVEL_ENV).ok(),
        config.log_level.as_deref(),
    );
    logging::init(&level, color)?;

    // Create context for commands
    let ctx = commands::Context {
        data_dir: cli.data_dir.clone().unwrap_or_else(|| config.data_dir()),
        output_format: cli
            .output
            .or(config.output_format)
            .unwrap_or(OutputFormat::Pretty),
        fetch: config.fetch_config(),
        config_path,
    };

    // Dispatch to appropriate command
    match cli.command {
        Commands::Build(args) => commands::build::execute(ctx, args).await,
        Commands::Classify(args) => commands::classify::execute(ctx, args).await,
        Commands::Config(args) => commands::config::execute(ctx, args).await,
    }
}
