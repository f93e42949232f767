//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Classify IP addresses by the cloud or CDN provider that owns them
///
/// Run `cloudfinder build` once to compile the lookup data, then
/// `cloudfinder classify` as often as needed, fully offline.
#[derive(Parser, Debug)]
#[command(name = "cloudfinder")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the compiled lookup data
    #[arg(short, long, env = "CLOUDFINDER_DATA_DIR", global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Config file to use instead of the platform default
    #[arg(long, env = "CLOUDFINDER_CONFIG", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log debug details
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every provider feed and compile the lookup data
    Build(BuildArgs),

    /// Classify IP addresses, hostnames or URLs
    Classify(ClassifyArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ============================================================================
// Build command
// ============================================================================

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Rebuild even if the feeds did not change
    #[arg(short, long)]
    pub force: bool,

    /// Also write one `<provider>.txt` range file per provider into DIR
    #[arg(long, value_name = "DIR")]
    pub write_ranges: Option<PathBuf>,
}

// ============================================================================
// Classify command
// ============================================================================

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// IPs, hostnames or URLs; read from stdin, one per line, when omitted
    pub inputs: Vec<String>,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Key to set (e.g., data_dir, output_format)
        key: String,

        /// Value to set
        value: String,
    },

    /// Show config file path
    Path,
}
