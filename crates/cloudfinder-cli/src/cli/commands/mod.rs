//! Command implementations.

pub mod build;
pub mod classify;
pub mod config;

use std::path::PathBuf;

use cloudfinder::FetchConfig;

use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory holding the compiled lookup data
    pub data_dir: PathBuf,

    /// Output format
    pub output_format: OutputFormat,

    /// Feed fetch settings
    pub fetch: FetchConfig,

    /// Config file in use
    pub config_path: PathBuf,
}
