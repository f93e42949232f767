//! # cloudfinder-cli
//!
//! Command-line interface for cloudfinder.
//!
//! ## Features
//!
//! - **build**: fetch every provider feed and compile the lookup data
//! - **classify**: map IPs, hostnames or URLs to their provider
//! - **config**: persistent defaults in a TOML file
//! - **Multiple output formats**: pretty, JSON lines, raw

pub mod cli;
pub mod config;
pub mod logging;
pub mod output;

pub use cli::run;
