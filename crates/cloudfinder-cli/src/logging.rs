//! Log subscriber setup. Logs go to stderr; stdout carries results only.

use anyhow::{Context as _, Result};
use tracing_subscriber::{filter::Targets, fmt, prelude::*};

/// Environment variable overriding the configured log level.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Pick the log filter: flags first, then `LOG_LEVEL`, then the config.
pub fn level(verbose: bool, quiet: bool, env: Option<String>, config: Option<&str>) -> String {
    if verbose {
        return "debug".to_string();
    }
    if quiet {
        return "warn".to_string();
    }
    env.filter(|level| !level.trim().is_empty())
        .or_else(|| config.map(ToString::to_string))
        .unwrap_or_else(|| "info".to_string())
}

/// Install the global subscriber.
pub fn init(level: &str, color: bool) -> Result<()> {
    let filter: Targets = level
        .parse()
        .with_context(|| format!("Invalid log level: {level}"))?;

    let format = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(color)
        .with_target(false);

    tracing_subscriber::registry()
        .with(format)
        .with(filter)
        .try_init()
        .context("Failed to install log subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_precedence() {
        assert_eq!(level(true, true, Some("trace".into()), Some("error")), "debug");
        assert_eq!(level(false, true, Some("trace".into()), Some("error")), "warn");
        assert_eq!(level(false, false, Some("trace".into()), Some("error")), "trace");
        assert_eq!(level(false, false, Some("  ".into()), Some("error")), "error");
        assert_eq!(level(false, false, None, None), "info");
    }

    #[test]
    fn test_filter_syntax() {
        assert!("info".parse::<Targets>().is_ok());
        assert!("warn,cloudfinder_sources=debug".parse::<Targets>().is_ok());
    }
}
