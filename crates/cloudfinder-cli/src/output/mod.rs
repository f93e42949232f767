//! Output formatting for different formats.

use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::str::FromStr;

use cloudfinder::Provider;

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable, colored when stdout is a terminal
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
    /// Provider name only
    Raw,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" | "jsonl" => Ok(Self::Json),
            "raw" => Ok(Self::Raw),
            _ => anyhow::bail!(
                "Unknown output format: {}\n\
                 Valid formats: pretty, json, raw",
                s
            ),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
            Self::Raw => write!(f, "raw"),
        }
    }
}

/// One classified address.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Classification {
    /// Input as given by the user
    pub input: String,
    /// Address that was classified
    pub ip: IpAddr,
    /// Owning provider
    pub provider: Provider,
}

impl Classification {
    /// Render according to `format`.
    pub fn render(&self, format: OutputFormat) -> anyhow::Result<String> {
        Ok(match format {
            OutputFormat::Json => serde_json::to_string(self)?,
            OutputFormat::Raw => self.provider.to_string(),
            OutputFormat::Pretty => {
                let provider = if self.provider.is_known() {
                    self.provider.to_string().green().bold()
                } else {
                    self.provider.to_string().dimmed()
                };
                if self.input == self.ip.to_string() {
                    format!("{} {}", self.ip.to_string().cyan(), provider)
                } else {
                    format!("{} ({}) {}", self.input, self.ip.to_string().cyan(), provider)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification(input: &str, ip: &str, provider: Provider) -> Classification {
        Classification {
            input: input.to_string(),
            ip: ip.parse().unwrap(),
            provider,
        }
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("raw".parse::<OutputFormat>().unwrap(), OutputFormat::Raw);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_json() {
        let line = classification("example.com", "8.8.4.5", Provider::Gcp)
            .render(OutputFormat::Json)
            .unwrap();
        assert_eq!(line, r#"{"input":"example.com","ip":"8.8.4.5","provider":"Gcp"}"#);
    }

    #[test]
    fn test_render_raw_and_pretty() {
        colored::control::set_override(false);
        let c = classification("203.0.113.1", "203.0.113.1", Provider::Unknown);
        assert_eq!(c.render(OutputFormat::Raw).unwrap(), "Unknown");
        assert_eq!(c.render(OutputFormat::Pretty).unwrap(), "203.0.113.1 Unknown");

        let c = classification("https://example.com/x", "8.8.4.5", Provider::Gcp);
        assert_eq!(
            c.render(OutputFormat::Pretty).unwrap(),
            "https://example.com/x (8.8.4.5) Gcp"
        );
    }
}
