//! `cloudfinder config` - CLI configuration management.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::config::Config;
use crate::output::OutputFormat;

pub async fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(&ctx),
        ConfigCommands::Set { key, value } => set_config(&ctx, &key, &value),
        ConfigCommands::Path => {
            println!("{}", ctx.config_path.display());
            Ok(())
        }
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = Config::load_from(&ctx.config_path)?;

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Raw => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        OutputFormat::Pretty => {
            let unset = || "(not set)".dimmed().to_string();
            println!("{}", "Current Configuration:".bold());
            println!();
            println!(
                "  {} {}",
                "data_dir:".bold(),
                config.data_dir.as_ref().map_or_else(unset, |d| d.display().to_string())
            );
            println!(
                "  {} {}",
                "output_format:".bold(),
                config.output_format.unwrap_or_default()
            );
            println!(
                "  {} {}",
                "log_level:".bold(),
                config.log_level.clone().unwrap_or_else(unset)
            );
            println!(
                "  {} {}",
                "timeout_secs:".bold(),
                config.timeout_secs.map_or_else(unset, |t| t.to_string())
            );
            println!(
                "  {} {}",
                "user_agent:".bold(),
                config.user_agent.clone().unwrap_or_else(unset)
            );
            println!(
                "  {} {}",
                "asn_table_url:".bold(),
                config.asn_table_url.clone().unwrap_or_else(unset)
            );
        }
    }

    Ok(())
}

fn set_config(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_from(&ctx.config_path)?;
    config.set(key, value)?;
    config.save_to(&ctx.config_path)?;

    println!("{} {} set to {}.", "Success:".green().bold(), key, value.cyan());
    Ok(())
}
