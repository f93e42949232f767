//! `cloudfinder build` - Fetch every feed and compile the lookup data.

use anyhow::{Context as _, Result};
use colored::Colorize;
use std::collections::BTreeMap;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

use cloudfinder::build::{self, BuildOptions, BuildOutcome, BuildReport};
use cloudfinder::{Aggregator, Provider, Resolver, SourceContext, SourceRegistry};

use super::Context;
use crate::cli::args::BuildArgs;
use crate::output::OutputFormat;

#[derive(Tabled)]
struct ProviderRow {
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "IPv4 blocks")]
    v4: usize,
    #[tabled(rename = "IPv6 blocks")]
    v6: usize,
}

pub async fn execute(ctx: Context, args: BuildArgs) -> Result<()> {
    let registry = SourceRegistry::builtin().context("Invalid source registry")?;
    let sources = SourceContext::from_config(&ctx.fetch).context("Failed to set up HTTP client")?;
    let aggregator = Aggregator::new(registry, sources);

    let mut options = BuildOptions::new(&ctx.data_dir).force(args.force);
    if let Some(dir) = &args.write_ranges {
        options = options.ranges_dir(dir);
    }

    info!(data_dir = %ctx.data_dir.display(), force = args.force, "starting build");
    let report = build::run(&aggregator, &options)
        .await
        .context("Build failed")?;

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", report_json(&report));
        }
        OutputFormat::Raw => {
            println!("{}", report.hash);
        }
        OutputFormat::Pretty => {
            print_report_pretty(&ctx, &report)?;
        }
    }

    Ok(())
}

fn report_json(report: &BuildReport) -> serde_json::Value {
    match &report.outcome {
        BuildOutcome::Written { stats, range_files } => serde_json::json!({
            "hash": report.hash,
            "candidates": report.candidates,
            "written": true,
            "inserted": stats.inserted,
            "shadowed": stats.shadowed,
            "range_files": range_files,
        }),
        BuildOutcome::Unchanged => serde_json::json!({
            "hash": report.hash,
            "candidates": report.candidates,
            "written": false,
        }),
    }
}

fn print_report_pretty(ctx: &Context, report: &BuildReport) -> Result<()> {
    println!("{} {}", "Hash:".bold(), report.hash.dimmed());
    println!("  {} {}", "Candidates:".bold(), report.candidates);

    let (stats, range_files) = match &report.outcome {
        BuildOutcome::Unchanged => {
            println!();
            println!("{}", "Feeds unchanged, nothing rebuilt (use --force to rebuild).".yellow());
            return Ok(());
        }
        BuildOutcome::Written { stats, range_files } => (stats, *range_files),
    };

    println!("  {} {}", "Inserted:".bold(), stats.inserted);
    println!("  {} {}", "Shadowed:".bold(), stats.shadowed);
    if range_files > 0 {
        println!("  {} {}", "Range files:".bold(), range_files);
    }

    let resolver = Resolver::load(&ctx.data_dir)
        .with_context(|| format!("Failed to reload {}", ctx.data_dir.display()))?;

    let mut counts: BTreeMap<Provider, (usize, usize)> = BTreeMap::new();
    for (provider, n) in resolver.v4().provider_counts() {
        counts.entry(provider).or_default().0 = n;
    }
    for (provider, n) in resolver.v6().provider_counts() {
        counts.entry(provider).or_default().1 = n;
    }

    let rows: Vec<ProviderRow> = counts
        .into_iter()
        .map(|(provider, (v4, v6))| ProviderRow {
            provider: provider.to_string(),
            v4,
            v6,
        })
        .collect();

    println!();
    println!("{}", Table::new(&rows).with(Style::rounded()));
    println!();
    println!(
        "{} {}",
        "Wrote lookup data to".green().bold(),
        ctx.data_dir.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudfinder::InsertStats;

    #[test]
    fn test_report_json() {
        let report = BuildReport {
            hash: "abc".into(),
            candidates: 3,
            outcome: BuildOutcome::Written {
                stats: InsertStats {
                    inserted: 2,
                    shadowed: 1,
                },
                range_files: 0,
            },
        };
        let json = report_json(&report);
        assert_eq!(json["written"], true);
        assert_eq!(json["shadowed"], 1);

        let unchanged = BuildReport {
            outcome: BuildOutcome::Unchanged,
            ..report
        };
        assert_eq!(report_json(&unchanged)["written"], false);
    }
}
