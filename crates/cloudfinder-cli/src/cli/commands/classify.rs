//! `cloudfinder classify` - Map addresses, hostnames or URLs to providers.

use anyhow::{Context as _, Result};
use std::net::IpAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use url::{Host, Url};

use cloudfinder::Resolver;

use super::Context;
use crate::cli::args::ClassifyArgs;
use crate::output::Classification;

/// What an input names once the URL decoration is stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A literal address
    Ip(IpAddr),
    /// A name to resolve
    Host(String),
}

pub async fn execute(ctx: Context, args: ClassifyArgs) -> Result<()> {
    let resolver = Resolver::load(&ctx.data_dir).with_context(|| {
        format!(
            "Failed to load lookup data from {} (run `cloudfinder build` first)",
            ctx.data_dir.display()
        )
    })?;

    let inputs = if args.inputs.is_empty() {
        read_stdin().await?
    } else {
        args.inputs
    };

    let mut failed = 0usize;
    for input in inputs.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        match resolve(input).await {
            Ok(addrs) => {
                for ip in addrs {
                    let result = Classification {
                        input: input.to_string(),
                        ip,
                        provider: resolver.classify(ip),
                    };
                    println!("{}", result.render(ctx.output_format)?);
                }
            }
            Err(e) => {
                warn!(input, error = %e, "could not resolve input");
                eprintln!("{input}: {e:#}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} input(s) could not be resolved");
    }
    Ok(())
}

async fn read_stdin() -> Result<Vec<String>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut inputs = Vec::new();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        inputs.push(line);
    }
    Ok(inputs)
}

/// Extract the address or host an input refers to.
///
/// Accepts bare addresses, `host[:port][/path]` and full URLs.
pub fn parse_target(input: &str) -> Result<Target> {
    if let Ok(ip) = input.parse::<IpAddr>() {
        return Ok(Target::Ip(ip));
    }

    let url = if input.contains("://") {
        Url::parse(input)
    } else {
        Url::parse(&format!("http://{input}"))
    }
    .with_context(|| format!("Not an IP address, hostname or URL: {input}"))?;

    match url.host() {
        Some(Host::Ipv4(ip)) => Ok(Target::Ip(IpAddr::V4(ip))),
        Some(Host::Ipv6(ip)) => Ok(Target::Ip(IpAddr::V6(ip))),
        Some(Host::Domain(name)) => Ok(Target::Host(name.to_string())),
        None => anyhow::bail!("No host in {input}"),
    }
}

/// Every address an input stands for; hostnames go through DNS.
async fn resolve(input: &str) -> Result<Vec<IpAddr>> {
    match parse_target(input)? {
        Target::Ip(ip) => Ok(vec![ip]),
        Target::Host(name) => {
            let mut addrs: Vec<IpAddr> = tokio::net::lookup_host((name.as_str(), 0))
                .await
                .with_context(|| format!("DNS lookup failed for {name}"))?
                .map(|addr| addr.ip())
                .collect();
            addrs.sort();
            addrs.dedup();
            debug!(host = %name, addresses = addrs.len(), "resolved");
            if addrs.is_empty() {
                anyhow::bail!("{name} has no addresses");
            }
            Ok(addrs)
        }
    }
}
