//! memceil CLI: run a block script under a hard memory ceiling.
//!
//! stdout carries the status lines and script output only; logs go to stderr
//! (filter with `MEMCEIL_LOG`, default `warn`).

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use memceil_core::config::{AllocatorConfig, PolicyKind};
use memceil_exec::{BlockScript, Session, SessionSummary};
use memceil_mem::{build_policy, HostAllocator};

#[derive(Parser, Debug)]
#[command(name = "memceil")]
#[command(about = "Run a line-oriented script with every allocation held under a byte ceiling", long_about = None)]
struct Cli {
    /// Script file to run; reads stdin when omitted
    script: Option<PathBuf>,

    /// Byte ceiling (overrides config and MEMCEIL_BYTE_LIMIT)
    #[arg(long)]
    limit: Option<i64>,

    /// Count allocations but never refuse them
    #[arg(long, conflicts_with = "limit")]
    unbounded: bool,

    /// Emit a tracing event for every allocator call
    #[arg(long)]
    trace: bool,

    /// JSON allocator config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a JSON session summary to stderr on exit
    #[arg(long)]
    summary: bool,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("MEMCEIL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(cli, |key| std::env::var(key).ok())?;
    tracing::debug!(?config, "allocator config");

    let policy = build_policy(&config)?;
    let mut script = BlockScript::new(HostAllocator::new(&policy));
    let session = Session::new(&policy);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary: SessionSummary = match &cli.script {
        Some(path) => {
            let input = BufReader::new(File::open(path)?);
            session.run(&mut script, input, &mut out)?
        }
        None => session.run(&mut script, io::stdin().lock(), &mut out)?,
    };

    if cli.summary {
        eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

/// Defaults < config file < environment < flags.
fn resolve_config<F>(cli: &Cli, lookup: F) -> Result<AllocatorConfig, Box<dyn std::error::Error>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &cli.config {
        Some(path) => AllocatorConfig::from_json(&fs::read_to_string(path)?)?,
        None => AllocatorConfig::default(),
    };
    config.apply_env(lookup)?;

    if let Some(limit) = cli.limit {
        config.byte_limit = limit;
        config.policy = PolicyKind::Bounded;
    }
    if cli.unbounded {
        config.policy = PolicyKind::Unbounded;
    }
    if cli.trace {
        config.trace_calls = true;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{resolve_config, Cli};
    use clap::Parser;
    use memceil_core::config::PolicyKind;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_to_bounded_30000() {
        let cli = Cli::parse_from(["memceil"]);
        let config = resolve_config(&cli, no_env).unwrap();
        assert_eq!(config.byte_limit, 30_000);
        assert_eq!(config.policy, PolicyKind::Bounded);
    }

    #[test]
    fn flag_beats_env() {
        let cli = Cli::parse_from(["memceil", "--limit", "500"]);
        let config = resolve_config(&cli, |key| {
            (key == "MEMCEIL_BYTE_LIMIT").then(|| "9000".to_string())
        })
        .unwrap();
        assert_eq!(config.byte_limit, 500);
    }

    #[test]
    fn env_applies_without_flag() {
        let cli = Cli::parse_from(["memceil", "--trace"]);
        let config = resolve_config(&cli, |key| {
            (key == "MEMCEIL_BYTE_LIMIT").then(|| "9000".to_string())
        })
        .unwrap();
        assert_eq!(config.byte_limit, 9000);
        assert!(config.trace_calls);
    }

    #[test]
    fn negative_limit_flag_is_rejected() {
        let cli = Cli::parse_from(["memceil", "--limit=-1"]);
        assert!(resolve_config(&cli, no_env).is_err());
    }

    #[test]
    fn unbounded_conflicts_with_limit() {
        assert!(Cli::try_parse_from(["memceil", "--unbounded", "--limit", "5"]).is_err());
    }
}
