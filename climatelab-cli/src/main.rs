//! ClimateLab CLI: run the pipeline and inspect the download cache.
//!
//! Commands:
//! - `run`: fetch, parse, merge, analyze and write artifacts for one run
//! - `cache status`: report which sources have a cached raw document

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use climatelab_core::data::{Fetcher, FileFetcher, HttpFetcher, RawCache};
use climatelab_core::domain::{Indicator, MergePolicy};
use climatelab_runner::{Pipeline, PipelineConfig, RunSummary};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "climatelab",
    version,
    about = "ClimateLab CLI: temperature, CO2 and sea level in one table"
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write artifacts.
    Run {
        /// Path to a TOML config file. Built-in defaults when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Merge policy override: strict, inclusive or forward-fill.
        #[arg(long, value_parser = parse_policy)]
        policy: Option<MergePolicy>,

        /// Offline mode: every source must come from the cache.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Re-download even if cached.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Read raw documents from this directory instead of the network.
        #[arg(long, conflicts_with_all = ["offline", "force"])]
        from_dir: Option<PathBuf>,

        /// Output directory override.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Cache directory override.
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report which sources are cached, with size and fetch time.
    Status {
        /// Cache directory. Defaults to ./data/raw.
        #[arg(long, default_value = "data/raw")]
        cache_dir: PathBuf,
    },
}

fn parse_policy(s: &str) -> Result<MergePolicy, String> {
    s.parse()
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match cli.command {
        Commands::Run {
            config,
            policy,
            offline,
            force,
            from_dir,
            output_dir,
            cache_dir,
        } => run_pipeline(RunArgs {
            config,
            policy,
            offline,
            force,
            from_dir,
            output_dir,
            cache_dir,
        }),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => run_cache_status(&cache_dir),
        },
    }
}

struct RunArgs {
    config: Option<PathBuf>,
    policy: Option<MergePolicy>,
    offline: bool,
    force: bool,
    from_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
}

fn run_pipeline(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    // CLI flags win over the file.
    if let Some(policy) = args.policy {
        config.merge.policy = policy;
    }
    if let Some(dir) = args.output_dir {
        config.output.dir = dir;
    }
    if let Some(dir) = args.cache_dir {
        config.output.cache_dir = dir;
    }
    config.validate().context("invalid configuration")?;

    let pipeline = match &args.from_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "reading raw documents from directory");
            Pipeline::new(config, Box::new(FileFetcher::new(dir)))
        }
        None => {
            let fetcher: Box<dyn Fetcher> = Box::new(
                HttpFetcher::new(config.fetch.clone()).context("building HTTP client")?,
            );
            let cache = RawCache::new(&config.output.cache_dir);
            Pipeline::new(config, fetcher)
                .with_cache(cache)
                .offline(args.offline)
                .force(args.force)
        }
    };

    let summary = pipeline.run()?;
    print_summary(&summary);
    Ok(())
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = RawCache::new(cache_dir);
    let status = cache.status(&Indicator::ALL);
    let cached = status.iter().filter(|s| s.cached).count();

    println!("Cache: {}", cache_dir.display());
    println!("Sources cached: {cached}/{}", status.len());
    println!();
    println!(
        "{:<20} {:<26} {:>10} {:<20} {:<12}",
        "Indicator", "File", "Size", "Fetched", "Hash"
    );
    println!("{}", "-".repeat(92));
    for s in &status {
        match &s.meta {
            Some(meta) => println!(
                "{:<20} {:<26} {:>10} {:<20} {:<12}",
                s.indicator,
                meta.file_name,
                format_size(meta.bytes as u64),
                meta.fetched_at.format("%Y-%m-%d %H:%M:%S"),
                &meta.data_hash[..meta.data_hash.len().min(12)]
            ),
            None => println!("{:<20} (not cached)", s.indicator),
        }
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn print_summary(summary: &RunSummary) {
    let run = &summary.output;
    let table = &run.table;

    println!();
    println!("=== ClimateLab Run ===");
    println!("Run ID:         {}", run.run_id);
    println!("Policy:         {}", table.policy());
    println!("Granularity:    {}", table.granularity());
    println!("Rows:           {}", table.len());
    if let (Some(first), Some(last)) = (table.rows().first(), table.rows().last()) {
        println!("Span:           {} to {}", first.period, last.period);
    }
    println!();
    println!("--- Correlations ---");
    for (a, b) in Indicator::PAIRS {
        println!(
            "{:<36} r = {:+.3} (n = {})",
            format!("{a} / {b}"),
            run.analysis.correlations.get(a, b),
            run.analysis.correlations.observations(a, b)
        );
    }
    println!();
    println!("--- Trends (per period) ---");
    for indicator in Indicator::ALL {
        if let Some(a) = run.analysis.indicator(indicator) {
            println!(
                "{:<36} {:+.4} over {} points",
                indicator.label(),
                a.trend.slope,
                a.trend.points
            );
        }
    }
    println!();
    for path in &summary.artifacts {
        println!("Wrote: {}", path.display());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn policy_flag_accepts_aliases() {
        let cli = Cli::parse_from(["climatelab", "run", "--policy", "ffill"]);
        match cli.command {
            Commands::Run { policy, .. } => assert_eq!(policy, Some(MergePolicy::ForwardFill)),
            _ => panic!("expected run"),
        }
        assert!(Cli::try_parse_from(["climatelab", "run", "--policy", "loose"]).is_err());
    }

    #[test]
    fn from_dir_conflicts_with_offline() {
        assert!(
            Cli::try_parse_from(["climatelab", "run", "--from-dir", "raw", "--offline"]).is_err()
        );
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
