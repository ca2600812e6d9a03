use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fheco_bench::config::Config;
use fheco_bench::discover;
use fheco_bench::pipeline;
use fheco_bench::report;
use fheco_bench::runner::SystemExecutor;

#[derive(Parser)]
#[command(
    name = "fheco-bench",
    version,
    about = "Run benchmarks before and after swapping in vectorized sources, and tabulate the results"
)]
struct Cli {
    /// TOML config file (default: ./fheco-bench.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    benchmarks_dir: Option<PathBuf>,

    #[arg(long)]
    build_output_dir: Option<PathBuf>,

    #[arg(long)]
    source_dir: Option<PathBuf>,

    #[arg(long)]
    build_dir: Option<PathBuf>,

    /// CMake generator passed as -G
    #[arg(long, conflicts_with = "no_generator")]
    generator: Option<String>,

    /// Let CMake choose its default generator
    #[arg(long)]
    no_generator: bool,

    #[arg(long)]
    results: Option<PathBuf>,

    #[arg(long)]
    vectorization: Option<PathBuf>,

    /// Kill any build step or benchmark run after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Only run this benchmark (repeatable)
    #[arg(long, value_name = "NAME")]
    only: Vec<String>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(p) = self.benchmarks_dir {
            config.benchmarks_dir = p;
        }
        if let Some(p) = self.build_output_dir {
            config.build_output_dir = p;
        }
        if let Some(p) = self.source_dir {
            config.source_dir = p;
        }
        if let Some(p) = self.build_dir {
            config.build_dir = p;
        }
        if self.no_generator {
            config.generator = None;
        } else if let Some(g) = self.generator {
            config.generator = Some(g);
        }
        if let Some(p) = self.results {
            config.results_csv = p;
        }
        if let Some(p) = self.vectorization {
            config.vectorization_csv = p;
        }
        if self.timeout.is_some() {
            config.timeout_secs = self.timeout;
        }
        if !self.only.is_empty() {
            config.only = self.only;
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let cwd = std::env::current_dir().context("reading current directory")?;
    let mut config = Config::load(cli.config.as_deref(), &cwd)?;
    let json = cli.json;
    cli.apply(&mut config);
    tracing::debug!("configuration: {:?}", config);

    let benchmarks = discover::discover_benchmarks(&config)?;
    let mut exec = SystemExecutor {
        timeout: config.timeout(),
    };
    let report = pipeline::run_pipeline(&config, &benchmarks, &mut exec)?;

    let output = if json {
        report::format_json(&report)
    } else {
        report::format_text(&report)
    };
    print!("{}", output);
    if json {
        println!();
    }

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", err);
        process::exit(1);
    }
}
