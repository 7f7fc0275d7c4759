// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Validate them (bad configuration stops us before any request is sent)
// 3. Read the input, check every link, print the results
// 4. Exit with proper code:
//      0 = no dead links, 1 = dead links found, 2 = error, 130 = Ctrl-C
// =============================================================================

mod checker;       // src/checker/ - extraction, probing, dispatch, results
mod cli;           // src/cli.rs - command-line parsing
mod config;        // src/config.rs - validated settings
mod input;         // src/input/ - reading files and fetching pages
mod report;        // src/report.rs - printing results
mod scan;          // src/scan.rs - the extract -> probe -> collect pipeline

use anyhow::{anyhow, Context, Result};
use checker::{build_client, AnchorExtractor, BaseHost, HttpProber, LineExtractor, ResultTable};
use clap::Parser;
use cli::{CheckArgs, Cli, Commands};
use report::Filter;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Ctrl-C ends the run right away; in-flight probes die with the runtime
    let exit_code = tokio::select! {
        result = run(cli) => match result {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                2
            }
        },
        Ok(()) = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted");
            130
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr. RUST_LOG wins over -v when it is set.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,link_reaper={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::File { path, all, check } => handle_file_scan(&path, all, &check).await,
        Commands::Crawl { seed_url, check } => handle_crawl_scan(&seed_url, &check).await,
    }
}

// Handles the 'file' subcommand
async fn handle_file_scan(path: &str, all: bool, check: &CheckArgs) -> Result<i32> {
    let settings = check.settings()?;
    let path = config::validate_path(path)?;

    let lines = input::read_lines(path).await?;
    eprintln!("🔍 Scanning {} ({} lines)", path, lines.len());

    let extractor = LineExtractor::new().context("failed to compile the URL pattern")?;
    let client = build_client(&settings.probe).context("failed to create HTTP client")?;
    let prober = Arc::new(HttpProber::new(client, settings.probe.fallback));

    let table = scan::scan_lines(&lines, &extractor, settings.strategy, prober).await?;

    let filter = if all { Filter::All } else { Filter::DeadOnly };
    report::print_file_report(&table, filter, check.json)?;

    Ok(exit_code(&table))
}

// Handles the 'crawl' subcommand
async fn handle_crawl_scan(seed_url: &str, check: &CheckArgs) -> Result<i32> {
    let settings = check.settings()?;
    let seed = config::validate_seed(seed_url)?;
    let base = BaseHost::from_url(&seed).ok_or_else(|| anyhow!("URL has no host: {}", seed))?;

    let client = build_client(&settings.probe).context("failed to create HTTP client")?;

    eprintln!("🔍 Crawling {}", seed);
    let html = input::fetch_page(&client, seed.as_str()).await?;

    let extractor = AnchorExtractor::new(base);
    let prober = Arc::new(HttpProber::new(client, settings.probe.fallback));

    let table = scan::scan_page(&html, &extractor, settings.strategy, prober).await?;
    report::print_crawl_report(&table, check.json)?;

    Ok(exit_code(&table))
}

fn exit_code(table: &ResultTable) -> i32 {
    if table.dead_count() > 0 {
        1
    } else {
        0
    }
}
