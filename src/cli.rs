// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Numbers are parsed as signed integers on purpose: clap only checks that
// they are numbers, and src/config.rs rejects zero or negative values with a
// message that says what is wrong.
// =============================================================================

use crate::config::{self, ConfigError, FallbackPolicy, ProbeConfig, Strategy};
use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "link-reaper",
    version,
    about = "Finds dead links in text files and web pages",
    long_about = "link-reaper pulls every http(s) URL out of a text file, or every link out of a \
                  web page, and checks them concurrently. A link is alive when it answers \
                  HTTP 200 to a HEAD request, or to a GET request when HEAD is refused."
)]
pub struct Cli {
    /// More log output on stderr (-v: info, -vv: debug). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check every URL found in a text file, line by line
    ///
    /// Example: link-reaper file NOTES.md --concurrency 20
    File {
        /// Path of the file to scan
        path: String,

        /// Print live links too, not only dead ones
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        check: CheckArgs,
    },

    /// Fetch a web page and check every link on it
    ///
    /// Example: link-reaper crawl https://example.com
    Crawl {
        /// Page to fetch; relative links are resolved against its host
        seed_url: String,

        #[command(flatten)]
        check: CheckArgs,
    },
}

/// Options shared by both subcommands
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Number of concurrent probe workers
    #[arg(
        short,
        long,
        default_value_t = config::DEFAULT_CONCURRENCY as i64,
        allow_negative_numbers = true
    )]
    pub concurrency: i64,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS as i64, allow_negative_numbers = true)]
    pub timeout: i64,

    /// Start one task per URL instead of a worker pool (no concurrency limit)
    #[arg(long)]
    pub fan_out: bool,

    /// Keep idle connections open for reuse
    #[arg(long)]
    pub keep_alive: bool,

    /// When to retry a HEAD request with GET
    #[arg(long, value_enum, default_value_t = FallbackPolicy::NonOk)]
    pub head_fallback: FallbackPolicy,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Validated settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub strategy: Strategy,
    pub probe: ProbeConfig,
}

impl CheckArgs {
    // Validates the raw flags. The concurrency value is checked even with
    // --fan-out, so a typo never goes unnoticed.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let workers = config::validate_concurrency(self.concurrency)?;
        let timeout = config::validate_timeout(self.timeout)?;

        let strategy = if self.fan_out {
            Strategy::FanOut
        } else {
            Strategy::Pool { workers }
        };

        Ok(Settings {
            strategy,
            probe: ProbeConfig {
                timeout,
                keep_alive: self.keep_alive,
                fallback: self.head_fallback,
            },
        })
    }
}
