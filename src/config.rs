// src/config.rs
// =============================================================================
// Validated runtime configuration.
//
// The CLI (src/cli.rs) hands us raw values exactly as the user typed them.
// This module checks them once, up front, and turns them into types that
// cannot hold a bad value (NonZeroUsize, Duration). Everything after this
// point can trust its configuration.
//
// Invalid configuration is fatal: main.rs prints the error and exits with
// code 2 before a single request is sent.
// =============================================================================

use std::num::NonZeroUsize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default number of probe workers
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default per-request timeout, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// Everything that can be wrong with the user's configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no input source provided")]
    MissingSource,

    #[error("invalid seed URL '{url}': {reason}")]
    InvalidSeedUrl { url: String, reason: String },

    #[error("concurrency must be a positive integer, got {0}")]
    NonPositiveConcurrency(i64),

    #[error("timeout must be a positive number of seconds, got {0}")]
    NonPositiveTimeout(i64),
}

/// How candidate URLs are scheduled onto probe tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// A fixed number of long-lived workers pulling from a shared queue
    Pool { workers: NonZeroUsize },
    /// One task per URL, no admission limit
    FanOut,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Pool {
            workers: NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// When a HEAD answer is not trusted and GET is tried as well
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FallbackPolicy {
    /// Fall back to GET whenever HEAD does not answer 200
    #[default]
    NonOk,
    /// Fall back to GET only when HEAD got no response at all
    TransportOnly,
}

/// Settings shared by every probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub timeout: Duration,
    pub keep_alive: bool,
    pub fallback: FallbackPolicy,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            keep_alive: false,
            fallback: FallbackPolicy::default(),
        }
    }
}

// Checks a concurrency value typed by the user
//
// We accept a signed number on purpose: "-c -3" should produce our message,
// not a generic parse error.
pub fn validate_concurrency(raw: i64) -> Result<NonZeroUsize, ConfigError> {
    usize::try_from(raw)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or(ConfigError::NonPositiveConcurrency(raw))
}

pub fn validate_timeout(raw: i64) -> Result<Duration, ConfigError> {
    match u64::try_from(raw) {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::NonPositiveTimeout(raw)),
    }
}

// Checks a file path argument (only that it is not blank; opening it is
// the input module's job)
pub fn validate_path(raw: &str) -> Result<&str, ConfigError> {
    if raw.trim().is_empty() {
        Err(ConfigError::MissingSource)
    } else {
        Ok(raw)
    }
}

// Parses the crawl seed. It must be an absolute http(s) URL with a host,
// because relative links are resolved against it.
pub fn validate_seed(raw: &str) -> Result<Url, ConfigError> {
    if raw.trim().is_empty() {
        return Err(ConfigError::MissingSource);
    }

    let invalid = |reason: &str| ConfigError::InvalidSeedUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid("only http and https are supported"));
    }
    if url.host_str().is_none() {
        return Err(invalid("URL has no host"));
    }

    Ok(url)
}
