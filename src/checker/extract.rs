// src/checker/extract.rs
// =============================================================================
// This module turns raw input into candidate URLs.
//
// There are two extractors, one per input mode:
// - LineExtractor: finds every http(s) URL in a line of plain text (regex)
// - AnchorExtractor: reads the href of an HTML <a> element and resolves
//   relative links against the host of the crawled page
//
// Both implement the Extractor trait, so the scan pipeline can drive either
// one the same way.
//
// Extraction is best-effort. A line without URLs or an anchor without href is
// a "miss" (ExtractMiss), not an error, and a URL that does not parse is
// dropped quietly. Nothing that fails here is ever reported as a dead link.
// =============================================================================

use regex::Regex;
use scraper::node::Element;
use std::fmt;
use thiserror::Error;
use tracing::debug;
use url::{ParseError, Url};

// Word boundary, scheme, then everything up to the next whitespace.
// The boundary is ASCII-only, so "éhttp://x" still yields a match.
const URL_PATTERN: &str = r"(?-u:\b)https?://\S+";

/// A URL found in the input, tagged with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateUrl {
    /// Line index (file mode) or anchor index (crawl mode), zero-based
    pub origin_key: usize,
    /// Left-to-right index of this URL within its origin
    pub position: usize,
    /// The resolved, absolute URL text
    pub url: String,
}

/// Why an origin produced no candidates
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ExtractMiss {
    #[error("no URL matches")]
    NoMatches,
    #[error("anchor has no href attribute")]
    MissingHref,
    #[error("anchor has an empty href attribute")]
    EmptyHref,
}

// Common contract of both extractors
//
// Ok(urls) may still be empty when every match was malformed and dropped.
pub trait Extractor {
    type Input: ?Sized;

    fn extract(
        &self,
        origin_key: usize,
        input: &Self::Input,
    ) -> Result<Vec<CandidateUrl>, ExtractMiss>;
}

// -----------------------------------------------------------------------------
// Plain text lines
// -----------------------------------------------------------------------------

/// Regex-based extractor for lines of text. Build it once and share it.
#[derive(Debug, Clone)]
pub struct LineExtractor {
    pattern: Regex,
}

impl LineExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(URL_PATTERN)?,
        })
    }
}

impl Extractor for LineExtractor {
    type Input = str;

    fn extract(&self, origin_key: usize, line: &str) -> Result<Vec<CandidateUrl>, ExtractMiss> {
        let matches: Vec<&str> = self.pattern.find_iter(line).map(|m| m.as_str()).collect();

        if matches.is_empty() {
            return Err(ExtractMiss::NoMatches);
        }

        let urls = matches
            .into_iter()
            .filter(|raw| is_absolute_http(raw))
            .enumerate()
            .map(|(position, raw)| CandidateUrl {
                origin_key,
                position,
                url: raw.to_string(),
            })
            .collect();

        Ok(urls)
    }
}

// -----------------------------------------------------------------------------
// HTML anchors
// -----------------------------------------------------------------------------

/// Scheme and host of the crawled page, used to resolve relative hrefs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseHost {
    pub scheme: String,
    /// Host name, with ":port" appended when the seed URL had an explicit port
    pub host: String,
}

impl BaseHost {
    // Returns None for URLs without a host (e.g. "data:...")
    pub fn from_url(url: &Url) -> Option<Self> {
        let host = url.host_str()?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Some(Self {
            scheme: url.scheme().to_string(),
            host,
        })
    }
}

impl fmt::Display for BaseHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)
    }
}

/// Extractor for <a> elements of a crawled page
#[derive(Debug, Clone)]
pub struct AnchorExtractor {
    base: BaseHost,
}

impl AnchorExtractor {
    pub fn new(base: BaseHost) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &BaseHost {
        &self.base
    }
}

impl Extractor for AnchorExtractor {
    type Input = Element;

    fn extract(&self, origin_key: usize, anchor: &Element) -> Result<Vec<CandidateUrl>, ExtractMiss> {
        let href = anchor.attr("href").ok_or(ExtractMiss::MissingHref)?.trim();

        if href.is_empty() {
            return Err(ExtractMiss::EmptyHref);
        }

        Ok(resolve_href(&self.base, href)
            .map(|url| CandidateUrl {
                origin_key,
                position: 0,
                url,
            })
            .into_iter()
            .collect())
    }
}

// Resolves an href against the page's base host
//
// - absolute http(s) href: returned unchanged
// - no scheme and no host ("/docs", "page#top"): base + href, concatenated
//   as-is, so "../x" is NOT normalized
// - no scheme but a host ("//cdn.example.com/x"): takes the base scheme
// - anything else (mailto:, javascript:, garbage): None
pub fn resolve_href(base: &BaseHost, href: &str) -> Option<String> {
    let resolved = match Url::parse(href) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => href.to_string(),
        Ok(url) => {
            debug!(href, scheme = url.scheme(), "skipping non-http link");
            return None;
        }
        Err(ParseError::RelativeUrlWithoutBase) if href.starts_with("//") => {
            format!("{}:{}", base.scheme, href)
        }
        Err(ParseError::RelativeUrlWithoutBase) => format!("{}{}", base, href),
        Err(e) => {
            debug!(href, error = %e, "dropping malformed link");
            return None;
        }
    };

    is_absolute_http(&resolved).then_some(resolved)
}

fn is_absolute_http(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => url.host_str().is_some(),
        Err(e) => {
            debug!(url = raw, error = %e, "dropping unparseable URL");
            false
        }
    }
}
