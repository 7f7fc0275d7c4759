// src/checker/mod.rs
// =============================================================================
// This module contains the link checking engine.
//
// Submodules, leaves first:
// - extract: Finds candidate URLs in text lines and HTML anchors
// - probe: Decides if one URL is alive (HEAD, then GET)
// - results: Thread-safe table of verdicts, keyed by origin
// - dispatch: Runs the probes concurrently and waits for all of them
//
// This file (mod.rs) is the module root - it re-exports the public API so
// the rest of the application can write `checker::dispatch(...)`.
// =============================================================================

mod dispatch;
mod extract;
mod probe;
mod results;

pub use dispatch::{dispatch, DispatchError};
pub use extract::{AnchorExtractor, BaseHost, CandidateUrl, Extractor, LineExtractor};
pub use probe::{build_client, HttpProber, Prober};
pub use results::{ResultTable, Verdict};
