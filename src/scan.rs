// src/scan.rs
// =============================================================================
// The scan pipeline: input -> extractor -> dispatcher -> result table.
//
// One function per input mode:
// - scan_lines: plain text, one origin per line
// - scan_page: an HTML page, one origin per <a> element
//
// Origins that produce nothing (no URL on the line, anchor without href) are
// skipped here and never reach the table, so they are never printed.
// =============================================================================

use crate::checker::{
    dispatch, AnchorExtractor, CandidateUrl, DispatchError, Extractor, LineExtractor, Prober,
    ResultTable,
};
use crate::config::Strategy;
use crate::input::for_each_anchor;
use std::sync::Arc;
use tracing::{info, trace};

// Checks every URL found in the given lines
pub async fn scan_lines<P: Prober>(
    lines: &[(usize, String)],
    extractor: &LineExtractor,
    strategy: Strategy,
    prober: Arc<P>,
) -> Result<Arc<ResultTable>, DispatchError> {
    let mut candidates = Vec::new();
    for (index, line) in lines {
        gather(extractor, *index, line.as_str(), &mut candidates);
    }

    info!(lines = lines.len(), urls = candidates.len(), "extracted URLs from file");
    run(candidates, strategy, prober).await
}

// Checks every link of an already fetched HTML page
pub async fn scan_page<P: Prober>(
    html: &str,
    extractor: &AnchorExtractor,
    strategy: Strategy,
    prober: Arc<P>,
) -> Result<Arc<ResultTable>, DispatchError> {
    let mut candidates = Vec::new();
    let anchors = for_each_anchor(html, |index, anchor| {
        gather(extractor, index, anchor, &mut candidates);
    });

    info!(base = %extractor.base(), anchors, urls = candidates.len(), "extracted links from page");
    run(candidates, strategy, prober).await
}

fn gather<E: Extractor>(
    extractor: &E,
    origin_key: usize,
    input: &E::Input,
    out: &mut Vec<CandidateUrl>,
) {
    match extractor.extract(origin_key, input) {
        Ok(urls) => out.extend(urls),
        Err(miss) => trace!(origin_key, %miss, "skipping origin"),
    }
}

async fn run<P: Prober>(
    candidates: Vec<CandidateUrl>,
    strategy: Strategy,
    prober: Arc<P>,
) -> Result<Arc<ResultTable>, DispatchError> {
    let table = Arc::new(ResultTable::new());
    dispatch(candidates, strategy, prober, Arc::clone(&table)).await?;
    info!(verdicts = table.len(), origins = table.origin_keys().len(), "scan finished");
    Ok(table)
}
