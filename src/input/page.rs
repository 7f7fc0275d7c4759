// src/input/page.rs
// =============================================================================
// Crawl mode input: fetch the seed page and walk its anchors.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Is built on html5ever (Mozilla's HTML parser)
//
// The parsed document is not Send, so parsing and walking happen in one
// synchronous call, never across an .await.
// =============================================================================

use super::InputError;
use reqwest::Client;
use scraper::node::Element;
use scraper::{ElementRef, Html};
use tracing::info;

// Fetches a web page and returns its HTML content
//
// Unlike a probe, a non-success status here is an error: there is nothing
// to crawl on a 404 page.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, InputError> {
    let fetch_error = |source| InputError::Fetch {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(fetch_error)?;

    if !response.status().is_success() {
        return Err(InputError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let html = response.text().await.map_err(fetch_error)?;
    info!(url, bytes = html.len(), "fetched seed page");
    Ok(html)
}

// Calls `visit` for every <a> element of the document, in document order,
// with its zero-based index among all anchors
//
// Returns how many anchors were visited.
pub fn for_each_anchor(html: &str, mut visit: impl FnMut(usize, &Element)) -> usize {
    let document = Html::parse_document(html);

    let anchors = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "a");

    let mut count = 0;
    for (index, anchor) in anchors.enumerate() {
        visit(index, anchor.value());
        count += 1;
    }
    count
}
