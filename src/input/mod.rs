// src/input/mod.rs
// =============================================================================
// Where candidate URLs come from.
//
// - file: reads a text file as (line_index, text) pairs
// - page: fetches the seed page of a crawl and walks its <a> elements
//
// These are thin I/O wrappers; all the URL logic lives in checker::extract.
// =============================================================================

mod file;
mod page;

use thiserror::Error;

pub use file::read_lines;
pub use page::{fetch_page, for_each_anchor};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not fetch '{url}': {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("'{url}' answered HTTP {status}")]
    Status { url: String, status: u16 },
}
