// src/checker/html.rs
// =============================================================================
// This module extracts external links from an HTML document.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Is built on html5ever (Mozilla's HTML parser)
// - Recovers from broken markup the way a browser does, so parsing
//   never fails; bad HTML just yields fewer links
//
// Links are returned exactly as authored: no resolving, no normalizing.
// Repeated links are kept, one entry per anchor.
//
// Rust concepts:
// - Iterators: For walking the document tree
// - Result<T, E>: For the one thing that can fail (reading the file)
// =============================================================================

use scraper::Html;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Errors that can happen while getting links out of a file
//
// The parser itself never fails, so the only failure is not being able
// to read the bytes in the first place.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// Reads an HTML file and extracts its external links
//
// Parameters:
//   path: the HTML file on disk
//
// Returns: the links in document order, or ExtractError::Read
pub async fn extract_links_from_file(path: &Path) -> Result<Vec<String>, ExtractError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(extract_links(&bytes))
}

// Extracts all http:// and https:// links from raw HTML bytes
//
// Walks the tree depth-first in pre-order (the order the tags appear in
// the source), so the Nth link returned belongs to the Nth qualifying <a>.
//
// Example:
//   html = "<a href='https://a.com'>A</a><a href='mailto:x@y.z'>B</a>"
//   result = ["https://a.com"]
pub fn extract_links(html: &[u8]) -> Vec<String> {
    // Invalid UTF-8 is replaced rather than rejected, same leniency as the parser
    let text = String::from_utf8_lossy(html);
    let document = Html::parse_document(&text);

    if !document.errors.is_empty() {
        tracing::debug!(
            recoveries = document.errors.len(),
            "HTML parser recovered from malformed markup"
        );
    }

    let mut links = Vec::new();

    // descendants() is a pre-order walk starting at the document root
    for node in document.tree.root().descendants() {
        let Some(element) = node.value().as_element() else {
            continue;
        };

        if element.name() != "a" {
            continue;
        }

        // Only the first href on an anchor counts
        let href = element
            .attrs()
            .find(|(name, _)| *name == "href")
            .map(|(_, value)| value);

        if let Some(href) = href {
            if is_checkable_link(href) {
                links.push(href.to_string());
            }
        }
    }

    links
}

// Checks if a link should be probed
//
// Plain prefix match. We skip:
// - mailto:, tel:, javascript:, data: links
// - fragments (#section) and relative paths (/docs, ../about)
fn is_checkable_link(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://")
}
