// src/checker/mod.rs
// =============================================================================
// This module contains the two halves of a link audit.
//
// Submodules:
// - html: Extracts external links from an HTML document
// - http: Makes HTTP requests to find out the status of each link
//
// This file (mod.rs) is the module root - it re-exports the public API so
// callers can write `checker::check_links()` instead of
// `checker::http::check_links()`.
// =============================================================================

mod html;
mod http;

pub use html::extract_links_from_file;
pub use http::{check_links, CheckOptions, FailureKind, HttpProbe, LinkStatus, Probe};
