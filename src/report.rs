// src/report.rs
// =============================================================================
// This module turns check results into the JSON report file.
//
// The file is a JSON array of {"url": ..., "status": ...} objects,
// pretty-printed with two-space indentation and no trailing newline.
// Field order is fixed by the struct: url, then status.
//
// With detailed errors turned on, failed checks also get an "error" field
// naming why they failed ("timeout", "dns", ...). Without it the output is
// byte-for-byte the classic two-field format.
//
// One difference from older reports: a page with no external links writes
// an empty array `[]`, where they wrote `null`.
// =============================================================================

use crate::checker::{FailureKind, LinkStatus};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("could not serialize report")]
    Serialize(#[from] serde_json::Error),

    #[error("could not write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// One line of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkStatusRecord {
    pub url: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureKind>,
}

impl LinkStatusRecord {
    pub fn new(url: String, status: &LinkStatus, detailed_errors: bool) -> Self {
        Self {
            url,
            status: status.status_line(),
            error: if detailed_errors { status.failure() } else { None },
        }
    }
}

// Builds report records from (url, status) pairs, keeping their order
pub fn build_report(results: Vec<(String, LinkStatus)>, detailed_errors: bool) -> Vec<LinkStatusRecord> {
    results
        .into_iter()
        .map(|(url, status)| LinkStatusRecord::new(url, &status, detailed_errors))
        .collect()
}

// Writes the report to `path`, replacing any existing file
pub async fn save_report(report: &[LinkStatusRecord], path: &Path) -> Result<(), ReportError> {
    let data = serde_json::to_vec_pretty(report)?;

    tokio::fs::write(path, data).await.map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), records = report.len(), "report written");
    Ok(())
}
