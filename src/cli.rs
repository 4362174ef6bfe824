// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use clap's "derive" API: the CLI is a plain struct and the
// #[arg(...)] attributes describe each flag.
//
// The tool also accepts single-dash long flags (-file, -output,
// -verbose, -file=page.html) so existing scripts keep working. Those are
// rewritten to --file etc. before clap sees them.
// =============================================================================

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "link-report",
    version,
    about = "Check the external links of an HTML file and write a JSON status report",
    long_about = "link-report extracts every http:// and https:// link from the anchors of an \
                  HTML file, probes each one with a HEAD request, and writes a JSON report of \
                  url/status pairs in document order."
)]
pub struct Cli {
    /// Path to the input HTML file
    #[arg(long, value_name = "PATH")]
    pub file: PathBuf,

    /// Path to the output JSON file
    #[arg(long, value_name = "PATH", default_value = "report.json")]
    pub output: PathBuf,

    /// Print each link as it is found and as it is checked
    #[arg(long)]
    pub verbose: bool,

    /// Maximum number of links checked at the same time (1 = one by one)
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Stop checking after this many seconds and write what was checked so far
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub deadline: Option<u64>,

    /// Add an "error" field naming the failure kind to failed checks
    #[arg(long)]
    pub detailed_errors: bool,
}

// Single-dash spellings we translate to clap's double-dash form
const LEGACY_FLAGS: &[&str] = &["file", "output", "verbose"];

// Rewrites "-file x" / "-file=x" style arguments to "--file x" / "--file=x"
//
// Everything after a bare "--" is passed through untouched, and so are
// arguments that aren't valid UTF-8.
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut rest_is_positional = false;

    args.into_iter()
        .map(|arg| {
            let arg: OsString = arg.into();
            if rest_is_positional {
                return arg;
            }

            let Some(text) = arg.to_str() else {
                return arg;
            };

            if text == "--" {
                rest_is_positional = true;
                return arg;
            }

            let legacy = match text.strip_prefix('-') {
                Some(body) if !body.starts_with('-') => {
                    let name = body.split('=').next().unwrap_or(body);
                    LEGACY_FLAGS.contains(&name)
                }
                _ => false,
            };

            if legacy {
                OsString::from(format!("-{}", text))
            } else {
                arg
            }
        })
        .collect()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why OsString instead of String?
//    - Command-line arguments are not guaranteed to be valid UTF-8
//    - OsString holds whatever the OS gave us; to_str() tells us if it's UTF-8
//
// 2. What does value_parser!(u64).range(1..) do?
//    - Parses the flag as a u64 and rejects 0 with a clear error message
// -----------------------------------------------------------------------------
