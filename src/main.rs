// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Read the HTML file and extract its external links
// 3. Check every link and collect the results in document order
// 4. Write the JSON report and print how long it took
// 5. Exit with proper code (0 = done, 1 = error, 3 = partial report)
//
// Ctrl-C is handled with one CancellationToken created here and passed
// down. The first Ctrl-C stops the checks and the links checked so far
// are still written out; a second one exits immediately.
// =============================================================================

mod checker;
mod cli;
mod report;

use anyhow::{bail, Context, Result};
use checker::{CheckOptions, HttpProbe, Probe};
use cli::Cli;
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
// Checking was cut short (Ctrl-C or --deadline) and a partial report was written
const EXIT_PARTIAL: i32 = 3;

#[tokio::main]
async fn main() {
    init_tracing();

    let cancel = CancellationToken::new();
    listen_for_interrupt(cancel.clone());

    let exit_code = match run(&cancel).await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    };

    std::process::exit(exit_code);
}

// Diagnostics go to stderr so they never mix with the console summary.
// RUST_LOG controls the level (default: warn).
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// Cancels `cancel` on the first Ctrl-C, exits on the second
fn listen_for_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Unable to listen for interrupt signal: {}", e);
            return;
        }
        tracing::info!("interrupt received, stopping link checks");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nProcess interrupted by user.");
            std::process::exit(EXIT_FAILURE);
        }
    });
}

async fn run(cancel: &CancellationToken) -> Result<i32> {
    let cli = match Cli::try_parse_from(cli::normalize_legacy_flags(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also come through here, and are not errors
            let code = if e.use_stderr() { EXIT_FAILURE } else { EXIT_SUCCESS };
            e.print()?;
            return Ok(code);
        }
    };

    let probe = HttpProbe::new(Duration::from_secs(cli.timeout))
        .context("Failed to create HTTP client")?;

    let config = ScanConfig {
        file: cli.file,
        output: cli.output,
        verbose: cli.verbose,
        detailed_errors: cli.detailed_errors,
        deadline: cli.deadline.map(Duration::from_secs),
        options: CheckOptions {
            concurrency: usize::from(cli.concurrency),
            verbose: cli.verbose,
        },
    };

    handle_scan(&config, &probe, cancel).await
}

// Everything a scan needs, already validated by clap
#[derive(Debug, Clone)]
struct ScanConfig {
    file: PathBuf,
    output: PathBuf,
    verbose: bool,
    detailed_errors: bool,
    deadline: Option<Duration>,
    options: CheckOptions,
}

// Runs one audit: extract, check, write report
//
// Returns:
//   Ok(0) = report written for every link
//   Ok(1) = interrupted before checking started, nothing written
//   Ok(3) = checking was cut short, partial report written
//   Err   = missing input, unreadable input, or report not written
async fn handle_scan<P: Probe + ?Sized>(
    config: &ScanConfig,
    probe: &P,
    cancel: &CancellationToken,
) -> Result<i32> {
    if !config.file.exists() {
        bail!("The file {} does not exist.", config.file.display());
    }

    let start = Instant::now();

    if config.verbose {
        println!("Extracting links from {}...", config.file.display());
    }

    let links = tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            println!("\nProcess interrupted by user.");
            return Ok(EXIT_FAILURE);
        }
        links = checker::extract_links_from_file(&config.file) => links
            .with_context(|| format!("Failed to extract links from {}", config.file.display()))?,
    };

    if config.verbose {
        for link in &links {
            println!("Found link: {}", link);
        }
    }
    println!("Found {} external links.", links.len());

    if config.verbose {
        println!("Checking the status of each link...");
    }

    // The deadline only cancels this child token, so we can tell it apart
    // from a Ctrl-C on the parent afterwards
    let check_cancel = cancel.child_token();
    if let Some(deadline) = config.deadline {
        let token = check_cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(deadline) => token.cancel(),
                _ = token.cancelled() => {}
            }
        });
    }

    let total = links.len();
    let run = checker::check_links(probe, links, config.options, &check_cancel).await;
    // Stops the deadline timer if it is still waiting
    check_cancel.cancel();

    let checked = run.results.len();
    let report = report::build_report(run.results, config.detailed_errors);

    report::save_report(&report, &config.output)
        .await
        .with_context(|| format!("Failed to save the report to {}", config.output.display()))?;

    let exit_code = if run.interrupted {
        if cancel.is_cancelled() {
            println!("\nProcess interrupted by user.");
        } else {
            println!("Deadline reached before every link was checked.");
        }
        println!(
            "Partial report ({} of {} links) saved to: {}",
            checked,
            total,
            config.output.display()
        );
        EXIT_PARTIAL
    } else {
        println!("Report successfully saved to: {}", config.output.display());
        EXIT_SUCCESS
    };

    println!("Process completed in {:.2} seconds.", start.elapsed().as_secs_f64());

    Ok(exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::checker::LinkStatus;
    use reqwest::StatusCode;
    use std::io::Write;

    // Answers 200 for every link without touching the network
    struct OkProbe;

    #[async_trait]
    impl Probe for OkProbe {
        async fn probe(&self, _url: &str) -> LinkStatus {
            LinkStatus::responded(StatusCode::OK)
        }
    }

    // Answers links under /fast at once, never answers anything else
    struct StallingProbe;

    #[async_trait]
    impl Probe for StallingProbe {
        async fn probe(&self, url: &str) -> LinkStatus {
            if url.contains("/fast") {
                LinkStatus::responded(StatusCode::OK)
            } else {
                std::future::pending().await
            }
        }
    }

    fn html_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn config(file: PathBuf, output: PathBuf) -> ScanConfig {
        ScanConfig {
            file,
            output,
            verbose: false,
            detailed_errors: false,
            deadline: None,
            options: CheckOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_with_stub_probe() {
        let input = html_file(
            r#"<html><body>
                <a href="https://www.google.com">Google</a>
                <a href="mailto:test@example.com">Email</a>
            </body></html>"#,
        );
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");

        let code = handle_scan(
            &config(input.path().to_path_buf(), output.clone()),
            &OkProbe,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(code, EXIT_SUCCESS);
        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            written,
            "[\n  {\n    \"url\": \"https://www.google.com\",\n    \"status\": \"200 OK\"\n  }\n]"
        );
    }

    #[tokio::test]
    async fn test_missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");

        let err = handle_scan(
            &config(dir.path().join("nope.html"), output.clone()),
            &OkProbe,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("does not exist"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_interrupt_before_checking_writes_nothing() {
        let input = html_file(r#"<a href="https://a.example/fast">A</a>"#);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let code = handle_scan(&config(input.path().to_path_buf(), output.clone()), &OkProbe, &cancel)
            .await
            .unwrap();

        assert_eq!(code, EXIT_FAILURE);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_interrupt_during_checking_flushes_prefix() {
        let input = html_file(
            r#"<a href="https://a.example/fast">A</a>
               <a href="https://b.example/stall">B</a>"#,
        );
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let code = handle_scan(
            &config(input.path().to_path_buf(), output.clone()),
            &StallingProbe,
            &cancel,
        )
        .await
        .unwrap();

        assert_eq!(code, EXIT_PARTIAL);
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(
            written,
            serde_json::json!([{ "url": "https://a.example/fast", "status": "200 OK" }])
        );
    }

    #[tokio::test]
    async fn test_deadline_flushes_prefix() {
        let input = html_file(
            r#"<a href="https://a.example/fast">A</a>
               <a href="https://b.example/stall">B</a>
               <a href="https://c.example/fast">C</a>"#,
        );
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");
        let mut config = config(input.path().to_path_buf(), output.clone());
        config.deadline = Some(Duration::from_millis(100));
        config.options.concurrency = 1;

        let cancel = CancellationToken::new();
        let code = handle_scan(&config, &StallingProbe, &cancel).await.unwrap();

        assert_eq!(code, EXIT_PARTIAL);
        // The parent token is untouched: the deadline is not a user interrupt
        assert!(!cancel.is_cancelled());
        let written: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written.len(), 1);
    }

    #[tokio::test]
    async fn test_no_links_writes_empty_array() {
        let input = html_file(r##"<a href="#top">Top</a>"##);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");

        let code = handle_scan(
            &config(input.path().to_path_buf(), output.clone()),
            &OkProbe,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "[]");
    }
}
