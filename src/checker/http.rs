// src/checker/http.rs
// =============================================================================
// This module checks if URLs are alive by making HTTP requests.
//
// Key functionality:
// - Makes HTTP HEAD requests (lightweight, no body download)
// - Reports the status line exactly, whatever the code (2xx, 3xx, 4xx, 5xx)
// - Turns every failed request into a FailureKind instead of an error,
//   so one bad link never stops the batch
// - Runs checks concurrently with a limit, keeping results in input order
// - Stops early when the run is cancelled (Ctrl-C or deadline)
//
// Rust concepts:
// - Traits: Probe lets tests swap the network for a stub
// - async/await: For concurrent network I/O
// - Streams: For processing many items concurrently
// =============================================================================

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use hyper::ext::ReasonPhrase;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// Status string written for any request that never got a response.
// Misspelled on purpose: existing reports and tooling expect this exact value.
pub const LEGACY_ERROR_STATUS: &str = "Erro";

// Why a request failed to produce a response
//
// #[serde(rename_all = "snake_case")] makes these "timeout", "dns", ...
// in the detailed report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Request timed out
    Timeout,
    /// Could not resolve hostname
    Dns,
    /// Connection refused, reset or unreachable
    Connect,
    /// SSL/TLS handshake or certificate error
    Tls,
    /// Redirect limit hit (redirect loop)
    TooManyRedirects,
    /// The link could not be turned into a request at all
    MalformedUrl,
    /// Anything else
    Other,
}

// The outcome of probing one link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// The server answered, with any status code
    Responded {
        code: StatusCode,
        /// Reason phrase sent by the server, when it differs from the
        /// standard one for `code`
        reason: Option<String>,
    },
    /// No response was received
    Failed(FailureKind),
}

impl LinkStatus {
    // A response that used the standard reason phrase for its code
    pub fn responded(code: StatusCode) -> Self {
        LinkStatus::Responded { code, reason: None }
    }

    // The status as it appears in the report
    //
    // The server's own reason phrase wins; the standard one fills in when
    // the server sent the usual text. A code with neither is printed bare.
    //
    // Examples: "200 OK", "404 Gone Fishing", "599", "Erro"
    pub fn status_line(&self) -> String {
        match self {
            LinkStatus::Responded { code, reason } => {
                match reason.as_deref().or_else(|| code.canonical_reason()) {
                    Some(reason) if !reason.is_empty() => format!("{} {}", code.as_u16(), reason),
                    _ => code.as_u16().to_string(),
                }
            }
            LinkStatus::Failed(_) => LEGACY_ERROR_STATUS.to_string(),
        }
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            LinkStatus::Responded { .. } => None,
            LinkStatus::Failed(kind) => Some(*kind),
        }
    }
}

// Anything that can tell us the status of a URL
//
// The real implementation is HttpProbe. Tests use small stubs so the
// pipeline can run without a network.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, url: &str) -> LinkStatus;
}

// Probes links with HTTP HEAD requests
//
// One Client is shared by all checks (connection pooling).
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    // Creates a probe with a per-request timeout
    //
    // Redirects use reqwest's default policy (up to 10 hops).
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, url: &str) -> LinkStatus {
        match self.client.head(url).send().await {
            Ok(response) => {
                // Only the status line is needed. Dropping the response here
                // releases the connection back to the pool.
                let code = response.status();
                // hyper only keeps the phrase when it isn't the standard one
                let reason = response
                    .extensions()
                    .get::<ReasonPhrase>()
                    .map(|phrase| String::from_utf8_lossy(phrase.as_bytes()).into_owned());
                drop(response);
                tracing::debug!(url, status = code.as_u16(), reason = ?reason, "link responded");
                LinkStatus::Responded { code, reason }
            }
            Err(e) => {
                let kind = categorize_error(&e);
                tracing::warn!(url, ?kind, error = %e, "link check failed");
                LinkStatus::Failed(kind)
            }
        }
    }
}

// Categorizes different error types from reqwest
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure
// - SSL certificate issues
// - Too many redirects
// - A URL that doesn't parse
fn categorize_error(error: &reqwest::Error) -> FailureKind {
    // Only the source chain is searched; reqwest's own message embeds the
    // URL, which could contain any of the keywords below
    let mut detail = String::new();
    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        detail.push_str(&inner.to_string().to_lowercase());
        detail.push('\n');
        source = inner.source();
    }

    if error.is_timeout() {
        FailureKind::Timeout
    } else if error.is_redirect() {
        FailureKind::TooManyRedirects
    } else if error.is_builder() {
        FailureKind::MalformedUrl
    } else if detail.contains("certificate") || detail.contains("tls") || detail.contains("ssl") {
        FailureKind::Tls
    } else if detail.contains("dns") || detail.contains("lookup") || detail.contains("resolve") {
        FailureKind::Dns
    } else if error.is_connect() {
        FailureKind::Connect
    } else {
        FailureKind::Other
    }
}

// Knobs for a checking run
#[derive(Debug, Clone, Copy)]
pub struct CheckOptions {
    /// Max number of probes in flight (1 = strictly one after another)
    pub concurrency: usize,
    /// Print "Checking link: ..." as each check starts
    pub verbose: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            concurrency: 10,
            verbose: false,
        }
    }
}

// Result of checking a batch of links
#[derive(Debug)]
pub struct CheckRun {
    /// (url, status) pairs in the same order as the input
    pub results: Vec<(String, LinkStatus)>,
    /// true if cancellation stopped the run before every link was checked
    pub interrupted: bool,
}

// Checks multiple links concurrently
//
// This is the main entry point for link checking.
//
// Unlike buffer_unordered, .buffered(n) hands results back in the order
// the futures were created, so the output lines up with the input even
// though up to n checks run at once.
//
// When `cancel` fires, in-flight checks are dropped and only the results
// that were already complete are returned. Because results come back in
// order, that is always a prefix of the input.
pub async fn check_links<P: Probe + ?Sized>(
    probe: &P,
    urls: Vec<String>,
    options: CheckOptions,
    cancel: &CancellationToken,
) -> CheckRun {
    let total = urls.len();
    let verbose = options.verbose;

    let checks = urls.into_iter().map(move |url| async move {
        if verbose {
            println!("Checking link: {}", url);
        }
        let status = probe.probe(&url).await;
        (url, status)
    });

    let mut checks = stream::iter(checks).buffered(options.concurrency.max(1));
    let mut results = Vec::with_capacity(total);

    loop {
        tokio::select! {
            // Check cancellation first so a cancelled run never starts more work
            biased;

            _ = cancel.cancelled() => {
                tracing::warn!(completed = results.len(), total, "link checking cancelled");
                return CheckRun { results, interrupted: true };
            }
            next = checks.next() => match next {
                Some(result) => results.push(result),
                None => break,
            },
        }
    }

    CheckRun {
        results,
        interrupted: false,
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a Probe trait?
//    - check_links only needs "give me a status for this URL"
//    - Putting that behind a trait lets tests pass a stub that never
//      touches the network
//    - #[async_trait] is needed because the method is async
//
// 2. buffered vs buffer_unordered
//    - Both run up to N futures at once
//    - buffer_unordered yields whichever finishes first
//    - buffered waits and yields them in the order they were created
//
// 3. What is tokio::select!?
//    - Waits on several futures and runs the branch of the first one ready
//    - `biased;` makes it check branches top to bottom instead of randomly
//
// 4. What is a CancellationToken?
//    - A cheap, cloneable flag that async code can wait on
//    - cancel() on any clone wakes everyone waiting on cancelled()
//    - child_token() makes a token that is cancelled with its parent,
//      but can also be cancelled on its own
// -----------------------------------------------------------------------------
