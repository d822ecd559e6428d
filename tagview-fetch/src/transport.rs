//! Subprocess transport over the external transfer utility.
//!
//! All registry traffic goes through `curl`, invoked with a literal
//! argument list (never a shell string) and a bounded timeout. The
//! [`Transport`] trait is the seam that lets pagination and token tests
//! substitute canned responses.

use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use async_trait::async_trait;

use crate::error::ProcessError;

/// The transfer utility every request goes through.
const CURL_BIN: &str = "curl";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound for long-running collaborator-owned calls.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(300);

// ============================================================================
// Fetch Options
// ============================================================================

/// Options selecting what a single transfer captures.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Include response headers in the captured output (`-i`).
    pub capture_headers: bool,
    /// Capture the response body.
    pub capture_body: bool,
    /// Capture only the HTTP status code (`-w %{http_code}`).
    pub status_only: bool,
    /// Per-request timeout, applied to curl and the subprocess wait.
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            capture_headers: false,
            capture_body: true,
            status_only: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FetchOptions {
    /// Options for a page fetch: body and headers in one request.
    pub fn page() -> Self {
        Self {
            capture_headers: true,
            ..Self::default()
        }
    }

    /// Options for a status-only probe, discarding the body.
    pub fn status_probe() -> Self {
        Self {
            capture_body: false,
            status_only: true,
            ..Self::default()
        }
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.min(MAX_TIMEOUT);
        self
    }
}

// ============================================================================
// Transport Output
// ============================================================================

/// Raw output from one transfer.
#[derive(Debug, Clone)]
pub struct TransportOutput {
    /// Standard output content.
    pub stdout: String,
    /// Standard error content.
    pub stderr: String,
    /// Exit code (0 = success).
    pub exit_code: i32,
    /// How long the transfer took.
    pub duration: Duration,
}

impl TransportOutput {
    /// Returns true if the transfer succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// One authenticated GET against the registry.
///
/// Implemented by [`CurlTransport`] in production and by mock transports
/// in pagination and token tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs a GET request, optionally with a bearer token.
    async fn fetch(
        &self,
        url: &str,
        token: Option<&str>,
        options: &FetchOptions,
    ) -> Result<TransportOutput, ProcessError>;
}

// ============================================================================
// Curl Transport
// ============================================================================

/// Transport that shells out to curl.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport;

impl CurlTransport {
    /// Creates a new curl transport.
    pub fn new() -> Self {
        Self
    }

    /// Returns true if the transfer utility is on PATH.
    pub fn available() -> bool {
        which::which(CURL_BIN).is_ok()
    }

    /// Builds the literal argument list for one request.
    ///
    /// Arguments are always passed as a vector, never joined into a shell
    /// string, so tag and token content cannot inject options.
    fn build_args(url: &str, token: Option<&str>, options: &FetchOptions) -> Vec<String> {
        let mut args = vec![
            "-s".to_string(),
            "--http2".to_string(),
            "--max-time".to_string(),
            options.timeout.as_secs().to_string(),
        ];

        if options.status_only {
            args.push("-w".to_string());
            args.push("%{http_code}".to_string());
        }
        if options.capture_headers {
            args.push("-i".to_string());
        }
        if !options.capture_body {
            args.push("-o".to_string());
            args.push("/dev/null".to_string());
        }
        if let Some(token) = token {
            args.push("-H".to_string());
            args.push(format!("Authorization: Bearer {token}"));
        }
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl Transport for CurlTransport {
    #[instrument(skip(self, token), fields(url = %url))]
    async fn fetch(
        &self,
        url: &str,
        token: Option<&str>,
        options: &FetchOptions,
    ) -> Result<TransportOutput, ProcessError> {
        let bin = which::which(CURL_BIN).map_err(|_| {
            warn!(cmd = CURL_BIN, "Transfer utility not found");
            ProcessError::NotFound(CURL_BIN.to_string())
        })?;

        let args = Self::build_args(url, token, options);
        debug!(arg_count = args.len(), timeout = ?options.timeout, "Running transfer");

        let start = Instant::now();
        let mut command = Command::new(&bin);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match tokio::time::timeout(options.timeout, command.output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(url = %url, timeout = ?options.timeout, "Transfer timed out");
                return Err(ProcessError::Timeout(options.timeout));
            }
        };

        let duration = start.elapsed();
        let exit_code = output.status.code().unwrap_or(-1);

        let result = TransportOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code,
            duration,
        };

        debug!(
            exit_code = exit_code,
            duration = ?duration,
            stdout_len = result.stdout.len(),
            "Transfer completed"
        );

        Ok(result)
    }
}

// ============================================================================
// Tests
// ============================================================================
