//! HTTP client with retry and request pacing for the TWiT API
//!
//! This module provides the transport seam (`Transport`), the reqwest-backed
//! implementation, the page fetch with bounded retry on transient server
//! errors, and the per-minute rate limiter used across a traversal.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::TwitConfig;
use crate::error::{Result, TwitError};
use crate::parser::parse_error_envelope;

/// Default User-Agent
const DEFAULT_USER_AGENT: &str = concat!("twit-core/", env!("CARGO_PKG_VERSION"));

/// Message some transports raise instead of reporting HTTP 500
pub const INTERNAL_SERVER_ERROR: &str = "InternalServerError";

/// Maximum number of attempts per page
const MAX_ATTEMPTS: u32 = 6;

/// Fixed delay between attempts after a transient server error
const RETRY_BACKOFF: Duration = Duration::from_secs(20);

/// Length of one rate limiting window
pub const PACING_WINDOW: Duration = Duration::from_secs(60);

/// Status and body of a single GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Performs one HTTP GET. Retry and pacing live above this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET to `url` with the given headers.
    ///
    /// Non-success statuses are returned as responses, not errors. Errors are
    /// reserved for transport faults.
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<TransportResponse>;
}

/// reqwest-backed transport
///
/// Compression is not negotiated and connections are not kept alive.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the given request timeout
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<TransportResponse> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(TransportResponse { status, body })
    }
}

/// Retry budget for a single page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (default: 6)
    pub max_attempts: u32,
    /// Delay after a transient failure (default: 20s)
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff: RETRY_BACKOFF,
        }
    }
}

/// Sleep for `duration` unless `cancel` fires first.
///
/// Returns `true` if the full duration elapsed.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = sleep(duration) => true,
    }
}

/// Client for the TWiT API
///
/// This client:
/// - Attaches the `app-id` / `app-key` credentials to every request
/// - Retries HTTP 500 (and the `InternalServerError` transport fault) with a
///   fixed backoff, up to the retry budget
/// - Treats any other status as a non-retryable "no response"
pub struct TwitClient<T = HttpTransport> {
    transport: T,
    app_id: String,
    app_key: String,
    debug_logging: bool,
    retry: RetryPolicy,
}

impl TwitClient<HttpTransport> {
    /// Create a reqwest-backed client from configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: &TwitConfig) -> Result<Self> {
        let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> TwitClient<T> {
    /// Create a client over a custom transport
    pub fn with_transport(transport: T, config: &TwitConfig) -> Self {
        Self {
            transport,
            app_id: config.app_id.clone(),
            app_key: config.app_key.clone(),
            debug_logging: config.enable_debug_logging,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch one page body.
    ///
    /// # Returns
    /// * `Ok(Some(body))` on HTTP 200
    /// * `Ok(None)` on a non-retryable status, an exhausted retry budget, or
    ///   cancellation during backoff
    ///
    /// # Errors
    /// Transport faults other than `InternalServerError` are returned as-is.
    pub async fn fetch_page(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        let headers = [
            ("app-id", self.app_id.as_str()),
            ("app-key", self.app_key.as_str()),
            ("Accept", "application/json"),
            ("Connection", "close"),
        ];
        self.debug_request(url, &headers);

        for attempt in 1..=self.retry.max_attempts {
            match self.transport.get(url, &headers).await {
                Ok(response) if response.status == 200 => {
                    self.debug_response(url, &response);
                    debug!("Returning valid API response");
                    return Ok(Some(response.body));
                }
                Ok(response) if response.status == 500 => {
                    self.debug_response(url, &response);
                    log_server_error(&response.body);
                }
                Ok(response) => {
                    info!(
                        "An unexpected error was returned from the API: {} for {}",
                        response.status, url
                    );
                    return Ok(None);
                }
                Err(TwitError::Transport(message)) if message == INTERNAL_SERVER_ERROR => {
                    debug!("Ignoring InternalServerError {} attempt {}", url, attempt);
                }
                Err(e) => {
                    info!("Error during TWiT API call attempt {} {}: {}", attempt, url, e);
                    return Err(e);
                }
            }

            if attempt == self.retry.max_attempts {
                break;
            }
            if !sleep_or_cancel(self.retry.backoff, cancel).await {
                info!("Stopping retries for {} due to cancellation request", url);
                return Ok(None);
            }
        }

        info!(
            "Unable to access TWiT API after {} attempts, stopping",
            self.retry.max_attempts
        );
        Ok(None)
    }

    fn debug_request(&self, url: &str, headers: &[(&str, &str)]) {
        if !self.debug_logging {
            return;
        }

        debug!("Requesting {}", url);
        for (name, value) in headers {
            let value = if *name == "app-key" { "<redacted>" } else { *value };
            debug!("\t{}\t{}", name, value);
        }
    }

    fn debug_response(&self, url: &str, response: &TransportResponse) {
        if !self.debug_logging {
            return;
        }

        debug!(
            "Obtained response from {}: HTTP Status {}, {} bytes",
            url,
            response.status,
            response.body.len()
        );
    }
}

fn log_server_error(body: &str) {
    match parse_error_envelope(body) {
        Ok(envelope) if envelope.is_usage_limit() => {
            info!("API usage limits have been exceeded, delay before retry");
        }
        Ok(envelope) => match envelope.message() {
            Some(message) => debug!("API issue seen, delay before retry: {}", message),
            None => debug!("Unhandled API issue, delay before retry"),
        },
        Err(e) => debug!("Unreadable API error response ({}), delay before retry", e),
    }
}

/// Per-minute request budget across one traversal
///
/// Counts calls and, after every `requests_per_minute`-th call, pauses for
/// one window before the next request. A limit of zero disables pacing.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    requests_per_minute: u32,
    window: Duration,
    calls: u32,
}

impl RateLimiter {
    /// Create a new rate limiter with the specified requests per minute
    ///
    /// # Example
    /// ```
    /// use twit_core::client::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(5);
    /// assert_eq!(limiter.calls(), 0);
    /// ```
    pub fn new(requests_per_minute: u32) -> Self {
        Self::with_window(requests_per_minute, PACING_WINDOW)
    }

    /// Create a rate limiter with a custom window length
    pub fn with_window(requests_per_minute: u32, window: Duration) -> Self {
        Self {
            requests_per_minute,
            window,
            calls: 0,
        }
    }

    /// Count one completed call; returns `true` if a pause is now due.
    pub fn record_call(&mut self) -> bool {
        self.calls += 1;
        self.requests_per_minute > 0 && self.calls % self.requests_per_minute == 0
    }

    /// Record a call and pause for one window if the budget is spent.
    ///
    /// Returns `false` if the pause was cut short by `cancel`.
    pub async fn acquire(&mut self, cancel: &CancellationToken) -> bool {
        if !self.record_call() {
            return true;
        }

        debug!(
            "Waiting {:?} before the next request due to request limit",
            self.window
        );
        sleep_or_cancel(self.window, cancel).await
    }

    /// Calls recorded so far
    pub fn calls(&self) -> u32 {
        self.calls
    }

    /// Length of the pause window
    pub fn window(&self) -> Duration {
        self.window
    }
}
