//! Retrying fetch
//!
//! Wraps a single HTTP request with bounded retry on transient failure. Server
//! errors (status >= 500) and transport failures are retried with a linearly
//! growing delay; anything below 500 is handed straight back to the caller so
//! a non-idempotent request that hit a client error is never sent twice.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode};
use tracing::{debug, instrument, warn};

use crate::error::ApiError;

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Callback invoked before each retry with the 1-based number of the attempt
/// that just failed and the error it produced
pub type RetryCallback = Arc<dyn Fn(u32, &ApiError) + Send + Sync>;

/// Retry configuration for a single call
#[derive(Clone)]
pub struct RetryOptions {
    /// Retries after the initial attempt; total attempts = `max_retries + 1`
    pub max_retries: u32,
    /// Base backoff; the wait after attempt `n` is `retry_delay * n`
    pub retry_delay: Duration,
    on_retry: Option<RetryCallback>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            on_retry: None,
        }
    }
}

impl fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

impl RetryOptions {
    /// Sets the number of retries after the first attempt
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the base backoff delay
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Registers a callback fired before every retry
    pub fn on_retry<F>(mut self, callback: F) -> Self
    where
        F: Fn(u32, &ApiError) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    /// Total number of attempts this configuration allows
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait after the given (1-based) failed attempt
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt)
    }
}

/// Anything that carries an HTTP status code
pub trait HttpStatus {
    fn status(&self) -> StatusCode;
}

impl HttpStatus for Response {
    fn status(&self) -> StatusCode {
        Response::status(self)
    }
}

/// Method, headers and body of a request, rebuilt for every attempt
#[derive(Debug, Clone, Default)]
pub struct RequestSpec {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl RequestSpec {
    /// A plain GET with no headers
    pub fn get() -> Self {
        Self::default()
    }

    /// A request with the given method and no headers or body
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Attaches a body
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Replaces the header map
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Runs `attempt` until it yields a response below 500, a permanent error,
/// or the attempts run out.
///
/// `attempt` receives the 1-based attempt number. On exhaustion the last
/// observed error is returned: either the synthesized `HTTP <status>` error
/// or the transport error from the final attempt.
pub async fn retry_with_backoff<R, F, Fut>(options: &RetryOptions, mut attempt: F) -> Result<R, ApiError>
where
    R: HttpStatus,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<R, ApiError>>,
{
    let total = options.total_attempts();
    let mut number = 1;

    loop {
        let error = match attempt(number).await {
            Ok(response) => {
                let status = response.status();
                if status.as_u16() < 500 {
                    return Ok(response);
                }
                ApiError::from_status(status)
            }
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => err,
        };

        if number >= total {
            warn!(attempts = number, error = %error, "Giving up after final attempt");
            return Err(error);
        }

        let delay = options.delay_after(number);
        debug!(attempt = number, ?delay, error = %error, "Attempt failed, retrying");
        if let Some(ref on_retry) = options.on_retry {
            on_retry(number, &error);
        }
        tokio::time::sleep(delay).await;
        number += 1;
    }
}

/// Sends `request` to `url`, retrying transient failures per `options`.
///
/// A response is returned as-is when its status is below 500, so callers
/// still have to check for 4xx themselves.
#[instrument(skip(client, request, options), fields(method = %request.method))]
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    request: &RequestSpec,
    options: &RetryOptions,
) -> Result<Response, ApiError> {
    retry_with_backoff(options, |_| {
        let mut builder = client
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }
        async move { builder.send().await.map_err(ApiError::from) }
    })
    .await
}
