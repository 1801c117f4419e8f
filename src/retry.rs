//! Retry logic with exponential backoff
//!
//! Page requests are retried on transient failures. The retried request is the
//! same request (same cursor), so retries never reorder or skip pages.
//!
//! # Example
//!
//! ```no_run
//! use rechat_dl::config::RetryConfig;
//! use rechat_dl::error::Error;
//! use rechat_dl::retry::with_retry;
//!
//! # async fn example() -> Result<(), Error> {
//! let config = RetryConfig::default();
//! let body = with_retry(&config, || async {
//!     Ok::<String, Error>("page".to_string())
//! }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, refused connections, overloaded server) return `true`.
/// Everything that would fail the same way again returns `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            // 429 Too Many Requests and server-side failures
            Error::HttpStatus { status, .. } => *status == 429 || (500..600).contains(status),
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            Error::Config { .. }
            | Error::AlreadyExists { .. }
            | Error::InvalidVideoId(_)
            | Error::Api(_)
            | Error::VideoNotFound(_)
            | Error::MalformedResponse(_)
            | Error::MalformedFile { .. }
            | Error::Serialization(_)
            | Error::Interrupted => false,
        }
    }
}

/// Execute an async operation with exponential backoff retry logic
///
/// Returns the successful result, or the last error once it is non-retryable or
/// `config.max_attempts` retries have been spent.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut retries = 0u32;

    loop {
        let error = match operation().await {
            Ok(result) => {
                if retries > 0 {
                    tracing::info!(attempts = retries + 1, "Request succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => e,
        };

        if !error.is_retryable() {
            tracing::debug!(error = %error, "Request failed with non-retryable error");
            return Err(error);
        }
        if retries >= config.max_attempts {
            tracing::error!(
                error = %error,
                attempts = retries + 1,
                "Request failed after all retry attempts exhausted"
            );
            return Err(error);
        }

        retries += 1;
        let delay = backoff_delay(config, retries);
        let delay = if config.jitter { add_jitter(delay) } else { delay };
        tracing::warn!(
            error = %error,
            attempt = retries,
            max_attempts = config.max_attempts,
            delay_ms = delay.as_millis(),
            "Request failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Delay before retry number `retry` (1-based), before jitter
///
/// `initial_delay * backoff_multiplier^(retry - 1)`, capped at `max_delay`.
/// Overflowing or non-finite intermediate values land on the cap.
fn backoff_delay(config: &RetryConfig, retry: u32) -> Duration {
    let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
    let seconds = config.initial_delay.as_secs_f64() * config.backoff_multiplier.powi(exponent);
    Duration::try_from_secs_f64(seconds)
        .map_or(config.max_delay, |delay| delay.min(config.max_delay))
}

/// Add random jitter to a delay
///
/// The result lies between `delay` and `2 * delay`, saturating at [`Duration::MAX`].
fn add_jitter(delay: Duration) -> Duration {
    let jitter_factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
    Duration::try_from_secs_f64(delay.as_secs_f64() * jitter_factor)
        .map_or(Duration::MAX, |extra| delay.saturating_add(extra))
}
