//! # rechat-dl
//!
//! Downloads the replay chat ("rechat") of a video and turns it into a readable
//! transcript.
//!
//! Two halves, chained through a file on disk:
//! - [`downloader`] pages through the comments API and streams every comment
//!   into a JSON array file. The file either appears complete or not at all.
//! - [`model`] and [`render`] read such a file back one comment at a time and
//!   render each as a transcript line; [`processor`] ties them to files.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rechat_dl::{Config, process_file, ProcessOptions};
//! use rechat_dl::downloader::download_video;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let summary = download_video(&config, "123456789", Path::new("123456789.json"), false, |p| {
//!         eprintln!("page {}", p.pages);
//!     })
//!     .await?;
//!
//!     process_file(&summary.path, None, &ProcessOptions::default())?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Comments API client
pub mod api;
/// Configuration types
pub mod config;
/// Comment downloader
pub mod downloader;
/// Error types
pub mod error;
/// Chat message model and comment file reader
pub mod model;
/// Transcript file processing
pub mod processor;
/// Transcript line rendering
pub mod render;
/// Retry logic with exponential backoff
pub mod retry;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use api::{CommentPage, CommentSource, GqlClient, PageRequest};
pub use config::Config;
pub use downloader::{DownloadProgress, DownloadSummary, Downloader};
pub use error::{Error, Result, Warning};
pub use model::{Badge, Commenter, Message, parse_messages};
pub use processor::{
    ProcessOptions, ProcessSummary, process_file, process_file_interruptible, process_pattern,
    process_pattern_interruptible,
};
pub use render::{RenderOptions, render};

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Run an operation until it completes or a termination signal arrives.
///
/// On a signal the operation's future is dropped, which removes any staged
/// output it was writing, and [`Error::Interrupted`] is returned.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use rechat_dl::{Config, run_with_shutdown};
/// use rechat_dl::downloader::download_video;
/// use std::path::Path;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let path = Path::new("123.json");
///     run_with_shutdown(download_video(&config, "123", path, false, |_| {})).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown<F, T>(operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        result = operation => result,
        () = wait_for_signal() => {
            tracing::warn!("Operation interrupted, discarding incomplete output");
            Err(Error::Interrupted)
        }
    }
}

/// Run blocking work on the blocking pool until it completes or a termination
/// signal arrives.
///
/// `work` receives a flag that is set when a signal arrives; it should check
/// the flag and return [`Error::Interrupted`], dropping any staged output. The
/// work is always awaited to the end so that cleanup has finished before this
/// returns.
///
/// # Example
///
/// ```no_run
/// use rechat_dl::{ProcessOptions, process_file_interruptible, run_blocking_with_shutdown};
/// use std::path::Path;
///
/// # async fn example() -> rechat_dl::Result<()> {
/// let summary = run_blocking_with_shutdown(|interrupted| {
///     process_file_interruptible(Path::new("123.json"), None, &ProcessOptions::default(), interrupted)
/// })
/// .await?;
/// println!("{} lines", summary.lines);
/// # Ok(())
/// # }
/// ```
pub async fn run_blocking_with_shutdown<F, T>(work: F) -> Result<T>
where
    F: FnOnce(&AtomicBool) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    let mut task = tokio::task::spawn_blocking(move || work(&flag));

    let joined = tokio::select! {
        joined = &mut task => joined,
        () = wait_for_signal() => {
            tracing::warn!("Operation interrupted, discarding incomplete output");
            interrupted.store(true, Ordering::SeqCst);
            task.await
        }
    };
    joined.map_err(|e| Error::Io(std::io::Error::other(e)))?
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            // Without a handler there is nothing to wait for; never resolve
            std::future::pending::<()>().await;
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completed_operation_passes_through() {
        let value = run_with_shutdown(async { Ok::<_, Error>(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn blocking_work_result_passes_through() {
        let value = run_blocking_with_shutdown(|interrupted| {
            assert!(!interrupted.load(Ordering::SeqCst));
            Ok(7)
        })
        .await
        .unwrap();
        assert_eq!(value, 7);

        let result =
            run_blocking_with_shutdown(|_| Err::<(), _>(Error::Interrupted)).await;
        assert!(matches!(result, Err(Error::Interrupted)));
    }

    #[tokio::test]
    async fn blocking_work_leaves_no_transcript_when_interrupted() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let input = temp_dir.path().join("123.json");
        std::fs::write(&input, "[]").unwrap();

        let work_input = input.clone();
        let result = run_blocking_with_shutdown(move |interrupted| {
            // Stands in for a signal arriving mid-run
            interrupted.store(true, Ordering::SeqCst);
            process_file_interruptible(&work_input, None, &ProcessOptions::default(), interrupted)
        })
        .await;

        assert!(matches!(result, Err(Error::Interrupted)));
        assert!(!temp_dir.path().join("123.txt").exists());
        assert!(!temp_dir.path().join("123.txt.part").exists());
    }

    #[tokio::test]
    async fn operation_error_passes_through() {
        let result = run_with_shutdown(async { Err::<(), _>(Error::Api("boom".into())) }).await;
        assert!(matches!(result, Err(Error::Api(_))));
    }
}
