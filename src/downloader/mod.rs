//! Comment downloader
//!
//! Pages are pulled from a [`CommentSource`] one at a time and every comment is
//! written to the output as soon as its page arrives. Submodules:
//! - [`pagination`] - cursor pagination as a stream of pages
//! - [`writer`] - staged, streaming JSON array output
//! - [`timestamps`] - file times inferred from the first and last comment

pub mod pagination;
pub mod timestamps;
pub mod writer;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use pagination::paginate;
pub use timestamps::FileTimestamps;
pub use writer::JsonArrayWriter;

use crate::api::{CommentSource, GqlClient};
use crate::config::Config;
use crate::error::{Result, Warning};
use crate::model::wire::CommentTimes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Progress reported after each page
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Pages fetched so far
    pub pages: u64,
    /// Comments written so far
    pub comments: u64,
    /// Offset of the most recent comment; `None` before the first comment or
    /// when its offset could not be read
    pub last_offset: Option<Duration>,
}

/// Result of a completed download
#[derive(Debug)]
pub struct DownloadSummary {
    /// The completed output file
    pub path: PathBuf,
    /// Pages fetched
    pub pages: u64,
    /// Comments written
    pub comments: u64,
    /// Inferred video start time (the file's creation time)
    pub video_start: Option<DateTime<Utc>>,
    /// Creation time of the last comment (the file's modification time)
    pub last_comment_at: Option<DateTime<Utc>>,
    /// Non-fatal problems; the file is complete regardless
    pub warnings: Vec<Warning>,
}

/// Downloads all comments of a video into a JSON array file
#[derive(Debug)]
pub struct Downloader<S> {
    source: S,
}

impl<S: CommentSource> Downloader<S> {
    /// Create a downloader over a page source
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Download every comment of `video_id` into `path`
    ///
    /// Fails with [`crate::Error::AlreadyExists`] before any request if `path`
    /// exists and `overwrite` is false. On any error, or if the returned future
    /// is dropped, `path` is left untouched: the output is staged and only moved
    /// into place once the array is complete.
    ///
    /// `on_progress` is called once per page.
    pub async fn download<F>(
        &self,
        video_id: &str,
        path: &Path,
        overwrite: bool,
        mut on_progress: F,
    ) -> Result<DownloadSummary>
    where
        F: FnMut(&DownloadProgress),
    {
        let mut writer = JsonArrayWriter::create(path, overwrite).await?;
        tracing::info!(video_id, path = %path.display(), "Starting comment download");

        let mut pages = std::pin::pin!(paginate(&self.source, video_id));
        let mut progress = DownloadProgress::default();
        let mut first_times: Option<serde_json::Result<CommentTimes>> = None;
        let mut last_times: Option<serde_json::Result<CommentTimes>> = None;

        while let Some(page) = pages.try_next().await? {
            for comment in &page.comments {
                writer.write_element(comment).await?;
            }

            if let Some(first) = page.comments.first()
                && first_times.is_none()
            {
                first_times = Some(CommentTimes::parse(first));
            }
            if let Some(last) = page.comments.last() {
                let times = CommentTimes::parse(last);
                progress.last_offset = times.as_ref().ok().map(CommentTimes::content_offset);
                last_times = Some(times);
            }

            progress.pages += 1;
            progress.comments += page.comments.len() as u64;
            tracing::debug!(
                video_id,
                page = progress.pages,
                comments = page.comments.len(),
                next_cursor = ?page.next_cursor,
                "Fetched comment page"
            );
            on_progress(&progress);
        }

        let path = writer.finish().await?;
        tracing::info!(
            video_id,
            path = %path.display(),
            pages = progress.pages,
            comments = progress.comments,
            "Comment download complete"
        );

        let mut summary = DownloadSummary {
            path,
            pages: progress.pages,
            comments: progress.comments,
            video_start: None,
            last_comment_at: None,
            warnings: Vec::new(),
        };

        let (Some(first), Some(last)) = (first_times, last_times) else {
            tracing::debug!(video_id, "No comments, leaving file times unchanged");
            return Ok(summary);
        };

        match first.and_then(|first| last.map(|last| (first, last))) {
            Ok((first, last)) => {
                let stamps = FileTimestamps::infer(&first, &last);
                summary.video_start = Some(stamps.created);
                summary.last_comment_at = Some(stamps.modified);
                if let Err(source) = stamps.apply(&summary.path) {
                    summary.warnings.push(Warning::FileTimes {
                        path: summary.path.clone(),
                        source,
                    });
                }
            }
            Err(e) => summary.warnings.push(Warning::TimestampsUnavailable {
                reason: e.to_string(),
            }),
        }

        for warning in &summary.warnings {
            tracing::warn!(video_id, warning = %warning, "Download completed with a warning");
        }
        Ok(summary)
    }

    /// The underlying page source
    pub fn source(&self) -> &S {
        &self.source
    }
}

/// Download a video's comments with a client built from `config`
///
/// The HTTP client lives exactly as long as this call.
pub async fn download_video<F>(
    config: &Config,
    video_id: &str,
    path: &Path,
    overwrite: bool,
    on_progress: F,
) -> Result<DownloadSummary>
where
    F: FnMut(&DownloadProgress),
{
    let downloader = Downloader::new(GqlClient::new(config)?);
    downloader
        .download(video_id, path, overwrite, on_progress)
        .await
}
