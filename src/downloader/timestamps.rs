//! File timestamps inferred from comment content

use crate::model::wire::CommentTimes;
use chrono::{DateTime, Utc};
use std::fs::{FileTimes, OpenOptions};
use std::path::Path;
use std::time::SystemTime;

/// Creation and modification times for a downloaded comment file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileTimestamps {
    /// Inferred video start: first comment's creation time minus its offset
    pub created: DateTime<Utc>,
    /// Last comment's creation time
    pub modified: DateTime<Utc>,
}

impl FileTimestamps {
    /// Infer timestamps from the first and last comment of a download
    pub fn infer(first: &CommentTimes, last: &CommentTimes) -> Self {
        let offset = chrono::Duration::from_std(first.content_offset())
            .unwrap_or_else(|_| chrono::Duration::zero());
        let created = first
            .created_at
            .checked_sub_signed(offset)
            .unwrap_or(first.created_at);
        Self {
            created,
            modified: last.created_at,
        }
    }

    /// Set the times on `path`
    ///
    /// The modification time is set everywhere. The creation time is only
    /// settable on Windows and macOS and is skipped elsewhere.
    pub fn apply(&self, path: &Path) -> std::io::Result<()> {
        let file = OpenOptions::new().write(true).open(path)?;
        let times = FileTimes::new().set_modified(SystemTime::from(self.modified));

        #[cfg(windows)]
        let times = {
            use std::os::windows::fs::FileTimesExt;
            times.set_created(SystemTime::from(self.created))
        };
        #[cfg(target_os = "macos")]
        let times = {
            use std::os::macos::fs::FileTimesExt;
            times.set_created(SystemTime::from(self.created))
        };
        #[cfg(not(any(windows, target_os = "macos")))]
        {
            tracing::debug!(
                path = %path.display(),
                "Creation time is not settable on this platform, skipping"
            );
        }

        file.set_times(times)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn times(secs: i64, offset: f64) -> CommentTimes {
        CommentTimes {
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            content_offset_seconds: offset,
        }
    }

    #[test]
    fn infers_start_and_end() {
        let t = 1_622_570_400;
        let stamps = FileTimestamps::infer(&times(t, 10.0), &times(t + 60, 70.0));

        assert_eq!(stamps.created, Utc.timestamp_opt(t - 10, 0).unwrap());
        assert_eq!(stamps.modified, Utc.timestamp_opt(t + 60, 0).unwrap());
    }

    #[test]
    fn fractional_offsets_round_to_milliseconds() {
        let t = 1_622_570_400;
        let stamps = FileTimestamps::infer(&times(t, 1.0006), &times(t, 1.0006));
        assert_eq!(
            stamps.created,
            Utc.timestamp_millis_opt(t * 1000 - 1001).unwrap()
        );
    }

    #[test]
    fn apply_sets_modification_time() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("out.json");
        std::fs::write(&path, "[]").unwrap();

        let t = 1_622_570_400;
        let stamps = FileTimestamps::infer(&times(t, 10.0), &times(t + 60, 70.0));
        stamps.apply(&path).unwrap();

        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(DateTime::<Utc>::from(modified), stamps.modified);
    }

    #[test]
    fn apply_to_missing_file_fails() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let t = 1_622_570_400;
        let stamps = FileTimestamps::infer(&times(t, 0.0), &times(t, 0.0));
        assert!(stamps.apply(&temp_dir.path().join("missing.json")).is_err());
    }
}
