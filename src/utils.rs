//! Utility functions for output files, paths and video ids

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix of the staging file written next to an output file
pub const STAGING_SUFFIX: &str = ".part";

/// Fail with [`Error::AlreadyExists`] if `path` exists and `overwrite` is false
pub fn ensure_can_write(path: &Path, overwrite: bool) -> Result<()> {
    if !overwrite && path.exists() {
        return Err(Error::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// `<path>.part`, in the same directory so the final rename stays on one filesystem
pub fn staging_path(path: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("output path has no file name: {}", path.display()),
        ))
    })?;
    let mut staged: OsString = file_name.to_os_string();
    staged.push(STAGING_SUFFIX);
    Ok(path.with_file_name(staged))
}

/// An output file being written under a temporary name
///
/// Content goes to [`StagedFile::staging_path`]. [`StagedFile::commit`] renames
/// it over the target; dropping the guard without committing deletes it. The
/// target path therefore either keeps its previous state or receives the
/// complete file, never a partial one.
#[derive(Debug)]
pub struct StagedFile {
    target: PathBuf,
    staging: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Check the target and reserve its staging path
    pub fn new(target: &Path, overwrite: bool) -> Result<Self> {
        ensure_can_write(target, overwrite)?;
        Ok(Self {
            target: target.to_path_buf(),
            staging: staging_path(target)?,
            committed: false,
        })
    }

    /// Where content is written until commit
    pub fn staging_path(&self) -> &Path {
        &self.staging
    }

    /// Move the staged file into place
    ///
    /// The caller must have flushed and closed its handle on the staging file.
    pub fn commit(mut self) -> Result<PathBuf> {
        std::fs::rename(&self.staging, &self.target)?;
        self.committed = true;
        Ok(self.target.clone())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.staging) {
            Ok(()) => {
                tracing::debug!(path = %self.staging.display(), "Removed incomplete output");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.staging.display(),
                    error = %e,
                    "Failed to remove incomplete output"
                );
            }
        }
    }
}

/// Extract a numeric video id from an id or a video URL
///
/// Accepts `123456`, `v123456`, `https://www.twitch.tv/videos/123456`,
/// `twitch.tv/<channel>/v/123456` and `https://player.twitch.tv/?video=v123456`.
pub fn parse_video_id(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let invalid = || Error::InvalidVideoId(input.to_string());

    if let Some(id) = numeric_id(trimmed) {
        return Ok(id.to_string());
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let url = url::Url::parse(&with_scheme).map_err(|_| invalid())?;
    let host = url.host_str().ok_or_else(invalid)?;
    if host != "twitch.tv" && !host.ends_with(".twitch.tv") {
        return Err(invalid());
    }

    if let Some((_, value)) = url.query_pairs().find(|(key, _)| key == "video")
        && let Some(id) = numeric_id(&value)
    {
        return Ok(id.to_string());
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|segment| !segment.is_empty()).collect())
        .unwrap_or_default();
    let id = match segments.as_slice() {
        ["videos", id, ..] => numeric_id(id),
        [_channel, "v" | "video", id, ..] => numeric_id(id),
        _ => None,
    };
    id.map(str::to_string).ok_or_else(invalid)
}

/// `123` and `v123` both yield `123`
fn numeric_id(s: &str) -> Option<&str> {
    let digits = s
        .strip_prefix('v')
        .or_else(|| s.strip_prefix('V'))
        .unwrap_or(s);
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(digits)
}

/// Default download path: `<video id>.json` in the current directory
pub fn default_download_path(video_id: &str) -> PathBuf {
    PathBuf::from(format!("{}.json", video_id))
}

/// Default transcript path next to `input`
///
/// `chat.json` becomes `chat.txt`; an input that is already `.txt` becomes
/// `<stem>-p.txt` so it is never overwritten by its own transcript.
pub fn default_transcript_path(input: &Path) -> PathBuf {
    let is_already_txt = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = if is_already_txt { "-p" } else { "" };
    input.with_file_name(format!("{}{}.txt", stem, suffix))
}

/// Whether `pattern` uses glob syntax (`*`, `?` or `[...]`) anywhere in the path
pub fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand a glob pattern into the regular files it matches, sorted by path
///
/// Wildcards may appear in any path component. A pattern without wildcards is
/// returned unchanged, whether or not the file exists.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    if !has_wildcards(pattern) {
        return Ok(vec![PathBuf::from(pattern)]);
    }

    let entries = glob::glob(pattern).map_err(|e| Error::Config {
        message: format!("invalid file pattern '{}': {}", pattern, e),
        key: None,
    })?;

    let mut matches = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::Io(e.into_error()))?;
        if path.is_file() {
            matches.push(path);
        }
    }
    matches.sort();
    Ok(matches)
}
