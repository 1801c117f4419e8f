//! Comment file to transcript conversion

use crate::error::{Error, Result};
use crate::model::parse_messages;
use crate::render::{RenderOptions, render};
use crate::utils::{StagedFile, default_transcript_path, expand_pattern};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Options for writing transcripts
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessOptions {
    /// Replace existing transcripts
    pub overwrite: bool,
    /// Line rendering switches
    pub render: RenderOptions,
}

/// One written transcript
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessSummary {
    /// Comment file that was read
    pub input: PathBuf,
    /// Transcript that was written
    pub output: PathBuf,
    /// Number of lines written
    pub lines: u64,
}

/// Render every comment in `input` into a transcript
///
/// `output` defaults to [`default_transcript_path`]. The transcript is staged
/// and only appears at its final path once every line is written, so a
/// malformed input never leaves a partial transcript behind.
pub fn process_file(
    input: &Path,
    output: Option<&Path>,
    options: &ProcessOptions,
) -> Result<ProcessSummary> {
    process_file_interruptible(input, output, options, &AtomicBool::new(false))
}

/// [`process_file`] that stops with [`Error::Interrupted`] once `interrupted` is set
///
/// The flag is checked before every line and before the transcript is moved
/// into place; an interrupted run leaves neither the transcript nor its
/// staging file behind.
pub fn process_file_interruptible(
    input: &Path,
    output: Option<&Path>,
    options: &ProcessOptions,
    interrupted: &AtomicBool,
) -> Result<ProcessSummary> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_transcript_path(input));
    let staged = StagedFile::new(&output, options.overwrite)?;
    let messages = parse_messages(input)?;

    let mut out = BufWriter::new(File::create(staged.staging_path())?);
    let mut lines = 0u64;
    for message in messages {
        check_interrupted(interrupted)?;
        writeln!(out, "{}", render(&message?, &options.render))?;
        lines += 1;
    }
    let file = out.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    file.sync_all()?;
    drop(file);
    check_interrupted(interrupted)?;

    let output = staged.commit()?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        lines,
        "Transcript written"
    );
    Ok(ProcessSummary {
        input: input.to_path_buf(),
        output,
        lines,
    })
}

/// Process every file matching a glob pattern
///
/// Each match gets its default transcript path. A pattern without wildcards
/// processes that single file. Stops at the first failing file.
pub fn process_pattern(pattern: &str, options: &ProcessOptions) -> Result<Vec<ProcessSummary>> {
    process_pattern_interruptible(pattern, options, &AtomicBool::new(false))
}

/// [`process_pattern`] that stops with [`Error::Interrupted`] once `interrupted` is set
///
/// Transcripts finished before the interruption are kept.
pub fn process_pattern_interruptible(
    pattern: &str,
    options: &ProcessOptions,
    interrupted: &AtomicBool,
) -> Result<Vec<ProcessSummary>> {
    let inputs = expand_pattern(pattern)?;
    if inputs.is_empty() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no files match '{}'", pattern),
        )));
    }

    inputs
        .iter()
        .map(|input| process_file_interruptible(input, None, options, interrupted))
        .collect()
}

fn check_interrupted(interrupted: &AtomicBool) -> Result<()> {
    if interrupted.load(Ordering::SeqCst) {
        return Err(Error::Interrupted);
    }
    Ok(())
}
