//! Streaming JSON array writer
//!
//! Elements are appended as they arrive; nothing is buffered beyond the
//! `BufWriter`. The array is written to a staging file that only becomes the
//! output once [`JsonArrayWriter::finish`] has closed and synced it.

use crate::error::Result;
use crate::utils::StagedFile;
use serde_json::value::RawValue;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Writes one JSON array element at a time
///
/// Dropping the writer before `finish` deletes the staging file.
#[derive(Debug)]
pub struct JsonArrayWriter {
    // Declared before `staged` so the handle is closed before the file is removed
    out: BufWriter<File>,
    staged: StagedFile,
    elements: u64,
}

impl JsonArrayWriter {
    /// Start an array destined for `target`
    pub async fn create(target: &Path, overwrite: bool) -> Result<Self> {
        let staged = StagedFile::new(target, overwrite)?;
        let file = File::create(staged.staging_path()).await?;
        let mut out = BufWriter::new(file);
        out.write_all(b"[").await?;
        Ok(Self {
            out,
            staged,
            elements: 0,
        })
    }

    /// Append one element verbatim
    pub async fn write_element(&mut self, element: &RawValue) -> Result<()> {
        let separator: &[u8] = if self.elements == 0 { b"\n" } else { b",\n" };
        self.out.write_all(separator).await?;
        self.out.write_all(element.get().as_bytes()).await?;
        self.elements += 1;
        Ok(())
    }

    /// Number of elements written so far
    pub fn elements(&self) -> u64 {
        self.elements
    }

    /// Close the array, sync it to disk and move it into place
    pub async fn finish(mut self) -> Result<PathBuf> {
        let close: &[u8] = if self.elements == 0 { b"]\n" } else { b"\n]\n" };
        self.out.write_all(close).await?;
        self.out.flush().await?;
        self.out.get_ref().sync_all().await?;

        let Self { out, staged, .. } = self;
        drop(out);
        staged.commit()
    }
}
