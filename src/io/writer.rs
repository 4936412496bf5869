//! PDF writing with atomic replacement.
//!
//! The merged document is written to a hidden staging file next to the
//! destination, flushed and synced, then renamed over the destination. A
//! reader of the storage root therefore sees either no output or a complete
//! one. The staging file is removed on every failure path.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use lopdf::Document;
use uuid::Uuid;

use crate::error::{ArtifactError, Result};
use crate::lifecycle::{STAGING_SUFFIX, discard};
use crate::utils::format_file_size;

/// Options for writing PDF files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Compress streams before writing.
    pub compress: bool,

    /// Renumber objects before writing.
    pub optimize: bool,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compress: true,
            optimize: true,
            buffer_size: 8192,
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,

    /// Whether compression was applied.
    pub compressed: bool,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// PDF writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Options in use.
    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Staging path used for an atomic write of `path`.
    ///
    /// The name is hidden and carries a fresh UUID, so concurrent writers of
    /// the same destination never share a staging file.
    pub fn staging_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output.pdf".to_string());
        let staging = format!(".{name}.{}{STAGING_SUFFIX}", Uuid::new_v4().simple());
        path.with_file_name(staging)
    }

    /// Save `doc` to `path` and return statistics about the write.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Write`] if the file cannot be created,
    /// serialized, synced or renamed into place. Nothing is left at `path`
    /// or at the staging path in that case.
    pub fn save(&self, mut doc: Document, path: &Path) -> Result<WriteStatistics> {
        let start = Instant::now();

        if self.options.compress {
            doc.compress();
        }
        if self.options.optimize {
            doc.renumber_objects();
        }

        let staging = Self::staging_path(path);

        if let Err(e) = self.write_file(&mut doc, &staging) {
            discard(&staging);
            return Err(e);
        }

        if let Err(e) = std::fs::rename(&staging, path) {
            discard(&staging);
            return Err(ArtifactError::write(path, e));
        }

        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let stats = WriteStatistics {
            write_time: start.elapsed(),
            file_size,
            output_path: path.to_path_buf(),
            compressed: self.options.compress,
        };

        tracing::debug!(
            path = %path.display(),
            size = %stats.format_file_size(),
            "wrote PDF"
        );

        Ok(stats)
    }

    fn write_file(&self, doc: &mut Document, write_path: &Path) -> Result<()> {
        let file = File::create(write_path).map_err(|e| ArtifactError::write(write_path, e))?;
        let mut writer = BufWriter::with_capacity(self.options.buffer_size, file);

        doc.save_to(&mut writer)
            .map_err(|e| ArtifactError::write(write_path, std::io::Error::other(e)))?;

        writer
            .flush()
            .map_err(|e| ArtifactError::write(write_path, e))?;

        let file = writer
            .into_inner()
            .map_err(|e| ArtifactError::write(write_path, e.into_error()))?;
        file.sync_all()
            .map_err(|e| ArtifactError::write(write_path, e))?;

        Ok(())
    }
}
