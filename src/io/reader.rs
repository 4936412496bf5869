//! Loading of source PDFs.
//!
//! Loading is synchronous; the orchestrator already runs the whole job on a
//! blocking worker.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use lopdf::Document;

use crate::error::{ArtifactError, Result};

/// A loaded PDF document with metadata.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,

    /// Time taken to load the document.
    pub load_time: Duration,

    /// File size in bytes.
    pub file_size: u64,
}

impl LoadedPdf {
    fn new(document: Document, path: PathBuf, load_time: Duration) -> Self {
        let page_count = document.get_pages().len();
        let file_size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

        Self {
            document,
            path,
            page_count,
            load_time,
            file_size,
        }
    }
}

/// PDF reader that rejects encrypted, unparseable and empty documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfReader;

impl PdfReader {
    /// Create a reader.
    pub fn new() -> Self {
        Self
    }

    /// Load a single PDF document.
    ///
    /// # Errors
    ///
    /// - [`ArtifactError::Read`] if the file cannot be opened
    /// - [`ArtifactError::EncryptedPdf`] if the document is encrypted
    /// - [`ArtifactError::CorruptPdf`] if it does not parse or has no pages
    pub fn load(&self, path: &Path) -> Result<LoadedPdf> {
        let start = Instant::now();

        // Open first so a vanished file reports as a read error, not a parse error.
        let file = std::fs::File::open(path).map_err(|e| ArtifactError::read(path, e))?;

        let document = Document::load_from(file).map_err(|e| {
            let message = e.to_string();
            let lowered = message.to_ascii_lowercase();
            if lowered.contains("encrypt") || lowered.contains("password") || lowered.contains("decrypt") {
                ArtifactError::EncryptedPdf {
                    path: path.to_path_buf(),
                }
            } else {
                ArtifactError::corrupt_pdf(path, message)
            }
        })?;

        if document.is_encrypted() {
            return Err(ArtifactError::EncryptedPdf {
                path: path.to_path_buf(),
            });
        }

        if document.get_pages().is_empty() {
            return Err(ArtifactError::corrupt_pdf(path, "PDF has no pages"));
        }

        let loaded = LoadedPdf::new(document, path.to_path_buf(), start.elapsed());
        tracing::debug!(
            path = %loaded.path.display(),
            pages = loaded.page_count,
            bytes = loaded.file_size,
            "loaded PDF"
        );

        Ok(loaded)
    }
}
