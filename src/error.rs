//! Error types for casefile.
//!
//! Errors fall into two tiers:
//!
//! - **Artifact errors** ([`ArtifactError`]) describe what went wrong with a
//!   single file: it could not be read, its format is not supported, its
//!   bytes could not be turned into a page, or an output could not be written.
//! - **Merge errors** ([`MergeError`]) wrap an artifact error with the job
//!   context (job id, record id, offending slot) once it has aborted a merge.
//!
//! Read and format errors met while resolving a record's slots only exclude
//! that slot; everything else aborts the whole job.

use std::io;
use std::path::PathBuf;

use uuid::Uuid;

use crate::record::Slot;

/// Result type alias for single-artifact operations.
pub type Result<T> = std::result::Result<T, ArtifactError>;

/// Failure of an operation on one file.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// A referenced file cannot be opened or read.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// File extension is outside pdf, png, jpg and jpeg.
    #[error("Unsupported file format: {}", path.display())]
    UnsupportedFormat {
        /// Offending file.
        path: PathBuf,
    },

    /// Image bytes cannot be decoded into a page.
    #[error("Failed to convert image {} into a page: {reason}", path.display())]
    Conversion {
        /// Source image.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },

    /// A PDF source cannot be parsed or has no pages.
    #[error("Corrupted or invalid PDF {}: {details}", path.display())]
    CorruptPdf {
        /// Source PDF.
        path: PathBuf,
        /// What was wrong with it.
        details: String,
    },

    /// A PDF source is encrypted.
    #[error("PDF is encrypted and cannot be merged: {}", path.display())]
    EncryptedPdf {
        /// Source PDF.
        path: PathBuf,
    },

    /// The output page tree could not be assembled.
    #[error("Failed to assemble merged document: {reason}")]
    Concatenation {
        /// What went wrong.
        reason: String,
    },

    /// An output (temporary or final) cannot be written.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// No slot survived resolution.
    #[error("No valid files found to merge (need PDF or image files)")]
    NoValidInputs,

    /// Output name is not a plain `.pdf` file name.
    #[error("Invalid output file name: {name}")]
    InvalidOutputName {
        /// Rejected name.
        name: String,
    },

    /// The worker running the job stopped before finishing.
    #[error("Merge job was interrupted: {reason}")]
    Interrupted {
        /// Join error message.
        reason: String,
    },
}

impl ArtifactError {
    /// Create a Read error.
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create an UnsupportedFormat error.
    pub fn unsupported_format(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedFormat { path: path.into() }
    }

    /// Create a Conversion error.
    pub fn conversion(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Conversion {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a CorruptPdf error.
    pub fn corrupt_pdf(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self::CorruptPdf {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Create a Concatenation error.
    pub fn concatenation(reason: impl Into<String>) -> Self {
        Self::Concatenation {
            reason: reason.into(),
        }
    }

    /// Create a Write error.
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Whether this error only excludes a slot during resolution instead of
    /// failing the job.
    pub fn is_exclusion(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::UnsupportedFormat { .. })
    }

    /// Whether the error comes from the state of the record rather than from
    /// an I/O fault.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::NoValidInputs | Self::InvalidOutputName { .. })
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Read { .. } => 2,
            Self::UnsupportedFormat { .. } => 2,
            Self::Conversion { .. } => 3,
            Self::CorruptPdf { .. } => 3,
            Self::EncryptedPdf { .. } => 3,
            Self::NoValidInputs => 4,
            Self::InvalidOutputName { .. } => 1,
            Self::Write { .. } => 5,
            Self::Concatenation { .. } => 6,
            Self::Interrupted { .. } => 6,
        }
    }
}

/// A merge job that failed, with enough context to log it usefully.
#[derive(Debug, thiserror::Error)]
#[error("Failed to merge files for record {record_id} (job {job_id}){}: {cause}", slot_context(.slot))]
pub struct MergeError {
    /// Job that failed.
    pub job_id: Uuid,
    /// Record the job was merging.
    pub record_id: i64,
    /// Slot whose file caused the failure, when one did.
    pub slot: Option<Slot>,
    /// Original failure.
    #[source]
    pub cause: ArtifactError,
}

impl MergeError {
    /// Wrap `cause` with job context.
    pub fn new(job_id: Uuid, record_id: i64, slot: Option<Slot>, cause: ArtifactError) -> Self {
        Self {
            job_id,
            record_id,
            slot,
            cause,
        }
    }

    /// Returns a reference to the original failure.
    pub fn cause(&self) -> &ArtifactError {
        &self.cause
    }

    /// Whether the job failed because nothing was left to merge.
    pub fn is_no_valid_inputs(&self) -> bool {
        matches!(self.cause, ArtifactError::NoValidInputs)
    }

    /// Process exit code, taken from the cause.
    pub fn exit_code(&self) -> i32 {
        self.cause.exit_code()
    }
}

fn slot_context(slot: &Option<Slot>) -> String {
    match slot {
        Some(slot) => format!(" in slot {slot}"),
        None => String::new(),
    }
}
