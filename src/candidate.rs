//! Resolution of upload slots into merge candidates.
//!
//! Candidates are computed fresh on every inspection or merge because the
//! underlying files can change between calls.

use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use crate::error::{ArtifactError, Result};
use crate::record::{FileReference, Slot, UploadSlot};

/// Format of a file, determined from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Portable Document Format.
    Pdf,
    /// PNG raster image.
    Png,
    /// JPEG raster image.
    Jpeg,
    /// Anything else.
    Unsupported,
}

impl FileFormat {
    /// Classify `path` by its extension, ignoring case.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("pdf") => Self::Pdf,
            Some("png") => Self::Png,
            Some("jpg") | Some("jpeg") => Self::Jpeg,
            _ => Self::Unsupported,
        }
    }

    /// Whether files of this format can be merged.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    /// Whether files of this format need normalizing into a PDF first.
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Png | Self::Jpeg)
    }
}

/// One slot resolved against the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCandidate {
    /// Slot the file was uploaded to.
    pub slot: Slot,
    /// Reference as stored on the record.
    pub reference: FileReference,
    /// Absolute path under the storage root.
    pub path: PathBuf,
    /// Format from the extension.
    pub format: FileFormat,
    /// Whether a regular file exists at `path`.
    pub exists: bool,
}

impl MergeCandidate {
    /// Resolve `upload` against `root`.
    ///
    /// Returns `None` when the slot has no reference. Only metadata is
    /// consulted; the file is never opened.
    pub fn resolve(root: &Path, upload: &UploadSlot) -> Option<Self> {
        let reference = upload.file.clone()?;

        let candidate = match reference.resolve(root) {
            Some(path) => {
                let exists = path.is_file();
                let format = FileFormat::from_path(&path);
                Self {
                    slot: upload.slot,
                    reference,
                    path,
                    format,
                    exists,
                }
            }
            None => Self {
                slot: upload.slot,
                format: FileFormat::from_path(Path::new(reference.as_str())),
                path: PathBuf::from(reference.as_str()),
                reference,
                exists: false,
            },
        };

        Some(candidate)
    }

    /// Whether the candidate can take part in a merge.
    pub fn is_mergeable(&self) -> bool {
        self.exists && self.format.is_supported()
    }

    /// The error that excludes this candidate, if any.
    pub fn exclusion(&self) -> Option<ArtifactError> {
        if !self.exists {
            Some(ArtifactError::read(
                self.path.clone(),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ))
        } else if !self.format.is_supported() {
            Some(ArtifactError::unsupported_format(self.path.clone()))
        } else {
            None
        }
    }
}

/// The transient unit of work for one merge call.
#[derive(Debug, Clone)]
pub struct MergeJob {
    /// Unique id of this job; also the token in every temp file name.
    pub id: Uuid,
    /// Record being merged.
    pub record_id: i64,
    /// Mergeable candidates in slot order.
    pub candidates: Vec<MergeCandidate>,
    /// File name of the merged output, relative to the storage root.
    pub output_name: String,
}

impl MergeJob {
    /// Plan a job from resolved candidates.
    ///
    /// Unusable candidates are filtered out here, once. An empty result is
    /// an error rather than an empty merge.
    pub fn plan(
        id: Uuid,
        record_id: i64,
        candidates: impl IntoIterator<Item = MergeCandidate>,
        output_name: impl Into<String>,
    ) -> Result<Self> {
        let output_name = validate_output_name(output_name.into())?;

        let candidates: Vec<MergeCandidate> = candidates
            .into_iter()
            .filter(|candidate| match candidate.exclusion() {
                None => true,
                Some(reason) => {
                    tracing::warn!(slot = %candidate.slot, %reason, "skipping slot");
                    false
                }
            })
            .collect();

        if candidates.is_empty() {
            return Err(ArtifactError::NoValidInputs);
        }

        Ok(Self {
            id,
            record_id,
            candidates,
            output_name,
        })
    }

    /// Number of candidates that need normalizing.
    pub fn image_count(&self) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.format.is_image())
            .count()
    }
}

fn validate_output_name(name: String) -> Result<String> {
    let path = Path::new(&name);
    let is_plain = path.file_name().is_some_and(|file| file == name.as_str())
        && !name.contains(['/', '\\'])
        && !name.starts_with('.');

    if is_plain && FileFormat::from_path(path) == FileFormat::Pdf {
        Ok(name)
    } else {
        Err(ArtifactError::InvalidOutputName { name })
    }
}
