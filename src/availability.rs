//! Read-only report of which slots of a record can be merged.
//!
//! Only metadata and extensions are consulted; no file is opened. The
//! report is recomputed on every call.

use std::path::PathBuf;

use serde::Serialize;

use crate::candidate::MergeCandidate;
use crate::record::{CaseRecord, Slot, UploadSlot};

/// Why a slot is not available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExclusionReason {
    /// The record has no reference for the slot.
    NotProvided,
    /// The reference does not name a file in the storage root.
    NotFound,
    /// The file's extension is not pdf, png, jpg or jpeg.
    UnsupportedFormat,
}

/// A slot whose file can be merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableFile {
    /// Display name of the slot.
    pub slot_name: Slot,
    /// Reference as stored on the record.
    pub path: String,
}

/// A slot that will be skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludedSlot {
    /// Display name of the slot.
    pub slot_name: Slot,
    /// Why it is skipped.
    pub reason: ExclusionReason,
}

/// Availability of a record's slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    /// Number of slots inspected.
    pub total: usize,
    /// Slots whose file can be merged.
    pub available: usize,
    /// `total - available`.
    pub missing: usize,
    /// Available files in slot order.
    pub files: Vec<AvailableFile>,
    /// Whether at least one slot is available.
    pub can_merge: bool,
    /// Unavailable slots in slot order.
    pub excluded: Vec<ExcludedSlot>,
}

/// Checks slots against the storage root.
#[derive(Debug, Clone)]
pub struct AvailabilityInspector {
    storage_root: PathBuf,
}

impl AvailabilityInspector {
    /// Create an inspector for `storage_root`.
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
        }
    }

    /// Inspect all seven slots of `record`.
    pub fn inspect(&self, record: &CaseRecord) -> AvailabilityReport {
        self.inspect_slots(&record.slots())
    }

    /// Inspect an explicit list of slots.
    pub fn inspect_slots(&self, slots: &[UploadSlot]) -> AvailabilityReport {
        let mut files = Vec::new();
        let mut excluded = Vec::new();

        for upload in slots {
            let reason = match MergeCandidate::resolve(&self.storage_root, upload) {
                None => Some(ExclusionReason::NotProvided),
                Some(c) if !c.exists => Some(ExclusionReason::NotFound),
                Some(c) if !c.format.is_supported() => Some(ExclusionReason::UnsupportedFormat),
                Some(c) => {
                    files.push(AvailableFile {
                        slot_name: c.slot,
                        path: c.reference.as_str().to_string(),
                    });
                    None
                }
            };

            if let Some(reason) = reason {
                excluded.push(ExcludedSlot {
                    slot_name: upload.slot,
                    reason,
                });
            }
        }

        let total = slots.len();
        let available = files.len();

        AvailabilityReport {
            total,
            available,
            missing: total - available,
            files,
            can_merge: available > 0,
            excluded,
        }
    }
}
