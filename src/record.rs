//! Plain-data view of a case record and its seven upload slots.
//!
//! The record layer hands records over as plain data; nothing here touches
//! the filesystem. Resolution against the storage root lives in
//! [`crate::candidate`].

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One of the seven named upload roles of a record, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    /// Disposition letter.
    Disposition,
    /// Hotel and flight itinerary.
    Itinerary,
    /// Activity material.
    Material,
    /// Photo documentation.
    Documentation,
    /// Activity report.
    Report,
    /// Final travel order.
    #[serde(rename = "Final-Travel-Order")]
    FinalTravelOrder,
    /// Boarding pass.
    #[serde(rename = "Boarding-Pass")]
    BoardingPass,
}

impl Slot {
    /// All slots in the order their pages appear in a merged file.
    pub const ALL: [Slot; 7] = [
        Slot::Disposition,
        Slot::Itinerary,
        Slot::Material,
        Slot::Documentation,
        Slot::Report,
        Slot::FinalTravelOrder,
        Slot::BoardingPass,
    ];

    /// Display name of the slot.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Disposition => "Disposition",
            Self::Itinerary => "Itinerary",
            Self::Material => "Material",
            Self::Documentation => "Documentation",
            Self::Report => "Report",
            Self::FinalTravelOrder => "Final-Travel-Order",
            Self::BoardingPass => "Boarding-Pass",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller-supplied path of an uploaded file, relative to the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileReference(String);

impl FileReference {
    /// Wrap a reference. Blank strings mean "not provided".
    pub fn new(reference: impl Into<String>) -> Option<Self> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            None
        } else {
            Some(Self(reference))
        }
    }

    /// The reference as given by the caller.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join the reference onto `root`.
    ///
    /// Leading separators are ignored. Returns `None` when the reference
    /// could name something outside `root` (`..`, a drive prefix).
    pub fn resolve(&self, root: &Path) -> Option<PathBuf> {
        let relative = Path::new(self.0.trim_start_matches(['/', '\\']));

        let mut resolved = root.to_path_buf();
        let mut pushed = false;
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    pushed = true;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        pushed.then_some(resolved)
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A slot paired with its (optional) file reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSlot {
    /// Role of the file.
    pub slot: Slot,
    /// Uploaded file, if any.
    pub file: Option<FileReference>,
}

impl UploadSlot {
    /// Pair `slot` with a raw reference; blank references count as absent.
    pub fn new(slot: Slot, reference: Option<&str>) -> Self {
        Self {
            slot,
            file: reference.and_then(FileReference::new),
        }
    }
}

/// A case record as handed over by the record layer.
///
/// Accepts the original column names as aliases so rows can be passed
/// through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    /// Record identifier.
    pub id: i64,

    /// Descriptive text, used in the merged file name.
    #[serde(default, alias = "agendaDinas")]
    pub label: Option<String>,

    /// Disposition letter.
    #[serde(default, alias = "uploadDisposisi")]
    pub disposition: Option<String>,

    /// Hotel and flight itinerary.
    #[serde(default, alias = "uploadEtiket")]
    pub itinerary: Option<String>,

    /// Activity material.
    #[serde(default, alias = "uploadMateri")]
    pub material: Option<String>,

    /// Photo documentation.
    #[serde(default, alias = "uploadDokumentasi")]
    pub documentation: Option<String>,

    /// Activity report.
    #[serde(default, alias = "uploadLaporan")]
    pub report: Option<String>,

    /// Final travel order.
    #[serde(default, alias = "uploadSppdFinal")]
    pub final_travel_order: Option<String>,

    /// Boarding pass.
    #[serde(default, alias = "uploadBoardingPass")]
    pub boarding_pass: Option<String>,
}

impl CaseRecord {
    /// Create an empty record.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// The record's seven slots in canonical order.
    pub fn slots(&self) -> [UploadSlot; 7] {
        Slot::ALL.map(|slot| UploadSlot::new(slot, self.reference(slot)))
    }

    /// Raw reference stored for `slot`.
    pub fn reference(&self, slot: Slot) -> Option<&str> {
        let field = match slot {
            Slot::Disposition => &self.disposition,
            Slot::Itinerary => &self.itinerary,
            Slot::Material => &self.material,
            Slot::Documentation => &self.documentation,
            Slot::Report => &self.report,
            Slot::FinalTravelOrder => &self.final_travel_order,
            Slot::BoardingPass => &self.boarding_pass,
        };
        field.as_deref()
    }

    /// Set the reference stored for `slot`.
    pub fn set_reference(&mut self, slot: Slot, reference: Option<impl Into<String>>) {
        let value = reference.map(Into::into);
        match slot {
            Slot::Disposition => self.disposition = value,
            Slot::Itinerary => self.itinerary = value,
            Slot::Material => self.material = value,
            Slot::Documentation => self.documentation = value,
            Slot::Report => self.report = value,
            Slot::FinalTravelOrder => self.final_travel_order = value,
            Slot::BoardingPass => self.boarding_pass = value,
        }
    }

    /// Builder-style [`CaseRecord::set_reference`].
    pub fn with(mut self, slot: Slot, reference: impl Into<String>) -> Self {
        self.set_reference(slot, Some(reference));
        self
    }

    /// Builder-style label setter.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
