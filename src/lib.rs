//! casefile - consolidate a record's uploaded documents into one PDF.
//!
//! A record references up to seven uploads (scans and photographs, as PDF,
//! PNG or JPEG). This library:
//!
//! - reports which of them are usable ([`availability`])
//! - turns images into single-page PDFs ([`normalize`])
//! - concatenates everything in slot order into one document ([`merge`])
//! - keeps intermediate files from outliving the job ([`lifecycle`])
//!
//! # Examples
//!
//! ```no_run
//! use casefile::{CaseFileEngine, CaseRecord, Config, Slot};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = CaseFileEngine::new(Config::new("/srv/uploads"));
//! let record = CaseRecord::new(42)
//!     .with_label("Rapat Koordinasi")
//!     .with(Slot::Disposition, "disposisi.pdf")
//!     .with(Slot::Documentation, "foto.jpg");
//!
//! if engine.inspect(&record).can_merge {
//!     let file_name = engine.merge(&record).await?;
//!     println!("Merged into {file_name}");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod availability;
pub mod candidate;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod lifecycle;
pub mod logging;
pub mod merge;
pub mod normalize;
pub mod record;
pub mod utils;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types
pub use availability::{AvailabilityInspector, AvailabilityReport};
pub use config::Config;
pub use engine::CaseFileEngine;
pub use error::{ArtifactError, MergeError, Result};
pub use merge::{MergeOrchestrator, MergeOutcome};
pub use record::{CaseRecord, Slot, UploadSlot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
