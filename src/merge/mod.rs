//! PDF merging.
//!
//! - [`merger`]: page-tree concatenation of loaded documents
//! - [`orchestrator`]: one merge job from record slots to written output

pub mod merger;
pub mod orchestrator;

pub use merger::PdfConcatenator;
pub use orchestrator::{MergeOrchestrator, MergeOutcome, SourceSummary};
