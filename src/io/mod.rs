//! PDF input and output.
//!
//! - [`reader`]: load source PDFs and check they can be merged
//! - [`writer`]: write the merged document atomically

pub mod reader;
pub mod writer;

pub use reader::{LoadedPdf, PdfReader};
pub use writer::{PdfWriter, WriteOptions, WriteStatistics};
