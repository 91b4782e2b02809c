//! Page text and page copying.
//!
//! The segmenter only talks to these two traits. [`PdfSource`] implements both
//! over a PDF file; [`MemorySource`] and [`RecordingWriter`] are in-memory
//! stand-ins for previews and tests.
//!
//! ## Example
//!
//! ```ignore
//! use payslip_split::source::{PdfSource, TextSource};
//!
//! let pdf = PdfSource::open("payslips.pdf")?;
//! for page in 0..pdf.page_count() {
//!     println!("{}", pdf.page_text(page)?);
//! }
//! ```

use crate::error::Result;
use std::path::Path;

mod memory;
mod pdf;

pub use memory::{MemoryPage, MemorySource, PageWrite, RecordingWriter};
pub use pdf::PdfSource;

/// Read access to the text of each page.
pub trait TextSource {
    /// Number of pages; fixed for the lifetime of the source.
    fn page_count(&self) -> usize;

    /// Text of page `index` (zero-based).
    ///
    /// Blank pages yield an empty string. An error means the page itself is
    /// unreadable.
    fn page_text(&self, index: usize) -> Result<String>;
}

/// Writes a new document made of a subset of the source pages.
pub trait PageWriter {
    /// Write pages `indices` (zero-based, in order) to `destination`.
    fn write_pages(&self, indices: &[usize], destination: &Path) -> Result<()>;
}
