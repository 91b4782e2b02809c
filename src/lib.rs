//! # Payslip Split
//!
//! Splits a concatenated PDF of payslips (or any document made of consecutive
//! multi-page records) into one file per record, named after the record's own
//! content.
//!
//! ## Core Features
//!
//! - **Boundary detection**: a page opens a record when every extraction rule
//!   finds its token (employee name, pay period, ...)
//! - **Multi-page records**: continuation pages join the open record
//! - **Content-derived names**: `Martin_Paul_12-2025.pdf`, with collision suffixes
//! - **Fault isolation**: unreadable pages and failed writes are quarantined in
//!   an error directory and never stop the run
//! - **Audit ledger**: one entry per output file, exported as CSV or JSON
//!
//! ## Quick Start
//!
//! ```no_run
//! use payslip_split::config::{run_stamp, OutputLayout, SplitConfig};
//! use payslip_split::segmenter::{NoProgress, Segmenter};
//! use std::path::Path;
//!
//! # fn main() -> payslip_split::Result<()> {
//! let layout = OutputLayout::timestamped(Path::new("."), &run_stamp())?;
//! let ledger = Segmenter::payslips(SplitConfig::default())
//!     .split_file(Path::new("payslips.pdf"), &layout, &mut NoProgress)?;
//! println!("{}", ledger.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Page classification
pub mod classifier;
pub mod rules;

// Output naming and audit trail
pub mod ledger;
pub mod naming;

// Configuration
pub mod config;

// Page sources and writers
pub mod source;

// Segmentation
pub mod finalizer;
pub mod segmenter;

// Re-exports
pub use classifier::{BoundaryClassifier, RecordIdentity};
pub use config::{OutputLayout, SplitConfig};
pub use error::{Error, Result};
pub use ledger::{Ledger, PageRange, RecordOutcome, RecordStatus, RunSummary};
pub use segmenter::{NoProgress, Progress, ProgressObserver, Segmenter};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
