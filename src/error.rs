//! Error types for the splitter.
//!
//! Only [`Error::SourceOpen`] aborts a run. Extraction and persistence errors are
//! recovered per page or per record and end up in the ledger as `FAILED` entries.

use std::path::PathBuf;

/// Result type alias for splitter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while splitting a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source document could not be opened or parsed at all
    #[error("Cannot open source document {path}: {reason}")]
    SourceOpen {
        /// Path of the source document
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// Text of a single page could not be extracted
    #[error("Text extraction failed on page {}: {reason}", .page + 1)]
    Extraction {
        /// Zero-based page index
        page: usize,
        /// Underlying failure
        reason: String,
    },

    /// An output document could not be written
    #[error("Cannot write {path}: {reason}")]
    Persist {
        /// Destination that was being written
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// An extraction rule could not be built
    #[error("Invalid extraction rule: {0}")]
    InvalidRule(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON report serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Short variant name, used as the prefix of ledger notes.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::SourceOpen { .. } => "SourceOpenError",
            Error::Extraction { .. } => "ExtractionError",
            Error::Persist { .. } => "PersistError",
            Error::InvalidRule(_) => "InvalidRule",
            Error::Io(_) => "IoError",
            Error::Serialization(_) => "SerializationError",
        }
    }

    /// Render as `Kind: message` for the ledger note column.
    pub fn to_note(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}
