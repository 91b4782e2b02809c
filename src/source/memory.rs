//! In-memory text source and recording page writer.

use super::{PageWriter, TextSource};
use crate::error::{Error, Result};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// One page of a [`MemorySource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryPage {
    /// Page with extractable (possibly empty) text
    Text(String),
    /// Page whose extraction fails with the given reason
    Unreadable(String),
}

/// Text source backed by a list of pages.
///
/// ```
/// use payslip_split::source::{MemorySource, TextSource};
///
/// let source = MemorySource::new()
///     .with_page("Period 12-2025 AAA-001")
///     .with_unreadable_page("corrupt content stream")
///     .with_page("");
/// assert_eq!(source.page_count(), 3);
/// assert!(source.page_text(1).is_err());
/// assert_eq!(source.page_text(2).unwrap(), "");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pages: Vec<MemoryPage>,
}

impl MemorySource {
    /// Source without pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// One readable page per text.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: texts
                .into_iter()
                .map(|t| MemoryPage::Text(t.into()))
                .collect(),
        }
    }

    /// Append a readable page.
    pub fn with_page(mut self, text: impl Into<String>) -> Self {
        self.pages.push(MemoryPage::Text(text.into()));
        self
    }

    /// Append a page whose extraction fails.
    pub fn with_unreadable_page(mut self, reason: impl Into<String>) -> Self {
        self.pages.push(MemoryPage::Unreadable(reason.into()));
        self
    }
}

impl TextSource for MemorySource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        match self.pages.get(index) {
            Some(MemoryPage::Text(text)) => Ok(text.clone()),
            Some(MemoryPage::Unreadable(reason)) => Err(Error::Extraction {
                page: index,
                reason: reason.clone(),
            }),
            None => Err(Error::Extraction {
                page: index,
                reason: format!("page index out of range (source has {} pages)", self.pages.len()),
            }),
        }
    }
}

/// A write performed through a [`RecordingWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWrite {
    /// Pages written, in order
    pub pages: Vec<usize>,
    /// Destination file
    pub destination: PathBuf,
}

/// Page writer that records writes instead of producing files.
///
/// Destinations whose path contains one of the configured patterns fail with
/// [`Error::Persist`] and are not recorded.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    writes: RefCell<Vec<PageWrite>>,
    failing: Vec<String>,
}

impl RecordingWriter {
    /// Writer that accepts every destination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail writes whose destination path contains `pattern`.
    pub fn with_failure_on(mut self, pattern: impl Into<String>) -> Self {
        self.failing.push(pattern.into());
        self
    }

    /// Successful writes so far, in order.
    pub fn writes(&self) -> Vec<PageWrite> {
        self.writes.borrow().clone()
    }
}

impl PageWriter for RecordingWriter {
    fn write_pages(&self, indices: &[usize], destination: &Path) -> Result<()> {
        let shown = destination.display().to_string();
        if let Some(pattern) = self.failing.iter().find(|p| shown.contains(p.as_str())) {
            return Err(Error::Persist {
                path: destination.to_path_buf(),
                reason: format!("write refused (matched '{}')", pattern),
            });
        }
        self.writes.borrow_mut().push(PageWrite {
            pages: indices.to_vec(),
            destination: destination.to_path_buf(),
        });
        Ok(())
    }
}
