//! PDF-backed text source and page writer.

use super::{PageWriter, TextSource};
use crate::error::{Error, Result};
use lopdf::Document;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A loaded PDF document.
///
/// Text comes from `lopdf`'s content-stream text extraction. Writing a subset
/// clones the document, deletes every other page, prunes unreferenced objects
/// and saves the result, so kept pages are copied unchanged.
#[derive(Debug)]
pub struct PdfSource {
    path: PathBuf,
    doc: Document,
    /// PDF page numbers (1-based) in page-tree order
    page_numbers: Vec<u32>,
}

impl PdfSource {
    /// Open and parse a PDF file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceOpen`] if the file is missing or is not a
    /// readable PDF. Nothing has been written at that point.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path).map_err(|e| Error::SourceOpen {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_document(path.to_path_buf(), doc))
    }

    /// Parse a PDF held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes).map_err(|e| Error::SourceOpen {
            path: PathBuf::from("<memory>"),
            reason: e.to_string(),
        })?;
        Ok(Self::from_document(PathBuf::from("<memory>"), doc))
    }

    fn from_document(path: PathBuf, doc: Document) -> Self {
        let page_numbers = doc.get_pages().keys().copied().collect();
        Self {
            path,
            doc,
            page_numbers,
        }
    }

    /// Path the document was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn page_number(&self, index: usize) -> Option<u32> {
        self.page_numbers.get(index).copied()
    }
}

impl TextSource for PdfSource {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        let number = self.page_number(index).ok_or_else(|| Error::Extraction {
            page: index,
            reason: format!(
                "page index out of range (document has {} pages)",
                self.page_numbers.len()
            ),
        })?;
        self.doc
            .extract_text(&[number])
            .map_err(|e| Error::Extraction {
                page: index,
                reason: e.to_string(),
            })
    }
}

impl PageWriter for PdfSource {
    fn write_pages(&self, indices: &[usize], destination: &Path) -> Result<()> {
        let persist_error = |reason: String| Error::Persist {
            path: destination.to_path_buf(),
            reason,
        };

        if indices.is_empty() {
            return Err(persist_error("no pages selected".to_string()));
        }
        let mut keep = HashSet::with_capacity(indices.len());
        for &index in indices {
            let number = self.page_number(index).ok_or_else(|| {
                persist_error(format!(
                    "page index {} out of range (document has {} pages)",
                    index,
                    self.page_numbers.len()
                ))
            })?;
            keep.insert(number);
        }

        let mut doc = self.doc.clone();
        let dropped: Vec<u32> = self
            .page_numbers
            .iter()
            .copied()
            .filter(|n| !keep.contains(n))
            .collect();
        if !dropped.is_empty() {
            doc.delete_pages(&dropped);
            doc.prune_objects();
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| persist_error(e.to_string()))?;
        fs::write(destination, bytes).map_err(|e| persist_error(e.to_string()))?;

        log::debug!("Wrote {} page(s) to {}", indices.len(), destination.display());
        Ok(())
    }
}
