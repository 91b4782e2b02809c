//! Append-only audit ledger of page and record outcomes.
//!
//! The ledger is the source of truth for a run: the exported report and the
//! run summary are both computed from it.

use crate::classifier::RecordIdentity;
use crate::error::Result;
use serde::{Serialize, Serializer};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Placeholder for absent values in the tabular report.
pub const ABSENT: &str = "-";

/// Default delimiter of the tabular report.
pub const DEFAULT_DELIMITER: char = ';';

/// Ascending zero-based page indices belonging to one outcome.
///
/// A record's range skips pages that failed extraction while it was open;
/// those pages get their own entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRange {
    pages: Vec<usize>,
}

impl PageRange {
    /// Range holding a single page.
    pub fn single(page: usize) -> Self {
        Self { pages: vec![page] }
    }

    /// Add the next page. Pages must be pushed in ascending order.
    pub fn push(&mut self, page: usize) {
        debug_assert!(self.pages.last().map_or(true, |&last| page > last));
        self.pages.push(page);
    }

    /// First page (zero-based); the page that opened the record.
    pub fn first(&self) -> usize {
        self.pages[0]
    }

    /// Last page (zero-based).
    pub fn last(&self) -> usize {
        self.pages[self.pages.len() - 1]
    }

    /// 1-based number of the first page, as used in file names.
    pub fn start_page_number(&self) -> usize {
        self.first() + 1
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Always false; a range is never empty.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Page indices in order.
    pub fn indices(&self) -> &[usize] {
        &self.pages
    }

    /// 1-based rendering: `"3"`, `"1-2"`, or `"1-2,4"` when a failed page was
    /// carved out of the record.
    pub fn render(&self) -> String {
        let mut runs: Vec<(usize, usize)> = Vec::new();
        for &page in &self.pages {
            match runs.last_mut() {
                Some((_, end)) if *end + 1 == page => *end = page,
                _ => runs.push((page, page)),
            }
        }
        runs.iter()
            .map(|&(start, end)| {
                if start == end {
                    format!("{}", start + 1)
                } else {
                    format!("{}-{}", start + 1, end + 1)
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for PageRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.render())
    }
}

/// Disposition of one range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    /// Complete identity, written to the output directory
    Resolved,
    /// No complete identity, written to the error directory
    Unresolved,
    /// Continuation page before any record was opened
    Orphan,
    /// Extraction or persistence error
    Failed,
}

impl RecordStatus {
    /// Report spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Resolved => "RESOLVED",
            RecordStatus::Unresolved => "UNRESOLVED",
            RecordStatus::Orphan => "ORPHAN",
            RecordStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of processing one page range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordOutcome {
    /// Disposition
    pub status: RecordStatus,
    /// Identity, present for records opened by a boundary page
    pub identity: Option<RecordIdentity>,
    /// Pages covered
    pub pages: PageRange,
    /// Written file, if any write succeeded
    pub output_path: Option<PathBuf>,
    /// Free text; carries the error for `Failed` entries
    pub note: String,
}

impl RecordOutcome {
    /// File name component of [`output_path`](Self::output_path).
    pub fn output_file(&self) -> Option<String> {
        self.output_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }
}

/// Run-level counters, always derived from a ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Pages accounted for across all entries
    pub total_pages: usize,
    /// `RESOLVED` entries
    pub resolved: usize,
    /// `UNRESOLVED` entries
    pub unresolved: usize,
    /// `ORPHAN` entries
    pub orphans: usize,
    /// `FAILED` entries
    pub failed: usize,
    /// Pages sent to the error directory as unresolved or orphan
    pub fallback_pages: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pages:          {}", self.total_pages)?;
        writeln!(f, "Resolved:       {}", self.resolved)?;
        writeln!(f, "Unresolved:     {}", self.unresolved)?;
        writeln!(f, "Orphans:        {}", self.orphans)?;
        writeln!(f, "Failed:         {}", self.failed)?;
        write!(f, "Fallback pages: {}", self.fallback_pages)
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    fields: &'a [String],
    summary: RunSummary,
    entries: &'a [RecordOutcome],
}

/// Ordered, append-only log of outcomes for one run.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    fields: Vec<String>,
    entries: Vec<RecordOutcome>,
}

impl Ledger {
    /// Empty ledger whose identity columns are `fields`, in order.
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            entries: Vec::new(),
        }
    }

    /// Append an outcome.
    pub fn push(&mut self, outcome: RecordOutcome) {
        self.entries.push(outcome);
    }

    /// Identity column names.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Entries in emission order.
    pub fn entries(&self) -> &[RecordOutcome] {
        &self.entries
    }

    /// Iterate entries in emission order.
    pub fn iter(&self) -> std::slice::Iter<'_, RecordOutcome> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold the entries into run counters.
    pub fn summary(&self) -> RunSummary {
        self.entries
            .iter()
            .fold(RunSummary::default(), |mut summary, entry| {
                summary.total_pages += entry.pages.len();
                match entry.status {
                    RecordStatus::Resolved => summary.resolved += 1,
                    RecordStatus::Unresolved => {
                        summary.unresolved += 1;
                        summary.fallback_pages += entry.pages.len();
                    },
                    RecordStatus::Orphan => {
                        summary.orphans += 1;
                        summary.fallback_pages += entry.pages.len();
                    },
                    RecordStatus::Failed => summary.failed += 1,
                }
                summary
            })
    }

    /// Report header: status, identity fields, pages, output_file, output_path, note.
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["status".to_string()];
        header.extend(self.fields.iter().cloned());
        header.extend(
            ["pages", "output_file", "output_path", "note"]
                .iter()
                .map(|s| s.to_string()),
        );
        header
    }

    fn row(&self, entry: &RecordOutcome) -> Vec<String> {
        let mut row = vec![entry.status.as_str().to_string()];
        for field in &self.fields {
            let value = entry
                .identity
                .as_ref()
                .and_then(|identity| identity.get(field))
                .unwrap_or(ABSENT);
            row.push(value.to_string());
        }
        row.push(entry.pages.render());
        row.push(entry.output_file().unwrap_or_else(|| ABSENT.to_string()));
        row.push(
            entry
                .output_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ABSENT.to_string()),
        );
        row.push(entry.note.clone());
        row
    }

    /// Write the delimiter-separated report, one row per entry in ledger order.
    pub fn write_delimited<W: Write>(&self, out: &mut W, delimiter: char) -> Result<()> {
        write_line(out, &self.header(), delimiter)?;
        for entry in &self.entries {
            write_line(out, &self.row(entry), delimiter)?;
        }
        Ok(())
    }

    /// Export the report to `path`, creating parent directories.
    pub fn export_csv(&self, path: &Path, delimiter: char) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(path)?);
        self.write_delimited(&mut out, delimiter)?;
        out.flush()?;
        log::info!("Report written to {}", path.display());
        Ok(())
    }

    /// Pretty JSON with the identity fields, the summary and every entry.
    pub fn to_json(&self) -> Result<String> {
        let report = JsonReport {
            fields: &self.fields,
            summary: self.summary(),
            entries: &self.entries,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a RecordOutcome;
    type IntoIter = std::slice::Iter<'a, RecordOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn escape_field(value: &str, delimiter: char) -> String {
    if value.contains(delimiter)
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn write_line<W: Write>(out: &mut W, fields: &[String], delimiter: char) -> Result<()> {
    let line = fields
        .iter()
        .map(|f| escape_field(f, delimiter))
        .collect::<Vec<_>>()
        .join(&delimiter.to_string());
    // RFC 4180 row terminator
    out.write_all(line.as_bytes())?;
    out.write_all(b"\r\n")?;
    Ok(())
}
