//! Run configuration and output directory layout.

use crate::error::Result;
use crate::ledger::DEFAULT_DELIMITER;
use std::fs;
use std::path::{Path, PathBuf};

/// Splitting options.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Group continuation pages with the preceding boundary page (default).
    /// When false every page becomes its own file.
    pub group_multipage: bool,

    /// Delimiter of the exported report.
    pub delimiter: char,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            group_multipage: true,
            delimiter: DEFAULT_DELIMITER,
        }
    }

    /// Enable or disable multi-page grouping.
    pub fn with_group_multipage(mut self, enable: bool) -> Self {
        self.group_multipage = enable;
        self
    }

    /// Set the report delimiter.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Where a run writes its files.
///
/// Resolved records go to `output_dir`; orphans, unresolved records and error
/// copies go to `error_dir`.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    /// Destination of resolved records
    pub output_dir: PathBuf,
    /// Destination of fallback files
    pub error_dir: PathBuf,
    /// Destination of the audit report, if one should be written
    pub report_path: Option<PathBuf>,
}

impl OutputLayout {
    /// Layout with explicit directories and no report file.
    pub fn new(output_dir: impl Into<PathBuf>, error_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            error_dir: error_dir.into(),
            report_path: None,
        }
    }

    /// Set the report destination.
    pub fn with_report(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// Per-run layout under `root`:
    ///
    /// ```text
    /// root/output/split_<stamp>/
    /// root/errors/split_<stamp>/
    /// root/logs/split_<stamp>.csv
    /// ```
    ///
    /// Directories are created.
    pub fn timestamped(root: &Path, stamp: &str) -> Result<Self> {
        let run = format!("split_{}", stamp);
        let layout = Self::new(root.join("output").join(&run), root.join("errors").join(&run))
            .with_report(root.join("logs").join(format!("{}.csv", run)));
        layout.ensure_dirs()?;
        Ok(layout)
    }

    /// Create the output, error and report directories.
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        fs::create_dir_all(&self.error_dir)?;
        if let Some(parent) = self.report_path.as_ref().and_then(|p| p.parent()) {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// Local timestamp used to name run directories, e.g. `20251231_235959`.
pub fn run_stamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}
