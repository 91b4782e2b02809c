//! Record segmentation state machine.
//!
//! Pages are scanned in order. A page with a complete identity opens a new
//! record (closing the previous one); any other page continues the open record,
//! or is an orphan when none is open. Unreadable pages are recorded on their
//! own and leave the scan state untouched.
//!
//! ## Example
//!
//! ```
//! use payslip_split::classifier::BoundaryClassifier;
//! use payslip_split::config::{OutputLayout, SplitConfig};
//! use payslip_split::ledger::RecordStatus;
//! use payslip_split::segmenter::Segmenter;
//! use payslip_split::source::{MemorySource, RecordingWriter};
//!
//! # fn main() -> payslip_split::Result<()> {
//! let source = MemorySource::from_texts([
//!     "Monsieur MARTIN PAUL\nPériode : 12.2025",
//!     "Cotisations (suite)",
//! ]);
//! let writer = RecordingWriter::new();
//! let dir = tempfile::tempdir()?;
//! let layout = OutputLayout::new(dir.path().join("ok"), dir.path().join("errors"));
//!
//! let segmenter = Segmenter::new(BoundaryClassifier::payslip(), SplitConfig::default());
//! let ledger = segmenter.run(&source, &writer, &layout)?;
//!
//! assert_eq!(ledger.len(), 1);
//! assert_eq!(ledger.entries()[0].status, RecordStatus::Resolved);
//! assert_eq!(ledger.entries()[0].pages.render(), "1-2");
//! # Ok(())
//! # }
//! ```

use crate::classifier::{BoundaryClassifier, RecordIdentity};
use crate::config::{OutputLayout, SplitConfig};
use crate::error::Result;
use crate::finalizer::RecordFinalizer;
use crate::ledger::{Ledger, PageRange};
use crate::naming::{CollisionStyle, FallbackKind, NameResolver};
use crate::source::{PageWriter, PdfSource, TextSource};
use std::path::Path;

/// Scan position reported after every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Pages processed so far
    pub pages_done: usize,
    /// Pages in the source
    pub total_pages: usize,
}

/// Receives progress notifications.
///
/// Gets a copy of the scan position only; it cannot reach scan state.
pub trait ProgressObserver {
    /// Called once per page, after the page has been handled.
    fn on_progress(&mut self, progress: Progress);
}

impl<F: FnMut(Progress)> ProgressObserver for F {
    fn on_progress(&mut self, progress: Progress) {
        self(progress)
    }
}

/// Observer that ignores notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _progress: Progress) {}
}

enum ScanState {
    NoOpenRecord,
    RecordOpen {
        pages: PageRange,
        identity: RecordIdentity,
    },
}

/// Splits a paged source into records.
#[derive(Debug)]
pub struct Segmenter {
    classifier: BoundaryClassifier,
    resolver: NameResolver,
    config: SplitConfig,
}

impl Segmenter {
    /// Segmenter using `classifier` for boundaries and default naming.
    pub fn new(classifier: BoundaryClassifier, config: SplitConfig) -> Self {
        let resolver = NameResolver::new();
        Self {
            classifier,
            resolver: Self::align_resolver(resolver, &config),
            config,
        }
    }

    /// Segmenter with the payslip rules.
    pub fn payslips(config: SplitConfig) -> Self {
        Self::new(BoundaryClassifier::payslip(), config)
    }

    /// Use a custom name resolver. Its collision style follows the grouping mode.
    pub fn with_resolver(mut self, resolver: NameResolver) -> Self {
        self.resolver = Self::align_resolver(resolver, &self.config);
        self
    }

    fn align_resolver(resolver: NameResolver, config: &SplitConfig) -> NameResolver {
        let style = if config.group_multipage {
            CollisionStyle::Record
        } else {
            CollisionStyle::Page
        };
        resolver.with_collision_style(style)
    }

    /// Boundary classifier in use.
    pub fn classifier(&self) -> &BoundaryClassifier {
        &self.classifier
    }

    /// Configuration in use.
    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Scan every page of `source`, writing through `writer` into `layout`.
    ///
    /// Per-page and per-record failures end up in the returned ledger. An
    /// error is returned only if the output directories cannot be created.
    pub fn run(
        &self,
        source: &dyn TextSource,
        writer: &dyn PageWriter,
        layout: &OutputLayout,
    ) -> Result<Ledger> {
        self.run_with_progress(source, writer, layout, &mut NoProgress)
    }

    /// Like [`run`](Self::run), notifying `observer` after every page.
    pub fn run_with_progress(
        &self,
        source: &dyn TextSource,
        writer: &dyn PageWriter,
        layout: &OutputLayout,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Ledger> {
        layout.ensure_dirs()?;

        let total = source.page_count();
        log::info!("Pages: {}", total);
        log::info!("Output: {}", layout.output_dir.display());
        log::info!("Errors: {}", layout.error_dir.display());
        log::info!(
            "Multi-page grouping: {}",
            if self.config.group_multipage { "ON" } else { "OFF" }
        );

        let mut finalizer =
            RecordFinalizer::new(writer, &self.resolver, layout, self.classifier.fields());
        if self.config.group_multipage {
            self.scan_records(source, &mut finalizer, observer);
        } else {
            self.scan_single_pages(source, &mut finalizer, observer);
        }
        let ledger = finalizer.into_ledger();

        let summary = ledger.summary();
        debug_assert_eq!(summary.total_pages, total);
        log::info!("Resolved: {}", summary.resolved);
        log::info!("Unresolved: {}", summary.unresolved);
        log::info!("Orphans: {}", summary.orphans);
        log::info!("Failed: {}", summary.failed);
        Ok(ledger)
    }

    /// Open a PDF, split it, and export the report if the layout names one.
    ///
    /// # Errors
    ///
    /// [`Error::SourceOpen`](crate::Error::SourceOpen) if the PDF cannot be
    /// loaded (nothing is written), or an IO error for directories and the
    /// report file.
    pub fn split_file(
        &self,
        path: &Path,
        layout: &OutputLayout,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Ledger> {
        let pdf = PdfSource::open(path)?;
        log::info!("Source: {}", pdf.path().display());

        let ledger = self.run_with_progress(&pdf, &pdf, layout, observer)?;
        if let Some(report) = &layout.report_path {
            ledger.export_csv(report, self.config.delimiter)?;
        }
        Ok(ledger)
    }

    fn scan_records(
        &self,
        source: &dyn TextSource,
        finalizer: &mut RecordFinalizer<'_>,
        observer: &mut dyn ProgressObserver,
    ) {
        let total = source.page_count();
        let mut state = ScanState::NoOpenRecord;

        for page in 0..total {
            match source.page_text(page) {
                Err(e) => {
                    finalizer.page_failure(page, &e);
                },
                Ok(text) => {
                    state = match (state, self.classifier.classify(&text)) {
                        (ScanState::NoOpenRecord, Some(identity)) => {
                            log::debug!("Page {}: record start ({})", page + 1, identity);
                            ScanState::RecordOpen {
                                pages: PageRange::single(page),
                                identity,
                            }
                        },
                        (ScanState::NoOpenRecord, None) => {
                            finalizer.orphan(page);
                            ScanState::NoOpenRecord
                        },
                        (
                            ScanState::RecordOpen {
                                pages,
                                identity: open,
                            },
                            Some(identity),
                        ) => {
                            log::debug!("Page {}: record start ({})", page + 1, identity);
                            finalizer.finalize(pages, Some(open));
                            ScanState::RecordOpen {
                                pages: PageRange::single(page),
                                identity,
                            }
                        },
                        (ScanState::RecordOpen { mut pages, identity }, None) => {
                            pages.push(page);
                            ScanState::RecordOpen { pages, identity }
                        },
                    };
                },
            }
            observer.on_progress(Progress {
                pages_done: page + 1,
                total_pages: total,
            });
        }

        if let ScanState::RecordOpen { pages, identity } = state {
            finalizer.finalize(pages, Some(identity));
        }
    }

    fn scan_single_pages(
        &self,
        source: &dyn TextSource,
        finalizer: &mut RecordFinalizer<'_>,
        observer: &mut dyn ProgressObserver,
    ) {
        let total = source.page_count();

        for page in 0..total {
            match source.page_text(page) {
                Err(e) => {
                    finalizer.page_failure(page, &e);
                },
                Ok(text) => {
                    let tokens = self.classifier.extract_tokens(&text);
                    if self.classifier.is_complete(&tokens) {
                        finalizer.finalize(PageRange::single(page), Some(tokens));
                    } else {
                        let note = if tokens.is_empty() {
                            "no complete identity".to_string()
                        } else {
                            format!("no complete identity (found {})", tokens)
                        };
                        finalizer.finalize_unresolved(
                            PageRange::single(page),
                            FallbackKind::UnknownPage,
                            note,
                        );
                    }
                },
            }
            observer.on_progress(Progress {
                pages_done: page + 1,
                total_pages: total,
            });
        }
    }
}
