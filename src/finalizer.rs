//! Turning closed page ranges into files and ledger entries.
//!
//! Every call appends exactly one entry to the ledger. Write failures never
//! propagate: they become `FAILED` entries after an explicit best-effort copy
//! to the error directory.

use crate::classifier::RecordIdentity;
use crate::config::OutputLayout;
use crate::error::Error;
use crate::ledger::{Ledger, PageRange, RecordOutcome, RecordStatus};
use crate::naming::{CollisionStyle, FallbackKind, NameRegistry, NameResolver};
use crate::source::PageWriter;
use std::path::{Path, PathBuf};

/// Outcome of one write attempt.
#[derive(Debug)]
pub enum PersistResult {
    /// File written at this path
    Success(PathBuf),
    /// Write failed
    Failure(Error),
}

/// Persists records and fallbacks, and owns the run's ledger.
pub struct RecordFinalizer<'a> {
    writer: &'a dyn PageWriter,
    resolver: &'a NameResolver,
    layout: &'a OutputLayout,
    registry: NameRegistry,
    ledger: Ledger,
}

impl<'a> RecordFinalizer<'a> {
    /// Finalizer writing through `writer` into `layout`, with report columns `fields`.
    pub fn new(
        writer: &'a dyn PageWriter,
        resolver: &'a NameResolver,
        layout: &'a OutputLayout,
        fields: Vec<String>,
    ) -> Self {
        Self {
            writer,
            resolver,
            layout,
            registry: NameRegistry::new(),
            ledger: Ledger::new(fields),
        }
    }

    /// Ledger so far.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Finish the run and hand over the ledger.
    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    fn single_pages(&self) -> bool {
        self.resolver.collision_style() == CollisionStyle::Page
    }

    /// Write `pages` to `dir/name` and claim the name on success.
    pub fn persist(&mut self, pages: &PageRange, dir: &Path, name: &str) -> PersistResult {
        let path = dir.join(name);
        match self.writer.write_pages(pages.indices(), &path) {
            Ok(()) => {
                self.registry.claim(dir, name);
                PersistResult::Success(path)
            },
            Err(e) => PersistResult::Failure(e),
        }
    }

    fn append(&mut self, outcome: RecordOutcome) -> RecordOutcome {
        self.ledger.push(outcome.clone());
        outcome
    }

    /// Close a record.
    ///
    /// With an identity the record is named and written to the output
    /// directory; without one it goes to the error directory under an
    /// `unknown_*` name.
    pub fn finalize(&mut self, pages: PageRange, identity: Option<RecordIdentity>) -> RecordOutcome {
        match identity {
            Some(identity) => self.finalize_resolved(pages, identity),
            None => {
                let kind = if self.single_pages() {
                    FallbackKind::UnknownPage
                } else {
                    FallbackKind::UnknownRecord
                };
                self.finalize_unresolved(pages, kind, "no complete identity".to_string())
            },
        }
    }

    fn finalize_resolved(&mut self, pages: PageRange, identity: RecordIdentity) -> RecordOutcome {
        let start = pages.start_page_number();
        let output_dir = self.layout.output_dir.clone();
        let name = self
            .resolver
            .resolve(&identity, start, self.registry.names_in(&output_dir));

        let primary = match self.persist(&pages, &output_dir, &name) {
            PersistResult::Success(path) => {
                log::info!("Record pages {} -> OK -> {}", pages, name);
                return self.append(RecordOutcome {
                    status: RecordStatus::Resolved,
                    identity: Some(identity),
                    pages,
                    output_path: Some(path),
                    note: String::new(),
                });
            },
            PersistResult::Failure(e) => e,
        };

        log::error!("Record p{:03} ({}): {}", start, identity, primary);
        let kind = if self.single_pages() {
            FallbackKind::ErrorPage
        } else {
            FallbackKind::ErrorRecord
        };
        let output_path = self.fallback_copy(&pages, kind);
        self.append(RecordOutcome {
            status: RecordStatus::Failed,
            identity: Some(identity),
            pages,
            output_path,
            note: primary.to_note(),
        })
    }

    /// Record without a complete identity, e.g. a page in page-per-file mode.
    pub fn finalize_unresolved(
        &mut self,
        pages: PageRange,
        kind: FallbackKind,
        note: String,
    ) -> RecordOutcome {
        let error_dir = self.layout.error_dir.clone();
        let name = kind.file_name(pages.start_page_number());
        match self.persist(&pages, &error_dir, &name) {
            PersistResult::Success(path) => {
                log::warn!("Pages {}: {} -> errors -> {}", pages, note, name);
                self.append(RecordOutcome {
                    status: RecordStatus::Unresolved,
                    identity: None,
                    pages,
                    output_path: Some(path),
                    note,
                })
            },
            PersistResult::Failure(e) => {
                log::error!("Unknown record p{:03}: {}", pages.start_page_number(), e);
                self.append(RecordOutcome {
                    status: RecordStatus::Failed,
                    identity: None,
                    pages,
                    output_path: None,
                    note: e.to_note(),
                })
            },
        }
    }

    /// Continuation page seen while no record is open.
    pub fn orphan(&mut self, page: usize) -> RecordOutcome {
        let pages = PageRange::single(page);
        let error_dir = self.layout.error_dir.clone();
        let name = FallbackKind::Orphan.file_name(pages.start_page_number());
        match self.persist(&pages, &error_dir, &name) {
            PersistResult::Success(path) => {
                log::warn!("Page {}: isolated page before any record -> errors -> {}", pages, name);
                self.append(RecordOutcome {
                    status: RecordStatus::Orphan,
                    identity: None,
                    pages,
                    output_path: Some(path),
                    note: "page before any record".to_string(),
                })
            },
            PersistResult::Failure(e) => self.page_failure(page, &e),
        }
    }

    /// Page whose processing failed; copied as-is to the error directory if possible.
    pub fn page_failure(&mut self, page: usize, error: &Error) -> RecordOutcome {
        let pages = PageRange::single(page);
        log::error!("Page {}: {}", pages, error);
        let output_path = self.fallback_copy(&pages, FallbackKind::ErrorPage);
        self.append(RecordOutcome {
            status: RecordStatus::Failed,
            identity: None,
            pages,
            output_path,
            note: error.to_note(),
        })
    }

    /// Second, best-effort write to the error directory.
    fn fallback_copy(&mut self, pages: &PageRange, kind: FallbackKind) -> Option<PathBuf> {
        let error_dir = self.layout.error_dir.clone();
        let name = kind.file_name(pages.start_page_number());
        match self.persist(pages, &error_dir, &name) {
            PersistResult::Success(path) => Some(path),
            PersistResult::Failure(e) => {
                log::warn!("Fallback copy of pages {} failed: {}", pages, e);
                None
            },
        }
    }
}
