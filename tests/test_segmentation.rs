//! Integration tests for record segmentation over in-memory sources.

use payslip_split::classifier::BoundaryClassifier;
use payslip_split::config::{OutputLayout, SplitConfig};
use payslip_split::ledger::{Ledger, RecordStatus};
use payslip_split::rules::RegexRule;
use payslip_split::segmenter::{Progress, Segmenter};
use payslip_split::source::{MemorySource, RecordingWriter};
use std::collections::HashSet;
use std::fs;
use tempfile::{tempdir, TempDir};

const A: &str = "Bulletin\nPeriod 12-2025\nEmployee AAA-001\nGross 3000.00";
const B: &str = "Bulletin\nPeriod 12-2025\nEmployee BBB-002\nGross 2800.00";
const DUP: &str = "Bulletin\nPeriod 01-2026\nEmployee BBB-002";
const CONT: &str = "Contributions (continued)\nNet 2100.00";

fn period_and_id() -> BoundaryClassifier {
    BoundaryClassifier::new()
        .with_rule(RegexRule::new("period", r"Period (\d{2}-\d{4})").unwrap())
        .with_rule(RegexRule::new("id", r"Employee ([A-Z]{3}-\d{3})").unwrap())
}

fn layout() -> (TempDir, OutputLayout) {
    let dir = tempdir().unwrap();
    let layout = OutputLayout::new(dir.path().join("output"), dir.path().join("errors"))
        .with_report(dir.path().join("logs/report.csv"));
    (dir, layout)
}

fn split(source: &MemorySource, writer: &RecordingWriter, layout: &OutputLayout) -> Ledger {
    Segmenter::new(period_and_id(), SplitConfig::default())
        .run(source, writer, layout)
        .unwrap()
}

fn covered_pages(ledger: &Ledger) -> Vec<usize> {
    let mut pages: Vec<usize> = ledger
        .iter()
        .flat_map(|e| e.pages.indices().iter().copied())
        .collect();
    pages.sort_unstable();
    pages
}

mod scenario_tests {
    use super::*;

    #[test]
    fn test_single_record_two_pages() {
        let source = MemorySource::from_texts([A, CONT]);
        let writer = RecordingWriter::new();
        let (_dir, layout) = layout();
        let ledger = split(&source, &writer, &layout);

        assert_eq!(ledger.len(), 1);
        let entry = &ledger.entries()[0];
        assert_eq!(entry.status, RecordStatus::Resolved);
        assert_eq!(entry.pages.render(), "1-2");
        assert_eq!(entry.output_file().as_deref(), Some("12-2025_AAA-001.pdf"));
        assert_eq!(writer.writes()[0].pages, vec![0, 1]);
        assert_eq!(writer.writes()[0].destination, layout.output_dir.join("12-2025_AAA-001.pdf"));
    }

    #[test]
    fn test_back_to_back_records() {
        let source = MemorySource::from_texts([A, B]);
        let writer = RecordingWriter::new();
        let (_dir, layout) = layout();
        let ledger = split(&source, &writer, &layout);

        let ranges: Vec<String> = ledger.iter().map(|e| e.pages.render()).collect();
        assert_eq!(ranges, vec!["1", "2"]);
        assert!(ledger.iter().all(|e| e.status == RecordStatus::Resolved));
        assert_eq!(ledger.summary().orphans, 0);
    }

    #[test]
    fn test_leading_continuation_page_is_orphan() {
        let source = MemorySource::from_texts([CONT, A]);
        let writer = RecordingWriter::new();
        let (_dir, layout) = layout();
        let ledger = split(&source, &writer, &layout);

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.entries()[0].status, RecordStatus::Orphan);
        assert_eq!(ledger.entries()[0].pages.render(), "1");
        assert_eq!(
            ledger.entries()[0].output_path,
            Some(layout.error_dir.join("orphan_page_001.pdf"))
        );
        assert_eq!(ledger.entries()[1].status, RecordStatus::Resolved);
        assert_eq!(ledger.entries()[1].pages.first(), 1);
    }

    #[test]
    fn test_duplicate_identity_disambiguated_by_start_page() {
        let source = MemorySource::from_texts([DUP, A, CONT, B, DUP]);
        let writer = RecordingWriter::new();
        let (_dir, layout) = layout();
        let ledger = split(&source, &writer, &layout);

        let dups: Vec<String> = ledger
            .iter()
            .filter(|e| e.identity.as_ref().and_then(|i| i.get("id")) == Some("BBB-002"))
            .filter(|e| e.identity.as_ref().and_then(|i| i.get("period")) == Some("01-2026"))
            .filter_map(|e| e.output_file())
            .collect();
        assert_eq!(dups, vec!["01-2026_BBB-002.pdf", "01-2026_BBB-002_p005.pdf"]);
    }

    #[test]
    fn test_persist_failure_does_not_stop_scan() {
        let source = MemorySource::from_texts([A, CONT, B, CONT]);
        let writer = RecordingWriter::new().with_failure_on("12-2025_AAA-001");
        let (_dir, layout) = layout();
        let ledger = split(&source, &writer, &layout);

        assert_eq!(ledger.len(), 2);
        let failed = &ledger.entries()[0];
        assert_eq!(failed.status, RecordStatus::Failed);
        assert!(failed.note.starts_with("PersistError: "));
        assert!(failed.note.contains("12-2025_AAA-001.pdf"));
        assert_eq!(failed.output_path, Some(layout.error_dir.join("error_record_p001.pdf")));

        let next = &ledger.entries()[1];
        assert_eq!(next.status, RecordStatus::Resolved);
        assert_eq!(next.pages.render(), "3-4");
    }
}

mod property_tests {
    use super::*;

    #[test]
    fn test_every_page_covered_once() {
        let source = MemorySource::new()
            .with_page(CONT)
            .with_page(A)
            .with_unreadable_page("bad xref")
            .with_page(CONT)
            .with_page(B)
            .with_page("")
            .with_page(DUP);
        let writer = RecordingWriter::new();
        let (_dir, layout) = layout();
        let ledger = split(&source, &writer, &layout);

        assert_eq!(covered_pages(&ledger), (0..7).collect::<Vec<_>>());
        assert_eq!(ledger.summary().total_pages, 7);
    }

    #[test]
    fn test_unreadable_page_is_isolated() {
        let pages = [A, CONT, CONT, B, CONT];
        let clean = MemorySource::from_texts(pages);
        let broken = MemorySource::new()
            .with_page(A)
            .with_page(CONT)
            .with_unreadable_page("corrupt content stream")
            .with_page(B)
            .with_page(CONT);

        let (_d1, l1) = layout();
        let (_d2, l2) = layout();
        let clean_ledger = split(&clean, &RecordingWriter::new(), &l1);
        let broken_ledger = split(&broken, &RecordingWriter::new(), &l2);

        let failed: Vec<_> = broken_ledger
            .iter()
            .filter(|e| e.status == RecordStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].pages.render(), "3");
        assert!(failed[0].note.starts_with("ExtractionError: "));

        let resolved = |ledger: &Ledger| -> Vec<(Option<String>, Vec<usize>)> {
            ledger
                .iter()
                .filter(|e| e.status == RecordStatus::Resolved)
                .map(|e| (e.output_file(), e.pages.indices().to_vec()))
                .collect()
        };
        let mut expected = resolved(&clean_ledger);
        expected[0].1.retain(|&p| p != 2);
        assert_eq!(resolved(&broken_ledger), expected);
    }

    #[test]
    fn test_resolved_names_unique() {
        let source = MemorySource::from_texts([A, A, CONT, A, B, A]);
        let writer = RecordingWriter::new();
        let (_dir, layout) = layout();
        let ledger = split(&source, &writer, &layout);

        let names: Vec<String> = ledger
            .iter()
            .filter(|e| e.status == RecordStatus::Resolved)
            .filter_map(|e| e.output_file())
            .collect();
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(names.len(), 5);
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_summary_reconciles_with_ledger() {
        let source = MemorySource::new()
            .with_page(CONT)
            .with_page(A)
            .with_unreadable_page("bad")
            .with_page(B);
        let writer = RecordingWriter::new();
        let (_dir, layout) = layout();
        let ledger = split(&source, &writer, &layout);
        let summary = ledger.summary();

        let count = |s: RecordStatus| ledger.iter().filter(|e| e.status == s).count();
        assert_eq!(summary.resolved, count(RecordStatus::Resolved));
        assert_eq!(summary.orphans, count(RecordStatus::Orphan));
        assert_eq!(summary.failed, count(RecordStatus::Failed));
        assert_eq!(summary.unresolved, count(RecordStatus::Unresolved));
        assert_eq!(summary.total_pages, 4);
        assert_eq!(summary.fallback_pages, 1);
    }
}

mod mode_tests {
    use super::*;

    #[test]
    fn test_page_per_file_mode() {
        let source = MemorySource::from_texts([A, CONT, A]);
        let writer = RecordingWriter::new();
        let (_dir, layout) = layout();
        let ledger = Segmenter::new(period_and_id(), SplitConfig::new().with_group_multipage(false))
            .run(&source, &writer, &layout)
            .unwrap();

        let files: Vec<Option<String>> = ledger.iter().map(|e| e.output_file()).collect();
        assert_eq!(
            files,
            vec![
                Some("12-2025_AAA-001.pdf".to_string()),
                Some("unknown_page_002.pdf".to_string()),
                Some("12-2025_AAA-001_page003.pdf".to_string()),
            ]
        );
        assert_eq!(ledger.summary().unresolved, 1);
        assert_eq!(ledger.summary().orphans, 0);
    }

    #[test]
    fn test_progress_notifications() {
        let source = MemorySource::from_texts([A, CONT, B, CONT, CONT]);
        let writer = RecordingWriter::new();
        let (_dir, layout) = layout();
        let mut seen: Vec<Progress> = Vec::new();
        let mut observer = |p: Progress| seen.push(p);

        Segmenter::new(period_and_id(), SplitConfig::default())
            .run_with_progress(&source, &writer, &layout, &mut observer)
            .unwrap();

        assert_eq!(seen.len(), 5);
        assert!(seen.windows(2).all(|w| w[0].pages_done < w[1].pages_done));
        assert!(seen.iter().all(|p| p.total_pages == 5));
        assert_eq!(seen.last().map(|p| p.pages_done), Some(5));
    }
}

mod report_tests {
    use super::*;

    #[test]
    fn test_report_rows_follow_ledger_order() {
        let source = MemorySource::from_texts([CONT, A, CONT]);
        let writer = RecordingWriter::new();
        let (_dir, layout) = layout();
        let ledger = split(&source, &writer, &layout);

        let report = layout.report_path.clone().unwrap();
        ledger.export_csv(&report, ';').unwrap();
        let text = fs::read_to_string(&report).unwrap();
        let lines: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();

        assert_eq!(lines[0], "status;period;id;pages;output_file;output_path;note");
        assert!(lines[1].starts_with("ORPHAN;-;-;1;orphan_page_001.pdf;"));
        assert!(lines[2].starts_with("RESOLVED;12-2025;AAA-001;2-3;12-2025_AAA-001.pdf;"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_json_report_contains_summary() {
        let source = MemorySource::from_texts([A, CONT]);
        let writer = RecordingWriter::new();
        let (_dir, layout) = layout();
        let ledger = split(&source, &writer, &layout);

        let json: serde_json::Value = serde_json::from_str(&ledger.to_json().unwrap()).unwrap();
        assert_eq!(json["summary"]["resolved"], 1);
        assert_eq!(json["summary"]["total_pages"], 2);
        assert_eq!(json["entries"][0]["status"], "RESOLVED");
        assert_eq!(json["entries"][0]["pages"], "1-2");
        assert_eq!(json["entries"][0]["identity"]["id"], "AAA-001");
    }
}
