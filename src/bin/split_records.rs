//! Split a Concatenated Payslip PDF
//!
//! Writes one PDF per employee-period, quarantines anything it cannot name,
//! and exports a per-file audit report.
//!
//! Usage:
//!   cargo run --release --bin split_records -- payslips.pdf
//!   cargo run --release --bin split_records -- payslips.pdf --root runs --no-multipage
//!   cargo run --release --bin split_records -- payslips.pdf --delimiter ,
//!
//! Output layout under the root (default: current directory):
//!   output/split_<stamp>/      resolved records
//!   errors/split_<stamp>/      orphans, unknown and failed pages
//!   logs/split_<stamp>.csv     audit report

use payslip_split::config::{run_stamp, OutputLayout, SplitConfig};
use payslip_split::segmenter::{Progress, Segmenter};
use payslip_split::Error;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

struct CliConfig {
    input: PathBuf,
    root: PathBuf,
    split: SplitConfig,
}

impl CliConfig {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut input = None;
        let mut root = PathBuf::from(".");
        let mut split = SplitConfig::new();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--root" => {
                    i += 1;
                    let value = args.get(i).ok_or("--root needs a directory")?;
                    root = PathBuf::from(value);
                },
                "--no-multipage" => {
                    split = split.with_group_multipage(false);
                },
                "--delimiter" => {
                    i += 1;
                    let value = args.get(i).ok_or("--delimiter needs a character")?;
                    let mut chars = value.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => split = split.with_delimiter(c),
                        _ => return Err(format!("invalid delimiter '{}'", value)),
                    }
                },
                "--help" | "-h" => {
                    return Err(String::new());
                },
                other if other.starts_with("--") => {
                    return Err(format!("unknown option '{}'", other));
                },
                other => {
                    if input.is_some() {
                        return Err(format!("unexpected argument '{}'", other));
                    }
                    input = Some(PathBuf::from(other));
                },
            }
            i += 1;
        }

        let input = input.ok_or("missing input PDF")?;
        Ok(Self { input, root, split })
    }
}

fn usage() {
    eprintln!("Usage: split_records <input.pdf> [--root DIR] [--no-multipage] [--delimiter C]");
}

fn main() {
    env_logger::init();

    let config = match CliConfig::from_args() {
        Ok(config) => config,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("Error: {}", msg);
            }
            usage();
            process::exit(2);
        },
    };

    let layout = match OutputLayout::timestamped(&config.root, &run_stamp()) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        },
    };

    println!("Splitting {}", config.input.display());
    println!("  Output: {}", layout.output_dir.display());
    println!("  Errors: {}", layout.error_dir.display());

    let start = Instant::now();
    let mut last_percent = None;
    let mut progress = |p: Progress| {
        let percent = if p.total_pages == 0 {
            100
        } else {
            p.pages_done * 100 / p.total_pages
        };
        if last_percent != Some(percent / 10) {
            last_percent = Some(percent / 10);
            println!("  [{:>3}%] {}/{} pages", percent, p.pages_done, p.total_pages);
        }
    };

    let segmenter = Segmenter::payslips(config.split);
    let ledger = match segmenter.split_file(&config.input, &layout, &mut progress) {
        Ok(ledger) => ledger,
        Err(e @ Error::SourceOpen { .. }) => {
            eprintln!("Error: {}", e);
            eprintln!("No files were written.");
            process::exit(1);
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        },
    };

    println!();
    println!("{}", ledger.summary());
    if let Some(report) = &layout.report_path {
        println!("Report: {}", report.display());
    }
    println!("Done in {:.2}s", start.elapsed().as_secs_f64());
}
