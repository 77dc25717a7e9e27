//! Statistics collection and reporting for a batch run.
//!
//! - File-level: [`FileStats`] (dispatch + writer counters for one input)
//! - Run-level: [`RunSummary`] (all files plus the ones that were skipped)

use std::path::PathBuf;
use std::time::Duration;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use oareport_core::fmt_num;

use crate::dispatch::DispatchStats;
use crate::writer::WriteStats;

/// Per-file statistics.
#[derive(Debug, Clone, Default)]
pub struct FileStats {
    pub path: PathBuf,
    pub dispatch: DispatchStats,
    pub write: WriteStats,
    pub elapsed: Duration,
}

impl FileStats {
    /// Log file completion (non-TTY mode only).
    pub fn log(&self) {
        log::info!(
            "{}: {} rows from {} records ({} parse errors, {} without DOI) [{:.1}s]",
            self.path.display(),
            fmt_num(self.write.rows_written),
            fmt_num(self.dispatch.records_published),
            self.dispatch.parse_errors,
            self.dispatch.records_without_doi,
            self.elapsed.as_secs_f64()
        );
        if self.dispatch.transport_errors + self.dispatch.decode_errors > 0 {
            log::warn!(
                "{}: {} of {} lookups failed ({} transport, {} decode)",
                self.path.display(),
                self.dispatch.transport_errors + self.dispatch.decode_errors,
                self.dispatch.lookups,
                self.dispatch.transport_errors,
                self.dispatch.decode_errors
            );
        }
    }
}

/// Input that never got processed
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Aggregated statistics for a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub files: Vec<FileStats>,
    pub skipped: Vec<SkippedFile>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn lines_read(&self) -> usize {
        self.files.iter().map(|f| f.dispatch.lines_read).sum()
    }

    pub fn parse_errors(&self) -> usize {
        self.files.iter().map(|f| f.dispatch.parse_errors).sum()
    }

    pub fn records(&self) -> usize {
        self.files.iter().map(|f| f.dispatch.records_published).sum()
    }

    pub fn records_without_doi(&self) -> usize {
        self.files.iter().map(|f| f.dispatch.records_without_doi).sum()
    }

    pub fn lookups(&self) -> usize {
        self.files.iter().map(|f| f.dispatch.lookups).sum()
    }

    pub fn failed_lookups(&self) -> usize {
        self.files
            .iter()
            .map(|f| f.dispatch.transport_errors + f.dispatch.decode_errors)
            .sum()
    }

    pub fn rows_written(&self) -> usize {
        self.files.iter().map(|f| f.write.rows_written).sum()
    }

    /// Files whose CSV output stopped early
    pub fn write_failures(&self) -> usize {
        self.files.iter().filter(|f| f.write.error.is_some()).count()
    }

    /// Log summary (non-TTY mode).
    pub fn log(&self) {
        log::info!("=== Enrichment Summary ===");
        log::info!(
            "Files: {} processed, {} skipped, {} with write errors",
            self.files.len(),
            self.skipped.len(),
            self.write_failures()
        );
        log::info!(
            "Records: {} from {} lines ({} parse errors, {} without DOI)",
            fmt_num(self.records()),
            fmt_num(self.lines_read()),
            fmt_num(self.parse_errors()),
            fmt_num(self.records_without_doi())
        );
        log::info!(
            "Lookups: {} ({} failed)",
            fmt_num(self.lookups()),
            fmt_num(self.failed_lookups())
        );
        log::info!("Rows: {}", fmt_num(self.rows_written()));
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
    }

    /// Print summary table on stderr (TTY mode).
    pub fn print(&self) {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Enrichment").fg(Color::Cyan),
                Cell::new("Value").fg(Color::Cyan),
            ]);

        let rows = [
            ("Files processed", fmt_num(self.files.len())),
            ("Files skipped", fmt_num(self.skipped.len())),
            ("Lines read", fmt_num(self.lines_read())),
            ("Parse errors", fmt_num(self.parse_errors())),
            ("Records", fmt_num(self.records())),
            ("Records without DOI", fmt_num(self.records_without_doi())),
            ("Lookups", fmt_num(self.lookups())),
            ("Failed lookups", fmt_num(self.failed_lookups())),
            ("Rows written", fmt_num(self.rows_written())),
            ("Time", format!("{:.1}s", self.elapsed.as_secs_f64())),
        ];
        for (label, value) in rows {
            table.add_row(vec![Cell::new(label), Cell::new(value)]);
        }
        eprintln!("\n{table}");

        for skipped in &self.skipped {
            eprintln!("skipped {}: {}", skipped.path.display(), skipped.reason);
        }
    }
}
