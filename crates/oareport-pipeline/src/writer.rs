//! CSV report writer: the single consumer of the results channel

use std::io::Write;
use std::sync::mpsc::Receiver;

use indicatif::ProgressBar;
use oareport_oadoi::{ResponseBody, sherpa_links_with_base};
use serde::Serialize;

use crate::dispatch::EnrichedRecord;

/// Column names, in [`ReportRow`] field order
pub const HEADER: [&str; 13] = [
    "API - Available OA",
    "Artudis - Available OA",
    "Artudis - Best Type OA",
    "Artudis - ID",
    "API - Best OA Location URL",
    "API - Best OA Location Version",
    "Artudis - Publication Type",
    "API - HTTP Response Status",
    "API - JSON Decode Error",
    "API - GET Error",
    "API - DOI",
    "API - Title",
    "SHERPA/RoMEO - Journal Links",
];

/// One output row: a record joined with one of its lookup results
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    api_is_oa: bool,
    local_is_oa: bool,
    local_best_version: &'a str,
    id: &'a str,
    best_oa_url: &'a str,
    best_oa_version: &'a str,
    publication_type: &'a str,
    http_status: &'a str,
    decode_error: &'a str,
    transport_error: &'a str,
    doi: &'a str,
    title: &'a str,
    sherpa_links: String,
}

/// Failure while producing CSV output
#[derive(Debug)]
pub enum WriteError {
    /// A row for `record_id` could not be serialized or written
    Row { record_id: String, source: csv::Error },
    /// Buffered rows could not be flushed
    Flush(std::io::Error),
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Row { record_id, source } => write!(f, "record {record_id}: {source}"),
            Self::Flush(e) => write!(f, "flush failed: {e}"),
        }
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Row { source, .. } => Some(source),
            Self::Flush(e) => Some(e),
        }
    }
}

/// Statistics from draining one file's results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub records_received: usize,
    pub rows_written: usize,
    /// First write failure; rows after it were discarded
    pub error: Option<String>,
}

/// CSV output stream shared by every input file of a run.
///
/// The header is written once, when the sink is created. Each input file
/// then writes through its own [`FileWriter`], so a failure inside one file
/// leaves no partial row state behind for the next.
pub struct ReportSink<W: Write> {
    output: W,
    sherpa_base: String,
}

impl<W: Write> ReportSink<W> {
    pub fn new(mut output: W, sherpa_base: impl Into<String>) -> csv::Result<Self> {
        let mut csv = csv_writer(&mut output);
        csv.write_record(HEADER)?;
        csv.flush()?;
        drop(csv);
        Ok(Self {
            output,
            sherpa_base: sherpa_base.into(),
        })
    }

    /// Fresh CSV writer for one input file
    pub fn file_writer(&mut self) -> FileWriter<'_, W> {
        FileWriter {
            csv: csv_writer(Fenced {
                inner: &mut self.output,
                failed: false,
            }),
            sherpa_base: &self.sherpa_base,
        }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.output.flush()
    }
}

fn csv_writer<W: Write>(output: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output)
}

/// Passes writes through until the first failure, then rejects everything,
/// including the flush `csv::Writer` attempts when dropped.
struct Fenced<'a, W: Write> {
    inner: &'a mut W,
    failed: bool,
}

impl<W: Write> Fenced<'_, W> {
    fn guard<T>(&mut self, op: impl FnOnce(&mut W) -> std::io::Result<T>) -> std::io::Result<T> {
        if self.failed {
            return Err(std::io::Error::other("output failed earlier in this file"));
        }
        let result = op(self.inner);
        self.failed = result.is_err();
        result
    }
}

impl<W: Write> Write for Fenced<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.guard(|w| w.write(buf))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.guard(|w| w.flush())
    }
}

/// Writes the rows of one input file into the shared [`ReportSink`]
pub struct FileWriter<'a, W: Write> {
    csv: csv::Writer<Fenced<'a, W>>,
    sherpa_base: &'a str,
}

impl<W: Write> FileWriter<'_, W> {
    /// Write one row per lookup result; returns the row count (0 when the
    /// record had no DOI).
    pub fn write_record(&mut self, enriched: &EnrichedRecord) -> Result<usize, WriteError> {
        let record = &enriched.record;
        let local_is_oa = record.is_locally_open_access();
        let local_best_version = record.best_local_version();
        let empty = ResponseBody::default();

        for result in &enriched.results {
            let body = result.body().unwrap_or(&empty);
            self.csv
                .serialize(ReportRow {
                    api_is_oa: body.is_oa,
                    local_is_oa,
                    local_best_version,
                    id: &record.id,
                    best_oa_url: &body.best_oa_location.url,
                    best_oa_version: &body.best_oa_location.version,
                    publication_type: &record.kind,
                    http_status: result.status(),
                    decode_error: result.decode_error(),
                    transport_error: result.transport_error(),
                    doi: &body.doi,
                    title: &body.title,
                    sherpa_links: sherpa_links_with_base(self.sherpa_base, &body.journal_issns),
                })
                .map_err(|source| WriteError::Row {
                    record_id: record.id.clone(),
                    source,
                })?;
        }
        Ok(enriched.results.len())
    }

    /// Flush this file's buffered rows into the shared output
    pub fn finish(mut self) -> Result<(), WriteError> {
        self.csv.flush().map_err(WriteError::Flush)
    }

    /// Drain `rx` until every sender is gone, then flush.
    ///
    /// After the first write error nothing more is written for this file,
    /// but the channel keeps being drained so dispatch units never block on
    /// a full channel.
    pub fn drain(mut self, rx: Receiver<EnrichedRecord>, pb: &ProgressBar) -> WriteStats {
        let mut stats = WriteStats::default();

        for enriched in rx.iter() {
            stats.records_received += 1;
            if stats.error.is_some() {
                continue;
            }
            match self.write_record(&enriched) {
                Ok(rows) => {
                    stats.rows_written += rows;
                    pb.inc(1);
                }
                Err(e) => {
                    log::error!("error writing record to csv: {e}");
                    stats.error = Some(e.to_string());
                }
            }
        }

        if stats.error.is_none() {
            if let Err(e) = self.finish() {
                log::error!("error writing csv output: {e}");
                stats.error = Some(e.to_string());
            }
        }
        stats
    }
}
