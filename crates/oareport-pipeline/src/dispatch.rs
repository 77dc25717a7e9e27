//! Fan-out: one dispatch unit per input line
//!
//! Each unit parses its line, performs the record's DOI lookups one after
//! another (each behind an admission-gate permit) and publishes the
//! [`EnrichedRecord`] on the results channel. Units of different records
//! run concurrently on the rayon pool; the gate caps lookups in flight.

use std::io::BufRead;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::SyncSender;

use oareport_core::Semaphore;
use oareport_oadoi::{Enricher, EnrichmentResult};

use crate::record::{InputRecord, parse_record};

/// Initial capacity for per-line read buffer; grows as needed so long
/// records are never truncated.
const LINE_BUF_CAPACITY: usize = 16 * 1024;

/// A parsed record with one lookup result per DOI identifier, in
/// identifier order.
#[derive(Debug, Clone)]
pub struct EnrichedRecord {
    pub record: InputRecord,
    pub results: Vec<EnrichmentResult>,
}

/// Statistics from dispatching one input file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub lines_read: usize,
    pub blank_lines: usize,
    pub parse_errors: usize,
    pub records_published: usize,
    /// Parsed records without any DOI identifier (they produce no rows)
    pub records_without_doi: usize,
    pub lookups: usize,
    pub transport_errors: usize,
    pub decode_errors: usize,
    /// Set when reading the input stopped early
    pub read_error: Option<String>,
}

/// Counters shared by concurrently running units
#[derive(Default)]
struct Counters {
    parse_errors: AtomicUsize,
    records_published: AtomicUsize,
    records_without_doi: AtomicUsize,
    lookups: AtomicUsize,
    transport_errors: AtomicUsize,
    decode_errors: AtomicUsize,
}

impl Counters {
    fn record(&self, result: &EnrichmentResult) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        match result {
            EnrichmentResult::Found { .. } => {}
            EnrichmentResult::DecodeFailed { .. } => {
                self.decode_errors.fetch_add(1, Ordering::Relaxed);
            }
            EnrichmentResult::TransportFailed { .. } => {
                self.transport_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Per-file dispatcher. Borrowed pieces are owned by the orchestrator and
/// outlive every unit spawned here.
pub struct Dispatcher<'a, E: Enricher> {
    /// Used in log lines, usually the input file name
    pub label: &'a str,
    pub enricher: &'a E,
    pub gate: &'a Semaphore,
    pub pool: &'a rayon::ThreadPool,
    /// Spawned-but-unfinished units allowed before reading pauses
    pub max_pending: usize,
}

impl<E: Enricher> Dispatcher<'_, E> {
    /// Launch one unit per line of `reader` and wait for all of them.
    ///
    /// `results` is consumed: once this returns, every sender clone is
    /// gone and the writer sees the channel close.
    pub fn run<R: BufRead>(
        &self,
        mut reader: R,
        results: SyncSender<EnrichedRecord>,
    ) -> DispatchStats {
        let counters = Counters::default();
        let backlog = Semaphore::new(self.max_pending);
        let mut stats = DispatchStats::default();
        let mut buf = Vec::with_capacity(LINE_BUF_CAPACITY);

        self.pool.in_place_scope(|s| {
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(e) => {
                        log::error!(
                            "{}: read failed after line {}: {e}",
                            self.label,
                            stats.lines_read
                        );
                        stats.read_error = Some(e.to_string());
                        break;
                    }
                }
                stats.lines_read += 1;
                if buf.iter().all(u8::is_ascii_whitespace) {
                    stats.blank_lines += 1;
                    continue;
                }

                let line_no = stats.lines_read;
                let line = buf.clone();
                let slot = backlog.acquire();
                let (counters, results) = (&counters, &results);
                s.spawn(move |_| {
                    let _slot = slot;
                    self.process_line(line_no, &line, counters, results);
                });
            }
        });
        drop(results);

        stats.parse_errors = counters.parse_errors.into_inner();
        stats.records_published = counters.records_published.into_inner();
        stats.records_without_doi = counters.records_without_doi.into_inner();
        stats.lookups = counters.lookups.into_inner();
        stats.transport_errors = counters.transport_errors.into_inner();
        stats.decode_errors = counters.decode_errors.into_inner();
        stats
    }

    /// One dispatch unit
    fn process_line(
        &self,
        line_no: usize,
        line: &[u8],
        counters: &Counters,
        results: &SyncSender<EnrichedRecord>,
    ) {
        let record = match parse_record(line) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("{}:{line_no}: skipping record: {e}", self.label);
                counters.parse_errors.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        // Lookups of one record stay sequential; the permit is held only
        // for the duration of a single call.
        let mut lookups = Vec::new();
        for doi in record.doi_values() {
            let result = {
                let _permit = self.gate.acquire();
                self.enricher.lookup(doi)
            };
            counters.record(&result);
            lookups.push(result);
        }

        if lookups.is_empty() {
            log::debug!(
                "{}:{line_no}: record {:?} has no DOI identifier, no rows",
                self.label,
                record.id
            );
            counters.records_without_doi.fetch_add(1, Ordering::Relaxed);
        }

        let enriched = EnrichedRecord {
            record,
            results: lookups,
        };
        if let Err(unsent) = results.send(enriched) {
            log::error!(
                "{}:{line_no}: writer stopped, record {:?} dropped",
                self.label,
                unsent.0.record.id
            );
            return;
        }
        counters.records_published.fetch_add(1, Ordering::Relaxed);
    }
}
