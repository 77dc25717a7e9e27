//! Batch orchestration: one input file at a time

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use std::sync::mpsc::sync_channel;
use std::time::Instant;

use anyhow::Context;
use oareport_core::{ProgressContext, Semaphore};
use oareport_oadoi::Enricher;

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::stats::{FileStats, RunSummary, SkippedFile};
use crate::writer::ReportSink;

/// Buffer size for reading input files (256KB)
const READ_BUF_SIZE: usize = 256 * 1024;

/// Run the enrichment pipeline over every input in `config`, writing one CSV
/// stream to `output`.
///
/// Files that cannot be opened are logged and skipped. Only setup failures
/// (invalid config, thread pool, CSV header) are returned as errors.
pub fn run<E: Enricher, W: Write + Send>(
    config: &Config,
    enricher: &E,
    output: W,
    progress: &ProgressContext,
) -> anyhow::Result<RunSummary> {
    config.validate()?;
    let start = Instant::now();

    let threads = config.dispatch_threads();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("dispatch-{i}"))
        .build()
        .context("Failed to create thread pool")?;

    let mut sink = ReportSink::new(output, config.sherpa_base_url.clone())
        .context("Failed to write CSV header")?;

    log::info!(
        "Processing {} files with {} concurrent lookups ({} threads)",
        config.inputs.len(),
        config.concurrency,
        threads
    );

    let mut summary = RunSummary::default();
    for path in &config.inputs {
        log::info!("Processing {}", path.display());
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                log::error!("{}: {e}", path.display());
                summary.skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let stats = process_file(path, file, config, enricher, &pool, &mut sink, progress)?;
        if !progress.is_tty() {
            stats.log();
        }
        summary.files.push(stats);
    }

    sink.flush().context("Failed to flush CSV output")?;
    summary.elapsed = start.elapsed();
    Ok(summary)
}

/// Wire gate, channel, writer and dispatcher for one file and wait for all
/// of them. The gate and channel do not outlive the file.
fn process_file<E: Enricher, W: Write + Send>(
    path: &Path,
    file: File,
    config: &Config,
    enricher: &E,
    pool: &rayon::ThreadPool,
    sink: &mut ReportSink<W>,
    progress: &ProgressContext,
) -> anyhow::Result<FileStats> {
    let start = Instant::now();
    let label = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    let gate = Semaphore::new(config.concurrency);
    let (tx, rx) = sync_channel(config.channel_capacity);
    let pb = progress.file_spinner(&label);

    let (dispatch, write) = std::thread::scope(|s| {
        let rows = sink.file_writer();
        let writer = std::thread::Builder::new()
            .name("csv-writer".into())
            .spawn_scoped(s, || rows.drain(rx, &pb))
            .context("Failed to spawn CSV writer")?;

        let dispatcher = Dispatcher {
            label: &label,
            enricher,
            gate: &gate,
            pool,
            max_pending: config.max_pending,
        };
        // Consumes the sender: the channel closes once every unit is done.
        let dispatch = dispatcher.run(BufReader::with_capacity(READ_BUF_SIZE, file), tx);

        let write = writer
            .join()
            .map_err(|_| anyhow::anyhow!("CSV writer panicked while writing {label}"))?;
        anyhow::Ok((dispatch, write))
    })?;
    drop(gate);

    pb.finish_and_clear();
    Ok(FileStats {
        path: path.to_path_buf(),
        dispatch,
        write,
        elapsed: start.elapsed(),
    })
}
