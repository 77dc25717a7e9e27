//! Pipeline configuration

use std::path::PathBuf;

use oareport_oadoi::SHERPA_ROMEO_BASE;

/// Concurrent lookups allowed when nothing else is configured
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Enriched records buffered between dispatch units and the CSV writer
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Lines handed to dispatch units but not yet finished
pub const DEFAULT_MAX_PENDING: usize = 4096;

/// Runtime configuration for the enrichment pipeline
#[derive(Debug, Clone)]
pub struct Config {
    /// Input files, processed one after another
    pub inputs: Vec<PathBuf>,
    /// Admission gate size: lookups in flight per file
    pub concurrency: usize,
    /// Dispatch threads. Raised to `concurrency` if lower, since every
    /// in-flight lookup occupies one thread.
    pub workers: usize,
    /// Results channel bound
    pub channel_capacity: usize,
    /// Backlog of spawned-but-unfinished dispatch units
    pub max_pending: usize,
    /// Prefix for the SHERPA/RoMEO link column
    pub sherpa_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            workers: default_workers(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_pending: DEFAULT_MAX_PENDING,
            sherpa_base_url: SHERPA_ROMEO_BASE.to_string(),
        }
    }
}

impl Config {
    /// Reject settings that would stall the pipeline
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.concurrency >= 1, "concurrency must be at least 1");
        anyhow::ensure!(self.max_pending >= 1, "max_pending must be at least 1");
        anyhow::ensure!(!self.inputs.is_empty(), "Could not find any files to process");
        Ok(())
    }

    /// Thread count actually used for dispatch
    pub fn dispatch_threads(&self) -> usize {
        self.workers.max(self.concurrency).max(1)
    }
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.concurrency, 5);
        assert!(config.workers >= 1);
        assert!(config.inputs.is_empty());
        assert_eq!(config.sherpa_base_url, SHERPA_ROMEO_BASE);
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let config = Config {
            inputs: vec![PathBuf::from("a.json")],
            concurrency: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_no_inputs() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("files"));
    }

    #[test]
    fn dispatch_threads_cover_concurrency() {
        let config = Config {
            workers: 2,
            concurrency: 8,
            ..Default::default()
        };
        assert_eq!(config.dispatch_threads(), 8);
    }
}
