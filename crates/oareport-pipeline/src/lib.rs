//! oareport Pipeline - concurrent DOI enrichment of publication exports
//!
//! Reads newline-delimited Artudis publication records, looks up every DOI
//! through an [`Enricher`](oareport_oadoi::Enricher) with a bounded number
//! of lookups in flight, and writes one CSV row per (record, lookup) pair.
//!
//! # Example
//!
//! ```no_run
//! use oareport_core::ProgressContext;
//! use oareport_oadoi::{ClientConfig, OadoiClient};
//! use oareport_pipeline::{Config, run};
//!
//! let client = OadoiClient::new(ClientConfig {
//!     email: "me@example.org".to_string(),
//!     ..Default::default()
//! })
//! .expect("valid client config");
//! let config = Config {
//!     inputs: vec!["2024-Publication-export.json".into()],
//!     ..Default::default()
//! };
//!
//! let summary = run(&config, &client, std::io::stdout(), &ProgressContext::new())
//!     .expect("Pipeline failed");
//! eprintln!("Wrote {} rows", summary.rows_written());
//! ```

pub mod config;
pub mod dispatch;
pub mod record;
pub mod runner;
pub mod stats;
pub mod writer;

// Re-exports for convenience
pub use config::Config;
pub use dispatch::{DispatchStats, Dispatcher, EnrichedRecord};
pub use record::{Attachment, Identifier, InputRecord, parse_record};
pub use runner::run;
pub use stats::{FileStats, RunSummary, SkippedFile};
pub use writer::{FileWriter, HEADER, ReportSink, WriteError, WriteStats};
