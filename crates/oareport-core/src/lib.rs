//! oareport Core - Common infrastructure for the enrichment pipeline
//!
//! This crate provides the pieces shared by the lookup client and the
//! pipeline: the admission semaphore, the shared HTTP client/runtime,
//! logging and progress reporting.

pub mod http;
pub mod logging;
pub mod progress;
pub mod semaphore;

// Re-exports for convenience
pub use http::{SHARED_RUNTIME, http_client};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, fmt_num};
pub use semaphore::{Semaphore, SemaphoreGuard};
