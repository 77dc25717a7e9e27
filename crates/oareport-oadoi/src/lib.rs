//! oareport oaDOI - Unpaywall/oaDOI lookup client
//!
//! This crate turns one DOI into one [`EnrichmentResult`]: a single GET
//! against the oaDOI v2 API with failures captured as data, never raised.
//!
//! # Example
//!
//! ```no_run
//! use oareport_oadoi::{ClientConfig, Enricher, OadoiClient};
//!
//! let client = OadoiClient::new(ClientConfig {
//!     email: "me@example.org".to_string(),
//!     ..Default::default()
//! })
//! .expect("valid config");
//!
//! let result = client.lookup("10.1038/nature12373");
//! println!("{} {}", result.status(), result.transport_error());
//! ```

pub mod client;
pub mod config;
pub mod schema;
pub mod sherpa;

// Re-exports for convenience
pub use client::{Enricher, OadoiClient, clean_doi};
pub use config::ClientConfig;
pub use schema::{BestOaLocation, EnrichmentResult, ResponseBody};
pub use sherpa::{SHERPA_ROMEO_BASE, sherpa_links, sherpa_links_with_base};
