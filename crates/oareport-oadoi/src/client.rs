//! oaDOI lookup client

use std::error::Error as StdError;

use anyhow::Context;
use oareport_core::http::status_line;
use oareport_core::{SHARED_RUNTIME, http_client};
use reqwest::Url;

use crate::config::ClientConfig;
use crate::schema::{EnrichmentResult, ResponseBody};

type UrlParseError = <Url as std::str::FromStr>::Err;

/// Resolver prefixes stripped so a bare DOI and a DOI URL look up the same way.
const DOI_URL_PREFIXES: &[&str] = &[
    "http://dx.doi.org/",
    "https://dx.doi.org/",
    "http://doi.org/",
    "https://doi.org/",
];

/// One external lookup per identifier.
///
/// Implementations never fail: every error is folded into the returned
/// [`EnrichmentResult`]. `Sync` because dispatch units share one instance.
pub trait Enricher: Sync {
    fn lookup(&self, identifier: &str) -> EnrichmentResult;
}

/// Strip a known DOI resolver prefix and surrounding whitespace.
pub fn clean_doi(identifier: &str) -> &str {
    let trimmed = identifier.trim();
    DOI_URL_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed)
}

/// Blocking oaDOI v2 client. One GET per [`lookup`](Enricher::lookup), no
/// retries.
#[derive(Debug, Clone)]
pub struct OadoiClient {
    base_url: String,
    email: String,
}

impl OadoiClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(
            !config.email.trim().is_empty(),
            "An email is required by the oaDOI API"
        );
        Url::parse(&config.base_url)
            .with_context(|| format!("Invalid oaDOI base URL: {}", config.base_url))?;
        Ok(Self {
            base_url: config.base_url,
            email: config.email.trim().to_string(),
        })
    }

    /// Target URL for a lookup: base + cleaned DOI + `email` query parameter
    pub fn request_url(&self, identifier: &str) -> Result<Url, UrlParseError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, clean_doi(identifier)))?;
        url.query_pairs_mut().append_pair("email", &self.email);
        Ok(url)
    }

    async fn fetch(&self, url: Url) -> EnrichmentResult {
        let resp = match http_client().get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                return EnrichmentResult::TransportFailed {
                    error: error_chain(&e.without_url()),
                };
            }
        };

        let status = status_line(resp.status());

        let bytes = match resp.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return EnrichmentResult::DecodeFailed {
                    status,
                    error: error_chain(&e.without_url()),
                };
            }
        };

        match serde_json::from_slice::<ResponseBody>(&bytes) {
            Ok(body) => EnrichmentResult::Found { status, body },
            Err(e) => EnrichmentResult::DecodeFailed {
                status,
                error: e.to_string(),
            },
        }
    }
}

impl Enricher for OadoiClient {
    fn lookup(&self, identifier: &str) -> EnrichmentResult {
        let url = match self.request_url(identifier) {
            Ok(url) => url,
            Err(e) => {
                return EnrichmentResult::TransportFailed {
                    error: format!("invalid lookup URL for {identifier:?}: {e}"),
                };
            }
        };

        log::debug!("GET {}", clean_doi(identifier));
        let result = SHARED_RUNTIME.handle().block_on(self.fetch(url));
        if !result.is_found() {
            log::debug!(
                "{}: status={:?} decode={:?} transport={:?}",
                clean_doi(identifier),
                result.status(),
                result.decode_error(),
                result.transport_error()
            );
        }
        result
    }
}

/// `reqwest` keeps the useful detail (DNS, refused, TLS) in the source chain.
fn error_chain(e: &dyn StdError) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !msg.contains(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = inner.source();
    }
    msg
}
