//! Shared HTTP client and runtime.
//!
//! Lookups are issued from plain worker threads, so the async reqwest client
//! is driven through a shared tokio runtime with `block_on`, presenting a
//! sync interface to the rayon dispatch units.

use std::sync::LazyLock;

/// Idle connections kept per host; the pipeline only ever talks to one API.
const POOL_MAX_IDLE_PER_HOST: usize = 16;

/// Shared async HTTP client with connection pooling.
///
/// No request or connect timeout is configured: a lookup waits as long as
/// the transport's own defaults allow.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .user_agent(concat!("oareport/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("oareport-http")
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Render a status code the way HTTP status lines read, e.g. `200 OK`.
pub fn status_line(status: reqwest::StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}
