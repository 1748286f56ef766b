//! Registry transport boundary.
//!
//! The core protocol only needs three HTTP-shaped calls; everything else
//! (timeouts, retries, TLS) belongs to the implementation behind the
//! trait. Any status other than 200 is a failure as far as the protocol
//! is concerned.
//!
//! # Modules
//!
//! - [`http`] — `reqwest`-backed client for a live registry endpoint.
//! - [`mock`] — in-memory registry double that enforces the registry-side
//!   verification rules; used by the test suites and the CLI demo mode.

pub mod http;
pub mod mock;

pub use http::HttpClient;
pub use mock::MemoryRegistry;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// An HTTP-style response: status code plus JSON body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
}

/// The three calls the registry protocol is built on.
///
/// Implementations must be shareable across tasks; the agent holds one
/// behind an `Arc`. No call is retried by the core.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `path` with query parameters.
    async fn do_get(&self, path: &str, query: &[(String, String)]) -> Result<ApiResponse>;

    /// POST `path` with a JSON body and extra request headers.
    async fn do_post(
        &self,
        path: &str,
        params: &Value,
        headers: &[(String, String)],
    ) -> Result<ApiResponse>;

    /// PATCH `path` with a JSON body and extra request headers.
    async fn do_patch(
        &self,
        path: &str,
        params: &Value,
        headers: &[(String, String)],
    ) -> Result<ApiResponse>;
}
