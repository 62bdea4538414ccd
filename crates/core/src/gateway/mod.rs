//! Remote release service access.
//!
//! This module provides the `ReleaseService` trait consumed by the restorer,
//! an HTTP implementation of it, and the one-shot service calls that need no
//! orchestration.

mod http;
mod token;
mod types;

pub use http::HttpGateway;
pub use token::read_token;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the remote service.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed (connection, timeout, body read...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Body was expected to be JSON but was not.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Token file could not be read.
    #[error("Token file {path} not readable: {source}")]
    TokenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Token file exists but holds no token.
    #[error("Token file {0} is empty")]
    EmptyToken(String),
}

/// Remote operations the restorer drives.
///
/// Implemented by `HttpGateway` for production and by
/// `testing::MockReleaseService` for tests.
#[async_trait]
pub trait ReleaseService: Send + Sync {
    /// Fetch every release stored under a free account, as
    /// genre -> account -> list of release codes.
    async fn fetch_releases_per_free_account(&self) -> Result<ApiResponse, GatewayError>;

    /// Ask the service to re-activate the link of a single release.
    async fn restore_release(&self, code: &ReleaseCode) -> Result<ApiResponse, GatewayError>;
}
