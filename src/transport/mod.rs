//! Transport module
//!
//! Defines the Transport trait the executor sends requests through, and its
//! implementations

pub mod http;
pub mod scripted;

use crate::models::{ApiResponse, HttpRequest};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single transport attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// The attempt exceeded its timeout; retried by the executor
    #[error("Request timed out")]
    Timeout,

    /// Connection refused, DNS failure and the like; never retried
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Transport trait for performing one HTTP request/response exchange
///
/// Any status code is a successful exchange; interpreting it is left to
/// the error router.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get the transport name
    fn name(&self) -> &str;

    /// Send one request, giving up after `timeout`
    async fn send(
        &self,
        request: &HttpRequest,
        timeout: Duration,
    ) -> Result<ApiResponse, TransportFailure>;
}

pub use http::HttpTransport;
pub use scripted::{ScriptedReply, ScriptedTransport};
