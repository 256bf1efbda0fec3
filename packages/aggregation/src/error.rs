//! Typed errors for the aggregation pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match
//! on the failure class.

use thiserror::Error;

/// Errors that can occur inside one pipeline cycle.
///
/// Most failures never reach this type: fetch failures are absorbed at the
/// source boundary, and delivery failures are contained per recipient. What
/// remains is store access and cycle-level orchestration.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// User or posting store operation failed
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Delivery channel rejected a send
    #[error("delivery error: {0}")]
    Delivery(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PipelineError {
    /// Wrap an arbitrary store backend error.
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PipelineError::Store(Box::new(err))
    }

    /// Wrap an arbitrary delivery backend error.
    pub fn delivery<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PipelineError::Delivery(Box::new(err))
    }
}

/// Errors that can occur while fetching from an external source.
///
/// These stay internal to source implementations, which fail soft (log, skip
/// the page, continue); the type exists so page-level helpers can use `?`.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Connection timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Non-success status code
    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    /// Response could not be parsed
    #[error("parse error: {0}")]
    Parse(String),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
