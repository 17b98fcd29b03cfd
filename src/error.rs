//! Service Error Types
//!
//! A single error enum covers the failure modes that can surface at the HTTP
//! boundary. Internal plumbing uses `anyhow::Result`; the pipeline converts
//! into `DetectError` at the point where the failure class is known.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    /// Malformed body, out-of-range parameter, or unsearchable metadata.
    #[error("{0}")]
    InvalidRequest(String),

    /// The requested node does not exist upstream.
    #[error("node {0} not found upstream")]
    NodeNotFound(String),

    /// Every upstream call for the request failed, or the metadata fetch failed.
    #[error("upstream unavailable: {0}")]
    UpstreamFatal(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    /// Admin authentication failure.
    #[error("invalid admin key")]
    Forbidden,

    #[error("internal error: {0}")]
    Internal(String),
}

impl DetectError {
    pub fn status(&self) -> StatusCode {
        match self {
            DetectError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DetectError::NodeNotFound(_) => StatusCode::BAD_REQUEST,
            DetectError::UpstreamFatal(_) => StatusCode::SERVICE_UNAVAILABLE,
            DetectError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            DetectError::Forbidden => StatusCode::FORBIDDEN,
            DetectError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
