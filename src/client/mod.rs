//! Upstream Client Module
//!
//! Talks to the learning-object repository's REST API. The repository is a
//! black box offering exactly two operations the service depends on: a
//! node-metadata endpoint and a field-scoped search endpoint.
//!
//! ## Responsibilities
//! - **Metadata fetch**: resolve a node id into a [`ContentMetadata`] record.
//! - **Search**: paginated, property-scoped candidate search.
//! - **Redirect check**: best-effort resolution of URL redirects.
//! - **Resilience**: retries with exponential backoff on network errors and
//!   5xx responses; 4xx responses are never retried.
//!
//! The [`UpstreamApi`] trait abstracts the wire client so the recruiter and
//! pipeline can run against an in-memory fake in tests.
//!
//! [`ContentMetadata`]: crate::detection::types::ContentMetadata

pub mod rest;
pub mod types;

pub use rest::{UpstreamApi, WloClient};

#[cfg(test)]
mod tests;
