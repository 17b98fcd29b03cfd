//! Detection Module
//!
//! Orchestrates a full duplicate-detection request.
//!
//! ## Pipeline Phases
//! 1. **Acquire**: fetch metadata for a node id, or accept the caller's
//!    record; unsearchable records are rejected.
//! 2. **Recruit**: targeted upstream searches over the active fields.
//! 3. **Enrich** (at most once): a sparse record is completed from a
//!    highly-confident candidate, then recruitment runs a second time.
//! 4. **URL-exact pass**: candidates whose normalized URL equals the
//!    source's are duplicates regardless of threshold.
//! 5. **Score**: MinHash similarity over title + description prefix;
//!    candidates at or above the threshold survive.
//! 6. **Assemble**: exclude the source node, sort, build the response.
//!
//! ## Submodules
//! - **`pipeline`**: the phase logic.
//! - **`handlers`**: HTTP endpoints, wired as validate → rate-limit →
//!   cache-lookup → handle → cache-store.
//! - **`types`**: domain record, request and response DTOs.

pub mod handlers;
pub mod pipeline;
pub mod types;
