//! Response Cache Module
//!
//! Bounded in-memory cache for by-metadata detection responses. By-node
//! responses are never cached because the node's upstream state can change
//! without this service noticing.
//!
//! ## Policy
//! - **Key**: stable digest over the normalized request (metadata fields,
//!   threshold, active search fields, candidate limit).
//! - **TTL**: lazy — expiry is checked on read, there is no sweeper.
//! - **Eviction**: FIFO by insertion time once the size cap is reached.
//! - **Purge**: the admin route empties the cache and reports the count.

pub mod handlers;
pub mod store;

pub use store::{cache_key, ResponseCache};
