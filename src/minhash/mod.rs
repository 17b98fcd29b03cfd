//! MinHash Module
//!
//! Textual near-duplicate scoring via MinHash signatures.
//!
//! ## How It Works
//! 1. **Shingling**: The text is lowercased, stripped of punctuation and cut
//!    into overlapping 3-word shingles.
//! 2. **Signature**: 100 independent hash functions each map the shingle set
//!    to its minimum hash value, producing a fixed-length fingerprint.
//! 3. **Comparison**: The fraction of signature positions where two
//!    fingerprints agree is an unbiased estimate of the Jaccard similarity
//!    of the underlying shingle sets.
//!
//! The hash coefficients are derived from a build-time seed, so signatures
//! are reproducible across processes and releases.

pub mod engine;

pub use engine::{MinHasher, Signature, NUM_HASHES};
