use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::config::CacheConfig;
use crate::detection::types::{ContentMetadata, DetectionResponse, SearchField};
use crate::normalize::title::normalize_title;

struct CacheEntry {
    response: DetectionResponse,
    inserted_at: Instant,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    // Keys in insertion order; the front is always the oldest live entry.
    insertion_order: VecDeque<String>,
}

/// TTL + FIFO cache for detection responses.
pub struct ResponseCache {
    inner: Mutex<CacheInner>,
    ttl: Duration,
    max_size: usize,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_limits(config.ttl, config.max_size)
    }

    pub fn with_limits(ttl: Duration, max_size: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
            ttl,
            max_size,
        }
    }

    /// Returns the cached response, or `None` on a miss. Expired entries are
    /// removed on the way out.
    pub fn get(&self, key: &str) -> Option<DetectionResponse> {
        let mut inner = self.lock();

        match inner.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.response.clone());
            }
            Some(_) => {
                tracing::debug!("Cache entry expired");
            }
            None => return None,
        }

        inner.entries.remove(key);
        inner.insertion_order.retain(|k| k != key);
        None
    }

    /// Stores a response, evicting the oldest entries when at capacity.
    /// Re-inserting an existing key refreshes its insertion time.
    pub fn insert(&self, key: String, response: DetectionResponse) {
        let mut inner = self.lock();

        if inner.entries.contains_key(&key) {
            inner.insertion_order.retain(|k| *k != key);
        } else {
            while inner.entries.len() >= self.max_size {
                let Some(oldest) = inner.insertion_order.pop_front() else {
                    break;
                };
                inner.entries.remove(&oldest);
                tracing::debug!("Cache full, evicted oldest entry");
            }
        }

        inner.insertion_order.push_back(key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                response,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Empties the cache, returning how many entries were removed.
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let removed = inner.entries.len();
        inner.entries.clear();
        inner.insertion_order.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A poisoned lock only means another thread panicked mid-operation; the
    // map itself is still structurally sound, so keep serving.
    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Stable cache key over everything that shapes a by-metadata response.
pub fn cache_key(
    metadata: &ContentMetadata,
    threshold: f64,
    search_fields: &[SearchField],
    max_candidates: usize,
) -> String {
    let normalized_title = metadata
        .title
        .as_deref()
        .map(normalize_title)
        .unwrap_or_default();
    let description_prefix: String = metadata
        .description
        .as_deref()
        .unwrap_or("")
        .trim()
        .chars()
        .take(100)
        .collect();
    let normalized_url = metadata.normalized_url().unwrap_or_default();

    let mut keywords: Vec<String> = metadata
        .keywords
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    keywords.sort();

    let mut field_names: Vec<&str> = search_fields.iter().map(|f| f.as_str()).collect();
    field_names.sort_unstable();
    field_names.dedup();

    let keywords_joined = keywords.join(",");
    let fields_joined = field_names.join(",");

    let mut hasher = Sha256::new();
    for part in [
        normalized_title.as_str(),
        description_prefix.as_str(),
        normalized_url.as_str(),
        keywords_joined.as_str(),
        fields_joined.as_str(),
    ] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(threshold.to_bits().to_be_bytes());
    hasher.update((max_candidates as u64).to_be_bytes());

    format!("{:x}", hasher.finalize())
}
