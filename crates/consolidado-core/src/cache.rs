//! Explicit cache for fetched attachment bytes.
//!
//! Regenerating a consolidado re-reads the same order and remisión
//! attachments; this cache avoids refetching them within its TTL. It is
//! owned by the pipeline and invalidated explicitly, never module state.

use std::time::Duration;

use bytes::Bytes;
use moka::future::Cache;

use crate::config::CacheConfig;

/// In-memory byte cache using moka with byte-size-based eviction.
///
/// Keys are md5 hashes of the source URL, fixed-length and opaque.
pub struct FetchCache {
    cache: Option<Cache<String, Bytes>>,
}

fn key_for(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

impl FetchCache {
    pub fn new(config: &CacheConfig) -> Self {
        if !config.enabled {
            return Self { cache: None };
        }

        let max_bytes = config.max_mb.saturating_mul(1024 * 1024);

        let mut builder = Cache::builder()
            .max_capacity(max_bytes)
            .weigher(|_key: &String, value: &Bytes| -> u32 {
                // Weight is the value byte size, capped at u32::MAX
                value.len().try_into().unwrap_or(u32::MAX)
            });

        if config.ttl_seconds > 0 {
            builder = builder.time_to_live(Duration::from_secs(config.ttl_seconds));
        }

        Self {
            cache: Some(builder.build()),
        }
    }

    pub async fn get(&self, url: &str) -> Option<Bytes> {
        match &self.cache {
            Some(cache) => cache.get(&key_for(url)).await,
            None => None,
        }
    }

    pub async fn insert(&self, url: &str, bytes: Bytes) {
        if let Some(cache) = &self.cache {
            cache.insert(key_for(url), bytes).await;
        }
    }

    /// Drop the entry for one URL (e.g. after an attachment is replaced).
    pub async fn invalidate(&self, url: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate(&key_for(url)).await;
        }
    }

    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }
}
