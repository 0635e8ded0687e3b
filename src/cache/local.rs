//! 本地 LRU 响应缓存
//!
//! 容量受限的 LRU，每个条目带独立的过期时间。

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use metrics::counter;
use tokio::sync::Mutex;

use super::{CacheStats, ResponseCache};
use crate::error::FaqResult;

/// 缓存条目
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// 本地响应缓存
pub struct LocalResponseCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
}

impl LocalResponseCache {
    /// 创建缓存，容量为 0 时按 1 处理
    pub fn new(capacity: usize) -> Self {
        let size = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(size)),
            capacity: size.get(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired: AtomicU64::new(0),
        }
    }

    /// 清理过期条目，返回清理数量
    pub async fn cleanup_expired(&self) -> usize {
        let mut cache = self.cache.lock().await;
        let now = Instant::now();

        let expired: Vec<String> = cache
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            cache.pop(key);
        }

        if !expired.is_empty() {
            tracing::debug!("清理过期缓存条目: {}", expired.len());
        }
        expired.len()
    }

    /// 当前条目数（含未清理的过期条目）
    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ResponseCache for LocalResponseCache {
    async fn get(&self, key: &str) -> FaqResult<Option<String>> {
        let mut cache = self.cache.lock().await;
        let now = Instant::now();

        let lookup = cache
            .get(key)
            .map(|entry| (!entry.is_expired(now)).then(|| entry.payload.clone()));

        let hit = match lookup {
            Some(Some(payload)) => Some(payload),
            Some(None) => {
                cache.pop(key);
                self.expired.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => None,
        };

        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            counter!("faq_response_cache_hits_total").increment(1);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            counter!("faq_response_cache_misses_total").increment(1);
        }
        Ok(hit)
    }

    async fn set(&self, key: &str, payload: String, ttl: Duration) -> FaqResult<()> {
        let entry = CacheEntry {
            payload,
            expires_at: Instant::now() + ttl,
        };
        self.cache.lock().await.put(key.to_string(), entry);
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            backend: "local".to_string(),
            entries: self.len().await,
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}
