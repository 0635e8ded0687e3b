//! 缓存版本号注册表
//!
//! 每个资源族一个单调递增的计数器。初始化和递增都必须是一次原子操作，
//! 两个并发的 bump 不能读到同一个旧值。

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::FaqResult;

/// 版本号注册表
#[async_trait]
pub trait CacheVersionRegistry: Send + Sync {
    /// 当前版本号，未初始化时原子地初始化为 1
    async fn get_version(&self, family: &str) -> FaqResult<u64>;

    /// 原子递增并返回新版本号
    async fn bump_version(&self, family: &str) -> FaqResult<u64>;
}

/// 进程内版本号注册表
///
/// DashMap 的 entry 持有分片写锁，初始化与递增在锁内完成。
#[derive(Debug, Default)]
pub struct InMemoryVersionRegistry {
    versions: DashMap<String, u64>,
}

impl InMemoryVersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheVersionRegistry for InMemoryVersionRegistry {
    async fn get_version(&self, family: &str) -> FaqResult<u64> {
        if let Some(version) = self.versions.get(family) {
            return Ok(*version);
        }
        Ok(*self.versions.entry(family.to_string()).or_insert(1))
    }

    async fn bump_version(&self, family: &str) -> FaqResult<u64> {
        let mut entry = self.versions.entry(family.to_string()).or_insert(1);
        *entry += 1;
        let version = *entry;
        drop(entry);

        tracing::debug!("缓存版本递增: family={} version={}", family, version);
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_initialized_to_one() {
        let registry = InMemoryVersionRegistry::new();
        assert_eq!(registry.get_version("faq").await.unwrap(), 1);
        assert_eq!(registry.get_version("faq").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_families_are_independent() {
        let registry = InMemoryVersionRegistry::new();
        assert_eq!(registry.bump_version("faq").await.unwrap(), 2);
        assert_eq!(registry.get_version("glossary").await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_bumps_are_distinct() {
        let registry = Arc::new(InMemoryVersionRegistry::new());
        let initial = registry.get_version("faq").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.bump_version("faq").await.unwrap()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }

        assert_eq!(registry.get_version("faq").await.unwrap(), initial + 50);
        assert_eq!(seen.into_iter().min(), Some(initial + 1));
    }
}
