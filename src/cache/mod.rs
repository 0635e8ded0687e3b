//! 响应缓存与版本化失效
//!
//! 每个派生缓存键都带上资源族的当前版本号。写操作只需把版本号加一，
//! 旧版本下计算出的键就再也不会被查询，不必逐个删除。
//!
//! 键格式: `<family>_<kind>_<id 或 'list'>_<lang>_v<version>`

pub mod local;
pub mod version;

pub use local::LocalResponseCache;
pub use version::{CacheVersionRegistry, InMemoryVersionRegistry};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::FaqResult;
use crate::model::FaqId;

/// 缓存的响应种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    List,
    Detail,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::List => "list",
            CacheKind::Detail => "detail",
        }
    }
}

/// 版本化缓存键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub family: String,
    pub kind: CacheKind,
    /// 列表键为 `None`
    pub id: Option<FaqId>,
    pub language: String,
    pub version: u64,
}

impl CacheKey {
    /// 列表响应键
    pub fn list(family: &str, language: &str, version: u64) -> Self {
        Self {
            family: family.to_string(),
            kind: CacheKind::List,
            id: None,
            language: language.to_string(),
            version,
        }
    }

    /// 详情响应键
    pub fn detail(family: &str, id: FaqId, language: &str, version: u64) -> Self {
        Self {
            family: family.to_string(),
            kind: CacheKind::Detail,
            id: Some(id),
            language: language.to_string(),
            version,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(
                f,
                "{}_{}_{}_{}_v{}",
                self.family,
                self.kind.as_str(),
                id,
                self.language,
                self.version
            ),
            None => write!(
                f,
                "{}_{}_list_{}_v{}",
                self.family,
                self.kind.as_str(),
                self.language,
                self.version
            ),
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub backend: String,
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
}

impl CacheStats {
    /// 命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// 序列化响应缓存
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// 读取缓存，过期或不存在返回 `None`
    async fn get(&self, key: &str) -> FaqResult<Option<String>>;

    /// 写入缓存
    async fn set(&self, key: &str, payload: String, ttl: Duration) -> FaqResult<()>;

    /// 统计信息
    async fn stats(&self) -> CacheStats;
}
