//! Redis 缓存模块
//!
//! 为多实例部署提供共享的版本号注册表和响应缓存。
//! 版本号的读取和递增各是一段 Lua 脚本，初始化与读取/递增在同一次往返内原子完成。
//! 版本键被淘汰后会重新从 1 开始。

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, Script};

use crate::cache::{CacheStats, CacheVersionRegistry, ResponseCache};
use crate::error::{FaqError, FaqResult};

/// Redis 缓存配置
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    pub url: String,
    pub key_prefix: String,
}

impl RedisCacheConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key_prefix: "faq-lingo:".to_string(),
        }
    }
}

/// Redis 连接
#[derive(Clone)]
pub struct RedisCache {
    connection: MultiplexedConnection,
    config: RedisCacheConfig,
}

impl RedisCache {
    /// 建立连接并 PING 一次
    pub async fn connect(config: RedisCacheConfig) -> FaqResult<Self> {
        let client = Client::open(config.url.as_str())?;
        let mut connection = client.get_multiplexed_async_connection().await?;

        let pong: String = redis::cmd("PING").query_async(&mut connection).await?;
        tracing::info!("Redis 连接成功: {} ({})", config.url, pong);

        Ok(Self { connection, config })
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}{}", self.config.key_prefix, suffix)
    }

    fn version_key(&self, family: &str) -> String {
        self.key(&format!("version:{}", family))
    }
}

/// 读取版本号，不存在时置 1
const GET_VERSION_SCRIPT: &str = r"
local version = redis.call('GET', KEYS[1])
if not version then
    redis.call('SET', KEYS[1], 1)
    return 1
end
return tonumber(version)
";

/// 递增版本号，不存在时先置 1，第一次递增返回 2
const BUMP_VERSION_SCRIPT: &str = r"
redis.call('SET', KEYS[1], 1, 'NX')
return redis.call('INCR', KEYS[1])
";

/// 基于 Redis 的版本号注册表
#[derive(Clone)]
pub struct RedisVersionRegistry {
    cache: RedisCache,
    get_script: Script,
    bump_script: Script,
}

impl RedisVersionRegistry {
    pub fn new(cache: RedisCache) -> Self {
        Self {
            cache,
            get_script: Script::new(GET_VERSION_SCRIPT),
            bump_script: Script::new(BUMP_VERSION_SCRIPT),
        }
    }
}

#[async_trait]
impl CacheVersionRegistry for RedisVersionRegistry {
    async fn get_version(&self, family: &str) -> FaqResult<u64> {
        let mut conn = self.cache.connection.clone();
        let version: u64 = self
            .get_script
            .key(self.cache.version_key(family))
            .invoke_async(&mut conn)
            .await?;
        Ok(version)
    }

    async fn bump_version(&self, family: &str) -> FaqResult<u64> {
        let mut conn = self.cache.connection.clone();
        let version: u64 = self
            .bump_script
            .key(self.cache.version_key(family))
            .invoke_async(&mut conn)
            .await?;

        tracing::debug!("Redis 缓存版本递增: family={} version={}", family, version);
        Ok(version)
    }
}

/// 基于 Redis 的响应缓存
#[derive(Clone)]
pub struct RedisResponseCache {
    cache: RedisCache,
}

impl RedisResponseCache {
    pub fn new(cache: RedisCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl ResponseCache for RedisResponseCache {
    async fn get(&self, key: &str) -> FaqResult<Option<String>> {
        let mut conn = self.cache.connection.clone();
        let payload: Option<String> = redis::cmd("GET")
            .arg(self.cache.key(key))
            .query_async(&mut conn)
            .await?;

        if payload.is_some() {
            metrics::counter!("faq_response_cache_hits_total").increment(1);
        } else {
            metrics::counter!("faq_response_cache_misses_total").increment(1);
        }
        Ok(payload)
    }

    async fn set(&self, key: &str, payload: String, ttl: Duration) -> FaqResult<()> {
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.cache.connection.clone();

        let _: () = redis::cmd("SET")
            .arg(self.cache.key(key))
            .arg(payload)
            .arg("EX")
            .arg(seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| FaqError::from(e).with_context(key))?;
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        let mut conn = self.cache.connection.clone();
        let entries: usize = redis::cmd("DBSIZE")
            .query_async(&mut conn)
            .await
            .unwrap_or_default();

        CacheStats {
            backend: "redis".to_string(),
            entries,
            ..CacheStats::default()
        }
    }
}
