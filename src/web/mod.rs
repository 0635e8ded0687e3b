//! Web 服务器模块
//!
//! 为多语言 FAQ 提供 HTTP API。可选后端 (MongoDB / Redis) 连接失败时
//! 记录警告并退回到进程内实现，服务仍然可用。

pub mod config;
pub mod handlers;
pub mod routes;
pub mod types;

pub use config::*;
pub use routes::*;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::cache::{CacheVersionRegistry, InMemoryVersionRegistry, LocalResponseCache, ResponseCache};
use crate::config::FaqConfig;
use crate::error::{FaqError, FaqResult};
use crate::service::{FaqService, ServiceBackends, ServiceSettings};
use crate::storage::{FaqRepository, InMemoryStore, TranslationStore};
use crate::translation::DeepLxTranslator;

/// 本地缓存过期条目清理间隔
const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Web 服务器
pub struct WebServer {
    config: WebConfig,
    faq_config: FaqConfig,
}

impl WebServer {
    /// 创建新的 Web 服务器
    pub fn new(config: WebConfig, faq_config: FaqConfig) -> Self {
        Self { config, faq_config }
    }

    /// 启动 Web 服务器，收到 Ctrl-C 后停止接收请求并等待后台任务完成
    pub async fn start(&self) -> FaqResult<()> {
        self.config.validate()?;

        let service = Arc::new(build_service(&self.faq_config).await?);
        let app = create_router(Arc::new(AppState {
            service: service.clone(),
        }));

        let listener = tokio::net::TcpListener::bind(self.config.listen_address())
            .await
            .map_err(|e| FaqError::Internal(format!("Failed to bind server: {}", e)))?;

        tracing::info!(
            "Web server starting at http://{}",
            self.config.listen_address()
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| FaqError::Internal(format!("Server error: {}", e)))?;

        service.shutdown().await;
        Ok(())
    }
}

/// 创建路由器
pub fn create_router(app_state: Arc<AppState>) -> Router {
    create_routes()
        .with_state(app_state)
        .layer(CorsLayer::permissive())
}

/// 按配置组装服务
pub async fn build_service(config: &FaqConfig) -> FaqResult<FaqService> {
    let translator = Arc::new(DeepLxTranslator::new(
        config.api_url.as_str(),
        config.source_lang.as_str(),
    )?);
    tracing::info!("翻译服务: {}", translator.api_url());

    let (faqs, translations) = open_store(config).await;
    let (versions, cache) = open_cache(config).await;

    Ok(FaqService::new(
        ServiceBackends {
            faqs,
            translations,
            translator,
            versions,
            cache,
        },
        ServiceSettings::from(config),
    ))
}

type Stores = (Arc<dyn FaqRepository>, Arc<dyn TranslationStore>);

async fn open_store(config: &FaqConfig) -> Stores {
    #[cfg(feature = "mongo")]
    if let Some(url) = &config.mongodb_url {
        use crate::storage::{MongoConfig, MongoStore};

        let mongo_config = MongoConfig {
            connection_string: url.clone(),
            database_name: config.mongodb_database.clone(),
        };
        match MongoStore::connect(&mongo_config).await {
            Ok(store) => {
                let store = Arc::new(store);
                return (store.clone(), store);
            }
            Err(e) => {
                tracing::warn!("MongoDB 连接失败: {}", e);
                tracing::warn!("继续运行，数据只保存在内存中");
            }
        }
    }

    #[cfg(not(feature = "mongo"))]
    if config.mongodb_url.is_some() {
        tracing::warn!("已配置 MongoDB，但未启用 mongo feature，使用内存存储");
    }

    let store = Arc::new(InMemoryStore::new());
    (store.clone(), store)
}

type Caches = (Arc<dyn CacheVersionRegistry>, Arc<dyn ResponseCache>);

async fn open_cache(config: &FaqConfig) -> Caches {
    #[cfg(feature = "redis-cache")]
    if let Some(url) = &config.redis_url {
        use crate::redis_cache::{
            RedisCache, RedisCacheConfig, RedisResponseCache, RedisVersionRegistry,
        };

        match RedisCache::connect(RedisCacheConfig::new(url.as_str())).await {
            Ok(redis) => {
                return (
                    Arc::new(RedisVersionRegistry::new(redis.clone())),
                    Arc::new(RedisResponseCache::new(redis)),
                );
            }
            Err(e) => {
                tracing::warn!("Redis 连接失败: {}", e);
                tracing::warn!("继续运行，使用进程内缓存");
            }
        }
    }

    #[cfg(not(feature = "redis-cache"))]
    if config.redis_url.is_some() {
        tracing::warn!("已配置 Redis，但未启用 redis-cache feature，使用进程内缓存");
    }

    let cache = Arc::new(LocalResponseCache::new(config.local_cache_size));
    spawn_cache_cleanup(cache.clone());
    (Arc::new(InMemoryVersionRegistry::new()), cache)
}

fn spawn_cache_cleanup(cache: Arc<LocalResponseCache>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_CLEANUP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            cache.cleanup_expired().await;
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("无法监听 Ctrl-C 信号: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("收到关闭信号，正在停止服务");
}
