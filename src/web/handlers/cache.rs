//! 缓存相关API处理器

use std::sync::Arc;

use axum::{extract::State, response::Json};

use super::error_response;
use crate::web::types::{ApiError, AppState, CacheStatsResponse, VersionResponse};

/// 当前缓存版本
pub async fn get_cache_version(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VersionResponse>, ApiError> {
    let version = state
        .service
        .current_version()
        .await
        .map_err(error_response)?;

    Ok(Json(VersionResponse {
        family: state.service.settings().family.clone(),
        version,
    }))
}

/// 手动失效全部派生响应
pub async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VersionResponse>, ApiError> {
    let version = state.service.invalidate().await.map_err(error_response)?;

    Ok(Json(VersionResponse {
        family: state.service.settings().family.clone(),
        version,
    }))
}

/// 获取缓存统计信息
pub async fn get_cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStatsResponse> {
    let settings = state.service.settings();
    let stats = state.service.cache_stats().await;
    let version = match state.service.current_version().await {
        Ok(version) => Some(version),
        Err(e) => {
            tracing::warn!("获取缓存版本失败: {}", e);
            None
        }
    };

    Json(CacheStatsResponse {
        family: settings.family.clone(),
        version,
        ttl_secs: settings.response_ttl.as_secs(),
        hit_rate: stats.hit_rate(),
        stats,
    })
}
