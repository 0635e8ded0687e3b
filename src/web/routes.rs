//! Web 路由定义

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::web::{handlers::*, types::AppState};

/// 创建路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        // FAQ
        .route("/api/faqs", get(list_faqs).post(create_faq))
        .route(
            "/api/faqs/:id",
            get(get_faq)
                .put(replace_faq)
                .patch(update_faq)
                .delete(delete_faq),
        )
        .route("/api/faqs/:id/translations", get(list_translations))
        // 后台任务
        .route("/api/jobs", get(list_jobs))
        .route("/api/jobs/:id", get(get_job))
        // 缓存管理
        .route("/api/cache/version", get(get_cache_version))
        .route("/api/cache/stats", get(get_cache_stats))
        .route("/api/cache/invalidate", post(invalidate_cache))
}
