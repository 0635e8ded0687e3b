//! 后台任务 API 处理器

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Json,
};
use uuid::Uuid;

use super::{not_found, ApiPath};
use crate::jobs::JobRecord;
use crate::web::types::{ApiError, AppState, HealthResponse, JobsQuery, JobsResponse};

/// 列出填充任务，`?failed=true` 只返回失败任务
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<JobsQuery>,
) -> Json<JobsResponse> {
    let monitor = state.service.jobs();
    let jobs = if query.failed {
        monitor.failed()
    } else {
        monitor.snapshot()
    };

    Json(JobsResponse {
        summary: monitor.summary(),
        jobs,
    })
}

/// 获取单个任务
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<JobRecord>, ApiError> {
    state
        .service
        .jobs()
        .get(id)
        .map(Json)
        .ok_or_else(|| not_found(format!("任务 {} 不存在", id)))
}

/// 健康检查
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let settings = state.service.settings();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        source_lang: settings.source_lang.clone(),
        target_languages: settings.target_languages.clone(),
        jobs: state.service.jobs().summary(),
    })
}
