//! FAQ API 处理器

use std::sync::Arc;

use axum::{
    extract::{Json as ExtractJson, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};

use super::{error_response, ApiPath};
use crate::error::FaqError;
use crate::model::{Faq, FaqId, FaqPatch, NewFaq, Translation};
use crate::web::types::{ApiError, AppState, LangQuery};

fn json_payload(payload: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], payload).into_response()
}

/// 按语言列出 FAQ
pub async fn list_faqs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LangQuery>,
) -> Result<Response, ApiError> {
    let lang = query.resolve(&state.service.settings().source_lang);
    let payload = state.service.list(lang).await.map_err(error_response)?;
    Ok(json_payload(payload))
}

/// 按语言获取单个 FAQ
pub async fn get_faq(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<FaqId>,
    Query(query): Query<LangQuery>,
) -> Result<Response, ApiError> {
    let lang = query.resolve(&state.service.settings().source_lang);
    match state.service.detail(id, lang).await.map_err(error_response)? {
        Some(payload) => Ok(json_payload(payload)),
        None => Err(error_response(FaqError::EntityNotFound(id))),
    }
}

/// 创建 FAQ
pub async fn create_faq(
    State(state): State<Arc<AppState>>,
    ExtractJson(request): ExtractJson<NewFaq>,
) -> Result<(StatusCode, Json<Faq>), ApiError> {
    let faq = state.service.create(request).await.map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(faq)))
}

/// 整体替换 FAQ
pub async fn replace_faq(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<FaqId>,
    ExtractJson(request): ExtractJson<NewFaq>,
) -> Result<Json<Faq>, ApiError> {
    let faq = state
        .service
        .replace(id, request)
        .await
        .map_err(error_response)?;
    Ok(Json(faq))
}

/// 部分更新 FAQ
pub async fn update_faq(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<FaqId>,
    ExtractJson(patch): ExtractJson<FaqPatch>,
) -> Result<Json<Faq>, ApiError> {
    let faq = state
        .service
        .update(id, patch)
        .await
        .map_err(error_response)?;
    Ok(Json(faq))
}

/// 删除 FAQ
pub async fn delete_faq(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<FaqId>,
) -> Result<StatusCode, ApiError> {
    state.service.delete(id).await.map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// 列出 FAQ 的全部译文
pub async fn list_translations(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<FaqId>,
) -> Result<Json<Vec<Translation>>, ApiError> {
    let translations = state
        .service
        .translations(id)
        .await
        .map_err(error_response)?;
    Ok(Json(translations))
}
