//! Web 路由处理器

pub mod cache;
pub mod faq;
pub mod jobs;

pub use cache::*;
pub use faq::*;
pub use jobs::*;

use axum::async_trait;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Json;
use serde::de::DeserializeOwned;

use crate::error::{helpers, FaqError};
use crate::web::types::ApiError;

/// 路径参数提取器，解析失败时返回统一的 JSON 错误
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ApiPath(value))
            .map_err(|rejection| {
                error_response(FaqError::InvalidInput(format!(
                    "无效的路径参数: {}",
                    rejection.body_text()
                )))
            })
    }
}

/// 将服务错误映射为 JSON 错误响应
pub(crate) fn error_response(error: FaqError) -> ApiError {
    let status = match &error {
        FaqError::EntityNotFound(_) => StatusCode::NOT_FOUND,
        FaqError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        FaqError::DuplicateTranslation { .. } | FaqError::SourceChanged { .. } => {
            StatusCode::CONFLICT
        }
        _ => {
            helpers::log_error(&error);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(serde_json::json!({
            "error": true,
            "message": error.to_string()
        })),
    )
}

/// 404 响应
pub(crate) fn not_found(message: impl Into<String>) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": true,
            "message": message.into()
        })),
    )
}
