//! Web 模块的数据类型定义

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::jobs::{JobRecord, JobSummary};
use crate::service::FaqService;

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FaqService>,
}

/// 处理器错误响应
pub type ApiError = (StatusCode, Json<serde_json::Value>);

/// `?lang=` 查询参数
#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

impl LangQuery {
    /// 请求语言，缺省为源语言
    pub fn resolve<'a>(&'a self, source_lang: &'a str) -> &'a str {
        match self.lang.as_deref().map(str::trim) {
            Some(lang) if !lang.is_empty() => lang,
            _ => source_lang,
        }
    }
}

/// 任务列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct JobsQuery {
    /// 只返回失败任务
    #[serde(default)]
    pub failed: bool,
}

/// 任务列表响应
#[derive(Serialize)]
pub struct JobsResponse {
    pub summary: JobSummary,
    pub jobs: Vec<JobRecord>,
}

/// 缓存版本响应
#[derive(Serialize)]
pub struct VersionResponse {
    pub family: String,
    pub version: u64,
}

/// 缓存统计响应
#[derive(Serialize)]
pub struct CacheStatsResponse {
    pub family: String,
    pub version: Option<u64>,
    pub ttl_secs: u64,
    pub stats: CacheStats,
    pub hit_rate: f64,
}

/// 健康检查响应
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub source_lang: String,
    pub target_languages: Vec<String>,
    pub jobs: JobSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lang_defaults_to_source() {
        assert_eq!(LangQuery::default().resolve("en"), "en");

        let blank = LangQuery {
            lang: Some("  ".to_string()),
        };
        assert_eq!(blank.resolve("en"), "en");

        let fr = LangQuery {
            lang: Some("fr".to_string()),
        };
        assert_eq!(fr.resolve("en"), "fr");
    }
}
