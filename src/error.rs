//! 统一错误处理
//!
//! 提供结构化错误类型。读路径上的翻译/存储错误只记录日志并回退到原文，
//! 后台任务中的错误则上报给任务监控。

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::model::FaqId;

/// FAQ 翻译子系统错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FaqError {
    /// 翻译服务失败
    #[error("翻译服务不可用: {0}")]
    TranslationUnavailable(String),

    /// 翻译调用超时
    #[error("翻译调用超时 ({0:?})")]
    Timeout(Duration),

    /// FAQ 不存在
    #[error("FAQ {0} does not exist")]
    EntityNotFound(FaqId),

    /// (faq, language) 唯一约束冲突
    #[error("唯一约束冲突: FAQ {faq_id} 已存在语言 '{language}' 的翻译")]
    DuplicateTranslation { faq_id: FaqId, language: String },

    /// 译文写入时源文本已变化
    #[error("源文本已变化，放弃写入: FAQ {faq_id} 语言 '{language}'")]
    SourceChanged { faq_id: FaqId, language: String },

    /// 存储错误
    #[error("存储错误: {0}")]
    Store(String),

    /// 重试次数耗尽
    #[error("重试 {attempts} 次后仍然失败: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    /// 缓存错误
    #[error("缓存错误: {0}")]
    Cache(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl FaqError {
    /// 检查错误是否可重试
    ///
    /// 后台填充任务据此决定是继续重试还是立即永久失败。
    pub fn is_retryable(&self) -> bool {
        match self {
            FaqError::TranslationUnavailable(_) => true,
            FaqError::Timeout(_) => true,
            FaqError::Store(_) => true,
            FaqError::Cache(_) => true,
            FaqError::DuplicateTranslation { .. } => true,
            FaqError::SourceChanged { .. } => true,
            FaqError::EntityNotFound(_) => false,
            FaqError::RetryExhausted { .. } => false,
            FaqError::Config(_) => false,
            FaqError::InvalidInput(_) => false,
            FaqError::Internal(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FaqError::InvalidInput(_) => ErrorSeverity::Info,
            FaqError::TranslationUnavailable(_) => ErrorSeverity::Warning,
            FaqError::Timeout(_) => ErrorSeverity::Warning,
            FaqError::Cache(_) => ErrorSeverity::Warning,
            FaqError::DuplicateTranslation { .. } => ErrorSeverity::Warning,
            FaqError::SourceChanged { .. } => ErrorSeverity::Info,
            FaqError::EntityNotFound(_) => ErrorSeverity::Error,
            FaqError::Store(_) => ErrorSeverity::Error,
            FaqError::RetryExhausted { .. } => ErrorSeverity::Error,
            FaqError::Config(_) => ErrorSeverity::Critical,
            FaqError::Internal(_) => ErrorSeverity::Critical,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        let wrap = |msg: String| format!("{} (上下文: {})", msg, context);

        match self {
            FaqError::TranslationUnavailable(msg) => FaqError::TranslationUnavailable(wrap(msg)),
            FaqError::Store(msg) => FaqError::Store(wrap(msg)),
            FaqError::Cache(msg) => FaqError::Cache(wrap(msg)),
            FaqError::Config(msg) => FaqError::Config(wrap(msg)),
            FaqError::InvalidInput(msg) => FaqError::InvalidInput(wrap(msg)),
            FaqError::Internal(msg) => FaqError::Internal(wrap(msg)),
            other => other,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl From<std::io::Error> for FaqError {
    fn from(error: std::io::Error) -> Self {
        FaqError::Internal(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for FaqError {
    fn from(error: serde_json::Error) -> Self {
        FaqError::Internal(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for FaqError {
    fn from(error: toml::de::Error) -> Self {
        FaqError::Config(format!("TOML解析错误: {}", error))
    }
}

impl From<reqwest::Error> for FaqError {
    fn from(error: reqwest::Error) -> Self {
        FaqError::TranslationUnavailable(format!("HTTP请求失败: {}", error))
    }
}

impl From<crate::env::EnvError> for FaqError {
    fn from(error: crate::env::EnvError) -> Self {
        FaqError::Config(error.to_string())
    }
}

#[cfg(feature = "redis-cache")]
impl From<redis::RedisError> for FaqError {
    fn from(error: redis::RedisError) -> Self {
        FaqError::Cache(format!("Redis错误: {}", error))
    }
}

#[cfg(feature = "mongo")]
impl From<mongodb::error::Error> for FaqError {
    fn from(error: mongodb::error::Error) -> Self {
        FaqError::Store(format!("MongoDB错误: {}", error))
    }
}

/// 错误结果类型别名
pub type FaqResult<T> = Result<T, FaqError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误
    pub fn log_error(error: &FaqError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("FAQ信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("FAQ警告: {}", error),
            ErrorSeverity::Error => tracing::error!("FAQ错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("FAQ严重错误: {}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entity_is_permanent() {
        let err = FaqError::EntityNotFound(FaqId(9999));
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "FAQ 9999 does not exist");
    }

    #[test]
    fn test_translator_failures_are_retryable() {
        assert!(FaqError::TranslationUnavailable("API Error".into()).is_retryable());
        assert!(FaqError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(FaqError::Store("disk full".into()).is_retryable());
    }

    #[test]
    fn test_context_is_appended() {
        let err = FaqError::Store("写入失败".into()).with_context("faq=1 lang=fr");
        assert!(err.to_string().contains("faq=1 lang=fr"));

        let timeout = FaqError::Timeout(Duration::from_secs(1)).with_context("ignored");
        assert_eq!(timeout, FaqError::Timeout(Duration::from_secs(1)));
    }
}
