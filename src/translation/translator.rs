//! 翻译服务接口
//!
//! `Translator` 是唯一的外部翻译能力抽象；所有调用都应经过
//! [`translate_with_timeout`]，挂起的请求不能无限占用调用方。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{FaqError, FaqResult};

/// 外部翻译能力
#[async_trait]
pub trait Translator: Send + Sync {
    /// 将 `text` 翻译为 `target_lang`
    async fn translate(&self, text: &str, target_lang: &str) -> FaqResult<String>;

    /// 翻译器名称，用于日志
    fn name(&self) -> &str {
        "translator"
    }
}

/// 带超时的翻译调用，超时记为 `FaqError::Timeout`
pub async fn translate_with_timeout(
    translator: &dyn Translator,
    text: &str,
    target_lang: &str,
    limit: Duration,
) -> FaqResult<String> {
    match tokio::time::timeout(limit, translator.translate(text, target_lang)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                "{} 翻译超时: lang={} limit={:?}",
                translator.name(),
                target_lang,
                limit
            );
            Err(FaqError::Timeout(limit))
        }
    }
}

/// DeepLX 请求体
#[derive(Debug, Serialize)]
struct DeepLxRequest<'a> {
    text: &'a str,
    source_lang: String,
    target_lang: String,
}

/// DeepLX 响应体
#[derive(Debug, Deserialize)]
struct DeepLxResponse {
    code: u16,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// DeepLX 兼容的 HTTP 翻译器
#[derive(Debug, Clone)]
pub struct DeepLxTranslator {
    client: reqwest::Client,
    api_url: String,
    source_lang: String,
}

impl DeepLxTranslator {
    /// 创建翻译器，`api_url` 必须是 http(s) 地址
    pub fn new(api_url: impl Into<String>, source_lang: impl Into<String>) -> FaqResult<Self> {
        let api_url = api_url.into();
        url::Url::parse(&api_url)
            .map_err(|e| FaqError::Config(format!("无效的翻译API地址 '{}': {}", api_url, e)))?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("faq-lingo/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url,
            source_lang: source_lang.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl Translator for DeepLxTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> FaqResult<String> {
        let request = DeepLxRequest {
            text,
            source_lang: self.source_lang.to_uppercase(),
            target_lang: target_lang.to_uppercase(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FaqError::TranslationUnavailable(format!(
                "HTTP {} from {}",
                status, self.api_url
            )));
        }

        let body: DeepLxResponse = response.json().await?;
        if body.code != 200 {
            return Err(FaqError::TranslationUnavailable(format!(
                "DeepLX code {}: {}",
                body.code,
                body.message.unwrap_or_default()
            )));
        }

        body.data.ok_or_else(|| {
            FaqError::TranslationUnavailable("DeepLX 响应缺少 data 字段".to_string())
        })
    }

    fn name(&self) -> &str {
        "deeplx"
    }
}
