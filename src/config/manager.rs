//! 配置管理器
//!
//! 加载顺序: 默认值 -> 配置文件 (TOML/JSON) -> .env -> 环境变量

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::error::{FaqError, FaqResult};
use crate::jobs::RetryPolicy;

/// 服务配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FaqConfig {
    // 语言配置
    pub source_lang: String,
    pub target_languages: Vec<String>,

    // 翻译服务
    pub api_url: String,
    pub translator_timeout_secs: u64,

    // 缓存配置
    pub cache_family: String,
    pub response_ttl_secs: u64,
    pub local_cache_size: usize,
    pub redis_url: Option<String>,

    // 后台任务
    pub fill_workers: usize,
    pub max_fill_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub fill_on_create: bool,
    pub reset_translations_on_change: bool,

    // 存储
    pub mongodb_url: Option<String>,
    pub mongodb_database: String,
}

impl Default for FaqConfig {
    fn default() -> Self {
        Self {
            source_lang: constants::DEFAULT_SOURCE_LANG.to_string(),
            target_languages: constants::DEFAULT_TARGET_LANGUAGES
                .iter()
                .map(|lang| lang.to_string())
                .collect(),

            api_url: constants::DEFAULT_API_URL.to_string(),
            translator_timeout_secs: constants::DEFAULT_TRANSLATOR_TIMEOUT.as_secs(),

            cache_family: constants::DEFAULT_CACHE_FAMILY.to_string(),
            response_ttl_secs: constants::DEFAULT_RESPONSE_TTL.as_secs(),
            local_cache_size: constants::DEFAULT_LOCAL_CACHE_SIZE,
            redis_url: None,

            fill_workers: constants::DEFAULT_FILL_WORKERS,
            max_fill_attempts: constants::DEFAULT_MAX_FILL_ATTEMPTS,
            retry_base_delay_ms: constants::DEFAULT_RETRY_BASE_DELAY.as_millis() as u64,
            retry_max_delay_ms: constants::DEFAULT_RETRY_MAX_DELAY.as_millis() as u64,
            fill_on_create: true,
            reset_translations_on_change: true,

            mongodb_url: None,
            mongodb_database: "faq".to_string(),
        }
    }
}

impl FaqConfig {
    /// 验证配置
    pub fn validate(&self) -> FaqResult<()> {
        if self.source_lang.trim().is_empty() {
            return Err(FaqError::Config("源语言不能为空".to_string()));
        }

        if self.target_languages.iter().any(|lang| lang.trim().is_empty()) {
            return Err(FaqError::Config("目标语言不能为空字符串".to_string()));
        }

        if self.cache_family.is_empty() || self.cache_family.contains('_') {
            return Err(FaqError::Config(
                "缓存资源族名称不能为空且不能包含 '_'".to_string(),
            ));
        }

        if self.response_ttl_secs == 0 {
            return Err(FaqError::Config("响应缓存TTL必须大于0".to_string()));
        }

        if self.local_cache_size == 0 {
            return Err(FaqError::Config("本地缓存大小不能为0".to_string()));
        }

        if self.translator_timeout_secs == 0 {
            return Err(FaqError::Config("翻译超时必须大于0".to_string()));
        }

        if self.fill_workers == 0 {
            return Err(FaqError::Config("后台任务工作协程数不能为0".to_string()));
        }

        if self.max_fill_attempts == 0 {
            return Err(FaqError::Config("最大尝试次数不能为0".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) -> FaqResult<()> {
        use crate::env::{cache, jobs, mongodb, translation, EnvVar};

        if let Some(value) = translation::SourceLang::get_set() {
            self.source_lang = value?;
        }
        if let Some(value) = translation::TargetLanguages::get_set() {
            self.target_languages = value?;
        }
        if let Some(value) = translation::ApiUrl::get_set() {
            self.api_url = value?;
            tracing::info!("环境变量覆盖 API URL: {}", self.api_url);
        }
        if let Some(value) = translation::Timeout::get_set() {
            self.translator_timeout_secs = value?.as_secs();
        }

        if let Some(value) = cache::ResponseTtl::get_set() {
            self.response_ttl_secs = value?.as_secs();
        }
        if let Some(value) = cache::LocalCacheSize::get_set() {
            self.local_cache_size = value?;
        }
        if let Some(value) = cache::RedisUrl::get_set() {
            self.redis_url = Some(value?);
        }

        if let Some(value) = jobs::Workers::get_set() {
            self.fill_workers = value?;
        }
        if let Some(value) = jobs::MaxAttempts::get_set() {
            self.max_fill_attempts = value? as u32;
        }
        if let Some(value) = jobs::RetryDelay::get_set() {
            self.retry_base_delay_ms = value?.as_millis() as u64;
        }

        if let Some(value) = mongodb::ConnectionString::get_set() {
            self.mongodb_url = Some(value?);
        }
        if let Some(value) = mongodb::DatabaseName::get_set() {
            self.mongodb_database = value?;
        }

        Ok(())
    }

    pub fn translator_timeout(&self) -> Duration {
        Duration::from_secs(self.translator_timeout_secs)
    }

    pub fn response_ttl(&self) -> Duration {
        Duration::from_secs(self.response_ttl_secs)
    }

    /// 后台任务重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_fill_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: FaqConfig,
}

impl ConfigManager {
    /// 按默认搜索路径加载配置
    pub fn new() -> FaqResult<Self> {
        Self::load(None)
    }

    /// 加载配置，`path` 指定时只读取该文件
    pub fn load(path: Option<&str>) -> FaqResult<Self> {
        Self::load_dotenv();

        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::find_config_file()?,
        };
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &FaqConfig {
        &self.config
    }

    pub fn into_config(self) -> FaqConfig {
        self.config
    }

    fn find_config_file() -> FaqResult<FaqConfig> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(FaqConfig::default())
    }

    /// 从指定文件加载配置
    pub fn load_from_file(path: &str) -> FaqResult<FaqConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FaqError::Config(format!("读取配置文件失败: {}", e)))?;
        Self::parse(path, &content)
    }

    fn parse(path: &str, content: &str) -> FaqResult<FaqConfig> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .map_err(|e| FaqError::Config(format!("解析JSON配置失败: {}", e)))
        } else {
            toml::from_str(content)
                .map_err(|e| FaqError::Config(format!("解析TOML配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> FaqResult<()> {
        let content = toml::to_string_pretty(&FaqConfig::default())
            .map_err(|e| FaqError::Config(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| FaqError::Config(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = FaqConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.response_ttl(), Duration::from_secs(900));
        assert_eq!(config.retry_policy().max_attempts, 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ConfigManager::parse(
            "faq-lingo.toml",
            r#"
                target_languages = ["fr", "de"]
                response_ttl_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.target_languages, vec!["fr", "de"]);
        assert_eq!(config.response_ttl_secs, 60);
        assert_eq!(config.source_lang, "en");
        assert_eq!(config.cache_family, "faq");
    }

    #[test]
    fn test_json_config() {
        let config =
            ConfigManager::parse("config.json", r#"{"source_lang": "fr", "fill_workers": 2}"#)
                .unwrap();
        assert_eq!(config.source_lang, "fr");
        assert_eq!(config.fill_workers, 2);
    }

    #[test]
    fn test_invalid_family_rejected() {
        let config = FaqConfig {
            cache_family: "faq_items".to_string(),
            ..FaqConfig::default()
        };
        assert!(matches!(config.validate(), Err(FaqError::Config(_))));
    }
}
