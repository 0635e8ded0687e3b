//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 仅在变量被显式设置时返回值
    fn get_set() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "FAQ_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;

    /// 源语言
    pub struct SourceLang;
    impl EnvVar<String> for SourceLang {
        const NAME: &'static str = "FAQ_SOURCE_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Canonical language of FAQ questions";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("en".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            parse_language(value, Self::NAME)
        }
    }

    /// 后台预翻译的目标语言
    pub struct TargetLanguages;
    impl EnvVar<Vec<String>> for TargetLanguages {
        const NAME: &'static str = "FAQ_TARGET_LANGUAGES";
        const DEFAULT: Option<Vec<String>> = None;
        const DESCRIPTION: &'static str = "Languages pre-translated in the background (comma-separated)";

        fn get() -> EnvResult<Vec<String>> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(vec!["hi".to_string(), "bn".to_string()]),
            }
        }

        fn parse(value: &str) -> EnvResult<Vec<String>> {
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse_language(s, Self::NAME))
                .collect()
        }
    }

    /// 翻译 API 地址
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "FAQ_TRANSLATION_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "DeepLX compatible translation endpoint";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(crate::config::constants::DEFAULT_API_URL.to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let parsed = url::Url::parse(value.trim()).map_err(|e| EnvError {
                variable: Self::NAME.to_string(),
                message: format!("Invalid URL: {}", e),
            })?;

            match parsed.scheme() {
                "http" | "https" => Ok(value.trim().to_string()),
                scheme => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Unsupported scheme '{}'. Use http or https", scheme),
                }),
            }
        }
    }

    /// 单次翻译调用超时
    pub struct Timeout;
    impl EnvVar<Duration> for Timeout {
        const NAME: &'static str = "FAQ_TRANSLATION_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(10));
        const DESCRIPTION: &'static str = "Translator call timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_seconds(value, Self::NAME, 1, 300)
        }
    }
}

/// 缓存相关环境变量
pub mod cache {
    use super::*;

    /// 响应缓存TTL
    pub struct ResponseTtl;
    impl EnvVar<Duration> for ResponseTtl {
        const NAME: &'static str = "FAQ_CACHE_TTL";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(900));
        const DESCRIPTION: &'static str = "Rendered response TTL in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_seconds(value, Self::NAME, 1, 86400 * 7)
        }
    }

    /// 本地缓存大小
    pub struct LocalCacheSize;
    impl EnvVar<usize> for LocalCacheSize {
        const NAME: &'static str = "FAQ_CACHE_LOCAL_SIZE";
        const DEFAULT: Option<usize> = Some(1000);
        const DESCRIPTION: &'static str = "Local response cache size (number of entries)";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 10, 100000)
        }
    }

    /// Redis 地址
    pub struct RedisUrl;
    impl EnvVar<String> for RedisUrl {
        const NAME: &'static str = "FAQ_REDIS_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Redis URL for shared cache versions and responses (optional)";

        fn parse(value: &str) -> EnvResult<String> {
            let value = value.trim();
            if value.starts_with("redis://") || value.starts_with("rediss://") {
                Ok(value.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Must start with redis:// or rediss://".to_string(),
                })
            }
        }
    }
}

/// 后台任务相关环境变量
pub mod jobs {
    use super::*;

    /// 工作协程数量
    pub struct Workers;
    impl EnvVar<usize> for Workers {
        const NAME: &'static str = "FAQ_FILL_WORKERS";
        const DEFAULT: Option<usize> = Some(4);
        const DESCRIPTION: &'static str = "Number of background translation workers";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 64)
        }
    }

    /// 最大尝试次数
    pub struct MaxAttempts;
    impl EnvVar<usize> for MaxAttempts {
        const NAME: &'static str = "FAQ_FILL_MAX_ATTEMPTS";
        const DEFAULT: Option<usize> = Some(3);
        const DESCRIPTION: &'static str = "Attempts per fill job before it is marked failed";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 10)
        }
    }

    /// 重试基础延迟
    pub struct RetryDelay;
    impl EnvVar<Duration> for RetryDelay {
        const NAME: &'static str = "FAQ_FILL_RETRY_DELAY_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(500));
        const DESCRIPTION: &'static str = "Base retry backoff in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let millis: u64 = value.parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of milliseconds".to_string(),
            })?;
            Ok(Duration::from_millis(millis))
        }
    }
}

/// Web服务器相关环境变量
pub mod web {
    use super::*;

    /// 绑定地址
    pub struct BindAddress;
    impl EnvVar<String> for BindAddress {
        const NAME: &'static str = "FAQ_WEB_BIND_ADDRESS";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Web server bind address";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("127.0.0.1".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let addr = value.trim();
            if addr.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Address cannot be empty".to_string(),
                });
            }
            Ok(addr.to_string())
        }
    }

    /// 端口
    pub struct Port;
    impl EnvVar<u16> for Port {
        const NAME: &'static str = "FAQ_WEB_PORT";
        const DEFAULT: Option<u16> = Some(8000);
        const DESCRIPTION: &'static str = "Web server port";

        fn parse(value: &str) -> EnvResult<u16> {
            let port: u16 = value.parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid port number (1-65535)".to_string(),
            })?;

            if port == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Port cannot be 0".to_string(),
                });
            }

            Ok(port)
        }
    }
}

/// MongoDB相关环境变量
pub mod mongodb {
    use super::*;

    /// MongoDB连接字符串
    pub struct ConnectionString;
    impl EnvVar<String> for ConnectionString {
        const NAME: &'static str = "MONGODB_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "MongoDB connection string (optional, in-memory storage when unset)";

        fn parse(value: &str) -> EnvResult<String> {
            let value = value.trim();
            if value.starts_with("mongodb://") || value.starts_with("mongodb+srv://") {
                Ok(value.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Must start with mongodb:// or mongodb+srv://".to_string(),
                })
            }
        }
    }

    /// 数据库名称
    pub struct DatabaseName;
    impl EnvVar<String> for DatabaseName {
        const NAME: &'static str = "MONGODB_DATABASE";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "MongoDB database name";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("faq".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let name = value.trim();
            if name.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Database name cannot be empty".to_string(),
                });
            }
            Ok(name.to_string())
        }
    }
}

/// 辅助函数
fn parse_language(value: &str, var_name: &str) -> EnvResult<String> {
    let lang = value.trim();
    if lang.is_empty() || lang.contains(char::is_whitespace) {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Invalid language code '{}'", value),
        });
    }
    Ok(lang.to_string())
}

fn parse_seconds(value: &str, var_name: &str, min: u64, max: u64) -> EnvResult<Duration> {
    let seconds: u64 = value.parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid number of seconds".to_string(),
    })?;

    if seconds < min || seconds > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} must be between {} and {} seconds", seconds, min, max),
        });
    }

    Ok(Duration::from_secs(seconds))
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    let mut entry = |name: &str, description: &str, default: String| {
        docs.push_str(&format!("- `{}`: {} (default: {})\n", name, description, default));
    };

    entry(core::LogLevel::NAME, core::LogLevel::DESCRIPTION, "info".into());
    entry(
        translation::SourceLang::NAME,
        translation::SourceLang::DESCRIPTION,
        "en".into(),
    );
    entry(
        translation::TargetLanguages::NAME,
        translation::TargetLanguages::DESCRIPTION,
        "hi,bn".into(),
    );
    entry(
        translation::ApiUrl::NAME,
        translation::ApiUrl::DESCRIPTION,
        crate::config::constants::DEFAULT_API_URL.into(),
    );
    entry(
        translation::Timeout::NAME,
        translation::Timeout::DESCRIPTION,
        format!("{:?}", translation::Timeout::DEFAULT),
    );
    entry(
        cache::ResponseTtl::NAME,
        cache::ResponseTtl::DESCRIPTION,
        format!("{:?}", cache::ResponseTtl::DEFAULT),
    );
    entry(
        cache::LocalCacheSize::NAME,
        cache::LocalCacheSize::DESCRIPTION,
        format!("{:?}", cache::LocalCacheSize::DEFAULT),
    );
    entry(cache::RedisUrl::NAME, cache::RedisUrl::DESCRIPTION, "unset".into());
    entry(
        jobs::Workers::NAME,
        jobs::Workers::DESCRIPTION,
        format!("{:?}", jobs::Workers::DEFAULT),
    );
    entry(
        jobs::MaxAttempts::NAME,
        jobs::MaxAttempts::DESCRIPTION,
        format!("{:?}", jobs::MaxAttempts::DEFAULT),
    );
    entry(
        jobs::RetryDelay::NAME,
        jobs::RetryDelay::DESCRIPTION,
        format!("{:?}", jobs::RetryDelay::DEFAULT),
    );
    entry(web::BindAddress::NAME, web::BindAddress::DESCRIPTION, "127.0.0.1".into());
    entry(
        web::Port::NAME,
        web::Port::DESCRIPTION,
        format!("{:?}", web::Port::DEFAULT),
    );
    entry(
        mongodb::ConnectionString::NAME,
        mongodb::ConnectionString::DESCRIPTION,
        "unset".into(),
    );
    entry(
        mongodb::DatabaseName::NAME,
        mongodb::DatabaseName::DESCRIPTION,
        "faq".into(),
    );

    docs
}
