//! 配置管理模块
//!
//! 支持配置文件、.env 文件、环境变量和默认值

pub mod manager;

pub use manager::{ConfigManager, FaqConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 语言
    pub const DEFAULT_SOURCE_LANG: &str = "en";
    pub const DEFAULT_TARGET_LANGUAGES: &[&str] = &["hi", "bn"];

    // 翻译API
    pub const DEFAULT_API_URL: &str = "http://localhost:1188/translate";
    pub const DEFAULT_TRANSLATOR_TIMEOUT: Duration = Duration::from_secs(10);

    // 缓存
    pub const DEFAULT_CACHE_FAMILY: &str = "faq";
    pub const DEFAULT_RESPONSE_TTL: Duration = Duration::from_secs(60 * 15);
    pub const DEFAULT_LOCAL_CACHE_SIZE: usize = 1000;

    // 后台任务
    pub const DEFAULT_FILL_WORKERS: usize = 4;
    pub const DEFAULT_MAX_FILL_ATTEMPTS: u32 = 3;
    pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
    pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "faq-lingo.toml",
        "config.toml",
        ".faq-lingo.toml",
        "~/.config/faq-lingo/config.toml",
        "/etc/faq-lingo/config.toml",
    ];
}

/// 是否存在配置文件
pub fn config_file_exists() -> bool {
    constants::CONFIG_PATHS
        .iter()
        .any(|path| std::path::Path::new(shellexpand::tilde(path).as_ref()).exists())
}
