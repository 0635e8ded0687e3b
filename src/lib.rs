//! # FAQ Lingo
//!
//! 多语言 FAQ 服务的翻译缓存一致性子系统：按需翻译、版本化响应缓存、
//! 内容变更后的后台译文填充。
//!
//! ## 模块组织
//!
//! - `model` - FAQ、译文及渲染结果
//! - `storage` - FAQ 与译文存储（内存 / MongoDB）
//! - `translation` - 翻译服务接口与译文解析器
//! - `cache` - 版本号注册表与响应缓存
//! - `jobs` - 后台填充任务、重试与监控
//! - `service` - 读写服务
//! - `config` / `env` - 配置与环境变量
//! - `redis_cache` - Redis 缓存后端（可选）
//! - `web` - Web服务器功能（可选）

pub mod cache;
pub mod config;
pub mod env;
pub mod error;
pub mod jobs;
pub mod model;
#[cfg(feature = "redis-cache")]
pub mod redis_cache;
pub mod service;
pub mod storage;
pub mod translation;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used items for convenience
pub use error::{FaqError, FaqResult};
pub use model::{Faq, FaqId, FaqPatch, FaqView, NewFaq, Translation};
pub use service::{FaqService, ServiceBackends, ServiceSettings};
