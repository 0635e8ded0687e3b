//! 翻译模块
//!
//! - **translator**: 外部翻译能力 (`Translator` trait) 及 DeepLX HTTP 实现
//! - **resolver**: 按语言解析 FAQ 问题文本，带译文存储与原文回退
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use faq_lingo::storage::InMemoryStore;
//! use faq_lingo::translation::{DeepLxTranslator, TranslationResolver};
//!
//! # async fn example(faq: faq_lingo::model::Faq) -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryStore::new());
//! let translator = Arc::new(DeepLxTranslator::new("http://localhost:1188/translate", "en")?);
//! let resolver = TranslationResolver::new(store, translator, "en", Duration::from_secs(10));
//!
//! let question = resolver.resolve(&faq, "fr").await;
//! # Ok(())
//! # }
//! ```

pub mod resolver;
pub mod translator;

pub use resolver::TranslationResolver;
pub use translator::{translate_with_timeout, DeepLxTranslator, Translator};
