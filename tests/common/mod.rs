// 集成测试公共模块
//
// 提供可编排的翻译器、故障注入缓存和测试环境构建器

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use faq_lingo::cache::{
    CacheStats, CacheVersionRegistry, InMemoryVersionRegistry, LocalResponseCache, ResponseCache,
};
use faq_lingo::error::{FaqError, FaqResult};
use faq_lingo::jobs::RetryPolicy;
use faq_lingo::model::{Faq, NewFaq};
use faq_lingo::service::{FaqService, ServiceBackends, ServiceSettings};
use faq_lingo::storage::{FaqRepository, InMemoryStore};
use faq_lingo::translation::Translator;

/// 翻译器行为
#[derive(Debug, Clone)]
pub enum Behavior {
    /// 按语言返回固定译文，未配置的语言返回 `[lang] text`
    Reply,
    /// 总是失败
    Fail,
    /// 前 n 次调用失败，之后正常
    FailTimes(usize),
    /// 每次调用先睡眠
    Hang(Duration),
}

/// 可编排的翻译器，记录调用次数
pub struct ScriptedTranslator {
    behavior: Behavior,
    replies: HashMap<String, String>,
    calls: AtomicUsize,
    calls_by_lang: Mutex<HashMap<String, usize>>,
}

impl ScriptedTranslator {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            replies: HashMap::new(),
            calls: AtomicUsize::new(0),
            calls_by_lang: Mutex::new(HashMap::new()),
        }
    }

    pub fn replying() -> Self {
        Self::new(Behavior::Reply)
    }

    pub fn failing() -> Self {
        Self::new(Behavior::Fail)
    }

    pub fn with_reply(mut self, lang: &str, text: &str) -> Self {
        self.replies.insert(lang.to_string(), text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, lang: &str) -> usize {
        self.calls_by_lang
            .lock()
            .unwrap()
            .get(lang)
            .copied()
            .unwrap_or(0)
    }

    fn reply_for(&self, text: &str, lang: &str) -> String {
        self.replies
            .get(lang)
            .cloned()
            .unwrap_or_else(|| format!("[{}] {}", lang, text))
    }
}

#[async_trait]
impl Translator for ScriptedTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> FaqResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self
            .calls_by_lang
            .lock()
            .unwrap()
            .entry(target_lang.to_string())
            .or_insert(0) += 1;

        match &self.behavior {
            Behavior::Reply => Ok(self.reply_for(text, target_lang)),
            Behavior::Fail => Err(FaqError::TranslationUnavailable("API Error".to_string())),
            Behavior::FailTimes(n) if call <= *n => {
                Err(FaqError::TranslationUnavailable("API Error".to_string()))
            }
            Behavior::FailTimes(_) => Ok(self.reply_for(text, target_lang)),
            Behavior::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(self.reply_for(text, target_lang))
            }
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// 总是失败的缓存后端
pub struct BrokenCache;

#[async_trait]
impl ResponseCache for BrokenCache {
    async fn get(&self, _key: &str) -> FaqResult<Option<String>> {
        Err(FaqError::Cache("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _payload: String, _ttl: Duration) -> FaqResult<()> {
        Err(FaqError::Cache("connection refused".to_string()))
    }

    async fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

/// 总是失败的版本号注册表
pub struct BrokenVersions;

#[async_trait]
impl CacheVersionRegistry for BrokenVersions {
    async fn get_version(&self, _family: &str) -> FaqResult<u64> {
        Err(FaqError::Cache("connection refused".to_string()))
    }

    async fn bump_version(&self, _family: &str) -> FaqResult<u64> {
        Err(FaqError::Cache("connection refused".to_string()))
    }
}

/// 测试用服务设置：目标语言 hi/bn，快速重试
pub fn test_settings() -> ServiceSettings {
    ServiceSettings {
        target_languages: vec!["hi".to_string(), "bn".to_string()],
        translator_timeout: Duration::from_millis(200),
        fill_workers: 2,
        retry_policy: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
        },
        ..ServiceSettings::default()
    }
}

/// 测试环境
pub struct TestEnvironment {
    pub store: Arc<InMemoryStore>,
    pub translator: Arc<ScriptedTranslator>,
    pub versions: Arc<dyn CacheVersionRegistry>,
    pub cache: Arc<dyn ResponseCache>,
    pub service: Arc<FaqService>,
}

impl TestEnvironment {
    pub fn new(translator: ScriptedTranslator) -> Self {
        Self::with_settings(translator, test_settings())
    }

    pub fn with_settings(translator: ScriptedTranslator, settings: ServiceSettings) -> Self {
        Self::build(
            translator,
            settings,
            Arc::new(InMemoryVersionRegistry::new()),
            Arc::new(LocalResponseCache::new(100)),
        )
    }

    pub fn build(
        translator: ScriptedTranslator,
        settings: ServiceSettings,
        versions: Arc<dyn CacheVersionRegistry>,
        cache: Arc<dyn ResponseCache>,
    ) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let translator = Arc::new(translator);

        let service = FaqService::new(
            ServiceBackends {
                faqs: store.clone(),
                translations: store.clone(),
                translator: translator.clone(),
                versions: versions.clone(),
                cache: cache.clone(),
            },
            settings,
        );

        Self {
            store,
            translator,
            versions,
            cache,
            service: Arc::new(service),
        }
    }

    /// 直接写入存储，不经过服务（不触发任务和版本递增）
    pub async fn seed(&self, question: &str, answer: &str) -> Faq {
        self.store
            .create(NewFaq::new(question, answer))
            .await
            .unwrap()
    }

    /// 等待全部已知任务进入终态
    pub async fn settle_jobs(&self) {
        let ids: Vec<_> = self
            .service
            .jobs()
            .snapshot()
            .into_iter()
            .map(|record| record.job.id)
            .collect();
        assert!(
            self.service
                .jobs()
                .wait_settled(&ids, Duration::from_secs(5))
                .await,
            "jobs did not settle in time"
        );
    }
}
