//! FAQ 读写服务
//!
//! 读路径: 版本化键 -> 响应缓存 -> 未命中时按语言渲染并写回缓存。
//! 写路径: 变更 -> (问题文本变化时重置译文并暂存填充任务) -> 递增版本 -> 提交发件箱。
//!
//! 读路径上版本号或缓存后端出错时只记录日志，退化为不带缓存的计算。

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use uuid::Uuid;

use crate::cache::{
    CacheKey, CacheStats, CacheVersionRegistry, InMemoryVersionRegistry, LocalResponseCache,
    ResponseCache,
};
use crate::config::{constants, FaqConfig};
use crate::error::{FaqError, FaqResult};
use crate::jobs::{AsyncFillDispatcher, FillWorker, JobMonitor, RetryPolicy};
use crate::model::{Faq, FaqId, FaqPatch, FaqView, NewFaq, Translation};
use crate::storage::{FaqRepository, InMemoryStore, TranslationStore};
use crate::translation::{TranslationResolver, Translator};

/// 服务设置
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub family: String,
    pub source_lang: String,
    pub target_languages: Vec<String>,
    pub response_ttl: Duration,
    pub translator_timeout: Duration,
    pub fill_workers: usize,
    pub retry_policy: RetryPolicy,
    pub fill_on_create: bool,
    pub reset_translations_on_change: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from(&FaqConfig::default())
    }
}

impl From<&FaqConfig> for ServiceSettings {
    fn from(config: &FaqConfig) -> Self {
        Self {
            family: config.cache_family.clone(),
            source_lang: config.source_lang.clone(),
            target_languages: config.target_languages.clone(),
            response_ttl: config.response_ttl(),
            translator_timeout: config.translator_timeout(),
            fill_workers: config.fill_workers,
            retry_policy: config.retry_policy(),
            fill_on_create: config.fill_on_create,
            reset_translations_on_change: config.reset_translations_on_change,
        }
    }
}

/// 服务依赖的后端
pub struct ServiceBackends {
    pub faqs: Arc<dyn FaqRepository>,
    pub translations: Arc<dyn TranslationStore>,
    pub translator: Arc<dyn Translator>,
    pub versions: Arc<dyn CacheVersionRegistry>,
    pub cache: Arc<dyn ResponseCache>,
}

impl ServiceBackends {
    /// 全部使用进程内实现
    pub fn in_memory(translator: Arc<dyn Translator>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            faqs: store.clone(),
            translations: store,
            translator,
            versions: Arc::new(InMemoryVersionRegistry::new()),
            cache: Arc::new(LocalResponseCache::new(constants::DEFAULT_LOCAL_CACHE_SIZE)),
        }
    }
}

/// FAQ 服务
pub struct FaqService {
    faqs: Arc<dyn FaqRepository>,
    translations: Arc<dyn TranslationStore>,
    resolver: TranslationResolver,
    versions: Arc<dyn CacheVersionRegistry>,
    cache: Arc<dyn ResponseCache>,
    dispatcher: AsyncFillDispatcher,
    settings: ServiceSettings,
}

impl FaqService {
    /// 创建服务并启动后台填充协程，必须在 tokio 运行时内调用
    pub fn new(backends: ServiceBackends, settings: ServiceSettings) -> Self {
        let resolver = TranslationResolver::new(
            backends.translations.clone(),
            backends.translator.clone(),
            settings.source_lang.clone(),
            settings.translator_timeout,
        );

        let worker = FillWorker::new(
            backends.faqs.clone(),
            backends.translations.clone(),
            backends.translator,
            settings.translator_timeout,
            settings.retry_policy.clone(),
            Arc::new(JobMonitor::new()),
        );
        let dispatcher = AsyncFillDispatcher::start(Arc::new(worker), settings.fill_workers);

        Self {
            faqs: backends.faqs,
            translations: backends.translations,
            resolver,
            versions: backends.versions,
            cache: backends.cache,
            dispatcher,
            settings,
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn resolver(&self) -> &TranslationResolver {
        &self.resolver
    }

    /// 任务监控
    pub fn jobs(&self) -> &Arc<JobMonitor> {
        self.dispatcher.monitor()
    }

    /// 按语言渲染的 FAQ 列表 (JSON)
    pub async fn list(&self, lang: &str) -> FaqResult<String> {
        let key = self
            .read_version()
            .await
            .map(|version| CacheKey::list(&self.settings.family, lang, version).to_string());

        if let Some(payload) = self.cached(key.as_deref()).await {
            return Ok(payload);
        }

        let faqs = self.faqs.list().await?;
        let views = join_all(faqs.iter().map(|faq| self.render(faq, lang))).await;
        let payload = serde_json::to_string(&views)?;

        self.store_cached(key.as_deref(), &payload).await;
        Ok(payload)
    }

    /// 按语言渲染的 FAQ 详情 (JSON)，不存在时返回 `None`
    pub async fn detail(&self, id: FaqId, lang: &str) -> FaqResult<Option<String>> {
        let key = self
            .read_version()
            .await
            .map(|version| CacheKey::detail(&self.settings.family, id, lang, version).to_string());

        if let Some(payload) = self.cached(key.as_deref()).await {
            return Ok(Some(payload));
        }

        let Some(faq) = self.faqs.get(id).await? else {
            return Ok(None);
        };
        let payload = serde_json::to_string(&self.render(&faq, lang).await)?;

        self.store_cached(key.as_deref(), &payload).await;
        Ok(Some(payload))
    }

    /// 创建 FAQ
    pub async fn create(&self, faq: NewFaq) -> FaqResult<Faq> {
        validate_question(&faq.question)?;

        let created = self.faqs.create(faq).await?;
        tracing::info!("FAQ 已创建: {}", created.id);

        let mut outbox = self.dispatcher.outbox();
        if self.settings.fill_on_create {
            outbox.stage(created.id, &self.fill_languages());
        }
        self.bump_after_write().await;
        outbox.commit();

        Ok(created)
    }

    /// 整体替换 (PUT)
    pub async fn replace(&self, id: FaqId, faq: NewFaq) -> FaqResult<Faq> {
        self.update(id, FaqPatch::from(faq)).await
    }

    /// 部分更新 (PATCH)
    pub async fn update(&self, id: FaqId, patch: FaqPatch) -> FaqResult<Faq> {
        if let Some(question) = &patch.question {
            validate_question(question)?;
        }

        let update = self.faqs.update(id, patch).await?;
        let mut outbox = self.dispatcher.outbox();

        if update.question_changed {
            if self.settings.reset_translations_on_change {
                match self.translations.reset_for(id).await {
                    Ok(count) => tracing::debug!("已重置 FAQ {} 的 {} 条译文", id, count),
                    Err(e) => tracing::warn!("重置 FAQ {} 译文失败: {}", id, e),
                }
            }
            outbox.stage(id, &self.fill_languages());
        }

        self.bump_after_write().await;
        let jobs = outbox.commit();
        tracing::info!("FAQ 已更新: {} (填充任务 {} 个)", id, jobs.len());

        Ok(update.faq)
    }

    /// 删除 FAQ 及其译文
    pub async fn delete(&self, id: FaqId) -> FaqResult<()> {
        self.faqs.delete(id).await?;
        tracing::info!("FAQ 已删除: {}", id);
        self.bump_after_write().await;
        Ok(())
    }

    /// 某个 FAQ 的全部译文
    pub async fn translations(&self, id: FaqId) -> FaqResult<Vec<Translation>> {
        if self.faqs.get(id).await?.is_none() {
            return Err(FaqError::EntityNotFound(id));
        }
        self.translations.list_for(id).await
    }

    /// 手动为 FAQ 调度填充任务
    pub fn schedule_fill(&self, id: FaqId, languages: &[String]) -> Vec<Uuid> {
        self.dispatcher.schedule(id, languages)
    }

    /// 当前缓存版本
    pub async fn current_version(&self) -> FaqResult<u64> {
        self.versions.get_version(&self.settings.family).await
    }

    /// 手动使全部派生响应失效
    pub async fn invalidate(&self) -> FaqResult<u64> {
        let version = self.versions.bump_version(&self.settings.family).await?;
        tracing::info!("手动失效响应缓存: version={}", version);
        Ok(version)
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// 关闭后台任务队列并等待已入队任务完成
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
    }

    async fn render(&self, faq: &Faq, lang: &str) -> FaqView {
        FaqView::render(faq, self.resolver.resolve(faq, lang).await)
    }

    fn fill_languages(&self) -> Vec<String> {
        self.settings
            .target_languages
            .iter()
            .filter(|lang| **lang != self.settings.source_lang)
            .cloned()
            .collect()
    }

    async fn read_version(&self) -> Option<u64> {
        match self.versions.get_version(&self.settings.family).await {
            Ok(version) => Some(version),
            Err(e) => {
                tracing::warn!("读取缓存版本失败，跳过缓存: {}", e);
                None
            }
        }
    }

    async fn cached(&self, key: Option<&str>) -> Option<String> {
        let key = key?;
        match self.cache.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!("读取响应缓存失败: key={} error={}", key, e);
                None
            }
        }
    }

    async fn store_cached(&self, key: Option<&str>, payload: &str) {
        let Some(key) = key else {
            return;
        };
        if let Err(e) = self
            .cache
            .set(key, payload.to_string(), self.settings.response_ttl)
            .await
        {
            tracing::warn!("写入响应缓存失败: key={} error={}", key, e);
        }
    }

    async fn bump_after_write(&self) {
        match self.versions.bump_version(&self.settings.family).await {
            Ok(version) => tracing::debug!("缓存版本: {}", version),
            Err(e) => tracing::error!("写操作后递增缓存版本失败: {}", e),
        }
    }
}

fn validate_question(question: &str) -> FaqResult<()> {
    if question.trim().is_empty() {
        return Err(FaqError::InvalidInput("问题不能为空".to_string()));
    }
    Ok(())
}
