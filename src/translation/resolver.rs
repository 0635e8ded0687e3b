//! 译文解析器
//!
//! 读路径上的按语言投影：源语言直接返回原文；已有译文直接返回；
//! 否则同步调用翻译服务并写回。任何失败都回退到原文，本模块从不返回错误。
//!
//! 失败时的清理是不对称的：本次新建的空行会被删除，让下一次读取干净地重试；
//! 之前就存在的空行保持原样，留给下一次解析原地重试。
//! 删除只针对仍为空的行，并发请求已经写入的译文不会被清掉。

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;

use super::translator::{translate_with_timeout, Translator};
use crate::error::FaqResult;
use crate::model::{Faq, Translation};
use crate::storage::TranslationStore;

/// 译文解析器
#[derive(Clone)]
pub struct TranslationResolver {
    store: Arc<dyn TranslationStore>,
    translator: Arc<dyn Translator>,
    source_lang: String,
    timeout: Duration,
}

impl TranslationResolver {
    pub fn new(
        store: Arc<dyn TranslationStore>,
        translator: Arc<dyn Translator>,
        source_lang: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            translator,
            source_lang: source_lang.into(),
            timeout,
        }
    }

    /// 源语言
    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    /// 获取 FAQ 问题在 `lang` 下的文本，失败时返回原文
    pub async fn resolve(&self, faq: &Faq, lang: &str) -> String {
        if lang == self.source_lang {
            return faq.question.clone();
        }

        match self.try_resolve(faq, lang).await {
            Ok(text) => text,
            Err(e) => {
                counter!("faq_translation_fallbacks_total").increment(1);
                tracing::warn!(
                    "翻译失败，回退到原文: faq={} lang={} error={}",
                    faq.id,
                    lang,
                    e
                );
                faq.question.clone()
            }
        }
    }

    async fn try_resolve(&self, faq: &Faq, lang: &str) -> FaqResult<String> {
        let (row, created) = self.store.get_or_create(faq.id, lang).await?;

        if row.is_filled() {
            counter!("faq_translation_store_hits_total").increment(1);
            return Ok(row.translated_text);
        }

        match self.translate_and_save(faq, &row).await {
            Ok(text) => Ok(text),
            Err(e) => {
                if created {
                    self.discard_placeholder(faq, lang).await;
                }
                Err(e)
            }
        }
    }

    async fn translate_and_save(&self, faq: &Faq, row: &Translation) -> FaqResult<String> {
        counter!("faq_translation_calls_total").increment(1);
        let text = translate_with_timeout(
            self.translator.as_ref(),
            &faq.question,
            &row.language,
            self.timeout,
        )
        .await?;

        self.store
            .save_translation(row, &faq.question, &text)
            .await?;
        tracing::debug!("译文已保存: faq={} lang={}", faq.id, row.language);
        Ok(text)
    }

    async fn discard_placeholder(&self, faq: &Faq, lang: &str) {
        if let Err(e) = self.store.discard_if_empty(faq.id, lang).await {
            tracing::warn!(
                "删除空译文行失败: faq={} lang={} error={}",
                faq.id,
                lang,
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::FaqError;
    use crate::model::{FaqPatch, NewFaq};
    use crate::storage::{FaqRepository, InMemoryStore};

    struct Counting {
        calls: AtomicUsize,
        reply: Option<&'static str>,
    }

    #[async_trait]
    impl Translator for Counting {
        async fn translate(&self, _text: &str, _target_lang: &str) -> FaqResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .ok_or_else(|| FaqError::TranslationUnavailable("API Error".into()))
        }
    }

    async fn setup(reply: Option<&'static str>) -> (Arc<InMemoryStore>, Arc<Counting>, Faq) {
        let store = Arc::new(InMemoryStore::new());
        let faq = store
            .create(NewFaq::new("How to use?", "Read the docs."))
            .await
            .unwrap();
        let translator = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            reply,
        });
        (store, translator, faq)
    }

    #[tokio::test]
    async fn test_source_language_skips_store() {
        let (store, translator, faq) = setup(Some("Comment utiliser?")).await;
        let resolver =
            TranslationResolver::new(store.clone(), translator.clone(), "en", Duration::from_secs(1));

        assert_eq!(resolver.resolve(&faq, "en").await, "How to use?");
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.translation_count().await, 0);
    }

    #[tokio::test]
    async fn test_existing_empty_row_survives_failure() {
        let (store, translator, faq) = setup(None).await;
        store.insert(faq.id, "fr").await.unwrap();
        let resolver =
            TranslationResolver::new(store.clone(), translator.clone(), "en", Duration::from_secs(1));

        assert_eq!(resolver.resolve(&faq, "fr").await, "How to use?");
        let row = store.find(faq.id, "fr").await.unwrap().unwrap();
        assert!(!row.is_filled());
    }

    #[tokio::test]
    async fn test_stale_question_is_not_saved() {
        let (store, translator, faq) = setup(Some("Comment utiliser?")).await;
        store
            .update(faq.id, FaqPatch::question("How do I start?"))
            .await
            .unwrap();
        let resolver =
            TranslationResolver::new(store.clone(), translator.clone(), "en", Duration::from_secs(1));

        // 调用方持有的是修改前的 FAQ
        assert_eq!(resolver.resolve(&faq, "fr").await, "How to use?");
        assert!(store.find(faq.id, "fr").await.unwrap().is_none());
    }

    /// 第一次调用延迟后失败，之后立即成功
    struct SlowFirstFailure {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for SlowFirstFailure {
        async fn translate(&self, _text: &str, _target_lang: &str) -> FaqResult<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
                return Err(FaqError::TranslationUnavailable("API Error".into()));
            }
            Ok("Comment utiliser?".to_string())
        }
    }

    #[tokio::test]
    async fn test_failed_creator_keeps_concurrent_translation() {
        let (store, _, faq) = setup(None).await;
        let translator = Arc::new(SlowFirstFailure {
            calls: AtomicUsize::new(0),
        });
        let resolver =
            TranslationResolver::new(store.clone(), translator, "en", Duration::from_secs(1));

        let first = {
            let resolver = resolver.clone();
            let faq = faq.clone();
            tokio::spawn(async move { resolver.resolve(&faq, "fr").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = resolver.resolve(&faq, "fr").await;

        assert_eq!(first.await.unwrap(), "How to use?");
        assert_eq!(second, "Comment utiliser?");
        let row = store.find(faq.id, "fr").await.unwrap().unwrap();
        assert_eq!(row.translated_text, "Comment utiliser?");
    }
}
