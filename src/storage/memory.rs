//! 内存存储实现
//!
//! 同时实现 `FaqRepository` 和 `TranslationStore`，删除 FAQ 时级联删除译文。

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{FaqRepository, TranslationStore};
use crate::error::{FaqError, FaqResult};
use crate::model::{Faq, FaqId, FaqPatch, FaqUpdate, NewFaq, Translation};

type TranslationKey = (FaqId, String);

/// 内存存储
pub struct InMemoryStore {
    faqs: RwLock<BTreeMap<FaqId, Faq>>,
    translations: RwLock<HashMap<TranslationKey, Translation>>,
    next_id: AtomicU64,
}

impl InMemoryStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self {
            faqs: RwLock::new(BTreeMap::new()),
            translations: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// 译文行总数
    pub async fn translation_count(&self) -> usize {
        self.translations.read().await.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FaqRepository for InMemoryStore {
    async fn get(&self, id: FaqId) -> FaqResult<Option<Faq>> {
        Ok(self.faqs.read().await.get(&id).cloned())
    }

    async fn list(&self) -> FaqResult<Vec<Faq>> {
        Ok(self.faqs.read().await.values().cloned().collect())
    }

    async fn create(&self, faq: NewFaq) -> FaqResult<Faq> {
        let id = FaqId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let now = Utc::now();
        let faq = Faq {
            id,
            question: faq.question,
            answer: faq.answer,
            created_at: now,
            updated_at: now,
        };

        self.faqs.write().await.insert(id, faq.clone());
        Ok(faq)
    }

    async fn update(&self, id: FaqId, patch: FaqPatch) -> FaqResult<FaqUpdate> {
        let mut faqs = self.faqs.write().await;
        let faq = faqs.get_mut(&id).ok_or(FaqError::EntityNotFound(id))?;
        let question_changed = patch.apply_to(faq);

        Ok(FaqUpdate {
            faq: faq.clone(),
            question_changed,
        })
    }

    async fn delete(&self, id: FaqId) -> FaqResult<()> {
        // 锁顺序固定为 faqs -> translations
        let mut faqs = self.faqs.write().await;
        if faqs.remove(&id).is_none() {
            return Err(FaqError::EntityNotFound(id));
        }

        let mut translations = self.translations.write().await;
        translations.retain(|(faq_id, _), _| *faq_id != id);
        Ok(())
    }
}

#[async_trait]
impl TranslationStore for InMemoryStore {
    async fn find(&self, faq_id: FaqId, language: &str) -> FaqResult<Option<Translation>> {
        let translations = self.translations.read().await;
        Ok(translations.get(&(faq_id, language.to_string())).cloned())
    }

    async fn insert(&self, faq_id: FaqId, language: &str) -> FaqResult<Translation> {
        let faqs = self.faqs.read().await;
        if !faqs.contains_key(&faq_id) {
            return Err(FaqError::EntityNotFound(faq_id));
        }

        let mut translations = self.translations.write().await;
        let key = (faq_id, language.to_string());
        if translations.contains_key(&key) {
            return Err(FaqError::DuplicateTranslation {
                faq_id,
                language: language.to_string(),
            });
        }

        let row = Translation::placeholder(faq_id, language);
        translations.insert(key, row.clone());
        Ok(row)
    }

    async fn save_text(&self, faq_id: FaqId, language: &str, text: &str) -> FaqResult<()> {
        let mut translations = self.translations.write().await;
        let row = translations
            .get_mut(&(faq_id, language.to_string()))
            .ok_or_else(|| {
                FaqError::Store(format!("译文行不存在: faq={} lang={}", faq_id, language))
            })?;

        row.translated_text = text.to_string();
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn save_translation(
        &self,
        row: &Translation,
        source: &str,
        text: &str,
    ) -> FaqResult<()> {
        let faqs = self.faqs.read().await;
        let faq = faqs
            .get(&row.faq_id)
            .ok_or(FaqError::EntityNotFound(row.faq_id))?;

        let mut translations = self.translations.write().await;
        let current = translations
            .get_mut(&(row.faq_id, row.language.clone()))
            .ok_or_else(|| {
                FaqError::Store(format!(
                    "译文行不存在: faq={} lang={}",
                    row.faq_id, row.language
                ))
            })?;

        if faq.question != source || current.revision != row.revision {
            return Err(FaqError::SourceChanged {
                faq_id: row.faq_id,
                language: row.language.clone(),
            });
        }

        current.translated_text = text.to_string();
        current.updated_at = Utc::now();
        Ok(())
    }

    async fn discard_if_empty(&self, faq_id: FaqId, language: &str) -> FaqResult<bool> {
        let mut translations = self.translations.write().await;
        let key = (faq_id, language.to_string());
        match translations.get(&key) {
            Some(row) if !row.is_filled() => Ok(translations.remove(&key).is_some()),
            _ => Ok(false),
        }
    }

    async fn list_for(&self, faq_id: FaqId) -> FaqResult<Vec<Translation>> {
        let translations = self.translations.read().await;
        let mut rows: Vec<Translation> = translations
            .values()
            .filter(|row| row.faq_id == faq_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.language.cmp(&b.language));
        Ok(rows)
    }

    async fn reset_for(&self, faq_id: FaqId) -> FaqResult<usize> {
        let mut translations = self.translations.write().await;
        let now = Utc::now();
        let mut reset = 0;

        for row in translations.values_mut().filter(|row| row.faq_id == faq_id) {
            row.translated_text.clear();
            row.revision += 1;
            row.updated_at = now;
            reset += 1;
        }

        Ok(reset)
    }
}
