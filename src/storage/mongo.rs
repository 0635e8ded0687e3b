//! MongoDB 存储实现
//!
//! - `faqs` 集合: FAQ 本体，`_id` 为自增整数
//! - `faq_translations` 集合: 译文，(faq_id, language) 唯一索引
//! - `counters` 集合: `$inc` 原子分配 FAQ ID

use async_trait::async_trait;
use bson::{doc, DateTime, Document};
use futures::stream::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};

use super::{FaqRepository, TranslationStore};
use crate::env::EnvResult;
use crate::error::{FaqError, FaqResult};
use crate::model::{Faq, FaqId, FaqPatch, FaqUpdate, NewFaq, Translation};

/// MongoDB 重复键错误码
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB 配置
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// MongoDB 连接字符串
    pub connection_string: String,
    /// 数据库名称
    pub database_name: String,
}

impl MongoConfig {
    /// 从环境变量创建配置
    pub fn from_env() -> EnvResult<Self> {
        use crate::env::{mongodb, EnvVar};

        Ok(Self {
            connection_string: mongodb::ConnectionString::get()?,
            database_name: mongodb::DatabaseName::get()?,
        })
    }
}

/// MongoDB 中的 FAQ 文档
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FaqDocument {
    #[serde(rename = "_id")]
    id: i64,
    question: String,
    answer: String,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<FaqDocument> for Faq {
    fn from(doc: FaqDocument) -> Self {
        Faq {
            id: FaqId(doc.id as u64),
            question: doc.question,
            answer: doc.answer,
            created_at: doc.created_at.to_chrono(),
            updated_at: doc.updated_at.to_chrono(),
        }
    }
}

/// MongoDB 中的译文文档
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TranslationDocument {
    faq_id: i64,
    language: String,
    #[serde(default)]
    translated_text: String,
    #[serde(default)]
    revision: i64,
    updated_at: DateTime,
}

impl From<TranslationDocument> for Translation {
    fn from(doc: TranslationDocument) -> Self {
        Translation {
            faq_id: FaqId(doc.faq_id as u64),
            language: doc.language,
            translated_text: doc.translated_text,
            revision: doc.revision as u64,
            updated_at: doc.updated_at.to_chrono(),
        }
    }
}

/// 基于 MongoDB 的存储
#[derive(Clone)]
pub struct MongoStore {
    faqs: Collection<FaqDocument>,
    translations: Collection<TranslationDocument>,
    counters: Collection<Document>,
}

impl MongoStore {
    /// 连接数据库并确保索引存在
    pub async fn connect(config: &MongoConfig) -> FaqResult<Self> {
        let client = Client::with_uri_str(&config.connection_string).await?;
        let db = client.database(&config.database_name);

        let store = Self {
            faqs: db.collection("faqs"),
            translations: db.collection("faq_translations"),
            counters: db.collection("counters"),
        };
        store.ensure_indexes().await?;

        tracing::info!(
            "MongoDB 存储已连接: database={}",
            config.database_name
        );
        Ok(store)
    }

    async fn ensure_indexes(&self) -> FaqResult<()> {
        let unique_pair = IndexModel::builder()
            .keys(doc! { "faq_id": 1, "language": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.translations.create_index(unique_pair).await?;
        Ok(())
    }

    async fn next_id(&self) -> FaqResult<FaqId> {
        let counter = self
            .counters
            .find_one_and_update(doc! { "_id": "faqs" }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| FaqError::Store("ID计数器未返回文档".to_string()))?;

        let seq = counter
            .get_i64("seq")
            .map_err(|e| FaqError::Store(format!("ID计数器格式错误: {}", e)))?;
        Ok(FaqId(seq as u64))
    }
}

/// 判断是否为唯一索引冲突
fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        &*error.kind,
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

fn faq_filter(id: FaqId) -> Document {
    doc! { "_id": id.0 as i64 }
}

fn translation_filter(faq_id: FaqId, language: &str) -> Document {
    doc! { "faq_id": faq_id.0 as i64, "language": language }
}

/// 只 `$set` 补丁中出现的字段
fn patch_update(patch: &FaqPatch, now: chrono::DateTime<chrono::Utc>) -> Document {
    let mut fields = doc! { "updated_at": DateTime::from_chrono(now) };
    if let Some(question) = &patch.question {
        fields.insert("question", question.as_str());
    }
    if let Some(answer) = &patch.answer {
        fields.insert("answer", answer.as_str());
    }
    doc! { "$set": fields }
}

#[async_trait]
impl FaqRepository for MongoStore {
    async fn get(&self, id: FaqId) -> FaqResult<Option<Faq>> {
        let doc = self.faqs.find_one(faq_filter(id)).await?;
        Ok(doc.map(Faq::from))
    }

    async fn list(&self) -> FaqResult<Vec<Faq>> {
        let cursor = self.faqs.find(doc! {}).sort(doc! { "_id": 1 }).await?;
        let docs: Vec<FaqDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(Faq::from).collect())
    }

    async fn create(&self, faq: NewFaq) -> FaqResult<Faq> {
        let id = self.next_id().await?;
        let now = DateTime::now();
        let doc = FaqDocument {
            id: id.0 as i64,
            question: faq.question,
            answer: faq.answer,
            created_at: now,
            updated_at: now,
        };

        self.faqs.insert_one(&doc).await?;
        Ok(doc.into())
    }

    async fn update(&self, id: FaqId, patch: FaqPatch) -> FaqResult<FaqUpdate> {
        let now = chrono::Utc::now();

        // 问题是否变化以更新前的文档为准
        let mut faq: Faq = self
            .faqs
            .find_one_and_update(faq_filter(id), patch_update(&patch, now))
            .return_document(ReturnDocument::Before)
            .await?
            .ok_or(FaqError::EntityNotFound(id))?
            .into();

        let question_changed = patch.apply_to(&mut faq);
        faq.updated_at = now;
        tracing::debug!(
            "MongoDB FAQ 已更新: id={} question_changed={}",
            id,
            question_changed
        );

        Ok(FaqUpdate {
            faq,
            question_changed,
        })
    }

    async fn delete(&self, id: FaqId) -> FaqResult<()> {
        let result = self.faqs.delete_one(faq_filter(id)).await?;
        if result.deleted_count == 0 {
            return Err(FaqError::EntityNotFound(id));
        }

        self.translations
            .delete_many(doc! { "faq_id": id.0 as i64 })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TranslationStore for MongoStore {
    async fn find(&self, faq_id: FaqId, language: &str) -> FaqResult<Option<Translation>> {
        let doc = self
            .translations
            .find_one(translation_filter(faq_id, language))
            .await?;
        Ok(doc.map(Translation::from))
    }

    async fn insert(&self, faq_id: FaqId, language: &str) -> FaqResult<Translation> {
        if self.faqs.find_one(faq_filter(faq_id)).await?.is_none() {
            return Err(FaqError::EntityNotFound(faq_id));
        }

        let doc = TranslationDocument {
            faq_id: faq_id.0 as i64,
            language: language.to_string(),
            translated_text: String::new(),
            revision: 0,
            updated_at: DateTime::now(),
        };

        match self.translations.insert_one(&doc).await {
            Ok(_) => Ok(doc.into()),
            Err(e) if is_duplicate_key(&e) => Err(FaqError::DuplicateTranslation {
                faq_id,
                language: language.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_text(&self, faq_id: FaqId, language: &str, text: &str) -> FaqResult<()> {
        let update = doc! {
            "$set": { "translated_text": text, "updated_at": DateTime::now() }
        };
        let result = self
            .translations
            .update_one(translation_filter(faq_id, language), update)
            .await?;

        if result.matched_count == 0 {
            return Err(FaqError::Store(format!(
                "译文行不存在: faq={} lang={}",
                faq_id, language
            )));
        }
        Ok(())
    }

    async fn save_translation(
        &self,
        row: &Translation,
        source: &str,
        text: &str,
    ) -> FaqResult<()> {
        let stale = || FaqError::SourceChanged {
            faq_id: row.faq_id,
            language: row.language.clone(),
        };

        let faq = self
            .faqs
            .find_one(faq_filter(row.faq_id))
            .await?
            .ok_or(FaqError::EntityNotFound(row.faq_id))?;
        if faq.question != source {
            return Err(stale());
        }

        // 重置发生在 FAQ 写入之后，revision 过滤覆盖检查与写入之间的窗口
        let mut filter = translation_filter(row.faq_id, &row.language);
        filter.insert("revision", row.revision as i64);
        let update = doc! {
            "$set": { "translated_text": text, "updated_at": DateTime::now() }
        };
        let result = self.translations.update_one(filter, update).await?;
        if result.matched_count > 0 {
            return Ok(());
        }

        match self.find(row.faq_id, &row.language).await? {
            Some(_) => Err(stale()),
            None => Err(FaqError::Store(format!(
                "译文行不存在: faq={} lang={}",
                row.faq_id, row.language
            ))),
        }
    }

    async fn discard_if_empty(&self, faq_id: FaqId, language: &str) -> FaqResult<bool> {
        let mut filter = translation_filter(faq_id, language);
        filter.insert("translated_text", "");
        let result = self.translations.delete_one(filter).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_for(&self, faq_id: FaqId) -> FaqResult<Vec<Translation>> {
        let cursor = self
            .translations
            .find(doc! { "faq_id": faq_id.0 as i64 })
            .sort(doc! { "language": 1 })
            .await?;
        let docs: Vec<TranslationDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(Translation::from).collect())
    }

    async fn reset_for(&self, faq_id: FaqId) -> FaqResult<usize> {
        let filter = doc! { "faq_id": faq_id.0 as i64 };
        let update = doc! {
            "$set": { "translated_text": "", "updated_at": DateTime::now() },
            "$inc": { "revision": 1_i64 }
        };
        let result = self.translations.update_many(filter, update).await?;
        Ok(result.matched_count as usize)
    }
}
