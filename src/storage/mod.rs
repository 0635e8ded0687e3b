//! 持久化存储接口
//!
//! - `FaqRepository`: FAQ 本体的增删改查
//! - `TranslationStore`: (faq, language) -> 译文，带唯一约束
//!
//! `get_or_create` 被拆成显式的两步：查询，不存在时插入，插入冲突时重新查询。
//! 这样并发首次访问同一语言时只会留下一行，且不依赖具体存储引擎的 upsert 语义。
//!
//! 翻译结果通过 `save_translation` 条件写入：FAQ 当前问题必须仍是被翻译的原文，
//! 且译文行的 `revision` 未被重置推进，否则返回 `SourceChanged`。

pub mod memory;
#[cfg(feature = "mongo")]
pub mod mongo;

pub use memory::InMemoryStore;
#[cfg(feature = "mongo")]
pub use mongo::{MongoConfig, MongoStore};

use async_trait::async_trait;

use crate::error::{FaqError, FaqResult};
use crate::model::{Faq, FaqId, FaqPatch, FaqUpdate, NewFaq, Translation};

/// FAQ 本体存储
#[async_trait]
pub trait FaqRepository: Send + Sync {
    /// 按 ID 获取
    async fn get(&self, id: FaqId) -> FaqResult<Option<Faq>>;

    /// 按 ID 升序列出全部 FAQ
    async fn list(&self) -> FaqResult<Vec<Faq>>;

    /// 创建 FAQ
    async fn create(&self, faq: NewFaq) -> FaqResult<Faq>;

    /// 更新 FAQ，不存在时返回 `EntityNotFound`
    async fn update(&self, id: FaqId, patch: FaqPatch) -> FaqResult<FaqUpdate>;

    /// 删除 FAQ 及其所有译文，不存在时返回 `EntityNotFound`
    async fn delete(&self, id: FaqId) -> FaqResult<()>;
}

/// 译文存储
#[async_trait]
pub trait TranslationStore: Send + Sync {
    /// 查询译文
    async fn find(&self, faq_id: FaqId, language: &str) -> FaqResult<Option<Translation>>;

    /// 插入空译文行
    ///
    /// 同一 (faq, language) 已存在时必须返回 `DuplicateTranslation`，
    /// FAQ 不存在时返回 `EntityNotFound`。
    async fn insert(&self, faq_id: FaqId, language: &str) -> FaqResult<Translation>;

    /// 无条件写入译文文本，行不存在时返回 `Store` 错误
    async fn save_text(&self, faq_id: FaqId, language: &str, text: &str) -> FaqResult<()>;

    /// 条件写入翻译结果
    ///
    /// `row` 是翻译开始前读到的译文行，`source` 是被翻译的问题文本。
    /// FAQ 问题已变化或行已被重置时返回 `SourceChanged`，不写入。
    async fn save_translation(&self, row: &Translation, source: &str, text: &str)
        -> FaqResult<()>;

    /// 仅当译文仍为空时删除该行，返回是否确实删除
    async fn discard_if_empty(&self, faq_id: FaqId, language: &str) -> FaqResult<bool>;

    /// 列出某个 FAQ 的全部译文
    async fn list_for(&self, faq_id: FaqId) -> FaqResult<Vec<Translation>>;

    /// 清空某个 FAQ 全部译文的文本并推进 `revision`，返回受影响行数
    async fn reset_for(&self, faq_id: FaqId) -> FaqResult<usize>;

    /// 查询或创建译文行，返回 (译文, 是否新建)
    async fn get_or_create(&self, faq_id: FaqId, language: &str) -> FaqResult<(Translation, bool)> {
        if let Some(existing) = self.find(faq_id, language).await? {
            return Ok((existing, false));
        }

        match self.insert(faq_id, language).await {
            Ok(created) => Ok((created, true)),
            Err(FaqError::DuplicateTranslation { .. }) => {
                tracing::debug!(
                    "并发创建译文冲突，重新查询: faq={} lang={}",
                    faq_id,
                    language
                );
                self.find(faq_id, language)
                    .await?
                    .map(|existing| (existing, false))
                    .ok_or_else(|| {
                        FaqError::Store(format!(
                            "译文行在冲突后消失: faq={} lang={}",
                            faq_id, language
                        ))
                    })
            }
            Err(e) => Err(e),
        }
    }
}
