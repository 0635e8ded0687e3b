//! 提交后入队的发件箱
//!
//! 变更过程中先暂存任务，变更成功后调用 `commit` 才入队。
//! 未提交就被丢弃的发件箱不会产生任何任务。

use uuid::Uuid;

use super::AsyncFillDispatcher;
use crate::model::FaqId;

/// 发件箱
pub struct Outbox<'a> {
    dispatcher: &'a AsyncFillDispatcher,
    staged: Vec<(FaqId, Vec<String>)>,
}

impl<'a> Outbox<'a> {
    pub(crate) fn new(dispatcher: &'a AsyncFillDispatcher) -> Self {
        Self {
            dispatcher,
            staged: Vec::new(),
        }
    }

    /// 暂存一组填充任务
    pub fn stage(&mut self, faq_id: FaqId, languages: &[String]) {
        if !languages.is_empty() {
            self.staged.push((faq_id, languages.to_vec()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// 提交并入队，返回任务 ID
    pub fn commit(mut self) -> Vec<Uuid> {
        let dispatcher = self.dispatcher;
        std::mem::take(&mut self.staged)
            .into_iter()
            .flat_map(|(faq_id, languages)| dispatcher.schedule(faq_id, &languages))
            .collect()
    }
}

impl Drop for Outbox<'_> {
    fn drop(&mut self) {
        if !self.staged.is_empty() {
            tracing::debug!("发件箱未提交，丢弃 {} 组填充任务", self.staged.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::FaqResult;
    use crate::jobs::{FillWorker, JobMonitor, RetryPolicy};
    use crate::storage::InMemoryStore;
    use crate::translation::Translator;

    struct Echo;

    #[async_trait]
    impl Translator for Echo {
        async fn translate(&self, text: &str, _target_lang: &str) -> FaqResult<String> {
            Ok(text.to_string())
        }
    }

    fn dispatcher() -> AsyncFillDispatcher {
        let store = Arc::new(InMemoryStore::new());
        let worker = FillWorker::new(
            store.clone(),
            store,
            Arc::new(Echo),
            Duration::from_secs(1),
            RetryPolicy::default(),
            Arc::new(JobMonitor::new()),
        );
        AsyncFillDispatcher::start(Arc::new(worker), 1)
    }

    #[tokio::test]
    async fn test_dropped_outbox_enqueues_nothing() {
        let dispatcher = dispatcher();
        {
            let mut outbox = dispatcher.outbox();
            outbox.stage(FaqId(1), &["hi".to_string()]);
            assert!(!outbox.is_empty());
        }
        assert_eq!(dispatcher.monitor().summary().total, 0);
    }

    #[tokio::test]
    async fn test_commit_enqueues_one_job_per_language() {
        let dispatcher = dispatcher();
        let mut outbox = dispatcher.outbox();
        outbox.stage(FaqId(1), &["hi".to_string(), "bn".to_string()]);
        outbox.stage(FaqId(2), &[]);

        let ids = outbox.commit();
        assert_eq!(ids.len(), 2);
        assert_eq!(dispatcher.monitor().summary().total, 2);
        dispatcher.shutdown().await;
    }
}
