//! 填充任务执行器

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;

use super::{FillJob, FillOutcome, JobMonitor, JobState, RetryPolicy};
use crate::error::{helpers, FaqError, FaqResult};
use crate::storage::{FaqRepository, TranslationStore};
use crate::translation::{translate_with_timeout, Translator};

/// 填充任务执行器
pub struct FillWorker {
    faqs: Arc<dyn FaqRepository>,
    translations: Arc<dyn TranslationStore>,
    translator: Arc<dyn Translator>,
    timeout: Duration,
    policy: RetryPolicy,
    monitor: Arc<JobMonitor>,
}

impl FillWorker {
    pub fn new(
        faqs: Arc<dyn FaqRepository>,
        translations: Arc<dyn TranslationStore>,
        translator: Arc<dyn Translator>,
        timeout: Duration,
        policy: RetryPolicy,
        monitor: Arc<JobMonitor>,
    ) -> Self {
        Self {
            faqs,
            translations,
            translator,
            timeout,
            policy,
            monitor,
        }
    }

    pub fn monitor(&self) -> &Arc<JobMonitor> {
        &self.monitor
    }

    /// 单次尝试
    ///
    /// 重复执行是安全的：译文已存在时直接返回 `AlreadyFilled`。
    /// 翻译期间问题被修改时写入被拒绝（`SourceChanged`），由重试按新问题重新翻译。
    pub async fn fill_one(&self, job: &FillJob) -> FaqResult<FillOutcome> {
        let faq = self
            .faqs
            .get(job.faq_id)
            .await?
            .ok_or(FaqError::EntityNotFound(job.faq_id))?;

        let (row, _) = self
            .translations
            .get_or_create(faq.id, &job.language)
            .await?;
        if row.is_filled() {
            return Ok(FillOutcome::AlreadyFilled);
        }

        let text = translate_with_timeout(
            self.translator.as_ref(),
            &faq.question,
            &job.language,
            self.timeout,
        )
        .await?;
        self.translations
            .save_translation(&row, &faq.question, &text)
            .await?;

        Ok(FillOutcome::Filled)
    }

    /// 带重试地执行任务，返回终态
    pub async fn run(&self, job: FillJob) -> JobState {
        let mut attempt = 0;

        let final_state = loop {
            attempt += 1;
            self.monitor.transition(job.id, JobState::Running { attempt });

            match self.fill_one(&job).await {
                Ok(outcome) => {
                    counter!("faq_fill_jobs_succeeded_total").increment(1);
                    tracing::debug!(
                        "填充任务完成: faq={} lang={} outcome={:?}",
                        job.faq_id,
                        job.language,
                        outcome
                    );
                    break JobState::Succeeded { outcome };
                }
                Err(e) if !e.is_retryable() => {
                    counter!("faq_fill_jobs_failed_total").increment(1);
                    helpers::log_error(&e.clone().with_context(format!("job={}", job.id)));
                    break JobState::Failed {
                        error: e.to_string(),
                    };
                }
                Err(e) if attempt < self.policy.max_attempts => {
                    counter!("faq_fill_jobs_retries_total").increment(1);
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        "填充任务第 {} 次尝试失败，{:?} 后重试: faq={} lang={} error={}",
                        attempt,
                        delay,
                        job.faq_id,
                        job.language,
                        e
                    );
                    self.monitor.transition(
                        job.id,
                        JobState::Retrying {
                            attempt,
                            error: e.to_string(),
                        },
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    counter!("faq_fill_jobs_failed_total").increment(1);
                    let exhausted = FaqError::RetryExhausted {
                        attempts: attempt,
                        last_error: e.to_string(),
                    };
                    tracing::error!(
                        "填充任务失败: faq={} lang={} job={} {}",
                        job.faq_id,
                        job.language,
                        job.id,
                        exhausted
                    );
                    break JobState::FailedAfterRetries {
                        attempts: attempt,
                        error: e.to_string(),
                    };
                }
            }
        };

        self.monitor.transition(job.id, final_state.clone());
        final_state
    }
}
