//! 后台译文填充任务
//!
//! 内容变更后按配置的目标语言预热译文。每个 (faq, language) 是一个独立任务，
//! 状态机:
//!
//! ```text
//! Pending -> Running -> Succeeded
//!                    -> Failed              (永久失败，不重试)
//!                    -> Retrying -> Running (有界循环)
//!                                -> FailedAfterRetries
//! ```
//!
//! 尝试次数作为任务状态的一部分记录在 [`JobMonitor`] 中。

pub mod dispatcher;
pub mod monitor;
pub mod outbox;
pub mod worker;

pub use dispatcher::AsyncFillDispatcher;
pub use monitor::{JobMonitor, JobRecord, JobSummary};
pub use outbox::Outbox;
pub use worker::FillWorker;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::constants;
use crate::model::FaqId;

/// 单个填充任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillJob {
    pub id: Uuid,
    pub faq_id: FaqId,
    pub language: String,
    pub enqueued_at: DateTime<Utc>,
}

impl FillJob {
    pub fn new(faq_id: FaqId, language: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            faq_id,
            language: language.into(),
            enqueued_at: Utc::now(),
        }
    }
}

/// 成功结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillOutcome {
    /// 调用翻译服务并写入了译文
    Filled,
    /// 译文已存在，未做任何事
    AlreadyFilled,
}

/// 任务状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running { attempt: u32 },
    Retrying { attempt: u32, error: String },
    Succeeded { outcome: FillOutcome },
    Failed { error: String },
    FailedAfterRetries { attempts: u32, error: String },
}

impl JobState {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded { .. } | JobState::Failed { .. } | JobState::FailedAfterRetries { .. }
        )
    }

    /// 是否为失败终态
    pub fn is_failure(&self) -> bool {
        matches!(self, JobState::Failed { .. } | JobState::FailedAfterRetries { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running { .. } => "running",
            JobState::Retrying { .. } => "retrying",
            JobState::Succeeded { .. } => "succeeded",
            JobState::Failed { .. } => "failed",
            JobState::FailedAfterRetries { .. } => "failed_after_retries",
        }
    }
}

/// 重试策略
///
/// `max_attempts` 是总尝试次数（含第一次）。两次尝试之间按指数退避等待。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: constants::DEFAULT_MAX_FILL_ATTEMPTS,
            base_delay: constants::DEFAULT_RETRY_BASE_DELAY,
            max_delay: constants::DEFAULT_RETRY_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// 第 `attempt` 次失败后的等待时间
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1_u32 << exponent)
            .min(self.max_delay)
    }
}
