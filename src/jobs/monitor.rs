//! 任务监控
//!
//! 记录每个任务的每次状态转换，失败任务在 `failed()` 中可见（死信视图）。

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Notify;
use uuid::Uuid;

use super::{FillJob, JobState};

/// 任务记录
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub job: FillJob,
    #[serde(flatten)]
    pub state: JobState,
    pub updated_at: DateTime<Utc>,
}

/// 各状态任务计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub retrying: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_after_retries: usize,
}

/// 任务监控
#[derive(Debug, Default)]
pub struct JobMonitor {
    records: DashMap<Uuid, JobRecord>,
    settled: Notify,
}

impl JobMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记新任务
    pub fn register(&self, job: &FillJob) {
        self.records.insert(
            job.id,
            JobRecord {
                job: job.clone(),
                state: JobState::Pending,
                updated_at: Utc::now(),
            },
        );
    }

    /// 状态转换
    pub fn transition(&self, id: Uuid, state: JobState) {
        let terminal = state.is_terminal();
        match self.records.get_mut(&id) {
            Some(mut record) => {
                tracing::trace!("任务 {} -> {}", id, state.label());
                record.state = state;
                record.updated_at = Utc::now();
            }
            None => tracing::warn!("未登记的任务状态更新: {}", id),
        }

        if terminal {
            self.settled.notify_waiters();
        }
    }

    pub fn get(&self, id: Uuid) -> Option<JobRecord> {
        self.records.get(&id).map(|record| record.clone())
    }

    /// 全部任务，按入队时间排序
    pub fn snapshot(&self) -> Vec<JobRecord> {
        let mut records: Vec<JobRecord> =
            self.records.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by_key(|record| record.job.enqueued_at);
        records
    }

    /// 失败的任务
    pub fn failed(&self) -> Vec<JobRecord> {
        self.snapshot()
            .into_iter()
            .filter(|record| record.state.is_failure())
            .collect()
    }

    pub fn summary(&self) -> JobSummary {
        let mut summary = JobSummary::default();
        for entry in self.records.iter() {
            summary.total += 1;
            match entry.value().state {
                JobState::Pending => summary.pending += 1,
                JobState::Running { .. } => summary.running += 1,
                JobState::Retrying { .. } => summary.retrying += 1,
                JobState::Succeeded { .. } => summary.succeeded += 1,
                JobState::Failed { .. } => summary.failed += 1,
                JobState::FailedAfterRetries { .. } => summary.failed_after_retries += 1,
            }
        }
        summary
    }

    fn all_settled(&self, ids: &[Uuid]) -> bool {
        ids.iter().all(|id| {
            self.records
                .get(id)
                .map(|record| record.state.is_terminal())
                .unwrap_or(true)
        })
    }

    /// 等待给定任务全部进入终态，超时返回 `false`
    pub async fn wait_settled(&self, ids: &[Uuid], limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;

        loop {
            let notified = self.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.all_settled(ids) {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.all_settled(ids);
            }
        }
    }
}
