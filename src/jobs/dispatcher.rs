//! 填充任务调度器
//!
//! 无界 mpsc 队列 + 固定数量的工作协程，工作协程共享同一个接收端。

use std::sync::{Arc, Mutex as StdMutex};

use metrics::counter;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{FillJob, FillWorker, JobMonitor, JobState, Outbox};
use crate::model::FaqId;

/// 异步填充调度器
pub struct AsyncFillDispatcher {
    sender: StdMutex<Option<mpsc::UnboundedSender<FillJob>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    monitor: Arc<JobMonitor>,
}

impl AsyncFillDispatcher {
    /// 启动 `concurrency` 个工作协程，必须在 tokio 运行时内调用
    pub fn start(worker: Arc<FillWorker>, concurrency: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel::<FillJob>();
        let receiver = Arc::new(Mutex::new(receiver));
        let monitor = worker.monitor().clone();

        let handles = (0..concurrency.max(1))
            .map(|index| {
                let worker = worker.clone();
                let receiver = receiver.clone();
                tokio::spawn(async move {
                    loop {
                        let next = receiver.lock().await.recv().await;
                        match next {
                            Some(job) => {
                                worker.run(job).await;
                            }
                            None => break,
                        }
                    }
                    tracing::debug!("填充工作协程 {} 退出", index);
                })
            })
            .collect();

        tracing::info!("填充任务调度器已启动: workers={}", concurrency.max(1));

        Self {
            sender: StdMutex::new(Some(sender)),
            workers: Mutex::new(handles),
            monitor,
        }
    }

    pub fn monitor(&self) -> &Arc<JobMonitor> {
        &self.monitor
    }

    /// 为每个语言入队一个独立任务，返回任务 ID
    pub fn schedule(&self, faq_id: FaqId, languages: &[String]) -> Vec<Uuid> {
        let sender = match self.sender.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        languages
            .iter()
            .map(|language| {
                let job = FillJob::new(faq_id, language.as_str());
                let id = job.id;
                self.monitor.register(&job);

                let sent = match &sender {
                    Some(sender) => sender.send(job).is_ok(),
                    None => false,
                };

                if sent {
                    counter!("faq_fill_jobs_scheduled_total").increment(1);
                } else {
                    tracing::error!("调度器已关闭，任务未入队: faq={} lang={}", faq_id, language);
                    self.monitor.transition(
                        id,
                        JobState::Failed {
                            error: "调度器已关闭".to_string(),
                        },
                    );
                }
                id
            })
            .collect()
    }

    /// 创建发件箱，提交后才真正入队
    pub fn outbox(&self) -> Outbox<'_> {
        Outbox::new(self)
    }

    /// 关闭队列并等待已入队的任务全部执行完
    pub async fn shutdown(&self) {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);

        let handles = std::mem::take(&mut *self.workers.lock().await);
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("填充工作协程异常退出: {}", e);
            }
        }

        tracing::info!("填充任务调度器已关闭");
    }
}
