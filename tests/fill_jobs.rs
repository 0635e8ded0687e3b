//! 后台填充任务集成测试

use std::sync::Arc;
use std::time::Duration;

use faq_lingo::jobs::{FillJob, FillOutcome, FillWorker, JobMonitor, JobState, RetryPolicy};
use faq_lingo::model::{FaqId, FaqPatch, NewFaq};
use faq_lingo::storage::{FaqRepository, TranslationStore};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{Behavior, ScriptedTranslator, TestEnvironment};

fn worker(env: &TestEnvironment) -> FillWorker {
    FillWorker::new(
        env.store.clone(),
        env.store.clone(),
        env.translator.clone(),
        Duration::from_millis(100),
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        },
        Arc::new(JobMonitor::new()),
    )
}

fn register(worker: &FillWorker, faq_id: FaqId, lang: &str) -> FillJob {
    let job = FillJob::new(faq_id, lang);
    worker.monitor().register(&job);
    job
}

#[tokio::test]
async fn test_job_fills_translation() {
    let env = TestEnvironment::new(ScriptedTranslator::replying());
    let faq = env.seed("How to use?", "Read the docs.").await;
    let worker = worker(&env);

    let job = register(&worker, faq.id, "hi");
    let state = worker.run(job.clone()).await;

    assert_eq!(
        state,
        JobState::Succeeded {
            outcome: FillOutcome::Filled
        }
    );
    let row = env.store.find(faq.id, "hi").await.unwrap().unwrap();
    assert_eq!(row.translated_text, "[hi] How to use?");
    assert_eq!(worker.monitor().get(job.id).unwrap().state, state);
}

#[tokio::test]
async fn test_job_for_filled_language_is_noop() {
    let env = TestEnvironment::new(ScriptedTranslator::replying());
    let faq = env.seed("How to use?", "Read the docs.").await;
    env.store.insert(faq.id, "bn").await.unwrap();
    env.store.save_text(faq.id, "bn", "কিভাবে ব্যবহার করবেন?").await.unwrap();
    let worker = worker(&env);

    let job = register(&worker, faq.id, "bn");
    assert_eq!(
        worker.run(job).await,
        JobState::Succeeded {
            outcome: FillOutcome::AlreadyFilled
        }
    );
    assert_eq!(env.translator.calls(), 0);
}

#[tokio::test]
async fn test_missing_faq_fails_permanently() {
    let env = TestEnvironment::new(ScriptedTranslator::replying());
    let worker = worker(&env);

    let job = register(&worker, FaqId(9999), "hi");
    let state = worker.run(job).await;

    match state {
        JobState::Failed { error } => assert_eq!(error, "FAQ 9999 does not exist"),
        other => panic!("unexpected state: {:?}", other),
    }
    assert_eq!(env.translator.calls(), 0);
    assert_eq!(worker.monitor().failed().len(), 1);
}

#[tokio::test]
async fn test_three_failures_exhaust_retries() {
    let env = TestEnvironment::new(ScriptedTranslator::failing());
    let faq = env.seed("How to use?", "Read the docs.").await;
    let worker = worker(&env);

    let job = register(&worker, faq.id, "hi");
    let state = worker.run(job).await;

    assert!(matches!(
        state,
        JobState::FailedAfterRetries { attempts: 3, .. }
    ));
    assert_eq!(env.translator.calls(), 3);

    let filled = env
        .store
        .list_for(faq.id)
        .await
        .unwrap()
        .into_iter()
        .any(|row| row.is_filled());
    assert!(!filled);
    assert_eq!(worker.monitor().summary().failed_after_retries, 1);
}

#[tokio::test]
async fn test_transient_failure_recovers_on_retry() {
    let env = TestEnvironment::new(ScriptedTranslator::new(Behavior::FailTimes(2)));
    let faq = env.seed("How to use?", "Read the docs.").await;
    let worker = worker(&env);

    let job = register(&worker, faq.id, "hi");
    assert_eq!(
        worker.run(job).await,
        JobState::Succeeded {
            outcome: FillOutcome::Filled
        }
    );
    assert_eq!(env.translator.calls(), 3);
}

#[tokio::test]
async fn test_update_schedules_fills_for_targets() {
    let env = TestEnvironment::new(ScriptedTranslator::replying());
    let faq = env.seed("How to use?", "Read the docs.").await;
    let before = env.service.current_version().await.unwrap();

    env.service
        .update(faq.id, FaqPatch::question("How do I start?"))
        .await
        .unwrap();
    env.settle_jobs().await;

    assert_eq!(env.service.current_version().await.unwrap(), before + 1);
    let summary = env.service.jobs().summary();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.succeeded, 2);

    for lang in ["hi", "bn"] {
        let row = env.store.find(faq.id, lang).await.unwrap().unwrap();
        assert_eq!(row.translated_text, format!("[{}] How do I start?", lang));
    }
}

#[tokio::test]
async fn test_answer_only_update_schedules_nothing() {
    let env = TestEnvironment::new(ScriptedTranslator::replying());
    let faq = env.seed("How to use?", "Read the docs.").await;

    env.service
        .update(faq.id, FaqPatch::answer("Read the manual."))
        .await
        .unwrap();

    assert_eq!(env.service.jobs().summary().total, 0);
    assert_eq!(env.service.current_version().await.unwrap(), 2);
}

#[tokio::test]
async fn test_question_change_refreshes_stale_translations() {
    let env = TestEnvironment::new(ScriptedTranslator::replying());
    let faq = env.seed("How to use?", "Read the docs.").await;
    env.store.insert(faq.id, "hi").await.unwrap();
    env.store.save_text(faq.id, "hi", "old text").await.unwrap();

    env.service
        .replace(faq.id, NewFaq::new("How do I start?", "Read the docs."))
        .await
        .unwrap();
    env.settle_jobs().await;

    let row = env.store.find(faq.id, "hi").await.unwrap().unwrap();
    assert_eq!(row.translated_text, "[hi] How do I start?");
}

#[tokio::test]
async fn test_in_flight_fill_does_not_outlive_question_change() {
    let env = TestEnvironment::new(ScriptedTranslator::new(Behavior::Hang(
        Duration::from_millis(150),
    )));
    let faq = env.seed("Q0", "Read the docs.").await;

    env.service
        .update(faq.id, FaqPatch::question("Q1"))
        .await
        .unwrap();
    // 第一批任务正在翻译 Q1 时再次修改问题
    tokio::time::sleep(Duration::from_millis(30)).await;
    env.service
        .update(faq.id, FaqPatch::question("Q2"))
        .await
        .unwrap();
    env.settle_jobs().await;

    for lang in ["hi", "bn"] {
        let row = env.store.find(faq.id, lang).await.unwrap().unwrap();
        assert_eq!(row.translated_text, format!("[{}] Q2", lang));
    }
    let summary = env.service.jobs().summary();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.failed + summary.failed_after_retries, 0);
}

#[tokio::test]
async fn test_create_prewarms_targets() {
    let env = TestEnvironment::new(ScriptedTranslator::replying());
    let faq = env
        .service
        .create(NewFaq::new("How to use?", "Read the docs."))
        .await
        .unwrap();
    env.settle_jobs().await;

    assert_eq!(env.store.list_for(faq.id).await.unwrap().len(), 2);
    assert_eq!(env.translator.calls(), 2);
}

#[tokio::test]
async fn test_rolled_back_outbox_enqueues_nothing() {
    let env = TestEnvironment::new(ScriptedTranslator::replying());
    let faq = env.seed("How to use?", "Read the docs.").await;

    // 通过服务的失败更新验证：不存在的 FAQ 不产生任务
    let err = env
        .service
        .update(FaqId(4242), FaqPatch::question("Gone?"))
        .await
        .unwrap_err();
    assert_eq!(err, faq_lingo::FaqError::EntityNotFound(FaqId(4242)));
    assert_eq!(env.service.jobs().summary().total, 0);
    assert!(env.store.get(faq.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_shutdown_drains_queue_and_rejects_new_jobs() {
    let env = TestEnvironment::new(ScriptedTranslator::replying());
    let faq = env.seed("How to use?", "Read the docs.").await;

    let ids = env
        .service
        .schedule_fill(faq.id, &["hi".to_string(), "bn".to_string(), "fr".to_string()]);
    env.service.shutdown().await;

    for id in &ids {
        assert!(env.service.jobs().get(*id).unwrap().state.is_terminal());
    }

    let late = env.service.schedule_fill(faq.id, &["de".to_string()]);
    assert!(matches!(
        env.service.jobs().get(late[0]).unwrap().state,
        JobState::Failed { .. }
    ));
}
