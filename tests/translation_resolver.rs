//! 译文解析集成测试
//!
//! 覆盖存储命中、原文回退、空行清理和并发首次访问

use std::sync::Arc;
use std::time::Duration;

use faq_lingo::storage::TranslationStore;
use faq_lingo::translation::TranslationResolver;

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{Behavior, ScriptedTranslator};

fn resolver(
    store: Arc<faq_lingo::storage::InMemoryStore>,
    translator: Arc<ScriptedTranslator>,
) -> TranslationResolver {
    TranslationResolver::new(store, translator, "en", Duration::from_millis(100))
}

#[tokio::test]
async fn test_how_to_use_scenario() {
    let env = common::TestEnvironment::new(
        ScriptedTranslator::replying().with_reply("fr", "Comment utiliser?"),
    );
    let faq = env.seed("How to use?", "Read the docs.").await;
    let resolver = resolver(env.store.clone(), env.translator.clone());

    assert_eq!(resolver.resolve(&faq, "en").await, "How to use?");
    assert_eq!(env.translator.calls(), 0);

    assert_eq!(resolver.resolve(&faq, "fr").await, "Comment utiliser?");
    assert_eq!(resolver.resolve(&faq, "fr").await, "Comment utiliser?");
    assert_eq!(env.translator.calls_for("fr"), 1);

    let row = env.store.find(faq.id, "fr").await.unwrap().unwrap();
    assert_eq!(row.translated_text, "Comment utiliser?");
}

#[tokio::test]
async fn test_failing_translator_falls_back_and_cleans_up() {
    let env = common::TestEnvironment::new(ScriptedTranslator::failing());
    let faq = env.seed("How to use?", "Read the docs.").await;
    let resolver = resolver(env.store.clone(), env.translator.clone());

    assert_eq!(resolver.resolve(&faq, "fr").await, "How to use?");
    assert!(env.store.find(faq.id, "fr").await.unwrap().is_none());

    // 下一次读取重新尝试翻译
    assert_eq!(resolver.resolve(&faq, "fr").await, "How to use?");
    assert_eq!(env.translator.calls_for("fr"), 2);
    assert_eq!(env.store.translation_count().await, 0);
}

#[tokio::test]
async fn test_timeout_counts_as_failure() {
    let env = common::TestEnvironment::new(ScriptedTranslator::new(Behavior::Hang(
        Duration::from_secs(5),
    )));
    let faq = env.seed("How to use?", "Read the docs.").await;
    let resolver = resolver(env.store.clone(), env.translator.clone());

    assert_eq!(resolver.resolve(&faq, "de").await, "How to use?");
    assert!(env.store.find(faq.id, "de").await.unwrap().is_none());
}

#[tokio::test]
async fn test_pre_existing_empty_row_is_retried_in_place() {
    let env = common::TestEnvironment::new(ScriptedTranslator::new(Behavior::FailTimes(1)));
    let faq = env.seed("How to use?", "Read the docs.").await;
    env.store.insert(faq.id, "hi").await.unwrap();
    let resolver = resolver(env.store.clone(), env.translator.clone());

    // 第一次失败，空行保留
    assert_eq!(resolver.resolve(&faq, "hi").await, "How to use?");
    let row = env.store.find(faq.id, "hi").await.unwrap().unwrap();
    assert!(!row.is_filled());

    // 第二次成功，原地写入
    assert_eq!(resolver.resolve(&faq, "hi").await, "[hi] How to use?");
    let row = env.store.find(faq.id, "hi").await.unwrap().unwrap();
    assert_eq!(row.translated_text, "[hi] How to use?");
}

#[tokio::test]
async fn test_duplicate_insert_is_a_constraint_violation() {
    let env = common::TestEnvironment::new(ScriptedTranslator::replying());
    let faq = env.seed("How to use?", "Read the docs.").await;

    env.store.insert(faq.id, "fr").await.unwrap();
    let err = env.store.insert(faq.id, "fr").await.unwrap_err();
    assert!(matches!(
        err,
        faq_lingo::FaqError::DuplicateTranslation { .. }
    ));

    let (row, created) = env.store.get_or_create(faq.id, "fr").await.unwrap();
    assert!(!created);
    assert_eq!(row.language, "fr");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_access_leaves_one_row() {
    let env = common::TestEnvironment::new(ScriptedTranslator::replying());
    let faq = env.seed("How to use?", "Read the docs.").await;
    let resolver = resolver(env.store.clone(), env.translator.clone());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let resolver = resolver.clone();
        let faq = faq.clone();
        handles.push(tokio::spawn(async move { resolver.resolve(&faq, "bn").await }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), "[bn] How to use?");
    }

    let rows = env.store.list_for(faq.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_filled());
}
