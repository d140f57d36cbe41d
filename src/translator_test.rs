use std::sync::Arc;

use crate::test_utils::eventually;
use crate::test_utils::seeded_store;
use crate::test_utils::test_config;
use crate::test_utils::wait_settled;
use crate::test_utils::FlakyStore;
use crate::CompiledFormat;
use crate::Error;
use crate::Locale;
use crate::MemoryStore;
use crate::Mutation;
use crate::ReloadMode;
use crate::ReloadState;
use crate::TaskPools;
use crate::Translator;

fn locale(tag: &str) -> Locale {
    Locale::parse(tag).unwrap()
}

async fn started(
    store: MemoryStore,
    mode: ReloadMode,
) -> Translator {
    let mut config = test_config();
    config.reload.mode = mode;
    let translator = Translator::new(Arc::new(store), &config, TaskPools::current());
    let mut rx = translator.subscribe();
    translator.start().await.unwrap();
    wait_settled(&mut rx, 1).await;
    translator
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hello_world_scenario() {
    let store = MemoryStore::with_entries([
        ("/locales", "bn,en"),
        ("/messages/en/greet.hello", "Hello {0}"),
    ]);
    let translator = started(store, ReloadMode::Sync).await;

    let format = translator.resolve("greet.hello", &locale("en")).unwrap().unwrap();

    assert_eq!(format.render(&["World"]), "Hello World");
    assert_eq!(
        translator.message("greet.hello", &["World"], &locale("en")).unwrap().as_deref(),
        Some("Hello World")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rendering_matches_raw_template() {
    let translator = started(seeded_store(), ReloadMode::Async).await;

    for (code, tag, raw) in [
        ("greet.hello", "en", "Hello {0}"),
        ("greet.bye", "en", "Bye {0}"),
        ("greet.hello", "bn", "Nomoskar {0}"),
    ] {
        let l = locale(tag);
        let resolved = translator.resolve(code, &l).unwrap().unwrap();
        let direct = CompiledFormat::compile(raw, &l).unwrap();
        assert_eq!(resolved.render(&["x"]), direct.render(&["x"]));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_region_qualified_request_matches_base_language() {
    let translator = started(seeded_store(), ReloadMode::Sync).await;

    let format = translator.resolve("greet.hello", &locale("en-US")).unwrap().unwrap();

    assert_eq!(format.locale(), &locale("en"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unregistered_locale_is_not_supported() {
    let translator = started(seeded_store(), ReloadMode::Sync).await;

    for code in ["greet.hello", "missing"] {
        match translator.resolve(code, &locale("fr")) {
            Err(Error::LocaleNotSupported(tag)) => assert_eq!(tag, "fr"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_code_is_absent() {
    let translator = started(seeded_store(), ReloadMode::Sync).await;

    assert!(translator.resolve("missing", &locale("en")).unwrap().is_none());
    assert_eq!(
        translator
            .message_or_default("missing", &["Ada"], "Hi {0}!", &locale("en"))
            .unwrap(),
        "Hi Ada!"
    );
    assert_eq!(
        translator
            .message_or_default("greet.hello", &["Ada"], "Hi {0}!", &locale("en"))
            .unwrap(),
        "Hello Ada"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_quoted_empty_marker_is_deleted() {
    let store = seeded_store();
    store.put("/messages/en/greet.empty", "''");
    let translator = started(store, ReloadMode::Sync).await;

    assert!(translator.resolve("greet.empty", &locale("en")).unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_repeated_resolve_returns_same_instance() {
    let translator = started(seeded_store(), ReloadMode::Sync).await;

    let a = translator.resolve("greet.hello", &locale("en")).unwrap().unwrap();
    let b = translator.resolve("greet.hello", &locale("en-GB")).unwrap().unwrap();

    assert!(Arc::ptr_eq(&a, &b));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watched_change_is_reflected_after_reload() {
    let store = seeded_store();
    let translator = started(store.clone(), ReloadMode::Async).await;
    let before = translator.resolve("greet.hello", &locale("en")).unwrap().unwrap();
    let mut rx = translator.subscribe();

    store.put("/messages/en/greet.hello", "Hi {0}");
    wait_settled(&mut rx, 2).await;

    let after = translator.resolve("greet.hello", &locale("en")).unwrap().unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.render(&["World"]), "Hi World");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_deleted_code_disappears_after_reload() {
    let store = seeded_store();
    let translator = started(store.clone(), ReloadMode::Sync).await;
    assert!(translator.resolve("greet.bye", &locale("en")).unwrap().is_some());

    store.apply(vec![Mutation::delete("/messages/en/greet.bye")]);
    eventually(|| translator.state().generation >= 2).await;

    assert!(translator.resolve("greet.bye", &locale("en")).unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_malformed_template_is_treated_as_absent() {
    let store = seeded_store();
    store.put("/messages/en/greet.broken", "Hello {0");
    let translator = started(store, ReloadMode::Sync).await;

    assert!(translator.resolve("greet.broken", &locale("en")).unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_store_outage_at_boot_uses_defaults_and_stays_up() {
    let store = Arc::new(FlakyStore::new(seeded_store()));
    store.fail_prefix("/messages/");
    let translator = Translator::new(store.clone(), &test_config(), TaskPools::current());
    let mut rx = translator.subscribe();

    translator.start().await.unwrap();
    let status = wait_settled(&mut rx, 1).await;

    assert_eq!(
        status.state,
        ReloadState::Failed {
            failed_locales: vec!["bn".to_string(), "en".to_string()]
        }
    );
    assert_eq!(translator.locales().len(), 2);
    assert!(translator.resolve("greet.hello", &locale("en")).unwrap().is_none());

    store.heal();
    translator.reload().await;
    let status = wait_settled(&mut rx, 2).await;
    assert_eq!(status.state, ReloadState::Ready);
    assert!(translator.resolve("greet.hello", &locale("en")).unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_is_idempotent_and_ends_watch() {
    let store = seeded_store();
    let translator = started(store.clone(), ReloadMode::Sync).await;
    assert_eq!(store.watcher_count(), 1);

    translator.stop();
    translator.stop();

    assert_eq!(store.watcher_count(), 0);
    store.put("/messages/en/greet.hello", "Hi {0}");
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(translator.state().generation, 1);
    assert_eq!(
        translator.message("greet.hello", &["x"], &locale("en")).unwrap().as_deref(),
        Some("Hello x")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lookup_before_start_is_not_supported() {
    let translator = Translator::new(Arc::new(seeded_store()), &test_config(), TaskPools::current());

    assert!(matches!(
        translator.resolve("greet.hello", &locale("en")),
        Err(Error::LocaleNotSupported(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_write_during_boot_load_triggers_follow_up() {
    let store = Arc::new(FlakyStore::new(seeded_store()));
    store.write_after_read("/messages/en/", Mutation::put("/messages/en/greet.hello", "Hi {0}"));
    let mut config = test_config();
    config.reload.mode = ReloadMode::Sync;
    let translator = Translator::new(store.clone(), &config, TaskPools::current());
    let mut rx = translator.subscribe();

    translator.start().await.unwrap();
    let status = wait_settled(&mut rx, 2).await;

    assert_eq!(status.state, ReloadState::Ready);
    assert_eq!(
        translator.message("greet.hello", &["x"], &locale("en")).unwrap().as_deref(),
        Some("Hi x")
    );
    assert_eq!(store.memory().watcher_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_overlapping_starts_keep_one_live_watch() {
    let store = Arc::new(FlakyStore::new(seeded_store()));
    let mut config = test_config();
    config.reload.mode = ReloadMode::Sync;
    let translator = Arc::new(Translator::new(store.clone(), &config, TaskPools::current()));
    let mut rx = translator.subscribe();

    store.close_gate();
    let first = tokio::spawn({
        let translator = translator.clone();
        async move { translator.start().await }
    });
    eventually(|| store.parked_count() > 0).await;

    translator.start().await.unwrap();
    store.open_gate();
    first.await.unwrap().unwrap();
    wait_settled(&mut rx, 1).await;
    assert_eq!(store.memory().watcher_count(), 1);

    store.memory().put("/messages/en/greet.hello", "Hi {0}");
    wait_settled(&mut rx, 2).await;

    assert_eq!(
        translator.message("greet.hello", &["x"], &locale("en")).unwrap().as_deref(),
        Some("Hi x")
    );
    translator.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_during_boot_leaves_no_watch() {
    let store = Arc::new(FlakyStore::new(seeded_store()));
    let mut config = test_config();
    config.reload.mode = ReloadMode::Sync;
    let translator = Arc::new(Translator::new(store.clone(), &config, TaskPools::current()));

    store.close_gate();
    let boot = tokio::spawn({
        let translator = translator.clone();
        async move { translator.start().await }
    });
    eventually(|| store.parked_count() > 0).await;

    translator.stop();
    store.open_gate();
    boot.await.unwrap().unwrap();

    assert_eq!(store.memory().watcher_count(), 0);
}
