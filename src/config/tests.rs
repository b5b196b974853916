use std::error::Error as _;

use super::*;
use crate::Effects;

#[derive(Debug)]
struct Unit;

impl Model for Unit {
    type Action = ();
    type Environment = ();

    fn update(&mut self, _action: (), _env: &()) -> Effects<()> {
        Effects::none()
    }
}

#[test]
fn default_config() {
    let c = StoreConfig::default();
    assert_eq!(c.worker_threads, None);
    assert_eq!(c.thread_name_prefix, "uniflow-effect-");
    assert!(c.log_actions);
}

#[test]
fn partial_document_uses_defaults() {
    let c: StoreConfig = serde_json::from_str(r#"{ "worker_threads": 2 }"#).unwrap();
    assert_eq!(
        c,
        StoreConfig {
            worker_threads: Some(2),
            ..StoreConfig::default()
        }
    );
    let c: StoreConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(c, StoreConfig::default());
}

#[test]
fn serialize_then_deserialize() {
    let c = StoreConfig {
        worker_threads: Some(3),
        thread_name_prefix: "app-".into(),
        log_actions: false,
    };
    let json = serde_json::to_string(&c).unwrap();
    assert_eq!(serde_json::from_str::<StoreConfig>(&json).unwrap(), c);
}

#[test]
fn zero_worker_threads_is_rejected() {
    let e = Store::builder(Unit, ()).worker_threads(0).build().unwrap_err();
    assert!(matches!(e, Error::ZeroWorkerThreads));
    assert_eq!(e.to_string(), "`worker_threads` must be greater than zero");
    assert!(e.source().is_none());
}

#[test]
fn executor_error_has_source() {
    let e = Error::Executor(std::io::Error::other("no threads"));
    assert_eq!(e.to_string(), "failed to start effect executor: no threads");
    assert!(e.source().is_some());
}

#[test]
fn dedicated_pool_builds() {
    let store = Store::builder(Unit, ())
        .worker_threads(1)
        .thread_name_prefix("config-test-")
        .log_actions(false)
        .build()
        .unwrap();
    store.send(());
    assert_eq!(store.in_flight(), 0);
}

#[test]
fn spawner_takes_precedence_over_worker_threads() {
    let store = Store::builder(Unit, ())
        .worker_threads(0)
        .spawner(crate::utils::test_helpers::ManualSpawner::new())
        .build();
    assert!(store.is_ok());
}

#[test]
fn shared_pool_is_reused() {
    let a = shared_pool().unwrap();
    let b = shared_pool().unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    a.spawn_ok(async move { tx.send(1).unwrap() });
    assert_eq!(rx.recv().unwrap(), 1);
    drop(b);
}
