use runsv::framework::ServiceDescriptor;
use runsv::lifecycle::{LifecycleEvent, Orchestrator, Topic};
use runsv_sample::cache::{CacheError, CacheService, CacheStats};
use runsv_sample::pool::{PoolError, PoolService, Statement};
use runsv_sample::system::{SampleConfig, SampleSystem};
use std::sync::Arc;

/// Full round trip: pool and cache started in order, reads served through the cache,
/// everything shut down in reverse.
#[tokio::test]
async fn test_full_sample_system_lifecycle() {
    let system = SampleSystem::new(SampleConfig::default()).expect("valid services");
    let orchestrator = system.orchestrator();
    assert_eq!(orchestrator.start_plan().unwrap(), vec!["pool", "cache"]);
    assert_eq!(orchestrator.stop_plan().unwrap(), vec!["cache", "pool"]);
    let mut events = orchestrator.subscribe(&Topic::ALL);

    assert!(system.pool_client().is_none(), "no client before start");
    system.start().await.expect("system starts");

    let pool = system.pool_client().expect("pool running");
    assert_eq!(pool.size(), 4);
    pool.query(Statement::put("user:1", "Alice"))
        .await
        .expect("insert");

    let cache = system.cache_client().expect("cache running");
    assert_eq!(cache.get("user:1").await.unwrap(), Some("Alice".to_string()));
    assert_eq!(cache.get("user:1").await.unwrap(), Some("Alice".to_string()));
    assert_eq!(cache.get("user:404").await.unwrap(), None);
    cache.put("user:2", "Bob").await.expect("write-through");
    assert_eq!(
        pool.query(Statement::get("user:2")).await.unwrap(),
        Some("Bob".to_string())
    );
    assert_eq!(
        cache.stats(),
        CacheStats {
            hits: 1,
            misses: 2,
            entries: 2,
        }
    );
    assert!(cache.invalidate("user:2"));

    system.shutdown().await.expect("system stops");
    assert!(matches!(cache.get("user:1").await, Err(CacheError::Closed)));
    assert_eq!(
        pool.query(Statement::get("user:1")).await,
        Err(PoolError::Closed)
    );
    assert_eq!(
        events.drain(),
        vec![
            LifecycleEvent::Started("pool".into()),
            LifecycleEvent::Started("cache".into()),
            LifecycleEvent::Stopped("cache".into()),
            LifecycleEvent::Stopped("pool".into()),
        ]
    );
}

#[tokio::test]
async fn test_system_can_be_restarted() {
    let system = SampleSystem::new(SampleConfig::default()).unwrap();
    system.start().await.unwrap();
    system
        .cache_client()
        .unwrap()
        .put("k", "v")
        .await
        .unwrap();
    system.shutdown().await.unwrap();

    system.start().await.expect("second start");
    let cache = system.cache_client().unwrap();
    assert_eq!(cache.get("k").await.unwrap(), None, "fresh pool after restart");
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_starting_twice_fails_at_the_pool() {
    let system = SampleSystem::new(SampleConfig::default()).unwrap();
    system.start().await.unwrap();

    let err = system.start().await.expect_err("pool already running");
    assert_eq!(err.service(), Some("pool"));
    assert_eq!(
        err.service_error().unwrap().downcast_ref::<PoolError>(),
        Some(&PoolError::AlreadyStarted)
    );
}

#[tokio::test]
async fn test_cache_without_pool_fails_to_start() {
    let mut orchestrator = Orchestrator::new();
    orchestrator.add_service(
        ServiceDescriptor::from_service(Arc::new(CacheService::new())).unwrap(),
        [],
    );

    let err = orchestrator.start().await.expect_err("missing pool");
    assert_eq!(err.service(), Some("cache"));
    assert_eq!(
        err.service_error().unwrap().to_string(),
        "cache requires the pool service"
    );
}

#[tokio::test]
async fn test_pool_alone_exposes_its_client() {
    let mut orchestrator = Orchestrator::new();
    orchestrator.add_service(
        ServiceDescriptor::from_callback_service(Arc::new(PoolService::new(2))).unwrap(),
        [],
    );
    orchestrator.start().await.unwrap();

    let clients = orchestrator.get_clients(&[]);
    assert_eq!(clients.names().collect::<Vec<_>>(), vec!["pool"]);
    orchestrator.stop().await.unwrap();
    assert!(orchestrator.get_clients(&[]).is_empty());
}

/// The watcher sees every transition and finishes once the system is gone.
#[tokio::test]
async fn test_event_watcher_counts_transitions() {
    let system = SampleSystem::new(SampleConfig::default()).unwrap();
    let watcher = system.watch_events();

    system.start().await.unwrap();
    system.shutdown().await.unwrap();
    drop(system);

    assert_eq!(watcher.await.expect("watcher task completes"), 4);
}

#[test]
fn test_config_from_json() {
    let config: SampleConfig =
        serde_json::from_str(r#"{ "pool_size": 8, "orchestrator": { "name": "edge" } }"#)
            .unwrap();
    assert_eq!(config.pool_size, 8);
    assert_eq!(config.orchestrator.name, "edge");

    let defaults: SampleConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(defaults, SampleConfig::default());
}
