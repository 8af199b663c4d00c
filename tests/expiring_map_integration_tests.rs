//! Integration Tests for the Expiring Map
//!
//! Drives the public API on a real tokio runtime. Most tests pause tokio's
//! clock so that sleeps advance time deterministically.

use std::time::{Duration, Instant};

use expiring_map::{Config, ExpiringMap, TokioScheduler, Ttl};

// == Helper Functions ==

fn create_test_map() -> ExpiringMap<String, String> {
    ExpiringMap::new().unwrap()
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// == Basic Operations ==

#[tokio::test(start_paused = true)]
async fn test_round_trip_without_ttl() {
    let map = create_test_map();

    map.set("k".to_string(), "v".to_string(), -1);

    assert_eq!(map.get("k"), Some("v".to_string()));
    assert_eq!(map.ttl("k"), -1);
    assert_eq!(map.ttl_state("k"), Ttl::Persistent);

    sleep_ms(60_000).await;
    assert_eq!(map.get("k"), Some("v".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_absent_key_reads() {
    let map = create_test_map();

    assert_eq!(map.get("nope"), None);
    assert!(!map.has("nope"));
    assert!(!map.delete("nope"));
    assert_eq!(map.ttl("nope"), -2);
}

#[tokio::test(start_paused = true)]
async fn test_set_is_chainable() {
    let map = create_test_map();

    map.set("k1".to_string(), "v1".to_string(), -1)
        .set("k2".to_string(), "v2".to_string(), -1);

    assert_eq!(map.get("k1"), Some("v1".to_string()));
    assert_eq!(map.get("k2"), Some("v2".to_string()));
}

// == Expiry ==

#[tokio::test(start_paused = true)]
async fn test_entry_expires_on_its_own() {
    let map: ExpiringMap<&str, i32> = ExpiringMap::new().unwrap();

    map.set("x", 42, 10);
    assert!(map.has("x"));

    sleep_ms(20).await;

    assert_eq!(map.get("x"), None);
    assert!(!map.has("x"));
    assert_eq!(map.stats().expirations, 1);
}

#[tokio::test(start_paused = true)]
async fn test_overwrite_cancels_old_timer() {
    let map = create_test_map();

    map.set("k".to_string(), "a".to_string(), 1000);
    map.set("k".to_string(), "b".to_string(), 50);

    sleep_ms(100).await;
    assert_eq!(map.get("k"), None);

    // Well past the first TTL, "a" must never come back
    sleep_ms(2000).await;
    assert_eq!(map.get("k"), None);
    assert_eq!(map.stats().expirations, 1);
}

#[tokio::test(start_paused = true)]
async fn test_old_timer_does_not_evict_newer_entry() {
    let map = create_test_map();

    map.set("k".to_string(), "a".to_string(), 50);
    map.set("k".to_string(), "b".to_string(), 1000);

    sleep_ms(100).await;
    assert_eq!(map.get("k"), Some("b".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_delete_before_expiry() {
    let map = create_test_map();

    map.set("k".to_string(), "v".to_string(), 50);
    assert!(map.delete("k"));

    sleep_ms(100).await;

    assert!(!map.has("k"));
    let stats = map.stats();
    assert_eq!(stats.deletions, 1);
    assert_eq!(stats.expirations, 0);
}

#[tokio::test(start_paused = true)]
async fn test_delete_then_reinsert_survives_old_deadline() {
    let map = create_test_map();

    map.set("k".to_string(), "old".to_string(), 50);
    map.delete("k");
    map.set("k".to_string(), "new".to_string(), -1);

    sleep_ms(100).await;
    assert_eq!(map.get("k"), Some("new".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_ttl_counts_down() {
    let map = create_test_map();

    map.set("k".to_string(), "v".to_string(), 1000);
    let ttl = map.ttl("k");
    assert!(ttl <= 1000 && ttl > 900, "ttl was {ttl}");

    sleep_ms(500).await;
    let ttl = map.ttl("k");
    assert!((450..=500).contains(&ttl), "ttl was {ttl}");
}

#[tokio::test(start_paused = true)]
async fn test_ttl_runs_from_set_not_first_poll() {
    let map: ExpiringMap<&str, u32> = ExpiringMap::new().unwrap();

    map.set("k", 1, 10);
    // Time passes before the eviction task ever gets polled
    tokio::time::advance(Duration::from_millis(100)).await;
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }

    assert!(!map.has("k"));
    assert_eq!(map.ttl("k"), -2);
}

#[tokio::test]
async fn test_entry_set_before_blocking_work_expires_on_time() {
    let map: ExpiringMap<&str, u32> = ExpiringMap::new().unwrap();

    map.set("k", 1, 10);
    // Synchronous work keeps the current-thread runtime from polling
    std::thread::sleep(Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(!map.has("k"));
    assert_eq!(map.ttl("k"), -2);
}

#[tokio::test(start_paused = true)]
async fn test_clear_stops_all_evictions() {
    let map = create_test_map();

    map.set("a".to_string(), "1".to_string(), 10)
        .set("b".to_string(), "2".to_string(), 20);
    assert_eq!(map.clear(), 2);

    map.set("a".to_string(), "fresh".to_string(), -1);
    sleep_ms(50).await;

    assert_eq!(map.get("a"), Some("fresh".to_string()));
    assert_eq!(map.stats().expirations, 0);
}

#[tokio::test(start_paused = true)]
async fn test_from_config_default_ttl() {
    let config = Config {
        default_ttl_ms: 30,
        ..Config::default()
    };
    let map: ExpiringMap<u32, u32> = ExpiringMap::from_config(&config).unwrap();

    map.set_default(1, 1);
    assert!(map.ttl(&1) <= 30);

    sleep_ms(40).await;
    assert!(!map.has(&1));
}

// == Runtime Behaviour ==

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_expiry_on_wall_clock() {
    let map = create_test_map();

    map.set("x".to_string(), "v".to_string(), 10)
        .set("y".to_string(), "w".to_string(), -1);

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(!map.has("x"));
    assert!(map.has("y"));
}

#[test]
fn test_new_requires_runtime() {
    let result: expiring_map::error::Result<ExpiringMap<String, String>> = ExpiringMap::new();
    assert!(result.is_err());
}

#[test]
fn test_pending_eviction_does_not_hold_runtime_open() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let scheduler = TokioScheduler::with_handle(runtime.handle().clone());
    let map: ExpiringMap<&str, u32, _> = ExpiringMap::with_scheduler(scheduler);

    // One hour TTL, far longer than the shutdown below may take
    map.set("k", 1, 3_600_000);

    let started = Instant::now();
    drop(runtime);
    assert!(started.elapsed() < Duration::from_secs(5));

    // Entry is still there: its timer was dropped with the runtime, not fired
    assert!(map.has("k"));
    assert!(map.delete("k"));
}
