//! Expiring Map demo
//!
//! Memoizes a slow lookup in an `ExpiringMap`, shows cache hits while the
//! TTL is live, and shows the entries evicting themselves afterwards.

use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use expiring_map::{Config, ExpiringMap};

/// Stand-in for an expensive fetch worth caching.
async fn fetch_user_name(id: u32) -> String {
    tokio::time::sleep(Duration::from_millis(20)).await;
    format!("user-{id}")
}

/// Returns the cached name for `id`, fetching and caching it on a miss.
async fn cached_user_name(cache: &ExpiringMap<u32, String>, id: u32, ttl_ms: i64) -> String {
    if let Some(name) = cache.get(&id) {
        return name;
    }
    let name = fetch_user_name(id).await;
    cache.set(id, name.clone(), ttl_ms);
    name
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expiring_map=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    config.validate()?;
    info!(
        "Configuration loaded: default_ttl={}ms, demo_ttl={}ms",
        config.default_ttl_ms, config.demo_ttl_ms
    );

    let cache = ExpiringMap::from_config(&config).context("creating expiring map")?;

    for round in 1..=2 {
        for id in [1, 2, 3] {
            let name = cached_user_name(&cache, id, config.demo_ttl_ms).await;
            info!("Round {}: user {} -> {} (ttl {}ms)", round, id, name, cache.ttl(&id));
        }
    }

    // Never expires unless EXPIRING_MAP_DEFAULT_TTL_MS says otherwise
    cache.set_default(0, "admin".to_string());

    let wait = Duration::from_millis(config.demo_ttl_ms as u64) + Duration::from_millis(50);
    info!("Waiting {:?} for entries to expire", wait);
    tokio::time::sleep(wait).await;

    info!("Entries left after expiry: {}", cache.len());
    let stats = serde_json::to_string(&cache.stats()).context("serializing stats")?;
    info!("Stats: {}", stats);

    Ok(())
}
