//! TTL Store demo
//!
//! Writes a handful of keys with staggered TTLs, logs every lifecycle event
//! and prints the store before and after the keys expire.

use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_store::{Config, EventKind, TtlStore};

/// Demo entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the store and subscribe a logger to every event kind
/// 4. Write `DEMO_KEYS` keys, each living a little longer than the last
/// 5. Wait for every key to expire, or for Ctrl+C
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TTL store demo");

    let config = Config::from_env();
    config.validate()?;
    info!(
        "Configuration loaded: default_ttl={}ms, capacity={}, demo_keys={}",
        config.default_ttl_ms, config.capacity, config.demo_keys
    );

    let store: TtlStore<String> =
        TtlStore::from_config(&config).context("failed to create store")?;

    for kind in EventKind::ALL {
        store.subscribe(kind, |event| {
            info!(
                kind = %event.kind,
                key = %event.key,
                value = ?event.value,
                expires_at = ?event.expires_at,
                "event"
            );
        });
    }

    let demo_keys = u32::try_from(config.demo_keys).context("DEMO_KEYS out of range")?;
    let step =
        Duration::from_millis((config.default_ttl_ms / u64::from(demo_keys)).saturating_add(1));
    let items = (1..=demo_keys).map(|i| {
        (
            format!("key{}", i),
            Some(format!("value{}", i)),
            Some(step.saturating_mul(i)),
        )
    });
    store.mset(items);

    let snapshot = serde_json::to_string_pretty(&store.snapshot())?;
    println!("{}", snapshot);

    let longest = step
        .saturating_mul(demo_keys)
        .saturating_add(Duration::from_millis(50));
    tokio::select! {
        _ = tokio::time::sleep(longest) => {
            info!("All demo keys had time to expire");
        }
        _ = signal::ctrl_c() => {
            warn!("Received Ctrl+C, stopping early");
        }
    }

    if let Some(value) = store.get("key1") {
        warn!("key1 still present: {}", value);
    }

    println!("{}", serde_json::to_string_pretty(&store.stats())?);
    store.clear();

    info!("Demo complete");
    Ok(())
}
