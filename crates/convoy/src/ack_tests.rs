// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use super::*;
use crate::cache::memory::{new_pending_envelope, InMemoryCache};
use crate::store::memory::InMemoryStore;
use crate::test_support::AnyhowExt;

fn engine() -> (AckEngine, Arc<dyn CacheAdapter>, Arc<dyn StoreAdapter>) {
    let store: Arc<dyn StoreAdapter> = Arc::new(InMemoryStore::new());
    let cache: Arc<dyn CacheAdapter> = Arc::new(InMemoryCache::new());
    (AckEngine::new(Arc::clone(&store), Arc::clone(&cache)), cache, store)
}

#[tokio::test]
async fn acknowledge_advances_cursor_and_drains_pending() -> anyhow::Result<()> {
    let (engine, cache, _store) = engine();
    cache.enqueue_pending("j1", "p2", new_pending_envelope(1, serde_json::json!({}))).await.anyhow()?;
    cache.enqueue_pending("j1", "p2", new_pending_envelope(2, serde_json::json!({}))).await.anyhow()?;
    cache.enqueue_pending("j1", "p2", new_pending_envelope(3, serde_json::json!({}))).await.anyhow()?;

    engine.acknowledge("j1", "p2", 2).await.anyhow()?;

    assert_eq!(cache.cursor("j1", "p2").await.anyhow()?, 2);
    let remaining = cache.pending_envelopes("j1", "p2").await.anyhow()?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].sequence_number, 3);
    Ok(())
}

#[tokio::test]
async fn stale_ack_below_cursor_is_a_no_op() -> anyhow::Result<()> {
    let (engine, cache, _store) = engine();
    engine.acknowledge("j1", "p2", 5).await.anyhow()?;
    engine.acknowledge("j1", "p2", 2).await.anyhow()?;
    assert_eq!(cache.cursor("j1", "p2").await.anyhow()?, 5);
    Ok(())
}

#[tokio::test]
async fn report_gap_matches_missing_range_size() -> anyhow::Result<()> {
    let (engine, cache, _store) = engine();
    cache.advance_cursor("j1", "p2", 5).await.anyhow()?;
    let gap = engine.report_gap("j1", "p2", 20).await.anyhow()?;
    assert_eq!(gap, 14);
    Ok(())
}

#[tokio::test]
async fn scenario_s4_resync_returns_ascending_tail() -> anyhow::Result<()> {
    let (engine, _cache, store) = engine();
    for seq in 1..=20u64 {
        store
            .append_location(crate::test_support::sample_location("j1", "leader", seq))
            .await
            .anyhow()?;
    }

    let resynced = engine.resync("j1", 5).await.anyhow()?;
    assert_eq!(resynced.len(), 15);
    assert_eq!(resynced[0].sequence_number, 6);
    assert_eq!(resynced.last().expect("nonempty").sequence_number, 20);
    Ok(())
}
