// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;

use super::*;
use crate::geo::GeoPoint;
use crate::model::{LocationMetadata, LocationRecord, Priority};
use crate::test_support::AnyhowExt;

fn location(journey_id: &str, participant_id: &str, seq: u64) -> CachedLocation {
    LocationRecord {
        journey_id: journey_id.to_owned(),
        participant_id: participant_id.to_owned(),
        user_id: participant_id.to_owned(),
        position: GeoPoint::new(0.0, 0.0).expect("valid"),
        accuracy: 5.0,
        heading: None,
        speed: None,
        altitude: None,
        server_timestamp: Utc::now(),
        sequence_number: seq,
        priority: Priority::Low,
        metadata: LocationMetadata::default(),
    }
}

#[tokio::test]
async fn sequence_counter_is_monotone_and_dense() -> anyhow::Result<()> {
    let cache = InMemoryCache::new();
    let sequences: Vec<u64> = {
        let mut out = Vec::new();
        for _ in 0..5 {
            out.push(cache.next_sequence("j1").await.anyhow()?);
        }
        out
    };
    assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
    Ok(())
}

#[tokio::test]
async fn separate_journeys_have_independent_counters() -> anyhow::Result<()> {
    let cache = InMemoryCache::new();
    assert_eq!(cache.next_sequence("j1").await.anyhow()?, 1);
    assert_eq!(cache.next_sequence("j2").await.anyhow()?, 1);
    assert_eq!(cache.next_sequence("j1").await.anyhow()?, 2);
    Ok(())
}

#[tokio::test]
async fn cursor_advance_is_monotone() -> anyhow::Result<()> {
    let cache = InMemoryCache::new();
    cache.advance_cursor("j1", "p1", 5).await.anyhow()?;
    cache.advance_cursor("j1", "p1", 3).await.anyhow()?;
    assert_eq!(cache.cursor("j1", "p1").await.anyhow()?, 5);
    Ok(())
}

#[tokio::test]
async fn drain_pending_removes_acked_and_older() -> anyhow::Result<()> {
    let cache = InMemoryCache::new();
    for seq in 1..=5 {
        cache
            .enqueue_pending("j1", "p1", new_pending_envelope(seq, serde_json::json!({})))
            .await
            .anyhow()?;
    }
    cache.drain_pending_through("j1", "p1", 3).await.anyhow()?;
    let remaining = cache.pending_envelopes("j1", "p1").await.anyhow()?;
    let sequences: Vec<u64> = remaining.iter().map(|e| e.sequence_number).collect();
    assert_eq!(sequences, vec![4, 5]);
    Ok(())
}

#[tokio::test]
async fn all_pending_keys_omits_empty_queues() -> anyhow::Result<()> {
    let cache = InMemoryCache::new();
    cache
        .enqueue_pending("j1", "p1", new_pending_envelope(1, serde_json::json!({})))
        .await
        .anyhow()?;
    cache.drain_pending_through("j1", "p1", 1).await.anyhow()?;
    assert!(cache.all_pending_keys().await.anyhow()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn pending_envelopes_older_than_the_ttl_are_no_longer_returned() -> anyhow::Result<()> {
    let cache = InMemoryCache::new();
    let stale = PendingEnvelope {
        sequence_number: 1,
        payload: serde_json::json!({}),
        attempt: 0,
        first_attempt_at: Utc::now() - chrono::Duration::hours(2),
        last_attempt_at: Utc::now() - chrono::Duration::hours(2),
    };
    cache.enqueue_pending("j1", "p1", stale).await.anyhow()?;
    cache.enqueue_pending("j1", "p1", new_pending_envelope(2, serde_json::json!({}))).await.anyhow()?;

    let remaining = cache.pending_envelopes("j1", "p1").await.anyhow()?;
    assert_eq!(remaining.iter().map(|e| e.sequence_number).collect::<Vec<_>>(), vec![2]);
    Ok(())
}

#[tokio::test]
async fn all_pending_keys_omits_queues_with_only_expired_envelopes() -> anyhow::Result<()> {
    let cache = InMemoryCache::new();
    let stale = PendingEnvelope {
        sequence_number: 1,
        payload: serde_json::json!({}),
        attempt: 0,
        first_attempt_at: Utc::now() - chrono::Duration::hours(2),
        last_attempt_at: Utc::now() - chrono::Duration::hours(2),
    };
    cache.enqueue_pending("j1", "p1", stale).await.anyhow()?;
    assert!(cache.all_pending_keys().await.anyhow()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn room_remove_everywhere_clears_all_rooms() -> anyhow::Result<()> {
    let cache = InMemoryCache::new();
    cache.room_add("j1", "c1").await.anyhow()?;
    cache.room_add("j2", "c1").await.anyhow()?;
    cache.room_remove_everywhere("c1").await.anyhow()?;
    assert!(cache.room_members("j1").await.anyhow()?.is_empty());
    assert!(cache.room_members("j2").await.anyhow()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn latest_location_round_trips() -> anyhow::Result<()> {
    let cache = InMemoryCache::new();
    cache.set_latest_location("j1", "p1", location("j1", "p1", 1)).await.anyhow()?;
    let fetched = cache.get_latest_location("j1", "p1").await.anyhow()?;
    assert_eq!(fetched.map(|l| l.sequence_number), Some(1));
    Ok(())
}

#[tokio::test]
async fn rate_limit_counts_accumulate_within_window() -> anyhow::Result<()> {
    let cache = InMemoryCache::new();
    assert_eq!(cache.record_rate_limit_hit("u1").await.anyhow()?, 1);
    assert_eq!(cache.record_rate_limit_hit("u1").await.anyhow()?, 2);
    assert_eq!(cache.record_rate_limit_hit("u2").await.anyhow()?, 1);
    Ok(())
}
