// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;

use super::*;
use crate::geo::GeoPoint;
use crate::model::{LocationMetadata, Priority, Severity};
use crate::test_support::AnyhowExt;

fn journey(id: &str, leader: &str) -> Journey {
    Journey::new(id.to_owned(), "Trip".to_owned(), leader.to_owned(), None, None, 500.0, Utc::now())
}

fn location(journey_id: &str, participant_id: &str, seq: u64) -> LocationRecord {
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
async fn insert_and_get_journey_round_trips() -> anyhow::Result<()> {
    let store = InMemoryStore::new();
    store.insert_journey(journey("j1", "u1")).await.anyhow()?;
    let fetched = store.get_journey("j1").await.anyhow()?;
    assert_eq!(fetched.map(|j| j.leader_id), Some("u1".to_owned()));
    Ok(())
}

#[tokio::test]
async fn get_missing_journey_returns_none() -> anyhow::Result<()> {
    let store = InMemoryStore::new();
    assert!(store.get_journey("missing").await.anyhow()?.is_none());
    Ok(())
}

#[tokio::test]
async fn update_journey_missing_is_not_found() {
    let store = InMemoryStore::new();
    let err = store
        .update_journey("missing", JourneyPatch::default(), Utc::now())
        .await
        .expect_err("missing journey must error");
    assert_eq!(err, ConvoyError::NotFound);
}

#[tokio::test]
async fn locations_after_returns_ascending_tail() -> anyhow::Result<()> {
    let store = InMemoryStore::new();
    for seq in 1..=5 {
        store.append_location(location("j1", "p1", seq)).await.anyhow()?;
    }
    let tail = store.locations_after("j1", 2).await.anyhow()?;
    let sequences: Vec<u64> = tail.iter().map(|r| r.sequence_number).collect();
    assert_eq!(sequences, vec![3, 4, 5]);
    Ok(())
}

#[tokio::test]
async fn last_location_is_most_recent_for_participant() -> anyhow::Result<()> {
    let store = InMemoryStore::new();
    store.append_location(location("j1", "p1", 1)).await.anyhow()?;
    store.append_location(location("j1", "p2", 2)).await.anyhow()?;
    store.append_location(location("j1", "p1", 3)).await.anyhow()?;
    let last = store.last_location("j1", "p1").await.anyhow()?;
    assert_eq!(last.map(|r| r.sequence_number), Some(3));
    Ok(())
}

#[tokio::test]
async fn membership_index_reflects_participant_writes() -> anyhow::Result<()> {
    let store = InMemoryStore::new();
    store.upsert_participant(Participant::leader("j1".into(), "u1".into(), Utc::now())).await.anyhow()?;
    store
        .upsert_participant(Participant::invited("j2".into(), "u1".into(), "u2".into(), Utc::now()))
        .await
        .anyhow()?;
    let memberships = store.list_memberships("u1").await.anyhow()?;
    assert_eq!(memberships.len(), 2);
    Ok(())
}

#[tokio::test]
async fn active_lag_alert_hides_resolved_rows() -> anyhow::Result<()> {
    let store = InMemoryStore::new();
    let leader_pt = GeoPoint::new(0.0, 0.0).anyhow()?;
    let follower_pt = GeoPoint::new(0.02, 0.0).anyhow()?;
    let mut alert = LagAlert::new(
        "a1".into(),
        "j1".into(),
        "p1".into(),
        "u1".into(),
        1500.0,
        leader_pt,
        follower_pt,
        Severity::Warning,
        Utc::now(),
    );
    store.insert_lag_alert(alert.clone()).await.anyhow()?;
    assert!(store.active_lag_alert("j1", "p1").await.anyhow()?.is_some());

    alert.resolve(Utc::now());
    store.update_lag_alert(alert).await.anyhow()?;
    assert!(store.active_lag_alert("j1", "p1").await.anyhow()?.is_none());
    Ok(())
}

#[tokio::test]
async fn resolved_alert_is_retained_when_a_new_one_is_inserted() -> anyhow::Result<()> {
    let store = InMemoryStore::new();
    let leader_pt = GeoPoint::new(0.0, 0.0).anyhow()?;
    let follower_pt = GeoPoint::new(0.02, 0.0).anyhow()?;
    let mut first = LagAlert::new(
        "a1".into(),
        "j1".into(),
        "p1".into(),
        "u1".into(),
        1500.0,
        leader_pt,
        follower_pt,
        Severity::Warning,
        Utc::now(),
    );
    store.insert_lag_alert(first.clone()).await.anyhow()?;
    first.resolve(Utc::now());
    store.update_lag_alert(first).await.anyhow()?;

    let second = LagAlert::new(
        "a2".into(),
        "j1".into(),
        "p1".into(),
        "u1".into(),
        1600.0,
        leader_pt,
        follower_pt,
        Severity::Critical,
        Utc::now(),
    );
    store.insert_lag_alert(second).await.anyhow()?;

    let active = store.active_lag_alert("j1", "p1").await.anyhow()?.expect("new alert is active");
    assert_eq!(active.id, "a2");
    assert_eq!(active.severity, Severity::Critical);
    Ok(())
}
