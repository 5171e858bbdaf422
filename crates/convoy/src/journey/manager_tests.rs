// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use super::*;
use crate::cache::memory::InMemoryCache;
use crate::store::memory::InMemoryStore;
use crate::test_support::AnyhowExt;

fn manager() -> JourneyManager {
    JourneyManager::new(Arc::new(InMemoryStore::new()), Arc::new(InMemoryCache::new()))
}

async fn create_journey(manager: &JourneyManager, leader: &str) -> anyhow::Result<Journey> {
    manager
        .create(leader, "Trip".to_owned(), None, None, None, 500.0)
        .await
        .anyhow()
}

#[tokio::test]
async fn create_rejects_empty_name() {
    let manager = manager();
    let err = manager
        .create("u1", "   ".to_owned(), None, None, None, 500.0)
        .await
        .expect_err("blank name must be rejected");
    assert_eq!(err, ConvoyError::InvalidInput);
}

#[tokio::test]
async fn create_rejects_threshold_below_minimum() {
    let manager = manager();
    let err = manager
        .create("u1", "Trip".to_owned(), None, None, Some(50.0), 500.0)
        .await
        .expect_err("threshold below 100m must be rejected");
    assert_eq!(err, ConvoyError::InvalidInput);
}

#[tokio::test]
async fn create_makes_creator_an_active_leader() -> anyhow::Result<()> {
    let manager = manager();
    let journey = create_journey(&manager, "u1").await?;
    assert_eq!(journey.status, JourneyStatus::Pending);
    let roster = manager.get(&journey.id).await.anyhow()?;
    assert_eq!(roster.participants.len(), 1);
    assert_eq!(roster.participants[0].role, Role::Leader);
    assert_eq!(roster.participants[0].status, ParticipantStatus::Active);
    Ok(())
}

#[tokio::test]
async fn update_by_non_leader_is_forbidden() -> anyhow::Result<()> {
    let manager = manager();
    let journey = create_journey(&manager, "u1").await?;
    let err = manager
        .update(&journey.id, "intruder", JourneyPatch::default())
        .await
        .expect_err("non-leader update must be forbidden");
    assert_eq!(err, ConvoyError::Forbidden);
    Ok(())
}

#[tokio::test]
async fn scenario_s5_start_on_completed_journey_fails() -> anyhow::Result<()> {
    let manager = manager();
    let journey = create_journey(&manager, "u1").await?;
    manager.start(&journey.id, "u1").await.anyhow()?;
    manager.end(&journey.id, "u1").await.anyhow()?;
    let err = manager.start(&journey.id, "u1").await.expect_err("already completed");
    assert_eq!(err, ConvoyError::PreconditionFailed);
    Ok(())
}

#[tokio::test]
async fn scenario_s5_cancel_on_active_journey_fails() -> anyhow::Result<()> {
    let manager = manager();
    let journey = create_journey(&manager, "u1").await?;
    manager.start(&journey.id, "u1").await.anyhow()?;
    let err = manager.cancel(&journey.id, "u1").await.expect_err("active journey cannot be cancelled");
    assert_eq!(err, ConvoyError::PreconditionFailed);
    Ok(())
}

#[tokio::test]
async fn scenario_s5_leader_cannot_leave() -> anyhow::Result<()> {
    let manager = manager();
    let journey = create_journey(&manager, "u1").await?;
    let err = manager.leave(&journey.id, "u1").await.expect_err("leader cannot leave");
    assert_eq!(err, ConvoyError::Forbidden);
    Ok(())
}

#[tokio::test]
async fn invite_accept_promotes_to_active_on_start() -> anyhow::Result<()> {
    let manager = manager();
    let journey = create_journey(&manager, "u1").await?;
    manager.invite(&journey.id, "u1", "u2").await.anyhow()?;
    manager.accept(&journey.id, "u2").await.anyhow()?;
    manager.start(&journey.id, "u1").await.anyhow()?;

    let roster = manager.get(&journey.id).await.anyhow()?;
    let follower = roster.participants.iter().find(|p| p.user_id == "u2").expect("u2 present");
    assert_eq!(follower.status, ParticipantStatus::Active);
    Ok(())
}

#[tokio::test]
async fn invite_conflicts_on_already_invited() -> anyhow::Result<()> {
    let manager = manager();
    let journey = create_journey(&manager, "u1").await?;
    manager.invite(&journey.id, "u1", "u2").await.anyhow()?;
    let err = manager.invite(&journey.id, "u1", "u2").await.expect_err("already invited");
    assert_eq!(err, ConvoyError::Conflict);
    Ok(())
}

#[tokio::test]
async fn invite_allows_reinviting_a_declined_user() -> anyhow::Result<()> {
    let manager = manager();
    let journey = create_journey(&manager, "u1").await?;
    manager.invite(&journey.id, "u1", "u2").await.anyhow()?;
    manager.decline(&journey.id, "u2").await.anyhow()?;
    manager.invite(&journey.id, "u1", "u2").await.anyhow()?;
    let roster = manager.get(&journey.id).await.anyhow()?;
    let follower = roster.participants.iter().find(|p| p.user_id == "u2").expect("u2 present");
    assert_eq!(follower.status, ParticipantStatus::Invited);
    Ok(())
}

#[tokio::test]
async fn list_invitations_reflects_pending_invites() -> anyhow::Result<()> {
    let manager = manager();
    let journey = create_journey(&manager, "u1").await?;
    manager.invite(&journey.id, "u1", "u2").await.anyhow()?;
    let invitations = manager.list_invitations("u2").await.anyhow()?;
    assert_eq!(invitations.len(), 1);
    assert_eq!(invitations[0].id, journey.id);
    Ok(())
}

#[tokio::test]
async fn list_active_excludes_pending_journeys_and_unaccepted_invites() -> anyhow::Result<()> {
    let manager = manager();
    let pending = create_journey(&manager, "u1").await?;
    manager.invite(&pending.id, "u1", "u2").await.anyhow()?;

    let started = create_journey(&manager, "u1").await?;
    manager.invite(&started.id, "u1", "u2").await.anyhow()?;
    manager.accept(&started.id, "u2").await.anyhow()?;
    manager.start(&started.id, "u1").await.anyhow()?;

    // u2 is INVITED (not yet ACCEPTED) on `pending`, and `pending` itself
    // never left PENDING, so it must not show up as an active journey.
    let active = manager.list_active("u2").await.anyhow()?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, started.id);
    Ok(())
}

#[tokio::test]
async fn create_rejects_out_of_range_destination() {
    let manager = manager();
    let bad = crate::geo::GeoPoint { latitude: 200.0, longitude: 0.0 };
    let err = manager
        .create("u1", "Trip".to_owned(), Some(bad), None, None, 500.0)
        .await
        .expect_err("out-of-range destination must be rejected");
    assert_eq!(err, ConvoyError::InvalidInput);
}

#[tokio::test]
async fn update_rejects_threshold_below_minimum() -> anyhow::Result<()> {
    let manager = manager();
    let journey = create_journey(&manager, "u1").await?;
    let patch = JourneyPatch { lag_threshold_meters: Some(50.0), ..Default::default() };
    let err = manager.update(&journey.id, "u1", patch).await.expect_err("below minimum");
    assert_eq!(err, ConvoyError::InvalidInput);
    Ok(())
}

#[tokio::test]
async fn roster_stays_nonempty_while_leader_remains_active() -> anyhow::Result<()> {
    let manager = manager();
    let journey = create_journey(&manager, "u1").await?;
    manager.invite(&journey.id, "u1", "u2").await.anyhow()?;
    manager.accept(&journey.id, "u2").await.anyhow()?;
    manager.start(&journey.id, "u1").await.anyhow()?;
    assert!(!manager.roster_is_empty(&journey.id).await.anyhow()?);
    manager.leave(&journey.id, "u2").await.anyhow()?;
    assert!(!manager.roster_is_empty(&journey.id).await.anyhow()?);
    Ok(())
}
