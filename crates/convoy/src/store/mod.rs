// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The durable document store adapter.
//!
//! Journeys, participants, location history, and lag-alert records live
//! here. The trait is deliberately storage-agnostic: a production deployment
//! implements it against a real document store; tests and single-process
//! operation use [`memory::InMemoryStore`].

pub mod memory;

use async_trait::async_trait;

use crate::error::ConvoyResult;
use crate::model::{Journey, JourneyPatch, LagAlert, LocationRecord, Participant};

/// A user's membership summary, as maintained by the secondary index
/// `{userId -> {journeyId, status}}` described in the design notes — lets a
/// user's active journeys and invitations be found without a collection scan.
#[derive(Debug, Clone)]
pub struct MembershipEntry {
    pub journey_id: String,
    pub status: crate::model::ParticipantStatus,
}

#[async_trait]
pub trait StoreAdapter: Send + Sync {
    // -- Journeys --------------------------------------------------------
    async fn insert_journey(&self, journey: Journey) -> ConvoyResult<()>;
    async fn get_journey(&self, journey_id: &str) -> ConvoyResult<Option<Journey>>;
    async fn update_journey(
        &self,
        journey_id: &str,
        patch: JourneyPatch,
        now: chrono::DateTime<chrono::Utc>,
    ) -> ConvoyResult<Journey>;
    /// Replace the stored journey wholesale (used for state-machine transitions).
    async fn put_journey(&self, journey: Journey) -> ConvoyResult<()>;

    // -- Participants ------------------------------------------------------
    async fn upsert_participant(&self, participant: Participant) -> ConvoyResult<()>;
    async fn get_participant(
        &self,
        journey_id: &str,
        user_id: &str,
    ) -> ConvoyResult<Option<Participant>>;
    async fn list_participants(&self, journey_id: &str) -> ConvoyResult<Vec<Participant>>;

    /// Collection-group query: every journey a user is a member of, via the
    /// `{userId -> {journeyId, status}}` secondary index.
    async fn list_memberships(&self, user_id: &str) -> ConvoyResult<Vec<MembershipEntry>>;

    // -- Location history --------------------------------------------------
    async fn append_location(&self, record: LocationRecord) -> ConvoyResult<()>;
    async fn last_location(
        &self,
        journey_id: &str,
        participant_id: &str,
    ) -> ConvoyResult<Option<LocationRecord>>;
    async fn location_history(
        &self,
        journey_id: &str,
        limit: usize,
    ) -> ConvoyResult<Vec<LocationRecord>>;
    /// Every persisted record with `sequenceNumber > from_sequence`, ascending.
    async fn locations_after(
        &self,
        journey_id: &str,
        from_sequence: u64,
    ) -> ConvoyResult<Vec<LocationRecord>>;

    // -- Lag alerts ---------------------------------------------------------
    async fn insert_lag_alert(&self, alert: LagAlert) -> ConvoyResult<()>;
    async fn active_lag_alert(
        &self,
        journey_id: &str,
        participant_id: &str,
    ) -> ConvoyResult<Option<LagAlert>>;
    async fn update_lag_alert(&self, alert: LagAlert) -> ConvoyResult<()>;
}
