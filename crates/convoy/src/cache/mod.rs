// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The hot key-value cache adapter: latest location, roster, sequence
//! counters, pending-delivery queues, rate limits, and room membership.
//!
//! All of this is ephemeral and reconstructible from the store, per the
//! design notes' "retry reconciles" failure mode.

pub mod memory;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::ConvoyResult;
use crate::model::CachedLocation;

pub use memory::new_pending_envelope;

/// One HIGH-priority envelope awaiting acknowledgement.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PendingEnvelope {
    pub sequence_number: u64,
    pub payload: serde_json::Value,
    pub attempt: u32,
    pub first_attempt_at: chrono::DateTime<chrono::Utc>,
    pub last_attempt_at: chrono::DateTime<chrono::Utc>,
}

/// TTL for cached latest-location entries.
pub const CACHED_LOCATION_TTL: Duration = Duration::from_secs(5 * 60);
/// TTL for pending-delivery queue entries.
pub const PENDING_DELIVERY_TTL: Duration = Duration::from_secs(60 * 60);

#[async_trait]
pub trait CacheAdapter: Send + Sync {
    // -- Hot location --------------------------------------------------------
    async fn set_latest_location(
        &self,
        journey_id: &str,
        participant_id: &str,
        location: CachedLocation,
    ) -> ConvoyResult<()>;
    async fn get_latest_location(
        &self,
        journey_id: &str,
        participant_id: &str,
    ) -> ConvoyResult<Option<CachedLocation>>;
    async fn latest_locations(
        &self,
        journey_id: &str,
    ) -> ConvoyResult<Vec<CachedLocation>>;

    // -- Sequence counters ----------------------------------------------------
    /// Atomically increment and return the journey's sequence counter.
    async fn next_sequence(&self, journey_id: &str) -> ConvoyResult<u64>;

    // -- Subscriber cursors ---------------------------------------------------
    async fn cursor(&self, journey_id: &str, participant_id: &str) -> ConvoyResult<u64>;
    async fn advance_cursor(
        &self,
        journey_id: &str,
        participant_id: &str,
        sequence_number: u64,
    ) -> ConvoyResult<()>;

    // -- Pending delivery -------------------------------------------------------
    async fn enqueue_pending(
        &self,
        journey_id: &str,
        participant_id: &str,
        envelope: PendingEnvelope,
    ) -> ConvoyResult<()>;
    async fn pending_envelopes(
        &self,
        journey_id: &str,
        participant_id: &str,
    ) -> ConvoyResult<Vec<PendingEnvelope>>;
    /// Drop every envelope with `sequence_number <= through`.
    async fn drain_pending_through(
        &self,
        journey_id: &str,
        participant_id: &str,
        through: u64,
    ) -> ConvoyResult<()>;
    async fn replace_pending(
        &self,
        journey_id: &str,
        participant_id: &str,
        envelopes: Vec<PendingEnvelope>,
    ) -> ConvoyResult<()>;
    /// Iterate every (journey, participant) key with a non-empty queue, for the
    /// retry scheduler.
    async fn all_pending_keys(&self) -> ConvoyResult<Vec<(String, String)>>;

    // -- Rate limiting ----------------------------------------------------------
    /// Record one write for `user_id` and return the count within the
    /// trailing one-minute window.
    async fn record_rate_limit_hit(&self, user_id: &str) -> ConvoyResult<u32>;

    // -- Rooms --------------------------------------------------------------------
    async fn room_add(&self, journey_id: &str, connection_id: &str) -> ConvoyResult<()>;
    async fn room_remove(&self, journey_id: &str, connection_id: &str) -> ConvoyResult<()>;
    async fn room_members(&self, journey_id: &str) -> ConvoyResult<Vec<String>>;
    /// Remove `connection_id` from every room it belongs to (disconnect cleanup).
    async fn room_remove_everywhere(&self, connection_id: &str) -> ConvoyResult<()>;

    // -- Active-journey set ---------------------------------------------------------
    async fn active_journeys_add(&self, journey_id: &str) -> ConvoyResult<()>;
    async fn active_journeys_remove(&self, journey_id: &str) -> ConvoyResult<()>;
    /// Size of the active-journey set, for the liveness probe.
    async fn active_journey_count(&self) -> ConvoyResult<usize>;
}
