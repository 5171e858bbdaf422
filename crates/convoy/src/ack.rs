// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The stateful half of the sequence and ack engine: wires the pure
//! decision logic in [`crate::sequence`] to the store and cache adapters.
//!
//! [`crate::sequence`] holds the math (gap sizing, retry eligibility); this
//! module holds the I/O (cursor advance, pending-queue drain, resync reads),
//! mirroring the split between [`crate::priority`] (pure) and
//! [`crate::pipeline`] (wired) elsewhere in this crate.

use std::sync::Arc;

use tracing::debug;

use crate::cache::CacheAdapter;
use crate::error::ConvoyResult;
use crate::model::LocationRecord;
use crate::sequence::{gap_size, prefers_full_resync};
use crate::store::StoreAdapter;

pub struct AckEngine {
    store: Arc<dyn StoreAdapter>,
    cache: Arc<dyn CacheAdapter>,
}

impl AckEngine {
    pub fn new(store: Arc<dyn StoreAdapter>, cache: Arc<dyn CacheAdapter>) -> Self {
        Self { store, cache }
    }

    /// Handle an `acknowledge {sequenceNumber}` event from `participant_id`
    /// advance its cursor and drain every pending envelope it implies
    /// delivery of. A stale ack (sequence below the current cursor) is a
    /// no-op, not an error.
    pub async fn acknowledge(
        &self,
        journey_id: &str,
        participant_id: &str,
        sequence_number: u64,
    ) -> ConvoyResult<()> {
        let cursor = self.cache.cursor(journey_id, participant_id).await?;
        if sequence_number < cursor {
            return Ok(());
        }
        self.cache.advance_cursor(journey_id, participant_id, sequence_number).await?;
        self.cache.drain_pending_through(journey_id, participant_id, sequence_number).await
    }

    /// Compute the gap a subscriber's self-reported `received_sequence`
    /// implies against its acked cursor, logging whether a full resync is
    /// preferable to incremental retry.
    pub async fn report_gap(
        &self,
        journey_id: &str,
        participant_id: &str,
        received_sequence: u64,
    ) -> ConvoyResult<u64> {
        let cursor = self.cache.cursor(journey_id, participant_id).await?;
        let gap = gap_size(cursor, received_sequence);
        if gap > 0 {
            debug!(
                journey_id,
                participant_id,
                cursor,
                received_sequence,
                gap,
                prefer_full_resync = prefers_full_resync(cursor, received_sequence),
                "gap detected in subscriber sequence stream"
            );
        }
        Ok(gap)
    }

    /// Handle a `request-resync {fromSequence}` event: every persisted
    /// record past `from_sequence`, ascending.
    pub async fn resync(
        &self,
        journey_id: &str,
        from_sequence: u64,
    ) -> ConvoyResult<Vec<LocationRecord>> {
        self.store.locations_after(journey_id, from_sequence).await
    }
}

#[cfg(test)]
#[path = "ack_tests.rs"]
mod tests;
