// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-process [`CacheAdapter`] backed by `RwLock`-guarded maps.
//!
//! TTL expiry is evaluated lazily on read rather than by a background sweep:
//! adequate for tests and single-process operation, where memory pressure
//! from unswept stale entries is not a concern.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{CacheAdapter, PendingEnvelope, CACHED_LOCATION_TTL, PENDING_DELIVERY_TTL};
use crate::error::ConvoyError;
use crate::model::CachedLocation;

struct Expiring<T> {
    value: T,
    inserted_at: Instant,
}

/// `true` once `envelope` has sat in its queue past [`PENDING_DELIVERY_TTL`],
/// measured from its first attempt. Expired envelopes are filtered lazily on
/// read, the same way `CACHED_LOCATION_TTL` is enforced above.
fn is_pending_expired(envelope: &PendingEnvelope, now: chrono::DateTime<Utc>) -> bool {
    let ttl = chrono::Duration::from_std(PENDING_DELIVERY_TTL).unwrap_or(chrono::Duration::zero());
    now - envelope.first_attempt_at >= ttl
}

#[derive(Default)]
pub struct InMemoryCache {
    latest_locations: RwLock<HashMap<(String, String), Expiring<CachedLocation>>>,
    sequences: RwLock<HashMap<String, u64>>,
    cursors: RwLock<HashMap<(String, String), u64>>,
    pending: RwLock<HashMap<(String, String), Vec<PendingEnvelope>>>,
    rate_limits: RwLock<HashMap<String, Vec<Instant>>>,
    rooms: RwLock<HashMap<String, HashSet<String>>>,
    active_journeys: RwLock<HashSet<String>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheAdapter for InMemoryCache {
    async fn set_latest_location(
        &self,
        journey_id: &str,
        participant_id: &str,
        location: CachedLocation,
    ) -> Result<(), ConvoyError> {
        let key = (journey_id.to_owned(), participant_id.to_owned());
        self.latest_locations
            .write()
            .await
            .insert(key, Expiring { value: location, inserted_at: Instant::now() });
        Ok(())
    }

    async fn get_latest_location(
        &self,
        journey_id: &str,
        participant_id: &str,
    ) -> Result<Option<CachedLocation>, ConvoyError> {
        let key = (journey_id.to_owned(), participant_id.to_owned());
        let locations = self.latest_locations.read().await;
        Ok(locations
            .get(&key)
            .filter(|entry| entry.inserted_at.elapsed() < CACHED_LOCATION_TTL)
            .map(|entry| entry.value.clone()))
    }

    async fn latest_locations(&self, journey_id: &str) -> Result<Vec<CachedLocation>, ConvoyError> {
        let locations = self.latest_locations.read().await;
        Ok(locations
            .iter()
            .filter(|((jid, _), entry)| {
                jid == journey_id && entry.inserted_at.elapsed() < CACHED_LOCATION_TTL
            })
            .map(|(_, entry)| entry.value.clone())
            .collect())
    }

    async fn next_sequence(&self, journey_id: &str) -> Result<u64, ConvoyError> {
        let mut sequences = self.sequences.write().await;
        let counter = sequences.entry(journey_id.to_owned()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn cursor(&self, journey_id: &str, participant_id: &str) -> Result<u64, ConvoyError> {
        let key = (journey_id.to_owned(), participant_id.to_owned());
        Ok(self.cursors.read().await.get(&key).copied().unwrap_or(0))
    }

    async fn advance_cursor(
        &self,
        journey_id: &str,
        participant_id: &str,
        sequence_number: u64,
    ) -> Result<(), ConvoyError> {
        let key = (journey_id.to_owned(), participant_id.to_owned());
        let mut cursors = self.cursors.write().await;
        let existing = cursors.entry(key).or_insert(0);
        if sequence_number > *existing {
            *existing = sequence_number;
        }
        Ok(())
    }

    async fn enqueue_pending(
        &self,
        journey_id: &str,
        participant_id: &str,
        envelope: PendingEnvelope,
    ) -> Result<(), ConvoyError> {
        let key = (journey_id.to_owned(), participant_id.to_owned());
        self.pending.write().await.entry(key).or_default().push(envelope);
        Ok(())
    }

    async fn pending_envelopes(
        &self,
        journey_id: &str,
        participant_id: &str,
    ) -> Result<Vec<PendingEnvelope>, ConvoyError> {
        let key = (journey_id.to_owned(), participant_id.to_owned());
        let now = Utc::now();
        Ok(self
            .pending
            .read()
            .await
            .get(&key)
            .map(|queue| queue.iter().filter(|e| !is_pending_expired(e, now)).cloned().collect())
            .unwrap_or_default())
    }

    async fn drain_pending_through(
        &self,
        journey_id: &str,
        participant_id: &str,
        through: u64,
    ) -> Result<(), ConvoyError> {
        let key = (journey_id.to_owned(), participant_id.to_owned());
        if let Some(queue) = self.pending.write().await.get_mut(&key) {
            queue.retain(|envelope| envelope.sequence_number > through);
        }
        Ok(())
    }

    async fn replace_pending(
        &self,
        journey_id: &str,
        participant_id: &str,
        envelopes: Vec<PendingEnvelope>,
    ) -> Result<(), ConvoyError> {
        let key = (journey_id.to_owned(), participant_id.to_owned());
        if envelopes.is_empty() {
            self.pending.write().await.remove(&key);
        } else {
            self.pending.write().await.insert(key, envelopes);
        }
        Ok(())
    }

    async fn all_pending_keys(&self) -> Result<Vec<(String, String)>, ConvoyError> {
        let pending = self.pending.read().await;
        let now = Utc::now();
        Ok(pending
            .iter()
            .filter(|(_, queue)| queue.iter().any(|e| !is_pending_expired(e, now)))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn record_rate_limit_hit(&self, user_id: &str) -> Result<u32, ConvoyError> {
        let window = std::time::Duration::from_secs(60);
        let mut limits = self.rate_limits.write().await;
        let hits = limits.entry(user_id.to_owned()).or_default();
        hits.retain(|at| at.elapsed() < window);
        hits.push(Instant::now());
        Ok(hits.len() as u32)
    }

    async fn room_add(&self, journey_id: &str, connection_id: &str) -> Result<(), ConvoyError> {
        self.rooms
            .write()
            .await
            .entry(journey_id.to_owned())
            .or_default()
            .insert(connection_id.to_owned());
        Ok(())
    }

    async fn room_remove(&self, journey_id: &str, connection_id: &str) -> Result<(), ConvoyError> {
        if let Some(members) = self.rooms.write().await.get_mut(journey_id) {
            members.remove(connection_id);
        }
        Ok(())
    }

    async fn room_members(&self, journey_id: &str) -> Result<Vec<String>, ConvoyError> {
        Ok(self
            .rooms
            .read()
            .await
            .get(journey_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn room_remove_everywhere(&self, connection_id: &str) -> Result<(), ConvoyError> {
        let mut rooms = self.rooms.write().await;
        for members in rooms.values_mut() {
            members.remove(connection_id);
        }
        Ok(())
    }

    async fn active_journeys_add(&self, journey_id: &str) -> Result<(), ConvoyError> {
        self.active_journeys.write().await.insert(journey_id.to_owned());
        Ok(())
    }

    async fn active_journeys_remove(&self, journey_id: &str) -> Result<(), ConvoyError> {
        self.active_journeys.write().await.remove(journey_id);
        Ok(())
    }

    async fn active_journey_count(&self) -> Result<usize, ConvoyError> {
        Ok(self.active_journeys.read().await.len())
    }
}

/// Build a [`PendingEnvelope`] for `sequence_number` with `attempt = 0`, stamped `now`.
pub fn new_pending_envelope(sequence_number: u64, payload: serde_json::Value) -> PendingEnvelope {
    let now = Utc::now();
    PendingEnvelope { sequence_number, payload, attempt: 0, first_attempt_at: now, last_attempt_at: now }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
