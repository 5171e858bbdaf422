// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-process [`StoreAdapter`] backed by `RwLock<HashMap<...>>`.
//!
//! Conformant for tests and single-process deployments; a clustered
//! deployment swaps this for a real document-store-backed implementation of
//! the same trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MembershipEntry, StoreAdapter};
use crate::error::ConvoyError;
use crate::model::{Journey, JourneyPatch, LagAlert, LocationRecord, Participant};

#[derive(Default)]
pub struct InMemoryStore {
    journeys: RwLock<HashMap<String, Journey>>,
    // keyed by (journey_id, user_id)
    participants: RwLock<HashMap<(String, String), Participant>>,
    // keyed by journey_id, append-only, ordered by insertion (== sequence order)
    locations: RwLock<HashMap<String, Vec<LocationRecord>>>,
    // keyed by (journey_id, participant_id), append-only history; at most
    // one entry per key has `is_active == true` at a time
    lag_alerts: RwLock<HashMap<(String, String), Vec<LagAlert>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreAdapter for InMemoryStore {
    async fn insert_journey(&self, journey: Journey) -> Result<(), ConvoyError> {
        self.journeys.write().await.insert(journey.id.clone(), journey);
        Ok(())
    }

    async fn get_journey(&self, journey_id: &str) -> Result<Option<Journey>, ConvoyError> {
        Ok(self.journeys.read().await.get(journey_id).cloned())
    }

    async fn update_journey(
        &self,
        journey_id: &str,
        patch: JourneyPatch,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Journey, ConvoyError> {
        let mut journeys = self.journeys.write().await;
        let journey = journeys.get_mut(journey_id).ok_or(ConvoyError::NotFound)?;
        if let Some(name) = patch.name {
            journey.name = name;
        }
        if let Some(destination) = patch.destination {
            journey.destination = Some(destination);
        }
        if let Some(address) = patch.destination_address {
            journey.destination_address = Some(address);
        }
        if let Some(threshold) = patch.lag_threshold_meters {
            journey.lag_threshold_meters = threshold;
        }
        journey.updated_at = now;
        Ok(journey.clone())
    }

    async fn put_journey(&self, journey: Journey) -> Result<(), ConvoyError> {
        self.journeys.write().await.insert(journey.id.clone(), journey);
        Ok(())
    }

    async fn upsert_participant(&self, participant: Participant) -> Result<(), ConvoyError> {
        let key = (participant.journey_id.clone(), participant.user_id.clone());
        self.participants.write().await.insert(key, participant);
        Ok(())
    }

    async fn get_participant(
        &self,
        journey_id: &str,
        user_id: &str,
    ) -> Result<Option<Participant>, ConvoyError> {
        let key = (journey_id.to_owned(), user_id.to_owned());
        Ok(self.participants.read().await.get(&key).cloned())
    }

    async fn list_participants(&self, journey_id: &str) -> Result<Vec<Participant>, ConvoyError> {
        let participants = self.participants.read().await;
        Ok(participants
            .values()
            .filter(|p| p.journey_id == journey_id)
            .cloned()
            .collect())
    }

    async fn list_memberships(&self, user_id: &str) -> Result<Vec<MembershipEntry>, ConvoyError> {
        let participants = self.participants.read().await;
        Ok(participants
            .values()
            .filter(|p| p.user_id == user_id)
            .map(|p| MembershipEntry { journey_id: p.journey_id.clone(), status: p.status })
            .collect())
    }

    async fn append_location(&self, record: LocationRecord) -> Result<(), ConvoyError> {
        self.locations
            .write()
            .await
            .entry(record.journey_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn last_location(
        &self,
        journey_id: &str,
        participant_id: &str,
    ) -> Result<Option<LocationRecord>, ConvoyError> {
        let locations = self.locations.read().await;
        Ok(locations
            .get(journey_id)
            .and_then(|records| records.iter().rev().find(|r| r.participant_id == participant_id))
            .cloned())
    }

    async fn location_history(
        &self,
        journey_id: &str,
        limit: usize,
    ) -> Result<Vec<LocationRecord>, ConvoyError> {
        let locations = self.locations.read().await;
        Ok(locations
            .get(journey_id)
            .map(|records| {
                let start = records.len().saturating_sub(limit);
                records[start..].to_vec()
            })
            .unwrap_or_default())
    }

    async fn locations_after(
        &self,
        journey_id: &str,
        from_sequence: u64,
    ) -> Result<Vec<LocationRecord>, ConvoyError> {
        let locations = self.locations.read().await;
        let mut matching: Vec<LocationRecord> = locations
            .get(journey_id)
            .map(|records| {
                records.iter().filter(|r| r.sequence_number > from_sequence).cloned().collect()
            })
            .unwrap_or_default();
        matching.sort_by_key(|r| r.sequence_number);
        Ok(matching)
    }

    async fn insert_lag_alert(&self, alert: LagAlert) -> Result<(), ConvoyError> {
        let key = (alert.journey_id.clone(), alert.participant_id.clone());
        self.lag_alerts.write().await.entry(key).or_default().push(alert);
        Ok(())
    }

    async fn active_lag_alert(
        &self,
        journey_id: &str,
        participant_id: &str,
    ) -> Result<Option<LagAlert>, ConvoyError> {
        let key = (journey_id.to_owned(), participant_id.to_owned());
        Ok(self
            .lag_alerts
            .read()
            .await
            .get(&key)
            .and_then(|alerts| alerts.iter().find(|a| a.is_active))
            .cloned())
    }

    async fn update_lag_alert(&self, alert: LagAlert) -> Result<(), ConvoyError> {
        let key = (alert.journey_id.clone(), alert.participant_id.clone());
        let mut lag_alerts = self.lag_alerts.write().await;
        let alerts = lag_alerts.entry(key).or_default();
        match alerts.iter_mut().find(|a| a.id == alert.id) {
            Some(existing) => *existing = alert,
            None => alerts.push(alert),
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
