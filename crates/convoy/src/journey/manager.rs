// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::CacheAdapter;
use crate::error::{ConvoyError, ConvoyResult};
use crate::model::{
    Journey, JourneyPatch, JourneyStatus, Participant, ParticipantStatus, Role,
    MIN_LAG_THRESHOLD_METERS,
};
use crate::store::StoreAdapter;

/// A journey together with its current roster, as returned by `get`.
pub struct JourneyWithRoster {
    pub journey: Journey,
    pub participants: Vec<Participant>,
}

/// Enforces the journey state machine and keeps the roster cache
/// reconciled with the store.
pub struct JourneyManager {
    store: Arc<dyn StoreAdapter>,
    cache: Arc<dyn CacheAdapter>,
}

impl JourneyManager {
    pub fn new(store: Arc<dyn StoreAdapter>, cache: Arc<dyn CacheAdapter>) -> Self {
        Self { store, cache }
    }

    pub async fn create(
        &self,
        user_id: &str,
        name: String,
        destination: Option<crate::geo::GeoPoint>,
        destination_address: Option<String>,
        lag_threshold_meters: Option<f64>,
        default_lag_threshold_meters: f64,
    ) -> ConvoyResult<Journey> {
        if name.trim().is_empty() {
            return Err(ConvoyError::InvalidInput);
        }
        let lag_threshold_meters = lag_threshold_meters.unwrap_or(default_lag_threshold_meters);
        if lag_threshold_meters < MIN_LAG_THRESHOLD_METERS {
            return Err(ConvoyError::InvalidInput);
        }
        if let Some(destination) = destination {
            destination.validate()?;
        }

        let now = Utc::now();
        let journey_id = Uuid::new_v4().to_string();
        let journey = Journey::new(
            journey_id.clone(),
            name,
            user_id.to_owned(),
            destination,
            destination_address,
            lag_threshold_meters,
            now,
        );
        // Store the journey before the leader participant record: a crash
        // between the two leaves an orphaned journey with no roster, which
        // reconciliation can detect (no participants) and surface, rather
        // than a dangling participant referencing a journey that never
        // committed.
        self.store.insert_journey(journey.clone()).await?;
        self.store
            .upsert_participant(Participant::leader(journey_id, user_id.to_owned(), now))
            .await?;
        Ok(journey)
    }

    pub async fn get(&self, journey_id: &str) -> ConvoyResult<JourneyWithRoster> {
        let journey = self.store.get_journey(journey_id).await?.ok_or(ConvoyError::NotFound)?;
        let participants = self.store.list_participants(journey_id).await?;
        Ok(JourneyWithRoster { journey, participants })
    }

    pub async fn update(
        &self,
        journey_id: &str,
        user_id: &str,
        patch: JourneyPatch,
    ) -> ConvoyResult<Journey> {
        let journey = self.store.get_journey(journey_id).await?.ok_or(ConvoyError::NotFound)?;
        if journey.leader_id != user_id {
            return Err(ConvoyError::Forbidden);
        }
        if journey.status != JourneyStatus::Pending {
            return Err(ConvoyError::PreconditionFailed);
        }
        if let Some(destination) = patch.destination {
            destination.validate()?;
        }
        if let Some(threshold) = patch.lag_threshold_meters {
            if threshold < MIN_LAG_THRESHOLD_METERS {
                return Err(ConvoyError::InvalidInput);
            }
        }
        self.store.update_journey(journey_id, patch, Utc::now()).await
    }

    pub async fn cancel(&self, journey_id: &str, user_id: &str) -> ConvoyResult<Journey> {
        let mut journey = self.store.get_journey(journey_id).await?.ok_or(ConvoyError::NotFound)?;
        if journey.leader_id != user_id {
            return Err(ConvoyError::Forbidden);
        }
        if journey.status != JourneyStatus::Pending {
            return Err(ConvoyError::PreconditionFailed);
        }
        let now = Utc::now();
        journey.status = JourneyStatus::Cancelled;
        journey.end_time = Some(now);
        journey.updated_at = now;
        self.store.put_journey(journey.clone()).await?;
        Ok(journey)
    }

    pub async fn start(&self, journey_id: &str, user_id: &str) -> ConvoyResult<Journey> {
        let mut journey = self.store.get_journey(journey_id).await?.ok_or(ConvoyError::NotFound)?;
        if journey.leader_id != user_id {
            return Err(ConvoyError::Forbidden);
        }
        if journey.status != JourneyStatus::Pending {
            return Err(ConvoyError::PreconditionFailed);
        }

        let now = Utc::now();
        journey.status = JourneyStatus::Active;
        journey.start_time = Some(now);
        journey.updated_at = now;
        self.store.put_journey(journey.clone()).await?;

        let participants = self.store.list_participants(journey_id).await?;
        for mut participant in participants {
            if participant.status == ParticipantStatus::Accepted {
                participant.status = ParticipantStatus::Active;
                self.store.upsert_participant(participant).await?;
            }
        }

        if let Err(err) = self.cache.active_journeys_add(journey_id).await {
            warn!(journey_id, error = %err, "failed to seed active-journey cache");
        }
        info!(journey_id, leader = user_id, "journey started");
        Ok(journey)
    }

    pub async fn end(&self, journey_id: &str, user_id: &str) -> ConvoyResult<Journey> {
        let mut journey = self.store.get_journey(journey_id).await?.ok_or(ConvoyError::NotFound)?;
        if journey.leader_id != user_id {
            return Err(ConvoyError::Forbidden);
        }
        if journey.status != JourneyStatus::Active {
            return Err(ConvoyError::PreconditionFailed);
        }
        let now = Utc::now();
        journey.status = JourneyStatus::Completed;
        journey.end_time = Some(now);
        journey.updated_at = now;
        self.store.put_journey(journey.clone()).await?;

        if let Err(err) = self.cache.active_journeys_remove(journey_id).await {
            warn!(journey_id, error = %err, "failed to clear active-journey cache");
        }
        Ok(journey)
    }

    /// Note: this does not verify that `invited_user_id` names a real
    /// account. The crate has no user-directory capability to call — see
    /// DESIGN.md's Open Questions for the resolution.
    pub async fn invite(
        &self,
        journey_id: &str,
        user_id: &str,
        invited_user_id: &str,
    ) -> ConvoyResult<()> {
        let journey = self.store.get_journey(journey_id).await?.ok_or(ConvoyError::NotFound)?;
        if journey.leader_id != user_id {
            return Err(ConvoyError::Forbidden);
        }
        if journey.status != JourneyStatus::Pending || invited_user_id == user_id {
            return Err(ConvoyError::PreconditionFailed);
        }

        if let Some(existing) = self.store.get_participant(journey_id, invited_user_id).await? {
            if matches!(
                existing.status,
                ParticipantStatus::Invited | ParticipantStatus::Accepted | ParticipantStatus::Active
            ) {
                return Err(ConvoyError::Conflict);
            }
        }

        self.store
            .upsert_participant(Participant::invited(
                journey_id.to_owned(),
                invited_user_id.to_owned(),
                user_id.to_owned(),
                Utc::now(),
            ))
            .await
    }

    pub async fn accept(&self, journey_id: &str, user_id: &str) -> ConvoyResult<()> {
        self.respond_to_invite(journey_id, user_id, true).await
    }

    pub async fn decline(&self, journey_id: &str, user_id: &str) -> ConvoyResult<()> {
        self.respond_to_invite(journey_id, user_id, false).await
    }

    async fn respond_to_invite(&self, journey_id: &str, user_id: &str, accept: bool) -> ConvoyResult<()> {
        let mut participant =
            self.store.get_participant(journey_id, user_id).await?.ok_or(ConvoyError::NotFound)?;
        if participant.status != ParticipantStatus::Invited {
            return Err(ConvoyError::NotFound);
        }
        if accept {
            participant.status = ParticipantStatus::Accepted;
            participant.joined_at = Some(Utc::now());
        } else {
            participant.status = ParticipantStatus::Declined;
        }
        self.store.upsert_participant(participant).await
    }

    pub async fn leave(&self, journey_id: &str, user_id: &str) -> ConvoyResult<()> {
        let mut participant =
            self.store.get_participant(journey_id, user_id).await?.ok_or(ConvoyError::NotFound)?;
        if participant.role == Role::Leader {
            return Err(ConvoyError::Forbidden);
        }
        participant.status = ParticipantStatus::Left;
        participant.left_at = Some(Utc::now());
        self.store.upsert_participant(participant).await
    }

    /// Journeys where the caller has an ACCEPTED/ACTIVE roster entry and the
    /// journey itself is currently ACTIVE.
    pub async fn list_active(&self, user_id: &str) -> ConvoyResult<Vec<Journey>> {
        self.list_by_membership(
            user_id,
            |status| matches!(status, ParticipantStatus::Accepted | ParticipantStatus::Active),
            Some(JourneyStatus::Active),
        )
        .await
    }

    /// Journeys the user has a pending invitation to.
    pub async fn list_invitations(&self, user_id: &str) -> ConvoyResult<Vec<Journey>> {
        self.list_by_membership(
            user_id,
            |status| status == ParticipantStatus::Invited,
            None,
        )
        .await
    }

    async fn list_by_membership(
        &self,
        user_id: &str,
        keep: impl Fn(ParticipantStatus) -> bool,
        journey_status: Option<JourneyStatus>,
    ) -> ConvoyResult<Vec<Journey>> {
        let memberships = self.store.list_memberships(user_id).await?;
        let mut journeys = Vec::new();
        for membership in memberships {
            if !keep(membership.status) {
                continue;
            }
            if let Some(journey) = self.store.get_journey(&membership.journey_id).await? {
                if journey_status.is_some_and(|want| journey.status != want) {
                    continue;
                }
                journeys.push(journey);
            }
        }
        Ok(journeys)
    }

    /// `true` if no participant is currently ACTIVE/ACCEPTED/ARRIVED. A query
    /// only: whether an empty roster should auto-complete a journey is left
    /// to the surrounding policy.
    pub async fn roster_is_empty(&self, journey_id: &str) -> ConvoyResult<bool> {
        let participants = self.store.list_participants(journey_id).await?;
        Ok(!participants.iter().any(Participant::is_current_subscriber))
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
