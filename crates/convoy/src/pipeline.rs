// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrates the journey manager, priority engine, and lag/arrival
//! detector for every inbound location update. This is the critical path.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::cache::{new_pending_envelope, CacheAdapter};
use crate::config::Config;
use crate::error::{ConvoyError, ConvoyResult};
use crate::events::OutboundEvent;
use crate::geo::GeoPoint;
use crate::lag::{detect_arrival, detect_lag, LagOutcome};
use crate::model::{
    JourneyStatus, LagAlert, LocationMetadata, LocationRecord, LocationUpdateDto, ParticipantStatus,
    Priority, Role,
};
use crate::priority::{classify, should_throttle, ClassifyInput};
use crate::store::StoreAdapter;

/// Result of `process_update`, consumed by the realtime gateway to decide
/// what (if anything) to broadcast.
pub struct ProcessOutcome {
    pub success: bool,
    pub priority: Priority,
    pub sequence_number: Option<u64>,
    pub record: Option<LocationRecord>,
    pub lag_alert: Option<LagAlert>,
    pub lag_resolved: Option<LagAlert>,
    pub arrival_detected: bool,
    /// Current subscribers other than the sender, as a dispatch intent for
    /// the gateway's fan-out.
    pub dispatch_targets: Vec<String>,
}

pub struct LocationPipeline {
    store: Arc<dyn StoreAdapter>,
    cache: Arc<dyn CacheAdapter>,
}

impl LocationPipeline {
    pub fn new(store: Arc<dyn StoreAdapter>, cache: Arc<dyn CacheAdapter>) -> Self {
        Self { store, cache }
    }

    pub async fn process_update(
        &self,
        user_id: &str,
        dto: LocationUpdateDto,
        config: &Config,
    ) -> ConvoyResult<ProcessOutcome> {
        // 1. Resolve journey; must be ACTIVE.
        let journey =
            self.store.get_journey(&dto.journey_id).await?.ok_or(ConvoyError::NotFound)?;
        if journey.status != JourneyStatus::Active {
            return Err(ConvoyError::PreconditionFailed);
        }

        // 2. Participant must be a current subscriber.
        let participant = self
            .store
            .get_participant(&dto.journey_id, user_id)
            .await?
            .ok_or(ConvoyError::Forbidden)?;
        if !matches!(participant.status, ParticipantStatus::Active | ParticipantStatus::Accepted) {
            return Err(ConvoyError::Forbidden);
        }

        // 3. Rate limit.
        let hits = self.cache.record_rate_limit_hit(user_id).await?;
        if hits > config.location_update_rate_limit {
            return Err(ConvoyError::TooManyRequests);
        }

        let position = GeoPoint::new(dto.latitude, dto.longitude)?;

        // 4. Load last record for this participant, and the leader's cached position.
        let last_record = self.store.last_location(&dto.journey_id, user_id).await?;
        let leader_position = if participant.role == Role::Follower {
            self.cache
                .get_latest_location(&dto.journey_id, &journey.leader_id)
                .await
                .unwrap_or(None)
                .map(|location| location.position)
        } else {
            None
        };

        // 5. Classify and throttle.
        let priority = classify(&ClassifyInput {
            role: participant.role,
            latitude: dto.latitude,
            longitude: dto.longitude,
            speed: dto.speed,
            metadata: dto.metadata,
            last_record: last_record.as_ref(),
            leader_position,
            lag_threshold_meters: journey.lag_threshold_meters,
            destination: journey.destination,
            arrival_distance_threshold_meters: config.arrival_distance_threshold_meters,
        });

        let throttled = should_throttle(
            priority,
            last_record.as_ref().map(|r| r.server_timestamp),
            Utc::now(),
            dto.metadata.battery_level,
        );
        if throttled {
            return Ok(ProcessOutcome {
                success: false,
                priority,
                sequence_number: None,
                record: None,
                lag_alert: None,
                lag_resolved: None,
                arrival_detected: false,
                dispatch_targets: Vec::new(),
            });
        }

        // 6. Allocate sequence.
        let sequence_number = self.cache.next_sequence(&dto.journey_id).await?;

        // 7. Persist; hot-cache write is best-effort.
        let record = LocationRecord {
            journey_id: dto.journey_id.clone(),
            participant_id: user_id.to_owned(),
            user_id: user_id.to_owned(),
            position,
            accuracy: dto.accuracy,
            heading: dto.heading,
            speed: dto.speed,
            altitude: dto.altitude,
            server_timestamp: Utc::now(),
            sequence_number,
            priority,
            metadata: dto.metadata,
        };
        self.store.append_location(record.clone()).await?;
        if let Err(err) =
            self.cache.set_latest_location(&dto.journey_id, user_id, record.clone()).await
        {
            warn!(journey_id = %dto.journey_id, user_id, error = %err, "hot-cache write failed");
        }

        // 8. Lag detection (followers only) and arrival detection (always).
        let mut lag_alert = None;
        let mut lag_resolved = None;
        if participant.role == Role::Follower {
            if let Some(leader_position) = leader_position {
                let existing = self
                    .store
                    .active_lag_alert(&dto.journey_id, user_id)
                    .await
                    .unwrap_or(None);
                match detect_lag(
                    Some(leader_position),
                    position,
                    journey.lag_threshold_meters,
                    config.critical_lag_meters,
                    existing,
                    &dto.journey_id,
                    user_id,
                    user_id,
                    Utc::now(),
                ) {
                    LagOutcome::NoLeaderPosition => {}
                    LagOutcome::WithinThreshold { resolved } => {
                        if let Some(alert) = resolved {
                            self.store.update_lag_alert(alert.clone()).await?;
                            lag_resolved = Some(alert);
                        }
                    }
                    LagOutcome::Exceeded(alert) => {
                        self.store.insert_lag_alert(alert.clone()).await?;
                        lag_alert = Some(alert);
                    }
                }
            }
        }

        let arrival_detected = detect_arrival(
            journey.destination,
            position,
            dto.speed,
            config.arrival_distance_threshold_meters,
            config.arrival_speed_threshold_mps,
            participant.status == ParticipantStatus::Arrived,
        );
        if arrival_detected {
            let mut updated = participant.clone();
            updated.status = ParticipantStatus::Arrived;
            self.store.upsert_participant(updated).await?;
        }

        // 9. Enqueue pending-delivery envelopes for HIGH-priority broadcasts.
        let mut dispatch_targets = Vec::new();
        if priority == Priority::High {
            let subscribers = self.store.list_participants(&dto.journey_id).await?;
            let payload = OutboundEvent::LocationUpdate { location: record.clone() }.to_json();
            for subscriber in subscribers {
                if subscriber.user_id == user_id || !subscriber.is_current_subscriber() {
                    continue;
                }
                self.cache
                    .enqueue_pending(
                        &dto.journey_id,
                        &subscriber.user_id,
                        new_pending_envelope(sequence_number, payload.clone()),
                    )
                    .await?;
                dispatch_targets.push(subscriber.user_id);
            }
        }

        Ok(ProcessOutcome {
            success: true,
            priority,
            sequence_number: Some(sequence_number),
            record: Some(record),
            lag_alert,
            lag_resolved,
            arrival_detected,
            dispatch_targets,
        })
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
