// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Computes distance-to-leader and distance-to-destination on every
//! accepted update, and manages the lag alert lifecycle.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::model::{LagAlert, Severity};

/// Outcome of running lag detection on one follower update.
pub enum LagOutcome {
    /// No leader position cached; detection skipped.
    NoLeaderPosition,
    /// Distance is within threshold. If an alert was active, it was resolved.
    WithinThreshold { resolved: Option<LagAlert> },
    /// Distance exceeds threshold; the active alert (new or upgraded) is returned.
    Exceeded(LagAlert),
}

/// Run lag detection for a follower update.
///
/// `existing_alert` is the currently active alert for this (journey,
/// participant), if any. Callers persist the returned alert via the store.
#[allow(clippy::too_many_arguments)]
pub fn detect_lag(
    leader_position: Option<GeoPoint>,
    follower_position: GeoPoint,
    lag_threshold_meters: f64,
    critical_lag_meters: f64,
    existing_alert: Option<LagAlert>,
    journey_id: &str,
    participant_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> LagOutcome {
    let Some(leader_position) = leader_position else {
        return LagOutcome::NoLeaderPosition;
    };

    let distance = leader_position.distance_meters(&follower_position);

    if distance <= lag_threshold_meters {
        let resolved = existing_alert.map(|mut alert| {
            alert.resolve(now);
            alert
        });
        return LagOutcome::WithinThreshold { resolved };
    }

    let severity = if distance > critical_lag_meters { Severity::Critical } else { Severity::Warning };

    let alert = match existing_alert {
        Some(mut alert) => {
            alert.upgrade(severity, distance, follower_position);
            alert
        }
        None => LagAlert::new(
            Uuid::new_v4().to_string(),
            journey_id.to_owned(),
            participant_id.to_owned(),
            user_id.to_owned(),
            distance,
            leader_position,
            follower_position,
            severity,
            now,
        ),
    };
    LagOutcome::Exceeded(alert)
}

/// Run arrival detection on any accepted update: geofence + speed
/// check, idempotent on an already-ARRIVED participant.
pub fn detect_arrival(
    destination: Option<GeoPoint>,
    position: GeoPoint,
    speed: Option<f64>,
    arrival_distance_threshold_meters: f64,
    arrival_speed_threshold_mps: f64,
    already_arrived: bool,
) -> bool {
    if already_arrived {
        return false;
    }
    let Some(destination) = destination else { return false };

    let distance = destination.distance_meters(&position);
    if distance >= arrival_distance_threshold_meters {
        return false;
    }
    match speed {
        Some(speed) => speed < arrival_speed_threshold_mps,
        None => true,
    }
}

#[cfg(test)]
#[path = "lag_tests.rs"]
mod tests;
