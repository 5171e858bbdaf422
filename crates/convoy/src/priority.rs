// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Classifies each inbound location update and decides whether it is
//! dropped, persisted, and/or broadcast.

use chrono::{DateTime, Utc};

use crate::geo::GeoPoint;
use crate::model::{LocationMetadata, LocationRecord, Priority, Role};

/// Great-circle jump beyond which an update is at least MEDIUM priority.
const MEDIUM_DISTANCE_METERS: f64 = 50.0;
/// Absolute speed change beyond which an update is at least MEDIUM priority.
const MEDIUM_SPEED_DELTA_MPS: f64 = 10.0 / 3.6;

const MEDIUM_MIN_INTERVAL: chrono::Duration = chrono::Duration::seconds(3);
const LOW_MIN_INTERVAL: chrono::Duration = chrono::Duration::seconds(10);

/// Inputs to [`classify`], gathered by the pipeline before calling in.
pub struct ClassifyInput<'a> {
    pub role: Role,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub metadata: LocationMetadata,
    pub last_record: Option<&'a LocationRecord>,
    pub leader_position: Option<GeoPoint>,
    pub lag_threshold_meters: f64,
    pub destination: Option<GeoPoint>,
    pub arrival_distance_threshold_meters: f64,
}

/// Classify one inbound update into HIGH/MEDIUM/LOW.
pub fn classify(input: &ClassifyInput<'_>) -> Priority {
    if input.role == Role::Leader {
        return Priority::High;
    }
    if input.metadata.status_change {
        return Priority::High;
    }
    if let Some(leader_position) = input.leader_position {
        let distance = haversine_from_raw(input.latitude, input.longitude, leader_position);
        if distance > input.lag_threshold_meters {
            return Priority::High;
        }
    }

    if let Some(last) = input.last_record {
        let jump = haversine_from_raw(input.latitude, input.longitude, last.position);
        if jump > MEDIUM_DISTANCE_METERS {
            return Priority::Medium;
        }
        if let (Some(speed), Some(last_speed)) = (input.speed, last.speed) {
            if (speed - last_speed).abs() > MEDIUM_SPEED_DELTA_MPS {
                return Priority::Medium;
            }
        }
    }
    if let Some(destination) = input.destination {
        let distance = haversine_from_raw(input.latitude, input.longitude, destination);
        if distance < input.arrival_distance_threshold_meters {
            return Priority::Medium;
        }
    }
    Priority::Low
}

fn haversine_from_raw(lat: f64, lon: f64, point: GeoPoint) -> f64 {
    crate::geo::haversine_meters(lat, lon, point.latitude, point.longitude)
}

/// Whether an update of `priority` should be throttled, given the time since
/// the participant's last *persisted* update and battery level.
///
/// HIGH is never throttled. A participant's first-ever update always
/// persists regardless of battery level, since there is no prior cadence to
/// throttle against. After that, MEDIUM/LOW are throttled below their
/// minimum inter-arrival, and further dropped on low battery.
pub fn should_throttle(
    priority: Priority,
    last_persisted_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    battery_level: Option<u8>,
) -> bool {
    if priority == Priority::High {
        return false;
    }

    let Some(last) = last_persisted_at else { return false };

    if let Some(level) = battery_level {
        if level < 20 {
            return true;
        }
        if level < 50 && priority == Priority::Low {
            return true;
        }
    }

    let elapsed = now - last;
    let min_interval = match priority {
        Priority::Medium => MEDIUM_MIN_INTERVAL,
        Priority::Low => LOW_MIN_INTERVAL,
        Priority::High => return false,
    };
    elapsed < min_interval
}

#[cfg(test)]
#[path = "priority_tests.rs"]
mod tests;
