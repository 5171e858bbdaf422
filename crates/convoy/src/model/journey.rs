// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Journey lifecycle status. Transitions are enforced by the journey manager,
/// never by consumers of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JourneyStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

/// A coordinated trip owned by one leader with zero or more followers.
///
/// `endTime` is set iff `status` is `Completed` or `Cancelled`; `startTime` is
/// set iff the journey has ever reached `Active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journey {
    pub id: String,
    pub name: String,
    pub leader_id: String,
    pub status: JourneyStatus,
    pub destination: Option<GeoPoint>,
    pub destination_address: Option<String>,
    pub lag_threshold_meters: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Minimum allowed `lagThresholdMeters`.
pub const MIN_LAG_THRESHOLD_METERS: f64 = 100.0;

impl Journey {
    pub fn new(
        id: String,
        name: String,
        leader_id: String,
        destination: Option<GeoPoint>,
        destination_address: Option<String>,
        lag_threshold_meters: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            leader_id,
            status: JourneyStatus::Pending,
            destination,
            destination_address,
            lag_threshold_meters,
            created_at: now,
            updated_at: now,
            start_time: None,
            end_time: None,
        }
    }
}

/// Patch accepted by `JourneyManager::update`. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyPatch {
    pub name: Option<String>,
    pub destination: Option<GeoPoint>,
    pub destination_address: Option<String>,
    pub lag_threshold_meters: Option<f64>,
}
