// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Client-supplied metadata carried on every location update.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMetadata {
    pub battery_level: Option<u8>,
    pub is_moving: Option<bool>,
    #[serde(default)]
    pub status_change: bool,
}

/// Inbound payload for `POST /locations` and the `location-update` realtime event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdateDto {
    pub journey_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
    pub altitude: Option<f64>,
    #[serde(default)]
    pub metadata: LocationMetadata,
}

/// An immutable, server-assigned record of one accepted location update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub journey_id: String,
    pub participant_id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub position: GeoPoint,
    pub accuracy: f64,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
    pub altitude: Option<f64>,
    pub server_timestamp: DateTime<Utc>,
    pub sequence_number: u64,
    pub priority: Priority,
    pub metadata: LocationMetadata,
}

/// The hot, overwritable counterpart of [`LocationRecord`]: one entry per
/// (journey, participant), TTL 5 minutes in the cache adapter.
pub type CachedLocation = LocationRecord;
