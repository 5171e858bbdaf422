// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Warning,
    Critical,
}

/// A lag alert for one (journey, participant) pair.
///
/// Invariant: at most one active alert per (journey, participant); once
/// resolved, the row stays resolved forever — a later re-lag creates a new
/// row rather than reopening this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LagAlert {
    pub id: String,
    pub journey_id: String,
    pub participant_id: String,
    pub user_id: String,
    pub distance_meters: f64,
    pub leader_position: GeoPoint,
    pub follower_position: GeoPoint,
    pub severity: Severity,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl LagAlert {
    pub fn new(
        id: String,
        journey_id: String,
        participant_id: String,
        user_id: String,
        distance_meters: f64,
        leader_position: GeoPoint,
        follower_position: GeoPoint,
        severity: Severity,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            journey_id,
            participant_id,
            user_id,
            distance_meters,
            leader_position,
            follower_position,
            severity,
            is_active: true,
            created_at: now,
            resolved_at: None,
            acknowledged_at: None,
        }
    }

    /// Upgrade severity of an active alert in place: upgrading never
    /// creates a second row.
    pub fn upgrade(&mut self, severity: Severity, distance_meters: f64, follower_position: GeoPoint) {
        self.severity = severity;
        self.distance_meters = distance_meters;
        self.follower_position = follower_position;
    }

    pub fn resolve(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.resolved_at = Some(now);
    }
}

#[cfg(test)]
#[path = "alert_tests.rs"]
mod tests;
