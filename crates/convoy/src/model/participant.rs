// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A participant's role within a journey. Immutable once the participant is
/// created: the leader never becomes a follower and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Leader,
    Follower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantStatus {
    Invited,
    Accepted,
    Declined,
    Active,
    Arrived,
    Left,
}

/// Realtime connection liveness, independent of the durable participant
/// status above. Lives alongside the participant record in the store so a
/// reconnect can restore it without rebuilding the whole roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
}

/// A user's membership in a specific journey.
///
/// Invariants: `joinedAt` is set iff `status` has reached `Accepted` or
/// `Active`; a user appears at most once per journey; the leader cannot
/// transition to `Left` while the journey is `Active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub journey_id: String,
    pub user_id: String,
    pub role: Role,
    pub status: ParticipantStatus,
    pub inviter_id: Option<String>,
    pub joined_at: Option<DateTime<Utc>>,
    pub left_at: Option<DateTime<Utc>>,
    pub connection_status: ConnectionStatus,
    pub last_seen: DateTime<Utc>,
}

impl Participant {
    /// Construct the leader's participant record at journey creation time:
    /// status `Active` with no inviter. `joinedAt` is set to the creation
    /// time since the invariant requires it once status reaches `Active`,
    /// even though the leader never went through invite/accept.
    pub fn leader(journey_id: String, user_id: String, now: DateTime<Utc>) -> Self {
        Self {
            journey_id,
            user_id,
            role: Role::Leader,
            status: ParticipantStatus::Active,
            inviter_id: None,
            joined_at: Some(now),
            left_at: None,
            connection_status: ConnectionStatus::Disconnected,
            last_seen: now,
        }
    }

    /// Construct an invited follower's participant record.
    pub fn invited(
        journey_id: String,
        user_id: String,
        inviter_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            journey_id,
            user_id,
            role: Role::Follower,
            status: ParticipantStatus::Invited,
            inviter_id: Some(inviter_id),
            joined_at: None,
            left_at: None,
            connection_status: ConnectionStatus::Disconnected,
            last_seen: now,
        }
    }

    pub fn is_current_subscriber(&self) -> bool {
        matches!(
            self.status,
            ParticipantStatus::Active | ParticipantStatus::Accepted | ParticipantStatus::Arrived
        )
    }
}
