// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime gateway event types: inbound commands and outbound frames.

use serde::{Deserialize, Serialize};

use crate::model::{LagAlert, LocationRecord, LocationUpdateDto, Participant, Priority};

/// Events a client sends over its WebSocket connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum InboundEvent {
    JoinJourney { journey_id: String },
    LeaveJourney { journey_id: String },
    LocationUpdate { payload: LocationUpdateDto },
    Acknowledge { sequence_number: u64 },
    RequestResync { from_sequence: u64 },
    Heartbeat,
}

/// Events the gateway sends to a client over its WebSocket connection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum OutboundEvent {
    ConnectionStatus { status: ConnectionStatusKind },
    JoinedJourney { journey_id: String },
    LeftJourney { journey_id: String },
    LatestLocations { journey_id: String, locations: Vec<LocationRecord> },
    LocationUpdate { location: LocationRecord },
    LocationUpdateAck { success: bool, sequence_number: Option<u64>, priority: Priority },
    LagAlert { alert: LagAlert },
    ArrivalDetected { journey_id: String, user_id: String },
    ParticipantJoined { journey_id: String, participant: Participant },
    ParticipantLeft { journey_id: String, user_id: String },
    ParticipantDisconnected { journey_id: String, user_id: String },
    ResyncData { journey_id: String, records: Vec<LocationRecord> },
    HeartbeatAck,
    Error { code: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatusKind {
    Connected,
    Timeout,
}

impl OutboundEvent {
    pub fn error(err: crate::error::ConvoyError, message: impl Into<String>) -> Self {
        Self::Error { code: err.as_str(), message: message.into() }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({"event": "error", "code": "INTERNAL", "message": "failed to serialize event"})
        })
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
