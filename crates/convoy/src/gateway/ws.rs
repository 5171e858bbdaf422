// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The realtime gateway's WebSocket handler: connection lifecycle, room
//! membership, and the inbound-event dispatch table.
//!
//! Mirrors the teacher's `transport::ws` shape: one task owns the socket
//! split into a reader half (this function's main loop) and a writer half
//! (`spawn_writer`), joined only by the per-connection outbound channel so a
//! slow client can never interleave two frames.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ConvoyError;
use crate::events::{ConnectionStatusKind, InboundEvent, OutboundEvent};
use crate::model::ConnectionStatus;
use crate::state::{AppState, ConnectionEntry};

/// Query parameters accepted on the WebSocket upgrade request.
#[derive(Debug, Clone, Deserialize)]
pub struct WsAuthQuery {
    pub token: Option<String>,
}

fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}

/// `GET /ws` — WebSocket upgrade for the realtime gateway.
///
/// The credential is accepted either as `?token=` (handshake requests from a
/// browser cannot set arbitrary headers) or an `Authorization: Bearer` header,
/// matching the same `auth.token`-or-`Authorization`-header fallback the
/// REST surface accepts.
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsAuthQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let token = query.token.or_else(|| bearer_from_headers(&headers));
    let Some(token) = token else {
        return ConvoyError::Unauthenticated.to_http_response("missing credential").into_response();
    };

    let user_id = match state.identity.verify(&token).await {
        Ok(user_id) => user_id,
        Err(err) => return err.to_http_response("unauthenticated").into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)).into_response()
}

/// Per-connection state and dispatch loop.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: String) {
    let connection_id = Uuid::new_v4().to_string();
    let cancel = tokio_util::sync::CancellationToken::new();
    let (outbound_tx, outbound_rx) = mpsc::channel(256);

    let entry = Arc::new(ConnectionEntry {
        connection_id: connection_id.clone(),
        user_id: user_id.clone(),
        journey_id: tokio::sync::RwLock::new(None),
        outbound: outbound_tx,
        last_heartbeat: tokio::sync::RwLock::new(Instant::now()),
        cancel: cancel.clone(),
    });
    state.connections.register(connection_id.clone(), Arc::clone(&entry)).await;

    let (mut ws_tx, mut ws_rx) = socket.split();
    let writer_cancel = cancel.clone();
    let writer = tokio::spawn(async move { run_writer(outbound_rx, &mut ws_tx, writer_cancel).await });

    send(&entry, OutboundEvent::ConnectionStatus { status: ConnectionStatusKind::Connected }).await;
    spawn_heartbeat_monitor(Arc::clone(&state), Arc::clone(&entry));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        dispatch(&state, &entry, &text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        debug!(connection_id = %connection_id, error = %err, "websocket read error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    cancel.cancel();
    let _ = writer.await;
    cleanup(&state, &connection_id, &entry).await;
}

async fn run_writer(
    mut outbound_rx: mpsc::Receiver<serde_json::Value>,
    ws_tx: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    cancel: tokio_util::sync::CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            frame = outbound_rx.recv() => {
                match frame {
                    Some(frame) => {
                        if ws_tx.send(Message::Text(frame.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }
}

/// Spawn the per-connection heartbeat timeout watchdog. Runs until the
/// connection's cancellation token fires, either from the caller (socket
/// closed) or from this task itself (timeout).
fn spawn_heartbeat_monitor(state: Arc<AppState>, entry: Arc<ConnectionEntry>) {
    let timeout = state.config.heartbeat_timeout();
    let cancel = entry.cancel.clone();
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(timeout / 2);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = timer.tick() => {}
            }
            let last = *entry.last_heartbeat.read().await;
            if last.elapsed() >= timeout {
                warn!(user_id = %entry.user_id, "connection heartbeat timed out");
                send(&entry, OutboundEvent::ConnectionStatus { status: ConnectionStatusKind::Timeout }).await;
                cancel.cancel();
                break;
            }
        }
    });
}

/// Parse and route one inbound text frame.
async fn dispatch(state: &Arc<AppState>, entry: &Arc<ConnectionEntry>, text: &str) {
    let event: InboundEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(err) => {
            send(entry, OutboundEvent::error(ConvoyError::InvalidInput, err.to_string())).await;
            return;
        }
    };

    match event {
        InboundEvent::JoinJourney { journey_id } => join_journey(state, entry, journey_id).await,
        InboundEvent::LeaveJourney { journey_id } => leave_journey(state, entry, journey_id).await,
        InboundEvent::LocationUpdate { payload } => location_update(state, entry, payload).await,
        InboundEvent::Acknowledge { sequence_number } => acknowledge(state, entry, sequence_number).await,
        InboundEvent::RequestResync { from_sequence } => request_resync(state, entry, from_sequence).await,
        InboundEvent::Heartbeat => heartbeat(entry).await,
    }
}

async fn join_journey(state: &Arc<AppState>, entry: &Arc<ConnectionEntry>, journey_id: String) {
    let participant = match state.store.get_participant(&journey_id, &entry.user_id).await {
        Ok(Some(participant)) if participant.is_current_subscriber() => participant,
        Ok(_) => {
            send(entry, OutboundEvent::error(ConvoyError::Forbidden, "not a participant")).await;
            return;
        }
        Err(err) => {
            send(entry, OutboundEvent::error(err, "failed to load participant")).await;
            return;
        }
    };

    *entry.journey_id.write().await = Some(journey_id.clone());
    if let Err(err) = state.cache.room_add(&journey_id, &entry.connection_id).await {
        warn!(journey_id, error = %err, "failed to register room membership");
    }

    let mut updated = participant.clone();
    updated.connection_status = ConnectionStatus::Connected;
    if let Err(err) = state.store.upsert_participant(updated).await {
        warn!(journey_id, user_id = %entry.user_id, error = %err, "failed to mark participant connected");
    }

    send(entry, OutboundEvent::JoinedJourney { journey_id: journey_id.clone() }).await;
    broadcast(state, &journey_id, OutboundEvent::ParticipantJoined { journey_id: journey_id.clone(), participant }, None)
        .await;

    match state.cache.latest_locations(&journey_id).await {
        Ok(locations) => send(entry, OutboundEvent::LatestLocations { journey_id, locations }).await,
        Err(err) => warn!(journey_id, error = %err, "failed to load latest-location snapshot"),
    }
}

async fn leave_journey(state: &Arc<AppState>, entry: &Arc<ConnectionEntry>, journey_id: String) {
    leave_room(state, entry, &journey_id, ConnectionStatus::Disconnected).await;
    send(entry, OutboundEvent::LeftJourney { journey_id: journey_id.clone() }).await;
    broadcast(state, &journey_id, OutboundEvent::ParticipantLeft { journey_id, user_id: entry.user_id.clone() }, None)
        .await;
}

async fn leave_room(
    state: &Arc<AppState>,
    entry: &Arc<ConnectionEntry>,
    journey_id: &str,
    status: ConnectionStatus,
) {
    *entry.journey_id.write().await = None;
    if let Err(err) = state.cache.room_remove(journey_id, &entry.connection_id).await {
        warn!(journey_id, error = %err, "failed to remove room membership");
    }
    if let Ok(Some(mut participant)) = state.store.get_participant(journey_id, &entry.user_id).await {
        participant.connection_status = status;
        if let Err(err) = state.store.upsert_participant(participant).await {
            warn!(journey_id, user_id = %entry.user_id, error = %err, "failed to mark participant connection status");
        }
    }
}

async fn location_update(
    state: &Arc<AppState>,
    entry: &Arc<ConnectionEntry>,
    payload: crate::model::LocationUpdateDto,
) {
    let journey_id = payload.journey_id.clone();
    let outcome = match state.process_location_update(&entry.user_id, payload).await {
        Ok(outcome) => outcome,
        Err(err) => {
            send(entry, OutboundEvent::error(err, "location update rejected")).await;
            return;
        }
    };

    send(
        entry,
        OutboundEvent::LocationUpdateAck {
            success: outcome.success,
            sequence_number: outcome.sequence_number,
            priority: outcome.priority,
        },
    )
    .await;

    let Some(record) = outcome.record else { return };
    broadcast(
        state,
        &journey_id,
        OutboundEvent::LocationUpdate { location: record },
        Some(entry.connection_id.clone()),
    )
    .await;

    if let Some(alert) = outcome.lag_alert {
        broadcast(state, &journey_id, OutboundEvent::LagAlert { alert }, None).await;
    }
    if let Some(alert) = outcome.lag_resolved {
        broadcast(state, &journey_id, OutboundEvent::LagAlert { alert }, None).await;
    }
    if outcome.arrival_detected {
        broadcast(
            state,
            &journey_id,
            OutboundEvent::ArrivalDetected { journey_id: journey_id.clone(), user_id: entry.user_id.clone() },
            None,
        )
        .await;
    }
}

async fn acknowledge(state: &Arc<AppState>, entry: &Arc<ConnectionEntry>, sequence_number: u64) {
    let Some(journey_id) = entry.journey_id.read().await.clone() else {
        send(entry, OutboundEvent::error(ConvoyError::PreconditionFailed, "not joined to a journey")).await;
        return;
    };
    if let Err(err) = state.ack.acknowledge(&journey_id, &entry.user_id, sequence_number).await {
        send(entry, OutboundEvent::error(err, "acknowledge failed")).await;
    }
}

async fn request_resync(state: &Arc<AppState>, entry: &Arc<ConnectionEntry>, from_sequence: u64) {
    let Some(journey_id) = entry.journey_id.read().await.clone() else {
        send(entry, OutboundEvent::error(ConvoyError::PreconditionFailed, "not joined to a journey")).await;
        return;
    };
    match state.ack.resync(&journey_id, from_sequence).await {
        Ok(records) => send(entry, OutboundEvent::ResyncData { journey_id, records }).await,
        Err(err) => send(entry, OutboundEvent::error(err, "resync failed")).await,
    }
}

async fn heartbeat(entry: &Arc<ConnectionEntry>) {
    *entry.last_heartbeat.write().await = Instant::now();
    send(entry, OutboundEvent::HeartbeatAck).await;
}

/// Disconnect cleanup: drop from every room, mark the
/// participant disconnected, and remove the connection entry.
async fn cleanup(state: &Arc<AppState>, connection_id: &str, entry: &Arc<ConnectionEntry>) {
    if let Some(journey_id) = entry.journey_id.read().await.clone() {
        leave_room(state, entry, &journey_id, ConnectionStatus::Disconnected).await;
        broadcast(
            state,
            &journey_id,
            OutboundEvent::ParticipantDisconnected { journey_id, user_id: entry.user_id.clone() },
            None,
        )
        .await;
    }
    if let Err(err) = state.cache.room_remove_everywhere(connection_id).await {
        warn!(connection_id, error = %err, "failed to clear room membership on disconnect");
    }
    state.connections.remove(connection_id).await;
    info!(connection_id, user_id = %entry.user_id, "connection closed");
}

async fn send(entry: &Arc<ConnectionEntry>, event: OutboundEvent) {
    if entry.outbound.send(event.to_json()).await.is_err() {
        debug!(user_id = %entry.user_id, "outbound channel closed");
    }
}

async fn broadcast(state: &Arc<AppState>, journey_id: &str, event: OutboundEvent, exclude: Option<String>) {
    let payload = event.to_json();
    for (connection_id, connection) in state.connections.room_connections(journey_id).await {
        if exclude.as_deref() == Some(connection_id.as_str()) {
            continue;
        }
        if connection.outbound.send(payload.clone()).await.is_err() {
            debug!(connection_id, "outbound channel closed during broadcast");
        }
    }
}
