// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! REST handlers for the journey and location surface.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::error::{ok_response, ConvoyError, ConvoyResult};
use crate::gateway::auth::AuthUser;
use crate::geo::GeoPoint;
use crate::model::{Journey, JourneyPatch, LocationRecord, LocationUpdateDto, Participant};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_journeys: usize,
    pub connection_count: usize,
}

/// `GET /healthz` — unauthenticated liveness probe.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let active_journeys = state.cache.active_journey_count().await.unwrap_or(0);
    let connection_count = state.connections.count().await;
    Json(HealthResponse { status: "ok", active_journeys, connection_count })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJourneyRequest {
    pub name: String,
    #[serde(default)]
    pub destination: Option<GeoPoint>,
    #[serde(default)]
    pub destination_address: Option<String>,
    #[serde(default)]
    pub lag_threshold_meters: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    pub invited_user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyWithRosterResponse {
    #[serde(flatten)]
    pub journey: Journey,
    pub participants: Vec<Participant>,
}

/// `POST /journeys`
pub async fn create_journey(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<CreateJourneyRequest>,
) -> ConvoyResult<impl IntoResponse> {
    let journey = state
        .journeys
        .create(
            &user_id,
            req.name,
            req.destination,
            req.destination_address,
            req.lag_threshold_meters,
            state.config.default_lag_threshold_meters,
        )
        .await?;
    Ok(ok_response(StatusCode::CREATED, "journey created", journey))
}

/// `GET /journeys/active`
pub async fn list_active_journeys(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> ConvoyResult<impl IntoResponse> {
    let journeys = state.journeys.list_active(&user_id).await?;
    Ok(ok_response(StatusCode::OK, "active journeys", journeys))
}

/// `GET /journeys/invitations`
pub async fn list_invitations(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> ConvoyResult<impl IntoResponse> {
    let journeys = state.journeys.list_invitations(&user_id).await?;
    Ok(ok_response(StatusCode::OK, "pending invitations", journeys))
}

/// `GET /journeys/:id`
pub async fn get_journey(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(journey_id): Path<String>,
) -> ConvoyResult<impl IntoResponse> {
    let with_roster = state.journeys.get(&journey_id).await?;
    if !with_roster.participants.iter().any(|p| p.user_id == user_id) {
        return Err(ConvoyError::Forbidden);
    }
    let body = JourneyWithRosterResponse { journey: with_roster.journey, participants: with_roster.participants };
    Ok(ok_response(StatusCode::OK, "journey", body))
}

/// `PUT /journeys/:id`
pub async fn update_journey(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(journey_id): Path<String>,
    Json(patch): Json<JourneyPatch>,
) -> ConvoyResult<impl IntoResponse> {
    let journey = state.journeys.update(&journey_id, &user_id, patch).await?;
    Ok(ok_response(StatusCode::OK, "journey updated", journey))
}

/// `DELETE /journeys/:id` — cancel a PENDING journey.
pub async fn cancel_journey(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(journey_id): Path<String>,
) -> ConvoyResult<impl IntoResponse> {
    state.journeys.cancel(&journey_id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /journeys/:id/start`
pub async fn start_journey(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(journey_id): Path<String>,
) -> ConvoyResult<impl IntoResponse> {
    let journey = state.journeys.start(&journey_id, &user_id).await?;
    Ok(ok_response(StatusCode::OK, "journey started", journey))
}

/// `POST /journeys/:id/end`
pub async fn end_journey(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(journey_id): Path<String>,
) -> ConvoyResult<impl IntoResponse> {
    let journey = state.journeys.end(&journey_id, &user_id).await?;
    Ok(ok_response(StatusCode::OK, "journey ended", journey))
}

/// `POST /journeys/:id/invite`
pub async fn invite_participant(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(journey_id): Path<String>,
    Json(req): Json<InviteRequest>,
) -> ConvoyResult<impl IntoResponse> {
    state.journeys.invite(&journey_id, &user_id, &req.invited_user_id).await?;
    Ok(ok_response(StatusCode::CREATED, "invited", ()))
}

/// `POST /journeys/:id/accept`
pub async fn accept_invite(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(journey_id): Path<String>,
) -> ConvoyResult<impl IntoResponse> {
    state.journeys.accept(&journey_id, &user_id).await?;
    Ok(ok_response(StatusCode::OK, "invitation accepted", ()))
}

/// `POST /journeys/:id/decline`
pub async fn decline_invite(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(journey_id): Path<String>,
) -> ConvoyResult<impl IntoResponse> {
    state.journeys.decline(&journey_id, &user_id).await?;
    Ok(ok_response(StatusCode::OK, "invitation declined", ()))
}

/// `POST /journeys/:id/leave`
pub async fn leave_journey(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(journey_id): Path<String>,
) -> ConvoyResult<impl IntoResponse> {
    state.journeys.leave(&journey_id, &user_id).await?;
    Ok(ok_response(StatusCode::OK, "left journey", ()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdateResponse {
    pub success: bool,
    pub sequence_number: Option<u64>,
    pub priority: crate::model::Priority,
}

/// `POST /locations`
pub async fn create_location(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(dto): Json<LocationUpdateDto>,
) -> ConvoyResult<impl IntoResponse> {
    let outcome = state.process_location_update(&user_id, dto).await?;
    let body = LocationUpdateResponse {
        success: outcome.success,
        sequence_number: outcome.sequence_number,
        priority: outcome.priority,
    };
    Ok(ok_response(StatusCode::CREATED, "location recorded", body))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

const DEFAULT_HISTORY_LIMIT: usize = 100;

/// `GET /locations/journeys/:id/history`
pub async fn location_history(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(journey_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ConvoyResult<impl IntoResponse> {
    require_participant(&state, &journey_id, &user_id).await?;
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let records = state.store.location_history(&journey_id, limit).await?;
    Ok(ok_response(StatusCode::OK, "location history", records))
}

/// `GET /locations/journeys/:id/latest`
pub async fn latest_locations(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(journey_id): Path<String>,
) -> ConvoyResult<impl IntoResponse> {
    require_participant(&state, &journey_id, &user_id).await?;
    let locations = state.cache.latest_locations(&journey_id).await?;
    let by_participant: HashMap<String, LocationRecord> =
        locations.into_iter().map(|record| (record.participant_id.clone(), record)).collect();
    Ok(ok_response(StatusCode::OK, "latest locations", by_participant))
}

async fn require_participant(state: &AppState, journey_id: &str, user_id: &str) -> ConvoyResult<()> {
    state.store.get_participant(journey_id, user_id).await?.ok_or(ConvoyError::Forbidden)?;
    Ok(())
}

#[cfg(test)]
#[path = "rest_tests.rs"]
mod tests;
