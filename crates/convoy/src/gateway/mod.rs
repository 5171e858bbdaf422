// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! REST handlers, the realtime WebSocket gateway, and the bearer-auth
//! middleware that fronts both.

pub mod auth;
pub mod rest;
pub mod ws;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Assemble the full HTTP/WebSocket router, mirroring the teacher's
/// `transport::build_router` shape: routes wired first, then the auth
/// middleware and permissive CORS layered on, then state attached last.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(rest::health))
        .route("/ws", get(ws::ws_handler))
        .route("/journeys", post(rest::create_journey))
        .route("/journeys/active", get(rest::list_active_journeys))
        .route("/journeys/invitations", get(rest::list_invitations))
        .route(
            "/journeys/{id}",
            get(rest::get_journey).put(rest::update_journey).delete(rest::cancel_journey),
        )
        .route("/journeys/{id}/start", post(rest::start_journey))
        .route("/journeys/{id}/end", post(rest::end_journey))
        .route("/journeys/{id}/invite", post(rest::invite_participant))
        .route("/journeys/{id}/accept", post(rest::accept_invite))
        .route("/journeys/{id}/decline", post(rest::decline_invite))
        .route("/journeys/{id}/leave", post(rest::leave_journey))
        .route("/locations", post(rest::create_location))
        .route("/locations/journeys/{id}/history", get(rest::location_history))
        .route("/locations/journeys/{id}/latest", get(rest::latest_locations))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), auth::auth_layer))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
