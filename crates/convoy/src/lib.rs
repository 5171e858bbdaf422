// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Convoy: the backend coordination core for a real-time convoy tracking
//! service. Ingests participant location updates over a realtime gateway,
//! fans them out to a journey's other participants with monotonic
//! per-journey ordering and retry-on-failure, and runs the domain-specific
//! lag and arrival detectors on every accepted update.

pub mod ack;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod identity;
pub mod journey;
pub mod lag;
pub mod model;
pub mod pipeline;
pub mod priority;
pub mod retry;
pub mod sequence;
pub mod state;
pub mod store;

pub mod gateway;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cache::memory::InMemoryCache;
use crate::cache::CacheAdapter;
use crate::config::Config;
use crate::identity::{HttpIdentityGate, IdentityGate, StaticTokenGate};
use crate::retry::spawn_retry_scheduler;
use crate::state::AppState;
use crate::store::memory::InMemoryStore;
use crate::store::StoreAdapter;

/// Default bearer token accepted when neither `auth_token` nor
/// `identity_gate_url` is configured. Local/dev use only — see DESIGN.md.
const DEV_DEFAULT_TOKEN: &str = "dev";
const DEV_DEFAULT_USER: &str = "dev-user";

/// Build the identity gate: an external identity-gate URL takes
/// precedence over the shared-secret token, which itself falls back to a
/// fixed development token if neither is set.
fn build_identity_gate(config: &Config) -> Arc<dyn IdentityGate> {
    if let Some(url) = &config.identity_gate_url {
        return Arc::new(HttpIdentityGate::new(url.clone()));
    }
    match &config.auth_token {
        Some(token) => Arc::new(StaticTokenGate::new(token.clone(), DEV_DEFAULT_USER)),
        None => {
            tracing::warn!(
                "no auth_token or identity_gate_url configured; accepting the fixed \
                 development token only. Do not run this configuration outside local dev."
            );
            Arc::new(StaticTokenGate::new(DEV_DEFAULT_TOKEN, DEV_DEFAULT_USER))
        }
    }
}

/// Run the convoy server until shutdown.
///
/// Wires the in-memory store and cache adapters bundled with this crate; a
/// production deployment would construct `AppState` directly with
/// store/cache adapters backed by a real document store and key-value cache,
/// following the same `StoreAdapter`/`CacheAdapter` trait boundary.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let store: Arc<dyn StoreAdapter> = Arc::new(InMemoryStore::new());
    let cache: Arc<dyn CacheAdapter> = Arc::new(InMemoryCache::new());
    let identity = build_identity_gate(&config);

    let state = Arc::new(AppState::new(config, store, cache, identity, shutdown.clone()));

    spawn_retry_scheduler(Arc::clone(&state));

    info!("convoy listening on {addr}");
    let router = gateway::build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
