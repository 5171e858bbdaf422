// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, OwnedMutexGuard, RwLock};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::ack::AckEngine;
use crate::cache::CacheAdapter;
use crate::config::Config;
use crate::error::ConvoyResult;
use crate::identity::IdentityGate;
use crate::journey::JourneyManager;
use crate::model::LocationUpdateDto;
use crate::pipeline::{LocationPipeline, ProcessOutcome};
use crate::store::StoreAdapter;

/// Shared application state, passed to every HTTP and WebSocket handler via
/// axum's `State` extractor.
///
/// Organized into focused members by concern: `store`/`cache` are the
/// durable and hot-path adapters, `identity` is the credential verifier,
/// `journeys` enforces the lifecycle state machine, `pipeline`/`ack` are
/// the critical-path and delivery-guarantee engines, and `connections` is
/// the realtime gateway's live-session registry.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn StoreAdapter>,
    pub cache: Arc<dyn CacheAdapter>,
    pub identity: Arc<dyn IdentityGate>,
    pub journeys: JourneyManager,
    pub pipeline: LocationPipeline,
    pub ack: AckEngine,
    pub locks: PipelineLocks,
    pub connections: ConnectionRegistry,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn StoreAdapter>,
        cache: Arc<dyn CacheAdapter>,
        identity: Arc<dyn IdentityGate>,
        shutdown: CancellationToken,
    ) -> Self {
        let journeys = JourneyManager::new(Arc::clone(&store), Arc::clone(&cache));
        let pipeline = LocationPipeline::new(Arc::clone(&store), Arc::clone(&cache));
        let ack = AckEngine::new(Arc::clone(&store), Arc::clone(&cache));
        Self {
            config,
            store,
            cache,
            identity,
            journeys,
            pipeline,
            ack,
            locks: PipelineLocks::new(),
            connections: ConnectionRegistry::new(),
            shutdown,
        }
    }

    /// Run one inbound location update through the pipeline, serialized
    /// against any other update from the same (journey, participant) via
    /// [`PipelineLocks`].
    pub async fn process_location_update(
        &self,
        user_id: &str,
        dto: LocationUpdateDto,
    ) -> ConvoyResult<ProcessOutcome> {
        let _guard = self.locks.acquire(&dto.journey_id, user_id).await;
        self.pipeline.process_update(user_id, dto, &self.config).await
    }
}

/// Sharded per-(journey, participant) mutex table enforcing the
/// serialization the pipeline needs for monotone sequencing, built the
/// way the teacher shapes its other focused concurrency sub-structs: a
/// `RwLock`-guarded map handed out lazily, one entry per key.
#[derive(Default)]
pub struct PipelineLocks {
    shards: RwLock<HashMap<(String, String), Arc<Mutex<()>>>>,
}

impl PipelineLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `(journey_id, participant_id)`, creating its
    /// shard on first use. Hold the returned guard for the duration of one
    /// pipeline invocation.
    pub async fn acquire(&self, journey_id: &str, participant_id: &str) -> OwnedMutexGuard<()> {
        let key = (journey_id.to_owned(), participant_id.to_owned());
        let shard = {
            let shards = self.shards.read().await;
            shards.get(&key).cloned()
        };
        let shard = match shard {
            Some(shard) => shard,
            None => {
                let mut shards = self.shards.write().await;
                Arc::clone(shards.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))))
            }
        };
        shard.lock_owned().await
    }
}

/// A single live realtime connection: its owning user, the journey room it
/// has joined (if any), and the outbound frame sender that serializes writes
/// so a slow client cannot corrupt frame boundaries.
///
/// Frames are pre-serialized to `serde_json::Value` before crossing the
/// channel so the retry scheduler can re-send a cached envelope payload
/// without reconstructing an [`crate::events::OutboundEvent`].
pub struct ConnectionEntry {
    pub connection_id: String,
    pub user_id: String,
    pub journey_id: RwLock<Option<String>>,
    pub outbound: mpsc::Sender<serde_json::Value>,
    pub last_heartbeat: RwLock<Instant>,
    pub cancel: CancellationToken,
}

/// Live connection-id -> connection-entry registry. Ephemeral: rebuilt from
/// nothing on process restart, exactly like the cache's room sets.
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: RwLock<HashMap<String, Arc<ConnectionEntry>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, connection_id: String, entry: Arc<ConnectionEntry>) {
        self.entries.write().await.insert(connection_id, entry);
    }

    pub async fn remove(&self, connection_id: &str) -> Option<Arc<ConnectionEntry>> {
        self.entries.write().await.remove(connection_id)
    }

    pub async fn get(&self, connection_id: &str) -> Option<Arc<ConnectionEntry>> {
        self.entries.read().await.get(connection_id).cloned()
    }

    /// Total live connections, for the liveness probe.
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Every connection currently joined to `journey_id`, for room fan-out.
    pub async fn room_connections(&self, journey_id: &str) -> Vec<(String, Arc<ConnectionEntry>)> {
        let entries = self.entries.read().await;
        let mut matching = Vec::new();
        for (id, entry) in entries.iter() {
            if entry.journey_id.read().await.as_deref() == Some(journey_id) {
                matching.push((id.clone(), Arc::clone(entry)));
            }
        }
        matching
    }

    /// Every connection belonging to `user_id` currently joined to
    /// `journey_id`, used by the retry scheduler to re-deliver a pending
    /// envelope.
    pub async fn user_connections_in_room(
        &self,
        journey_id: &str,
        user_id: &str,
    ) -> Vec<Arc<ConnectionEntry>> {
        let entries = self.entries.read().await;
        let mut matching = Vec::new();
        for entry in entries.values() {
            if entry.user_id == user_id && entry.journey_id.read().await.as_deref() == Some(journey_id)
            {
                matching.push(Arc::clone(entry));
            }
        }
        matching
    }
}
