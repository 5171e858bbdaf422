// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background retry scheduler for HIGH-priority pending deliveries.
//!
//! One task for the whole process walks every (journey, participant) pending
//! queue on a fixed tick, mirroring the teacher's `spawn_health_checker`
//! shape rather than a per-envelope timer, so the number of concurrently
//! live timers doesn't grow with the number of journeys.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::cache::PendingEnvelope;
use crate::sequence::has_exhausted_retries;
use crate::state::AppState;

/// Spawn the retry scheduler. Runs until `state.shutdown` is cancelled.
pub fn spawn_retry_scheduler(state: Arc<AppState>) {
    let interval = state.config.retry_sweep_interval();

    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = state.shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }
            sweep_once(&state).await;
        }
    });
}

/// One sweep over every pending-delivery queue. Exposed separately from the
/// spawned loop so tests can drive it deterministically without sleeping.
pub async fn sweep_once(state: &AppState) {
    let keys = match state.cache.all_pending_keys().await {
        Ok(keys) => keys,
        Err(err) => {
            warn!(error = %err, "retry scheduler failed to list pending keys");
            return;
        }
    };

    for (journey_id, participant_id) in keys {
        let envelopes = match state.cache.pending_envelopes(&journey_id, &participant_id).await {
            Ok(envelopes) => envelopes,
            Err(err) => {
                warn!(journey_id, participant_id, error = %err, "failed to load pending envelopes");
                continue;
            }
        };
        if envelopes.is_empty() {
            continue;
        }

        let now = Utc::now();
        let mut survivors = Vec::with_capacity(envelopes.len());
        for envelope in envelopes {
            if has_exhausted_retries(&envelope, state.config.max_retry_attempts) {
                info!(
                    journey_id,
                    participant_id,
                    sequence_number = envelope.sequence_number,
                    attempts = envelope.attempt,
                    "dropping pending delivery after exhausting retries"
                );
                continue;
            }

            if !is_due(&envelope, now, &state.config) {
                survivors.push(envelope);
                continue;
            }

            deliver(state, &journey_id, &participant_id, &envelope).await;
            survivors.push(PendingEnvelope {
                attempt: envelope.attempt + 1,
                last_attempt_at: now,
                ..envelope
            });
        }

        if let Err(err) =
            state.cache.replace_pending(&journey_id, &participant_id, survivors).await
        {
            warn!(journey_id, participant_id, error = %err, "failed to persist retry sweep result");
        }
    }
}

/// An envelope is due once it has missed its initial ack deadline
/// (`retry_timeout`, measured from its first attempt) and has also cleared
/// the exponential backoff window since its most recent attempt.
fn is_due(envelope: &PendingEnvelope, now: chrono::DateTime<Utc>, config: &crate::config::Config) -> bool {
    let retry_timeout = chrono::Duration::from_std(config.retry_timeout()).unwrap_or(chrono::Duration::zero());
    if now - envelope.first_attempt_at < retry_timeout {
        return false;
    }
    let backoff = chrono::Duration::from_std(config.retry_backoff(envelope.attempt))
        .unwrap_or(chrono::Duration::zero());
    crate::sequence::is_due_for_retry(envelope, now, backoff)
}

/// Re-send one envelope's payload to every live connection the target
/// participant has open on this journey. A participant with no live
/// connection simply doesn't receive it this round; the attempt still
/// counts so the envelope eventually gives up rather than retrying forever.
async fn deliver(state: &AppState, journey_id: &str, participant_id: &str, envelope: &PendingEnvelope) {
    let connections = state.connections.user_connections_in_room(journey_id, participant_id).await;
    for connection in connections {
        if connection.outbound.send(envelope.payload.clone()).await.is_err() {
            warn!(journey_id, participant_id, "outbound channel closed during retry delivery");
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
