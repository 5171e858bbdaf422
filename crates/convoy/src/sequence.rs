// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monotonic per-journey sequencing, per-subscriber cursors, gap
//! detection, and resync resolution.
//!
//! Sequence allocation and cursor/pending-queue bookkeeping live in the
//! [`crate::cache::CacheAdapter`]; this module holds the pure decision logic
//! around them (gap computation, retry eligibility, resync sizing) so it can
//! be unit-tested without a cache instance.

use chrono::{DateTime, Utc};

use crate::cache::PendingEnvelope;

/// Above this many missing sequences, a full resync is preferred over
/// replaying individual retries.
pub const FULL_RESYNC_GAP_THRESHOLD: u64 = 10;

/// Compute the inclusive range of sequence numbers a subscriber is missing,
/// given its acked cursor and the latest sequence it has reported seeing.
///
/// Returns `None` if there is no gap (the subscriber is caught up or ahead).
pub fn missing_range(cursor: u64, received_sequence: u64) -> Option<(u64, u64)> {
    let lo = cursor + 1;
    if received_sequence < lo {
        return None;
    }
    Some((lo, received_sequence - 1))
}

pub fn gap_size(cursor: u64, received_sequence: u64) -> u64 {
    missing_range(cursor, received_sequence)
        .map(|(lo, hi)| hi.saturating_sub(lo) + 1)
        .unwrap_or(0)
}

pub fn prefers_full_resync(cursor: u64, received_sequence: u64) -> bool {
    gap_size(cursor, received_sequence) > FULL_RESYNC_GAP_THRESHOLD
}

/// Whether `envelope` is due for a retry attempt at `now`, given the
/// configured backoff curve.
pub fn is_due_for_retry(
    envelope: &PendingEnvelope,
    now: DateTime<Utc>,
    backoff: chrono::Duration,
) -> bool {
    now - envelope.last_attempt_at >= backoff
}

pub fn has_exhausted_retries(envelope: &PendingEnvelope, max_attempts: u32) -> bool {
    envelope.attempt >= max_attempts
}

#[cfg(test)]
#[path = "sequence_tests.rs"]
mod tests;
