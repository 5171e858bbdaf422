// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure used across module-local `#[cfg(test)]` suites.

/// Converts any `Display`-able error into `anyhow::Error`, so test bodies can
/// use `?` against non-`anyhow` `Result` types (e.g. `ConvoyError`).
pub trait AnyhowExt<T> {
    fn anyhow(self) -> anyhow::Result<T>;
}

impl<T, E: std::fmt::Display> AnyhowExt<T> for Result<T, E> {
    fn anyhow(self) -> anyhow::Result<T> {
        self.map_err(|e| anyhow::anyhow!("{e}"))
    }
}

/// A minimal, valid [`crate::model::LocationRecord`] at `(0, 0)` carrying
/// `sequence_number = seq`, for tests that only care about sequencing.
pub fn sample_location(
    journey_id: &str,
    participant_id: &str,
    seq: u64,
) -> crate::model::LocationRecord {
    crate::model::LocationRecord {
        journey_id: journey_id.to_owned(),
        participant_id: participant_id.to_owned(),
        user_id: participant_id.to_owned(),
        position: crate::geo::GeoPoint::new(0.0, 0.0).expect("valid"),
        accuracy: 5.0,
        heading: None,
        speed: None,
        altitude: None,
        server_timestamp: chrono::Utc::now(),
        sequence_number: seq,
        priority: crate::model::Priority::Low,
        metadata: crate::model::LocationMetadata::default(),
    }
}
