// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Process-wide configuration for the convoy coordination core.
#[derive(Debug, Clone, clap::Args)]
pub struct Config {
    /// Host to bind on.
    #[arg(long, default_value = "0.0.0.0", env = "CONVOY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "CONVOY_PORT")]
    pub port: u16,

    /// Shared-secret bearer token. If unset and `identity_gate_url` is also
    /// unset, authentication is disabled (intended for local development only).
    #[arg(long, env = "CONVOY_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Base URL of an external identity-verification service. When set, takes
    /// precedence over `auth_token`.
    #[arg(long, env = "CONVOY_IDENTITY_GATE_URL")]
    pub identity_gate_url: Option<String>,

    /// Maximum location-update writes per user per minute.
    #[arg(long, default_value_t = 60, env = "CONVOY_LOCATION_UPDATE_RATE_LIMIT")]
    pub location_update_rate_limit: u32,

    /// Default journey lag threshold in meters.
    #[arg(long, default_value_t = 500.0, env = "CONVOY_DEFAULT_LAG_THRESHOLD_METERS")]
    pub default_lag_threshold_meters: f64,

    /// Distance beyond which a lag alert is CRITICAL rather than WARNING.
    #[arg(long, default_value_t = 1000.0, env = "CONVOY_CRITICAL_LAG_METERS")]
    pub critical_lag_meters: f64,

    /// Destination geofence radius for arrival detection.
    #[arg(long, default_value_t = 100.0, env = "CONVOY_ARRIVAL_DISTANCE_THRESHOLD_METERS")]
    pub arrival_distance_threshold_meters: f64,

    /// Speed ceiling (m/s) below which arrival detection may fire.
    #[arg(long, default_value_t = 1.39, env = "CONVOY_ARRIVAL_SPEED_THRESHOLD_MPS")]
    pub arrival_speed_threshold_mps: f64,

    /// Interval between expected client heartbeats.
    #[arg(long, default_value_t = 4000, env = "CONVOY_HEARTBEAT_INTERVAL_MS")]
    pub heartbeat_interval_ms: u64,

    /// A session with no heartbeat for this long is disconnected.
    #[arg(long, default_value_t = 7000, env = "CONVOY_HEARTBEAT_TIMEOUT_MS")]
    pub heartbeat_timeout_ms: u64,

    /// Maximum retry attempts for a HIGH-priority pending delivery.
    #[arg(long, default_value_t = 3, env = "CONVOY_MAX_RETRY_ATTEMPTS")]
    pub max_retry_attempts: u32,

    /// Base ack timeout before the first retry attempt.
    #[arg(long, default_value_t = 5000, env = "CONVOY_RETRY_TIMEOUT_MS")]
    pub retry_timeout_ms: u64,

    /// How often the retry scheduler sweeps pending-delivery queues.
    #[arg(long, default_value_t = 1000, env = "CONVOY_RETRY_SWEEP_INTERVAL_MS")]
    pub retry_sweep_interval_ms: u64,
}

impl Config {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }

    pub fn retry_timeout(&self) -> Duration {
        Duration::from_millis(self.retry_timeout_ms)
    }

    pub fn retry_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.retry_sweep_interval_ms)
    }

    /// Delay before the scheduler reattempts an envelope that has already
    /// missed its initial ack deadline (`retry_timeout`): `1s * 2^attempt`,
    /// capped at 30s. The base is fixed per the delivery-guarantee design;
    /// only the initial ack deadline is operator-configurable.
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        const BASE_MS: u64 = 1_000;
        const CAP_MS: u64 = 30_000;
        Duration::from_millis(BASE_MS.saturating_mul(1u64 << attempt.min(5)).min(CAP_MS))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
