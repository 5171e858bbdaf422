// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Geographic primitives: coordinate validation and great-circle distance.

use serde::{Deserialize, Serialize};

use crate::error::ConvoyError;

/// WGS84 mean spherical radius in meters.
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A validated (latitude, longitude) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Construct a point, rejecting out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ConvoyError> {
        if !(-90.0..=90.0).contains(&latitude) || !latitude.is_finite() {
            return Err(ConvoyError::InvalidInput);
        }
        if !(-180.0..=180.0).contains(&longitude) || !longitude.is_finite() {
            return Err(ConvoyError::InvalidInput);
        }
        Ok(Self { latitude, longitude })
    }

    /// Great-circle distance to `other`, in meters.
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        haversine_meters(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Re-check range on a point built by a path that bypassed [`GeoPoint::new`]
    /// (e.g. `serde` deserialization of a journey's `destination`).
    pub fn validate(&self) -> Result<(), ConvoyError> {
        GeoPoint::new(self.latitude, self.longitude).map(|_| ())
    }
}

/// Haversine great-circle distance between two WGS84 points, in meters.
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
#[path = "geo_tests.rs"]
mod tests;
