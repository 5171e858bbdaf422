// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;

use super::*;
use crate::geo::GeoPoint;

fn point(lat: f64, lon: f64) -> GeoPoint {
    GeoPoint::new(lat, lon).expect("valid coordinates")
}

#[test]
fn leader_updates_are_always_high() {
    let input = ClassifyInput {
        role: Role::Leader,
        latitude: 0.0,
        longitude: 0.0,
        speed: None,
        metadata: LocationMetadata::default(),
        last_record: None,
        leader_position: None,
        lag_threshold_meters: 500.0,
        destination: None,
        arrival_distance_threshold_meters: 100.0,
    };
    assert_eq!(classify(&input), Priority::High);
}

#[test]
fn status_change_flag_forces_high() {
    let input = ClassifyInput {
        role: Role::Follower,
        latitude: 0.0,
        longitude: 0.0,
        speed: None,
        metadata: LocationMetadata { status_change: true, ..Default::default() },
        last_record: None,
        leader_position: None,
        lag_threshold_meters: 500.0,
        destination: None,
        arrival_distance_threshold_meters: 100.0,
    };
    assert_eq!(classify(&input), Priority::High);
}

#[test]
fn follower_beyond_lag_threshold_is_high() {
    let input = ClassifyInput {
        role: Role::Follower,
        latitude: -1.3050,
        longitude: 36.8320,
        speed: None,
        metadata: LocationMetadata::default(),
        last_record: None,
        leader_position: Some(point(-1.2921, 36.8219)),
        lag_threshold_meters: 500.0,
        destination: None,
        arrival_distance_threshold_meters: 100.0,
    };
    assert_eq!(classify(&input), Priority::High);
}

#[test]
fn near_destination_without_jump_is_medium() {
    let input = ClassifyInput {
        role: Role::Follower,
        latitude: -1.2922,
        longitude: 36.8220,
        speed: None,
        metadata: LocationMetadata::default(),
        last_record: None,
        leader_position: None,
        lag_threshold_meters: 500.0,
        destination: Some(point(-1.2921, 36.8219)),
        arrival_distance_threshold_meters: 100.0,
    };
    assert_eq!(classify(&input), Priority::Medium);
}

#[test]
fn quiet_update_with_no_signal_is_low() {
    let input = ClassifyInput {
        role: Role::Follower,
        latitude: -1.2921,
        longitude: 36.8219,
        speed: Some(0.0),
        metadata: LocationMetadata::default(),
        last_record: None,
        leader_position: None,
        lag_threshold_meters: 500.0,
        destination: None,
        arrival_distance_threshold_meters: 100.0,
    };
    assert_eq!(classify(&input), Priority::Low);
}

#[test]
fn high_priority_is_never_throttled() {
    assert!(!should_throttle(Priority::High, Some(Utc::now()), Utc::now(), Some(1)));
}

#[yare::parameterized(
    battery_critical_drops_low = { Priority::Low, Some(15) },
    battery_critical_drops_medium = { Priority::Medium, Some(15) },
    battery_low_drops_low = { Priority::Low, Some(40) },
)]
fn low_battery_drops_by_table(priority: Priority, battery: Option<u8>) {
    assert!(should_throttle(priority, None, Utc::now(), battery));
}

#[test]
fn battery_low_does_not_drop_medium() {
    assert!(!should_throttle(Priority::Medium, None, Utc::now(), Some(40)));
}

#[test]
fn medium_throttled_under_three_seconds() {
    let last = Utc::now();
    let now = last + chrono::Duration::seconds(1);
    assert!(should_throttle(Priority::Medium, Some(last), now, Some(90)));
}

#[test]
fn medium_not_throttled_after_three_seconds() {
    let last = Utc::now();
    let now = last + chrono::Duration::seconds(4);
    assert!(!should_throttle(Priority::Medium, Some(last), now, Some(90)));
}

#[test]
fn low_not_throttled_after_ten_seconds() {
    let last = Utc::now();
    let now = last + chrono::Duration::seconds(11);
    assert!(!should_throttle(Priority::Low, Some(last), now, Some(90)));
}

#[test]
fn no_prior_record_is_never_throttled_by_interval() {
    assert!(!should_throttle(Priority::Low, None, Utc::now(), Some(90)));
}
