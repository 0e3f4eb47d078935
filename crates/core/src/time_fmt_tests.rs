// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn formats_with_exactly_three_fraction_digits() {
    let t = Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap();
    assert_eq!(iso_millis(&t), "2026-01-15T10:30:00.000Z");
}

#[test]
fn round_trips_through_parse() {
    let t = Utc.with_ymd_and_hms(2026, 3, 2, 8, 5, 9).unwrap() + chrono::Duration::milliseconds(42);
    let s = iso_millis(&t);
    assert_eq!(parse_iso(&s), Some(t));
}

#[test]
fn parse_rejects_garbage() {
    assert_eq!(parse_iso("yesterday"), None);
}
