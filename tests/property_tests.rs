//! Property-based tests for retention-window invariants using proptest
//!
//! These tests verify that certain properties hold true for all inputs:
//! - A header survives iff its timestamp is inside the window
//! - Continuation lines share their header's fate
//! - Orphan continuations never survive
//! - The trailer pair is always present
//! - Surviving lines keep their original order

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use pulsewatch::retention::{cutoff_for, filter_lines};

fn fixed_now() -> DateTime<Utc> {
    "2024-06-01T12:00:00Z".parse().unwrap()
}

fn header_line(now: DateTime<Utc>, age_seconds: i64) -> (String, DateTime<Utc>) {
    let stamp = now - Duration::seconds(age_seconds);
    (
        format!("entry at {} UTC", stamp.format("%Y-%m-%d %H:%M:%S")),
        stamp,
    )
}

// Property: a lone header survives iff its timestamp >= cutoff
proptest! {
    #[test]
    fn prop_header_survives_iff_within_window(
        age_seconds in 0i64..(60 * 86_400),
        retention_days in 0u32..45u32,
    ) {
        let now = fixed_now();
        let (line, stamp) = header_line(now, age_seconds);

        let kept = filter_lines([line.as_str()], retention_days, now);
        let survived = kept.len() == 3;

        prop_assert_eq!(survived, stamp >= cutoff_for(now, retention_days));
        if survived {
            prop_assert_eq!(&kept[0], &line);
        }
    }
}

// Property: continuations are kept exactly when their header is kept
proptest! {
    #[test]
    fn prop_continuations_follow_their_header(
        age_seconds in 0i64..(60 * 86_400),
        retention_days in 0u32..45u32,
        continuations in 1usize..5usize,
    ) {
        let now = fixed_now();
        let (header, stamp) = header_line(now, age_seconds);

        let mut lines = vec![header.clone()];
        for i in 0..continuations {
            lines.push(format!("  detail {i}"));
        }

        let kept = filter_lines(lines.iter().map(String::as_str), retention_days, now);
        let body = kept.len() - 2; // minus trailer pair

        if stamp >= cutoff_for(now, retention_days) {
            prop_assert_eq!(body, 1 + continuations);
        } else {
            prop_assert_eq!(body, 0);
        }
    }
}

// Property: continuations before any header never survive
proptest! {
    #[test]
    fn prop_orphan_continuations_are_dropped(
        orphans in prop::collection::vec("[a-z ]{0,40}", 1..10),
        retention_days in 0u32..45u32,
    ) {
        let now = fixed_now();
        let kept = filter_lines(orphans.iter().map(String::as_str), retention_days, now);

        // only the trailer pair remains
        prop_assert_eq!(kept.len(), 2);
    }
}

// Property: the trailer pair is always appended, whatever the input
proptest! {
    #[test]
    fn prop_trailer_is_always_appended(
        ages in prop::collection::vec(0i64..(60 * 86_400), 0..8),
        retention_days in 0u32..45u32,
    ) {
        let now = fixed_now();
        let lines: Vec<String> = ages
            .iter()
            .map(|&age| header_line(now, age).0)
            .collect();

        let kept = filter_lines(lines.iter().map(String::as_str), retention_days, now);

        prop_assert!(kept.len() >= 2);
        prop_assert!(kept[kept.len() - 2].starts_with("Log maintenance completed successfully at "));
        prop_assert_eq!(
            &kept[kept.len() - 1],
            &format!("Removed entries older than {retention_days} days")
        );
    }
}

// Property: surviving lines appear in their original relative order
proptest! {
    #[test]
    fn prop_survivors_preserve_order(
        ages in prop::collection::vec(0i64..(60 * 86_400), 1..10),
        retention_days in 0u32..45u32,
    ) {
        let now = fixed_now();
        let lines: Vec<String> = ages
            .iter()
            .map(|&age| header_line(now, age).0)
            .collect();

        let kept = filter_lines(lines.iter().map(String::as_str), retention_days, now);
        let body = &kept[..kept.len() - 2];

        // every survivor is a subsequence element of the input
        let mut input = lines.iter();
        for survivor in body {
            prop_assert!(
                input.any(|line| line == survivor),
                "survivor out of order or not in input: {survivor}"
            );
        }
    }
}

// Property: running the filter twice only adds one trailer pair
proptest! {
    #[test]
    fn prop_second_run_is_idempotent(
        ages in prop::collection::vec(0i64..(60 * 86_400), 0..8),
        retention_days in 1u32..45u32,
    ) {
        let now = fixed_now();
        let lines: Vec<String> = ages
            .iter()
            .map(|&age| header_line(now, age).0)
            .collect();

        let first = filter_lines(lines.iter().map(String::as_str), retention_days, now);
        let second = filter_lines(first.iter().map(String::as_str), retention_days, now);

        prop_assert_eq!(second.len(), first.len() + 2);
        prop_assert_eq!(&second[..first.len()], &first[..]);
    }
}
