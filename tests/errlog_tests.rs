//! Integration tests for the error-log scanner
//!
//! These tests verify that:
//! - No matching file yields the all-clear summary
//! - An empty matching file is "no error" but still named
//! - Content is excerpted to 500 bytes with a truncation marker
//! - The latest calendar date wins among several matching files

use pretty_assertions::assert_eq;
use pulsewatch::errlog::{compile_pattern, scan};
use tempfile::tempdir;

const PATTERN: &str = r"^error-(\d{4})-(\d{2})-(\d{2})\.log$";

#[test]
fn test_no_matching_file() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("access-2024-06-01.log"), "not an error log").unwrap();

    let re = compile_pattern(PATTERN).unwrap();
    let status = scan(dir.path(), &re);

    assert!(!status.has_error);
    assert_eq!(status.latest_log, None);
    assert_eq!(status.log_content, None);
}

#[test]
fn test_empty_matching_file_is_no_error_but_named() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("error-2024-06-01.log"), "").unwrap();

    let re = compile_pattern(PATTERN).unwrap();
    let status = scan(dir.path(), &re);

    assert!(!status.has_error);
    assert_eq!(status.latest_log.as_deref(), Some("error-2024-06-01.log"));
    assert_eq!(status.log_content, None);
}

#[test]
fn test_small_file_is_reported_untruncated() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("error-2024-06-01.log"), "boom\n").unwrap();

    let re = compile_pattern(PATTERN).unwrap();
    let status = scan(dir.path(), &re);

    assert!(status.has_error);
    assert_eq!(status.log_content.as_deref(), Some("boom\n"));
}

#[test]
fn test_large_file_is_truncated_with_marker() {
    let dir = tempdir().unwrap();
    let content = "x".repeat(600);
    std::fs::write(dir.path().join("error-2024-06-01.log"), &content).unwrap();

    let re = compile_pattern(PATTERN).unwrap();
    let status = scan(dir.path(), &re);

    assert!(status.has_error);
    let excerpt = status.log_content.unwrap();
    assert_eq!(excerpt.len(), 503);
    assert!(excerpt.ends_with("..."));
}

#[test]
fn test_exactly_500_bytes_is_not_truncated() {
    let dir = tempdir().unwrap();
    let content = "x".repeat(500);
    std::fs::write(dir.path().join("error-2024-06-01.log"), &content).unwrap();

    let re = compile_pattern(PATTERN).unwrap();
    let status = scan(dir.path(), &re);

    let excerpt = status.log_content.unwrap();
    assert_eq!(excerpt.len(), 500);
    assert!(!excerpt.ends_with("..."));
}

#[test]
fn test_latest_calendar_date_wins() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("error-2024-05-31.log"), "older").unwrap();
    std::fs::write(dir.path().join("error-2024-06-02.log"), "newest").unwrap();
    std::fs::write(dir.path().join("error-2024-06-01.log"), "newer").unwrap();

    let re = compile_pattern(PATTERN).unwrap();
    let status = scan(dir.path(), &re);

    assert_eq!(status.latest_log.as_deref(), Some("error-2024-06-02.log"));
    assert_eq!(status.log_content.as_deref(), Some("newest"));
}

#[test]
fn test_missing_directory_degrades_to_no_match() {
    let dir = tempdir().unwrap();
    let gone = dir.path().join("nope");

    let re = compile_pattern(PATTERN).unwrap();
    let status = scan(&gone, &re);

    assert!(!status.has_error);
    assert_eq!(status.latest_log, None);
}
