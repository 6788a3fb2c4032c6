//! Dated error-log scan folded into the status snapshot.
//!
//! The error-log directory holds files whose names encode a calendar date,
//! captured by a configurable pattern with three groups (year, month, day).
//! The scan picks the latest-dated file and reports whether it holds
//! anything. Ordering among files encoding the same date is undefined.

use std::fs;
use std::path::Path;

use anyhow::Context;
use regex::Regex;
use tracing::{debug, warn};

use crate::ErrorLogStatus;

/// Excerpt cap for the snapshot; anything beyond this is truncated.
const EXCERPT_LIMIT: usize = 500;

/// Compile the filename pattern and validate it carries the three
/// capture groups the date ordering relies on.
pub fn compile_pattern(pattern: &str) -> anyhow::Result<Regex> {
    let re = Regex::new(pattern)
        .with_context(|| format!("invalid error log pattern: {pattern}"))?;
    if re.captures_len() < 4 {
        anyhow::bail!("error log pattern needs year, month and day capture groups: {pattern}");
    }
    Ok(re)
}

fn date_key(re: &Regex, name: &str) -> Option<String> {
    let caps = re.captures(name)?;
    let (year, month, day) = (caps.get(1)?, caps.get(2)?, caps.get(3)?);
    Some(format!("{}{}{}", year.as_str(), month.as_str(), day.as_str()))
}

/// Scan `dir` for dated error logs and summarize the most recent one.
///
/// Never fails: an unreadable directory or file degrades to the no-match
/// summary, logged as a warning.
pub fn scan(dir: &Path, re: &Regex) -> ErrorLogStatus {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot read error log directory {}: {e}", dir.display());
            return ErrorLogStatus::no_match();
        }
    };

    let latest = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            date_key(re, &name).map(|key| (key, name))
        })
        .max_by(|(a, _), (b, _)| a.cmp(b));

    let Some((_, name)) = latest else {
        debug!("no error log matched in {}", dir.display());
        return ErrorLogStatus::no_match();
    };

    let raw = match fs::read(dir.join(&name)) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("cannot read error log {name}: {e}");
            return ErrorLogStatus {
                has_error: false,
                message: format!("Unable to read {name}"),
                latest_log: Some(name),
                log_content: None,
            };
        }
    };

    if raw.is_empty() {
        return ErrorLogStatus {
            has_error: false,
            message: format!("{name} is empty"),
            latest_log: Some(name),
            log_content: None,
        };
    }

    let mut excerpt =
        String::from_utf8_lossy(&raw[..raw.len().min(EXCERPT_LIMIT)]).into_owned();
    if raw.len() > EXCERPT_LIMIT {
        excerpt.push_str("...");
    }

    ErrorLogStatus {
        has_error: true,
        message: format!("Errors present in {name}"),
        latest_log: Some(name),
        log_content: Some(excerpt),
    }
}
