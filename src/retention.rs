//! Timestamp-window filter for the local run log.
//!
//! The log is append-only: every reporter run appends a header line carrying
//! a ` at <YYYY-MM-DD HH:MM:SS> UTC` stamp, optionally followed by untimed
//! continuation lines. The filter rewrites the file keeping only entries
//! whose header falls inside the retention window, then appends a trailer
//! pair recording the maintenance run. The trailer's first line uses the
//! same header surface form, so an immediate re-run keeps it and the
//! "Removed entries" line it owns, which makes the pass idempotent.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Days, NaiveDateTime, Utc};
use tracing::{debug, instrument, warn};

use crate::TIMESTAMP_FORMAT;

const HEADER_INFIX: &str = " at ";
const HEADER_SUFFIX: &str = " UTC";

/// Outcome of inspecting a single line for the header pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Header with a parseable UTC timestamp
    Header(DateTime<Utc>),
    /// Matches the header surface form but the timestamp does not parse;
    /// such an entry is treated as expired, never as an error
    MalformedHeader,
    /// Continuation line owned by the most recent header decision
    Continuation,
}

/// Classify a line against the header pattern: literal ` at ` followed by a
/// timestamp followed by ` UTC`, anywhere in the line. Every ` at `
/// occurrence is a candidate; the first one carrying a parseable timestamp
/// wins, so an unrelated earlier ` at ... UTC` span cannot shadow a real
/// header further down the line.
pub fn classify_line(line: &str) -> LineKind {
    let mut saw_shape = false;

    for (at, _) in line.match_indices(HEADER_INFIX) {
        let rest = &line[at + HEADER_INFIX.len()..];
        let Some(end) = rest.find(HEADER_SUFFIX) else {
            continue;
        };
        saw_shape = true;

        if let Ok(naive) = NaiveDateTime::parse_from_str(&rest[..end], TIMESTAMP_FORMAT) {
            return LineKind::Header(naive.and_utc());
        }
    }

    if saw_shape {
        LineKind::MalformedHeader
    } else {
        LineKind::Continuation
    }
}

/// Retention cutoff: `retention_days` calendar days before `now`, at the
/// same wall-clock time. Underflow degrades to "keep everything".
pub fn cutoff_for(now: DateTime<Utc>, retention_days: u32) -> DateTime<Utc> {
    now.checked_sub_days(Days::new(retention_days as u64))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Apply the window filter to the ordered lines of a log.
///
/// Returns the surviving lines plus the two synthetic trailer lines. Leading
/// continuation lines (before any header) have no owning entry and are
/// always dropped.
pub fn filter_lines<'a, I>(lines: I, retention_days: u32, now: DateTime<Utc>) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let cutoff = cutoff_for(now, retention_days);

    let mut kept = Vec::new();
    let mut keep_block = false;

    for line in lines {
        match classify_line(line) {
            LineKind::Header(stamp) => {
                keep_block = stamp >= cutoff;
                if keep_block {
                    kept.push(line.to_string());
                }
            }
            LineKind::MalformedHeader => {
                keep_block = false;
            }
            LineKind::Continuation => {
                if keep_block {
                    kept.push(line.to_string());
                }
            }
        }
    }

    kept.push(format!(
        "Log maintenance completed successfully at {} UTC",
        now.format(TIMESTAMP_FORMAT)
    ));
    kept.push(format!("Removed entries older than {retention_days} days"));

    kept
}

/// Rewrite `log_file` in place, keeping only entries within the retention
/// window and appending the maintenance trailer.
///
/// A missing log file is a warning no-op. The rewrite goes through a
/// temporary file in the same directory followed by a rename, so a
/// concurrent reader never observes a half-written log.
#[instrument(skip_all, fields(log_file = %log_file.display(), retention_days))]
pub fn run(log_file: &Path, retention_days: u32, now: DateTime<Utc>) -> anyhow::Result<()> {
    let content = match fs::read_to_string(log_file) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("log file does not exist, nothing to trim");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let before = content.lines().count();
    let kept = filter_lines(content.lines(), retention_days, now);
    // trailer is two lines
    debug!("kept {} of {before} lines", kept.len() - 2);

    let mut tmp = log_file.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);

    fs::write(tmp, kept.join("\n") + "\n")?;
    fs::rename(tmp, log_file)?;

    Ok(())
}

/// Append one run entry to the log: a header line in the shared surface
/// form plus any continuation detail lines.
pub fn append_entry(
    log_file: &Path,
    message: &str,
    now: DateTime<Utc>,
    details: &[&str],
) -> anyhow::Result<()> {
    use std::io::Write;

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    writeln!(file, "{message} at {} UTC", now.format(TIMESTAMP_FORMAT))?;
    for detail in details {
        writeln!(file, "  {detail}")?;
    }

    Ok(())
}
