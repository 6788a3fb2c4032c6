//! Recency check over the last published snapshot.
//!
//! Runs on an external schedule, independent of the reporter: fetch the
//! document, look at its timestamp, classify. Anything that prevents
//! reading a timestamp is an `Error` classification rather than a crash,
//! which alerts just like an offline node would.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, instrument, warn};

use crate::config::StoreConfig;
use crate::{StatusRecord, TIMESTAMP_FORMAT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Online { minutes: i64 },
    Offline { minutes: i64 },
    Error { reason: String },
}

/// Outcome of one check: the classification plus the record it was based
/// on, when one could be read at all.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub classification: Classification,
    pub record: Option<StatusRecord>,
}

impl Verdict {
    /// An alert goes out when the node is offline, the snapshot could not
    /// be read, or the node itself is reporting errors.
    pub fn should_alert(&self) -> bool {
        match &self.classification {
            Classification::Offline { .. } | Classification::Error { .. } => true,
            Classification::Online { .. } => self
                .record
                .as_ref()
                .is_some_and(|record| record.error_log.has_error),
        }
    }
}

/// Classify a snapshot timestamp against the offline threshold. The
/// timestamp uses the snapshot surface format, UTC implied.
pub fn classify(timestamp: &str, now: DateTime<Utc>, offline_after_minutes: i64) -> Classification {
    let Ok(parsed) = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT) else {
        return Classification::Error {
            reason: format!("unparseable snapshot timestamp: {timestamp}"),
        };
    };

    let minutes = (now - parsed.and_utc()).num_minutes();
    if minutes >= offline_after_minutes {
        Classification::Offline { minutes }
    } else {
        Classification::Online { minutes }
    }
}

pub struct Checker {
    client: reqwest::Client,
    document_url: String,
    token: String,
    offline_after_minutes: i64,
}

impl Checker {
    pub fn new(
        store: &StoreConfig,
        token: String,
        offline_after_minutes: i64,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(store.timeout))
            .user_agent(concat!("pulsewatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            document_url: format!(
                "{}/repos/{}/contents/{}",
                store.api_base.trim_end_matches('/'),
                store.repository,
                store.document_path
            ),
            token,
            offline_after_minutes,
        })
    }

    /// Fetch the published snapshot. The document API wraps the content in
    /// base64, with line breaks allowed inside the encoding.
    async fn fetch_record(&self) -> anyhow::Result<StatusRecord> {
        let response = self
            .client
            .get(&self.document_url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("document fetch failed with status {status}");
        }

        let body: serde_json::Value = response.json().await?;
        let content = body
            .get("content")
            .and_then(|content| content.as_str())
            .ok_or_else(|| anyhow::anyhow!("document has no content field"))?;

        let stripped: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        let raw = BASE64.decode(stripped)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    #[instrument(skip(self))]
    pub async fn check(&self, now: DateTime<Utc>) -> Verdict {
        let record = match self.fetch_record().await {
            Ok(record) => record,
            Err(e) => {
                warn!("could not read last snapshot: {e}");
                return Verdict {
                    classification: Classification::Error {
                        reason: e.to_string(),
                    },
                    record: None,
                };
            }
        };

        let classification = classify(&record.timestamp, now, self.offline_after_minutes);
        debug!("{} -> {classification:?}", record.hostname);

        Verdict {
            classification,
            record: Some(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_recent_snapshot_is_online() {
        let c = classify("2024-06-01 11:30:00", at("2024-06-01T12:00:00Z"), 180);
        assert_eq!(c, Classification::Online { minutes: 30 });
    }

    #[test]
    fn test_stale_snapshot_is_offline() {
        let c = classify("2024-06-01 06:00:00", at("2024-06-01T12:00:00Z"), 180);
        assert_eq!(c, Classification::Offline { minutes: 360 });
    }

    #[test]
    fn test_threshold_boundary_counts_as_offline() {
        let c = classify("2024-06-01 09:00:00", at("2024-06-01T12:00:00Z"), 180);
        assert_eq!(c, Classification::Offline { minutes: 180 });
    }

    #[test]
    fn test_garbage_timestamp_is_error() {
        let c = classify("yesterday-ish", at("2024-06-01T12:00:00Z"), 180);
        assert!(matches!(c, Classification::Error { .. }));
    }
}
