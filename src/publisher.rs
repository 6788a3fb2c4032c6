//! Upsert of the status snapshot into the remote document store.
//!
//! The store is a version-controlled file behind a generic document API:
//! GET yields the current version token (`sha`) when the document exists,
//! PUT writes base64 content and must attach that token for updates. The
//! whole fetch-then-write sequence is retried a bounded number of times;
//! the outcome is surfaced as a boolean so a cron-driven caller can log it
//! and still exit cleanly.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::StatusRecord;
use crate::config::StoreConfig;

/// Attempts for the whole fetch-then-write sequence.
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct Publisher {
    client: reqwest::Client,
    document_url: String,
    token: String,
}

impl Publisher {
    pub fn new(store: &StoreConfig, token: String) -> anyhow::Result<Self> {
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
        })
    }

    /// Current version token of the document, or `None` when the document
    /// does not exist yet. Any fetch failure counts as "no document" so a
    /// first run can proceed as a create.
    async fn fetch_version(&self) -> Option<String> {
        let response = match self
            .client
            .get(&self.document_url)
            .bearer_auth(&self.token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("version fetch failed, treating as new document: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(
                "version fetch returned {}, treating as new document",
                response.status()
            );
            return None;
        }

        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("version fetch body did not parse, treating as new document: {e}");
                return None;
            }
        };

        body.get("sha")
            .and_then(|sha| sha.as_str())
            .map(str::to_string)
    }

    /// One write, attaching the version token when updating.
    async fn write(&self, record: &StatusRecord, sha: Option<&str>) -> anyhow::Result<()> {
        let serialized = serde_json::to_string_pretty(record)?;

        let mut payload = json!({
            "message": format!("Status update for {}", record.hostname),
            "content": BASE64.encode(&serialized),
            "encoding": "base64",
        });
        if let Some(sha) = sha {
            payload["sha"] = json!(sha);
        }

        let response = self
            .client
            .put(&self.document_url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("document write failed with status {status}");
        }

        Ok(())
    }

    async fn try_publish(&self, record: &StatusRecord) -> anyhow::Result<()> {
        let sha = self.fetch_version().await;
        trace!("current version token: {sha:?}");
        self.write(record, sha.as_deref()).await
    }

    /// Upsert `record`, retrying the whole fetch-then-write sequence with
    /// linear backoff. Never propagates an error; the caller gets a bool
    /// and decides what to log.
    #[instrument(skip_all, fields(hostname = %record.hostname))]
    pub async fn publish(&self, record: &StatusRecord) -> bool {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.try_publish(record).await {
                Ok(()) => {
                    info!("published status snapshot (attempt {attempt})");
                    return true;
                }
                Err(e) => {
                    error!("publish attempt {attempt}/{MAX_ATTEMPTS} failed: {e}");
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(Duration::from_secs((attempt * 2) as u64)).await;
                    }
                }
            }
        }

        false
    }
}
