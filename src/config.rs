use std::path::PathBuf;

use tracing::trace;

/// Remote document store configuration.
///
/// The store is a version-controlled file behind a generic document API:
/// GET yields the current version token (`sha`) for an existing document,
/// PUT writes base64 content and attaches the token for updates.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct StoreConfig {
    /// Base URL of the document API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Repository identifier, e.g. "someone/server-status"
    pub repository: String,

    /// Path of the status document within the repository
    #[serde(default = "default_document_path")]
    pub document_path: String,

    /// File holding the static bearer token (overridable via environment)
    pub credential_file: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ReportConfig {
    /// Directory scanned for dated error logs; no scan when absent
    pub error_log_dir: Option<PathBuf>,

    /// Filename pattern with three capture groups: year, month, day
    #[serde(default = "default_error_log_pattern")]
    pub error_log_pattern: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            error_log_dir: None,
            error_log_pattern: default_error_log_pattern(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MaintenanceConfig {
    /// The local run log the retention filter rewrites
    pub log_file: PathBuf,

    /// Entries older than this many days are pruned
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CheckerConfig {
    /// Minutes of silence after which the node counts as offline
    #[serde(default = "default_offline_after")]
    pub offline_after_minutes: i64,

    pub alert: Option<EmailConfig>,
}

/// Message-send API target for alert mails.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct EmailConfig {
    pub endpoint: String,
    pub to: String,
    pub from: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub store: StoreConfig,

    #[serde(default)]
    pub report: ReportConfig,

    pub maintenance: MaintenanceConfig,

    pub checker: Option<CheckerConfig>,
}

fn default_api_base() -> String {
    String::from("https://api.github.com")
}

fn default_document_path() -> String {
    String::from("status.json")
}

fn default_timeout() -> u64 {
    10
}

fn default_error_log_pattern() -> String {
    String::from(r"^error-(\d{4})-(\d{2})-(\d{2})\.log$")
}

fn default_retention_days() -> u32 {
    30
}

fn default_offline_after() -> i64 {
    180
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
