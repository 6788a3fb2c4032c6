pub mod checker;
pub mod collector;
pub mod config;
pub mod errlog;
pub mod notifier;
pub mod publisher;
pub mod retention;
pub mod util;

use serde::{Deserialize, Serialize};

/// Sentinel used when the external IP cannot be resolved.
pub const UNKNOWN_IP: &str = "Unable to determine";

/// Timestamp format used everywhere a snapshot or log line carries a time.
/// Second precision, UTC, no timezone suffix in the string itself.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRecord {
    pub hostname: String,
    pub external_ip: String,
    pub timestamp: String,
    pub uptime: String,
    pub memory_usage: String,
    pub disk_usage: String,
    pub cpu_temp: String,
    pub error_log: ErrorLogStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorLogStatus {
    pub has_error: bool,
    pub message: String,
    pub latest_log: Option<String>,
    pub log_content: Option<String>,
}

impl ErrorLogStatus {
    pub fn no_match() -> Self {
        Self {
            has_error: false,
            message: String::from("No matching error log found"),
            latest_log: None,
            log_content: None,
        }
    }
}
