//! Point-in-time host metric collection.
//!
//! Every metric read is best-effort: a failing source degrades its own field
//! to `0`, an empty string or a sentinel, and collection as a whole never
//! fails. The external IP lookup walks a short ordered endpoint list with a
//! fixed per-request timeout; the first non-empty answer wins.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use sysinfo::{Components, Disks, System};
use tracing::{debug, instrument, trace, warn};

use crate::config::ReportConfig;
use crate::{StatusRecord, TIMESTAMP_FORMAT, UNKNOWN_IP, errlog};

/// Lookups tried in order for the public IP.
const IP_ENDPOINTS: [&str; 3] = [
    "https://api.ipify.org",
    "https://ifconfig.me/ip",
    "https://icanhazip.com",
];

/// Per-endpoint timeout for the IP lookup.
const IP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Collector {
    /// HTTP client (reused across requests for efficiency)
    client: reqwest::Client,
    error_log: Option<(PathBuf, Regex)>,
}

impl Collector {
    /// Build a collector from the report section of the configuration.
    /// Fails only on an invalid error-log pattern, which is a config error.
    pub fn new(report: &ReportConfig) -> anyhow::Result<Self> {
        let error_log = match &report.error_log_dir {
            Some(dir) => Some((dir.clone(), errlog::compile_pattern(&report.error_log_pattern)?)),
            None => None,
        };

        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(IP_TIMEOUT)
                .build()
                .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?,
            error_log,
        })
    }

    /// Produce a snapshot of the host. Never fails; individual fields
    /// degrade on their own.
    #[instrument(skip(self))]
    pub async fn collect(&self) -> StatusRecord {
        let mut sys = System::new_all();
        sys.refresh_all();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_all();

        let error_log = match &self.error_log {
            Some((dir, re)) => errlog::scan(dir, re),
            None => crate::ErrorLogStatus::no_match(),
        };

        let record = StatusRecord {
            hostname: System::host_name().unwrap_or_default(),
            external_ip: self.external_ip().await,
            timestamp: Utc::now().format(TIMESTAMP_FORMAT).to_string(),
            uptime: format_uptime(System::uptime()),
            memory_usage: memory_usage(&sys),
            disk_usage: disk_usage(),
            cpu_temp: cpu_temp(),
            error_log,
        };

        debug!("collected snapshot for {}", record.hostname);
        record
    }

    /// First non-empty answer from the endpoint list, or the sentinel.
    async fn external_ip(&self) -> String {
        for endpoint in IP_ENDPOINTS {
            trace!("{endpoint}: requesting external IP");
            let response = match self.client.get(endpoint).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!("{endpoint}: error during request: {e}");
                    continue;
                }
            };

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!("{endpoint}: error during decode: {e}");
                    continue;
                }
            };

            let ip = body.trim();
            if !ip.is_empty() {
                return ip.to_string();
            }
        }

        String::from(UNKNOWN_IP)
    }
}

fn memory_usage(sys: &System) -> String {
    let total = sys.total_memory();
    if total == 0 {
        return String::from("0.0%");
    }
    format!("{:.1}%", sys.used_memory() as f64 / total as f64 * 100.0)
}

fn disk_usage() -> String {
    let disks = Disks::new_with_refreshed_list();

    // prefer the root mount; fall back to the largest disk
    let disk = disks
        .iter()
        .find(|d| d.mount_point() == std::path::Path::new("/"))
        .or_else(|| disks.iter().max_by_key(|d| d.total_space()));

    match disk {
        Some(disk) if disk.total_space() > 0 => {
            let total = disk.total_space() as f64;
            let used = total - disk.available_space() as f64;
            format!("{:.2}%", used / total * 100.0)
        }
        _ => String::from("0.00%"),
    }
}

fn cpu_temp() -> String {
    let components = Components::new_with_refreshed_list();
    let temps: Vec<f32> = components
        .iter()
        .filter_map(|component| component.temperature())
        .collect();

    if temps.is_empty() {
        return String::from("0.0°C");
    }
    format!("{:.1}°C", temps.iter().sum::<f32>() / temps.len() as f32)
}

fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    format!("{days}d {hours}h {minutes}m")
}
