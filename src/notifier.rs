//! Alert mail delivery via a generic message-send API.
//!
//! Fire-and-forget: one POST with the email envelope, outcome logged,
//! never retried.

use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::checker::{Classification, Verdict};
use crate::config::EmailConfig;

#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    #[serde(rename = "html-body")]
    pub html_body: String,
}

pub struct EmailBuilder {
    subject: String,
    lines: Vec<String>,
}

impl EmailBuilder {
    pub fn new(subject: impl ToString) -> Self {
        Self {
            subject: subject.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl ToString) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn build(self, config: &EmailConfig) -> EmailMessage {
        let mut body = String::new();
        for line in &self.lines {
            body.push_str("<p>");
            body.push_str(line);
            body.push_str("</p>");
        }

        EmailMessage {
            to: config.to.clone(),
            from: config.from.clone(),
            subject: self.subject,
            html_body: body,
        }
    }
}

/// Compose the alert mail for a verdict. `None` when the verdict does not
/// warrant an alert.
pub fn build_alert(verdict: &Verdict, config: &EmailConfig) -> Option<EmailMessage> {
    if !verdict.should_alert() {
        return None;
    }

    let hostname = verdict
        .record
        .as_ref()
        .map(|record| record.hostname.clone())
        .unwrap_or_else(|| String::from("unknown host"));

    let builder = match &verdict.classification {
        Classification::Offline { minutes } => {
            EmailBuilder::new(format!("🔴 {hostname} appears to be offline"))
                .line(format!(
                    "No status update from <b>{hostname}</b> for {minutes} minutes."
                ))
                .line(format!("Checked at {} UTC", Utc::now().format(crate::TIMESTAMP_FORMAT)))
        }
        Classification::Error { reason } => {
            EmailBuilder::new("🔴 Status snapshot could not be read")
                .line(format!("The last published snapshot is unreadable: {reason}"))
                .line(format!("Checked at {} UTC", Utc::now().format(crate::TIMESTAMP_FORMAT)))
        }
        Classification::Online { .. } => {
            // online but the node itself reports errors
            let mut builder = EmailBuilder::new(format!("⚠️ {hostname} is reporting errors"));
            if let Some(record) = &verdict.record {
                builder = builder.line(record.error_log.message.clone());
                if let Some(excerpt) = &record.error_log.log_content {
                    builder = builder.line(format!("<pre>{excerpt}</pre>"));
                }
            }
            builder
        }
    };

    Some(builder.build(config))
}

#[derive(Debug, Clone)]
pub struct Notifier {
    client: Client,
    config: EmailConfig,
}

impl Notifier {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &EmailConfig {
        &self.config
    }

    #[instrument(skip_all, fields(subject = %message.subject))]
    pub async fn send(&self, message: &EmailMessage) {
        match self
            .client
            .post(&self.config.endpoint)
            .json(message)
            .send()
            .await
        {
            Ok(response) => {
                if response.status().is_success() {
                    info!("Successfully sent alert mail");
                } else {
                    error!("Alert mail failed with status: {}", response.status());
                }
            }
            Err(e) => {
                error!("Failed to send alert mail: {e}");
            }
        }
    }
}
