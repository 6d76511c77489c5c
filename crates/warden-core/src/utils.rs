use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::Result;

// ============== Timestamp Helpers ==============

/// RFC3339 timestamp in UTC (stored with every log row and audit line).
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

// ============== Audit Logging ==============

const AUDIT_MAX_TEXT: usize = 500;

#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl AuditEvent {
    pub fn deletion(user_id: i64, username: &str, reason: &str, content: &str) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: "deletion".to_string(),
            user_id: Some(user_id),
            username: Some(username.to_string()),
            command: None,
            content: Some(content.to_string()),
            reason: Some(reason.to_string()),
            authorized: None,
            error: None,
            context: None,
        }
    }

    pub fn admin_command(user_id: i64, username: &str, command: &str, authorized: bool) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: "admin_command".to_string(),
            user_id: Some(user_id),
            username: Some(username.to_string()),
            command: Some(command.to_string()),
            content: None,
            reason: None,
            authorized: Some(authorized),
            error: None,
            context: None,
        }
    }

    pub fn join(user_id: i64, username: &str) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: "join".to_string(),
            user_id: Some(user_id),
            username: Some(username.to_string()),
            command: None,
            content: None,
            reason: None,
            authorized: None,
            error: None,
            context: None,
        }
    }

    pub fn error(user_id: i64, username: &str, error: &str, context: Option<&str>) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: "error".to_string(),
            user_id: Some(user_id),
            username: Some(username.to_string()),
            command: None,
            content: None,
            reason: None,
            authorized: None,
            error: Some(error.to_string()),
            context: context.map(|s| s.to_string()),
        }
    }
}

/// Append-only JSON-lines audit trail of moderation actions.
#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, mut event: AuditEvent) -> Result<()> {
        // Deleted messages can be arbitrarily large; cap what lands in the trail.
        if let Some(s) = &event.content {
            event.content = Some(truncate_text(s, AUDIT_MAX_TEXT));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let line = serde_json::to_string(&event)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}
