// ABOUTME: Append-only JSON-lines audit trail of compute requests and their outcomes
// Every record is mirrored to tracing under the "audit" target

use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuditRecord<'a> {
    Request {
        op: &'a str,
        num1: &'a str,
        num2: &'a str,
    },
    Response {
        result: &'a str,
    },
    Error {
        error: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },
    Meta {
        url: &'a str,
        status: u16,
        #[serde(rename = "contentType")]
        content_type: &'a str,
    },
}

#[derive(Serialize)]
struct AuditEntry<'a> {
    #[serde(flatten)]
    record: &'a AuditRecord<'a>,
    timestamp: String,
}

#[derive(Debug, Default)]
pub struct AuditLog {
    file: Option<Mutex<File>>,
}

impl AuditLog {
    /// Open (or create) the audit file in append mode.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: Some(Mutex::new(file)) })
    }

    /// Audit sink that only mirrors records to tracing.
    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn record(&self, record: &AuditRecord<'_>) {
        let entry = AuditEntry {
            record,
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize audit record: {}", e);
                return;
            }
        };

        tracing::info!(target: "audit", "{}", line);

        if let Some(file) = &self.file {
            let mut guard = match file.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Err(e) = writeln!(guard, "{line}") {
                warn!("Failed to write audit record: {}", e);
            }
        }
    }

    pub fn request(&self, op: &str, num1: &str, num2: &str) {
        self.record(&AuditRecord::Request { op, num1, num2 });
    }

    pub fn response(&self, result: &str) {
        self.record(&AuditRecord::Response { result });
    }

    pub fn error(&self, error: &str, status: Option<u16>) {
        self.record(&AuditRecord::Error { error, status });
    }

    pub fn meta(&self, url: &str, status: u16, content_type: &str) {
        self.record(&AuditRecord::Meta { url, status, content_type });
    }
}
