//! Audit logger for anonymization operations
//!
//! Records one JSON-lines (or plain text) entry per anonymize call, with
//! SHA-256 hashes of original span values. Plaintext PII never reaches the
//! audit log.

use crate::domain::{AnonymizeResult, CloakError, EntitySpan, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

/// Audit log entry for one anonymization pass
#[derive(Debug, Serialize)]
struct AuditLogEntry {
    timestamp: String,
    session_id: Uuid,
    spans_count: usize,
    spans: Vec<AuditSpan>,
}

/// Audit span entry (with hashed value)
#[derive(Debug, Serialize)]
struct AuditSpan {
    entity_type: String,
    operator: String,
    score: f32,
    /// SHA-256 hash of the original value (never log plaintext PII)
    value_hash: String,
}

/// Audit logger for anonymization operations
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
}

impl AuditLogger {
    /// Create a new audit logger, ensuring the parent directory exists
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CloakError::Io(format!(
                        "Failed to create audit log directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
        })
    }

    /// Log one anonymization pass
    pub fn log_anonymization(
        &self,
        session_id: Uuid,
        spans: &[EntitySpan],
        result: &AnonymizeResult,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = AuditLogEntry {
            timestamp: result.timestamp.to_rfc3339(),
            session_id,
            spans_count: spans.len(),
            spans: spans
                .iter()
                .zip(&result.items)
                .map(|(span, item)| AuditSpan {
                    entity_type: span.entity_type.clone(),
                    operator: item.operator.clone(),
                    score: span.score,
                    value_hash: hash_value(&span.text),
                })
                .collect(),
        };

        self.write_entry(&entry)
    }

    fn write_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| {
                CloakError::Io(format!(
                    "Failed to open audit log {}: {e}",
                    self.log_path.display()
                ))
            })?;

        if self.json_format {
            let json_line = serde_json::to_string(entry)?;
            writeln!(file, "{json_line}")
                .map_err(|e| CloakError::Io(format!("Failed to write audit entry: {e}")))?;
        } else {
            writeln!(
                file,
                "[{}] Session: {} | Spans: {}",
                entry.timestamp, entry.session_id, entry.spans_count
            )
            .map_err(|e| CloakError::Io(format!("Failed to write audit entry: {e}")))?;
        }

        Ok(())
    }
}

/// Hash a PII value using SHA-256
fn hash_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    format!("{result:x}")
}
