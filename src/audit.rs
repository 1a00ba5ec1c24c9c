//! Append-only audit trail of produced routes.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{SolveResult, SolveStatus};
use crate::traits::AuditSink;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub route_id: String,
    pub input_stops_count: usize,
    pub total_distance_km: f64,
    /// Addresses on the sync path; indices on the async path.
    pub optimized_order: Vec<String>,
    pub status: SolveStatus,
}

impl AuditEntry {
    /// Entry for an async task. Labels are never known here, so the order is
    /// recorded as indices.
    pub fn for_task(task_id: Uuid, input_stops_count: usize, result: &SolveResult) -> Self {
        Self {
            route_id: task_id.to_string(),
            input_stops_count,
            total_distance_km: result.total_distance_km,
            optimized_order: result.tour.indices().iter().map(ToString::to_string).collect(),
            status: result.status,
        }
    }
}

/// Entry as written to disk.
#[derive(Debug, Serialize, Deserialize)]
pub struct StampedEntry {
    #[serde(flatten)]
    pub entry: AuditEntry,
    pub timestamp: String,
}

/// Writes one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesAudit {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesAudit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonLinesAudit {
    fn record(&self, entry: &AuditEntry) -> Result<()> {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|err| Error::Audit(err.to_string()))?;
        let mut line = serde_json::to_vec(&StampedEntry {
            entry: entry.clone(),
            timestamp,
        })?;
        line.push(b'\n');

        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::Audit("audit lock poisoned".to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| Error::Audit(format!("{}: {err}", self.path.display())))?;
        file.write_all(&line)
            .map_err(|err| Error::Audit(format!("{}: {err}", self.path.display())))?;

        info!(route_id = %entry.route_id, path = %self.path.display(), "audit entry saved");
        Ok(())
    }
}

/// Used when no audit log is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudit;

impl AuditSink for NullAudit {
    fn record(&self, entry: &AuditEntry) -> Result<()> {
        debug!(route_id = %entry.route_id, "audit disabled, entry dropped");
        Ok(())
    }
}
