//! Append-only evaluation run log: one pretty-printed JSON file per run.

use super::metrics::EvaluationReport;
use crate::config::{EVAL_RECORD_PREFIX, MAX_RECORD_SUFFIX};
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub retrieved: usize,
    pub relevant: usize,
    pub relevant_retrieved: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// RFC 3339, second precision, UTC.
    pub timestamp: String,
    pub query: String,
    pub retrieved: Vec<String>,
    /// Sorted for stable output.
    pub relevant: Vec<String>,
    pub metrics: EvaluationReport,
    pub summary: RunSummary,
}

/// A record read back from disk with the identifier it was stored under.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: String,
    pub record: EvaluationRecord,
}

pub struct EvalLog {
    root: PathBuf,
}

impl EvalLog {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a new record and returns its identifier (the file stem).
    pub fn record_run(
        &self,
        query: &str,
        retrieved: &[String],
        relevant: &HashSet<String>,
        metrics: &EvaluationReport,
    ) -> Result<String> {
        self.record_run_at(query, retrieved, relevant, metrics, OffsetDateTime::now_utc())
    }

    /// As [`record_run`](Self::record_run) with an explicit clock reading,
    /// stored in UTC. Records from the same second get `_1`, `_2`, ... appended.
    ///
    /// The record is written to a temporary file and linked into place only
    /// once complete, so a failed write never leaves a partial record.
    pub fn record_run_at(
        &self,
        query: &str,
        retrieved: &[String],
        relevant: &HashSet<String>,
        metrics: &EvaluationReport,
        now: OffsetDateTime,
    ) -> Result<String> {
        let now = now.to_offset(UtcOffset::UTC);
        let now = now.replace_nanosecond(0).unwrap_or(now);
        let mut relevant_sorted: Vec<String> = relevant.iter().cloned().collect();
        relevant_sorted.sort();
        let record = EvaluationRecord {
            timestamp: now.format(&Rfc3339).map_err(|e| EngineError::Persistence(e.to_string()))?,
            query: query.to_string(),
            retrieved: retrieved.to_vec(),
            summary: RunSummary {
                retrieved: retrieved.len(),
                relevant: relevant.len(),
                relevant_retrieved: retrieved.iter().filter(|id| relevant.contains(*id)).count(),
            },
            relevant: relevant_sorted,
            metrics: metrics.clone(),
        };
        let json = serde_json::to_string_pretty(&record)?;

        fs::create_dir_all(&self.root)?;
        let stamp = now
            .format(format_description!("[year][month][day]_[hour][minute][second]"))
            .map_err(|e| EngineError::Persistence(e.to_string()))?;
        let base = format!("{EVAL_RECORD_PREFIX}_{stamp}");

        let mut staged = NamedTempFile::new_in(&self.root)?;
        staged.write_all(json.as_bytes())?;
        staged.as_file().sync_all()?;

        for suffix in 0..=MAX_RECORD_SUFFIX {
            let id = if suffix == 0 { base.clone() } else { format!("{base}_{suffix}") };
            let path = self.root.join(format!("{id}.json"));
            match staged.persist_noclobber(&path) {
                Ok(_) => {
                    tracing::info!(record = %id, query, "recorded evaluation run");
                    return Ok(id);
                }
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => staged = e.file,
                Err(e) => return Err(e.error.into()),
            }
        }
        Err(EngineError::Persistence(format!("no free record name for {base}")))
    }

    /// All readable records, newest first. Unreadable files are skipped.
    pub fn list_records(&self) -> Result<Vec<StoredRecord>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let id = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if stem.starts_with(EVAL_RECORD_PREFIX) => stem.to_string(),
                _ => continue,
            };
            let parsed = fs::read_to_string(&path)
                .map_err(EngineError::from)
                .and_then(|text| Ok(serde_json::from_str::<EvaluationRecord>(&text)?));
            match parsed {
                Ok(record) => records.push(StoredRecord { id, record }),
                Err(e) => tracing::warn!(file = %path.display(), error = %e, "skipping unreadable evaluation record"),
            }
        }
        records.sort_by(|a, b| {
            b.record
                .timestamp
                .cmp(&a.record.timestamp)
                .then_with(|| suffix_of(&b.id).cmp(&suffix_of(&a.id)))
        });
        Ok(records)
    }
}

/// Collision counter of a record id; 0 for the first record of a second.
fn suffix_of(id: &str) -> u32 {
    // eval_YYYYMMDD_HHMMSS[_n]
    id.splitn(4, '_').nth(3).and_then(|s| s.parse().ok()).unwrap_or(0)
}
