//! Contractor audit sampling.
//!
//! Picks a random batch of contractors that have not been audited yet and
//! writes their identifiers, space separated, to a scratch file for the
//! reviewer to paste into the licensing lookup.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use crate::db::{Database, DbError};

/// Upper bound on identifiers returned by a single sample.
pub const AUDIT_SAMPLE_LIMIT: usize = 100;

/// Contractors that are never sampled: internal test accounts and records
/// under manual review with the licensing board.
pub const EXCLUDED_CONTRACTOR_IDS: &[&str] = &[
    "TACLA00000001",
    "TACLA00000002",
    "TACLA27741E",
    "TACLA31028C",
    "TACLB00981C",
    "RMP-40277",
    "M-39123",
    "ECL-198807",
];

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("unable to write identifiers to '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Knobs for a sampling run. `Default` samples the full limit and only
/// applies the built-in exclusions.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub limit: usize,
    pub extra_exclusions: Vec<String>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            limit: AUDIT_SAMPLE_LIMIT,
            extra_exclusions: Vec::new(),
        }
    }
}

impl AuditOptions {
    /// Built-in exclusions merged with the extra ones, deduplicated.
    pub fn exclusions(&self) -> BTreeSet<String> {
        EXCLUDED_CONTRACTOR_IDS
            .iter()
            .map(|id| id.to_string())
            .chain(
                self.extra_exclusions
                    .iter()
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty()),
            )
            .collect()
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.min(AUDIT_SAMPLE_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditSample {
    pub identifiers: Vec<String>,
    pub output_path: PathBuf,
    pub excluded: usize,
}

/// Randomly samples up to `limit` unaudited contractor identifiers, skipping
/// every identifier in `exclusions`. `limit` is capped at [`AUDIT_SAMPLE_LIMIT`].
pub fn sample_unaudited(
    conn: &Connection,
    exclusions: &BTreeSet<String>,
    limit: usize,
) -> Result<Vec<String>, DbError> {
    let mut sql = "SELECT id FROM contractors WHERE audited = 0".to_string();
    let mut params: Vec<Value> = Vec::with_capacity(exclusions.len() + 1);

    if !exclusions.is_empty() {
        let placeholders = vec!["?"; exclusions.len()].join(", ");
        sql.push_str(&format!(" AND id NOT IN ({placeholders})"));
        params.extend(exclusions.iter().cloned().map(Value::Text));
    }
    sql.push_str(" ORDER BY RANDOM() LIMIT ?");
    params.push(Value::Integer(limit.min(AUDIT_SAMPLE_LIMIT) as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
        row.get::<_, String>(0)
    })?;

    let mut identifiers = Vec::new();
    for id in rows {
        identifiers.push(id?);
    }
    Ok(identifiers)
}

/// Overwrites `path` with the identifiers joined by single spaces.
pub fn write_identifiers(path: &Path, identifiers: &[String]) -> io::Result<()> {
    fs::write(path, identifiers.join(" "))
}

/// Samples from the database at `database` and writes the result to `output`.
pub fn run_audit_sample(
    database: &Database,
    output: &Path,
    options: &AuditOptions,
) -> Result<AuditSample, AuditError> {
    let conn = database.open_readonly()?;
    let exclusions = options.exclusions();
    let identifiers = sample_unaudited(&conn, &exclusions, options.effective_limit())?;

    if identifiers.is_empty() {
        warn!(
            database = %database.path().display(),
            "no unaudited contractors matched; writing empty identifier file"
        );
    }

    write_identifiers(output, &identifiers).map_err(|source| AuditError::Write {
        path: output.to_path_buf(),
        source,
    })?;

    info!(
        sampled = identifiers.len(),
        excluded = exclusions.len(),
        output = %output.display(),
        "contractor audit sample written"
    );

    Ok(AuditSample {
        identifiers,
        output_path: output.to_path_buf(),
        excluded: exclusions.len(),
    })
}
