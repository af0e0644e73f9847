//! Log collector — batch tail reader over registry + adapter.
//!
//! Stateless: every call reads the current visible output through the
//! adapter. The batch operation stamps all snapshots of one pass with a
//! single shared collection timestamp and reports per-session failures
//! without aborting the rest of the batch.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::adapter::TerminalAdapter;
use crate::classify::Classifier;
use crate::error::{Result, SupervisorError};
use crate::registry::{Registry, SessionStatus};

/// Tail lines captured when the caller does not say otherwise.
pub const DEFAULT_COLLECT_LINES: usize = 500;

// ---------------------------------------------------------------------------
// Single-session collection
// ---------------------------------------------------------------------------

/// Options for `collect`.
#[derive(Debug, Clone)]
pub struct CollectOpts {
    pub lines: usize,
    /// Write the snapshot here instead of only returning it.
    pub output_path: Option<PathBuf>,
}

impl Default for CollectOpts {
    fn default() -> Self {
        CollectOpts {
            lines: DEFAULT_COLLECT_LINES,
            output_path: None,
        }
    }
}

/// One captured tail window.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: String,
    pub name: String,
    pub collected_at: DateTime<Utc>,
    pub text: String,
    /// Where the snapshot was written, if it was.
    pub path: Option<PathBuf>,
}

/// Capture one session's tail window, optionally writing it to disk.
pub fn collect(
    registry: &mut Registry,
    adapter: &mut dyn TerminalAdapter,
    id: &str,
    opts: &CollectOpts,
) -> Result<Snapshot> {
    let name = registry.get(id)?.name.clone();
    let text = registry.read(adapter, id, opts.lines)?;
    let collected_at = Utc::now();
    let path = match &opts.output_path {
        Some(p) => {
            write_snapshot(p, id, &name, collected_at, &text)?;
            Some(p.clone())
        }
        None => None,
    };
    Ok(Snapshot {
        id: id.to_string(),
        name,
        collected_at,
        text,
        path,
    })
}

// ---------------------------------------------------------------------------
// Batch collection
// ---------------------------------------------------------------------------

/// One session's failure inside a batch.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub id: String,
    pub name: String,
    pub reason: String,
}

/// Result of `collect_all`: snapshots, written files, and per-session
/// failures, all under one shared timestamp.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub collected_at: DateTime<Utc>,
    pub snapshots: Vec<Snapshot>,
    pub written: Vec<PathBuf>,
    pub failures: Vec<BatchFailure>,
}

/// Capture every registry record's tail window.
///
/// One session's adapter failure never aborts the batch; it becomes an entry
/// in `failures` while the other snapshots are still taken (and written when
/// `output_dir` is given).
pub fn collect_all(
    registry: &mut Registry,
    adapter: &mut dyn TerminalAdapter,
    output_dir: Option<&Path>,
    lines: usize,
) -> Result<BatchReport> {
    registry.refresh()?;
    let collected_at = Utc::now();
    let stamp = collected_at.format("%Y%m%dT%H%M%SZ").to_string();

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir).map_err(|e| {
            SupervisorError::persistence(format!("cannot create {}: {}", dir.display(), e))
        })?;
    }

    let targets: Vec<(String, String)> = registry
        .records()
        .iter()
        .map(|r| (r.id.clone(), r.name.clone()))
        .collect();

    let mut report = BatchReport {
        collected_at,
        snapshots: Vec::new(),
        written: Vec::new(),
        failures: Vec::new(),
    };

    for (id, name) in targets {
        match registry.read(adapter, &id, lines) {
            Ok(text) => {
                let mut snapshot = Snapshot {
                    id: id.clone(),
                    name: name.clone(),
                    collected_at,
                    text,
                    path: None,
                };
                if let Some(dir) = output_dir {
                    let path = dir.join(format!("{}-{}.log", id, stamp));
                    match write_snapshot(&path, &id, &name, collected_at, &snapshot.text) {
                        Ok(()) => {
                            report.written.push(path.clone());
                            snapshot.path = Some(path);
                        }
                        Err(e) => {
                            report.failures.push(BatchFailure {
                                id: id.clone(),
                                name: name.clone(),
                                reason: e.to_string(),
                            });
                            continue;
                        }
                    }
                }
                report.snapshots.push(snapshot);
            }
            Err(e) => {
                tracing::warn!(id = %id, name = %name, error = %e, "collection failed");
                report.failures.push(BatchFailure {
                    id,
                    name,
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(report)
}

fn write_snapshot(
    path: &Path,
    id: &str,
    name: &str,
    collected_at: DateTime<Utc>,
    text: &str,
) -> Result<()> {
    let header = format!(
        "# session {} ({}) collected {}\n",
        id,
        name,
        collected_at.to_rfc3339()
    );
    std::fs::write(path, format!("{}{}", header, text)).map_err(|e| {
        SupervisorError::persistence(format!("cannot write {}: {}", path.display(), e))
    })
}

// ---------------------------------------------------------------------------
// Status summary
// ---------------------------------------------------------------------------

/// One row of the status summary.
#[derive(Debug, Clone)]
pub struct HealthRow {
    pub id: String,
    pub name: String,
    pub group: String,
    pub status: SessionStatus,
    pub running: bool,
    pub has_errors: bool,
    pub last_error: Option<String>,
    /// Why the tail could not be read, when it could not.
    pub read_error: Option<String>,
}

/// Reclassify every record's current tail, independent of any watch loop.
/// Per-session read failures become rows, not errors.
pub fn status(
    registry: &mut Registry,
    adapter: &mut dyn TerminalAdapter,
    classifier: &Classifier,
    lines: usize,
) -> Result<Vec<HealthRow>> {
    registry.refresh()?;
    let targets: Vec<(String, String, String, SessionStatus)> = registry
        .records()
        .iter()
        .map(|r| (r.id.clone(), r.name.clone(), r.group.clone(), r.status))
        .collect();

    let mut rows = Vec::new();
    for (id, name, group, session_status) in targets {
        let row = match registry.read(adapter, &id, lines) {
            Ok(tail) => {
                let v = classifier.classify(&tail);
                HealthRow {
                    id,
                    name,
                    group,
                    status: session_status,
                    running: v.running,
                    has_errors: v.has_errors,
                    last_error: v.last_error,
                    read_error: None,
                }
            }
            Err(e) => HealthRow {
                id,
                name,
                group,
                status: session_status,
                running: false,
                has_errors: false,
                last_error: None,
                read_error: Some(e.to_string()),
            },
        };
        rows.push(row);
    }
    Ok(rows)
}
