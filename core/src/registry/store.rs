//! Durable storage for the registry document.
//!
//! One JSON document, always rewritten in full. Writes go to a temp file in
//! the same directory and are renamed into place, so a crashed writer can
//! never leave a torn document behind. Cross-process mutual exclusion uses an
//! exclusive `fs2` lock on a sibling `.lock` file; the guard releases on drop
//! so every exit path — including error returns — unlocks.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Result, SupervisorError};
use crate::registry::RegistryDoc;

/// Handle to the registry document on disk.
pub struct RegistryStore {
    path: PathBuf,
    lock_path: PathBuf,
}

/// RAII exclusive lock over the store. Held for the duration of one
/// read-modify-write cycle.
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        tracing::debug!(lock = %self.path.display(), "released registry lock");
    }
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        RegistryStore { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire the exclusive store lock, blocking until available.
    ///
    /// The lock file itself is never deleted; only the advisory lock cycles.
    pub fn lock(&self) -> Result<StoreLock> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SupervisorError::persistence(format!(
                    "cannot create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| {
                SupervisorError::persistence(format!(
                    "cannot open lock {}: {}",
                    self.lock_path.display(),
                    e
                ))
            })?;
        file.lock_exclusive().map_err(|e| {
            SupervisorError::persistence(format!(
                "cannot lock {}: {}",
                self.lock_path.display(),
                e
            ))
        })?;
        tracing::debug!(lock = %self.lock_path.display(), "acquired registry lock");
        Ok(StoreLock {
            file,
            path: self.lock_path.clone(),
        })
    }

    /// Load the document. A missing file is an empty registry; anything
    /// unreadable or unparsable is a persistence error.
    pub fn load(&self) -> Result<RegistryDoc> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RegistryDoc::default());
            }
            Err(e) => {
                return Err(SupervisorError::persistence(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };
        serde_json::from_str(&content).map_err(|e| {
            SupervisorError::persistence(format!(
                "corrupt registry {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Write the whole document atomically (temp file + rename).
    pub fn save(&self, doc: &RegistryDoc) -> Result<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|e| {
            SupervisorError::persistence(format!("cannot create {}: {}", parent.display(), e))
        })?;
        let json = serde_json::to_string_pretty(doc).map_err(|e| {
            SupervisorError::persistence(format!("cannot serialize registry: {}", e))
        })?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| {
            SupervisorError::persistence(format!("cannot write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            SupervisorError::persistence(format!(
                "cannot replace {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{SessionRecord, SessionStatus};

    fn sample_doc() -> RegistryDoc {
        let mut doc = RegistryDoc::default();
        doc.next_seq = 2;
        doc.sessions.insert(
            "s-1".into(),
            SessionRecord {
                id: "s-1".into(),
                name: "web".into(),
                group: "default".into(),
                command: Some("npm start".into()),
                created_at_ms: 1,
                status: SessionStatus::Running,
            },
        );
        doc.groups.insert("default".into(), vec!["s-1".into()]);
        doc
    }

    #[test]
    fn missing_file_loads_empty_doc() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("registry.json"));
        let doc = store.load().unwrap();
        assert!(doc.sessions.is_empty());
        assert_eq!(doc.next_seq, 1);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("registry.json"));
        store.save(&sample_doc()).unwrap();
        let doc = store.load().unwrap();
        assert_eq!(doc.next_seq, 2);
        assert_eq!(doc.sessions["s-1"].name, "web");
        assert_eq!(doc.groups["default"], vec!["s-1".to_string()]);
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("registry.json"));
        store.save(&sample_doc()).unwrap();
        assert!(!dir.path().join("registry.tmp").exists());
    }

    #[test]
    fn corrupt_document_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = RegistryStore::new(&path);
        assert!(matches!(
            store.load(),
            Err(SupervisorError::Persistence { .. })
        ));
    }

    #[test]
    fn lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("registry.json"));
        {
            let _guard = store.lock().unwrap();
        }
        // Re-acquiring immediately would deadlock if drop leaked the lock.
        let _guard = store.lock().unwrap();
    }
}
