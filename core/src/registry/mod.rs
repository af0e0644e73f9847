//! Session registry — the supervisor's only stateful data component.
//!
//! Keyed store of session records plus named groups, persisted as one JSON
//! document that is read-modify-written wholesale under an exclusive file
//! lock (see `store`). A `Registry` is constructed explicitly per invocation
//! and threaded through every operation; there is no global cache.
//!
//! Identity rules: ids are `s-<seq>` minted from a persisted monotonic
//! counter, immutable and never reused, and double as insertion order.
//! Display names are the adapter-facing labels and are *not* unique.
//! `restore` and `start_group` are relaunch-from-template operations: they
//! mint fresh ids and preserve the name/command/group triple of each member,
//! because text-injection automation cannot promise stable host identity
//! across a relaunch.

pub mod store;

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::adapter::{resolve, AmbiguityPolicy, TerminalAdapter};
use crate::classify::tail_window;
use crate::error::{Result, SupervisorError};
use store::RegistryStore;

// ---------------------------------------------------------------------------
// Data model
// ---------------------------------------------------------------------------

/// Lifecycle status of a registry record. The only legal transition is
/// `Running -> Closed`; restart does not change status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Closed,
}

/// One supervised session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub name: String,
    pub group: String,
    pub command: Option<String>,
    pub created_at_ms: u64,
    pub status: SessionStatus,
}

/// The persisted registry document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryDoc {
    /// Next id sequence number. Starts at 1 and only grows.
    pub next_seq: u64,
    pub sessions: BTreeMap<String, SessionRecord>,
    pub groups: BTreeMap<String, Vec<String>>,
}

impl Default for RegistryDoc {
    fn default() -> Self {
        RegistryDoc {
            next_seq: 1,
            sessions: BTreeMap::new(),
            groups: BTreeMap::new(),
        }
    }
}

/// Group used when the caller does not name one.
pub const DEFAULT_GROUP: &str = "default";

/// Options for `create`.
#[derive(Debug, Clone, Default)]
pub struct CreateOpts {
    pub group: Option<String>,
    pub command: Option<String>,
}

/// Outcome of a bulk operation. Per-member failures never abort the batch.
#[derive(Debug, Clone, Default)]
pub struct BulkReport {
    /// Ids acted on successfully (new ids for starts, closed ids for stops).
    pub completed: Vec<String>,
    /// `(id, reason)` for members that failed.
    pub failures: Vec<(String, String)>,
}

fn id_seq(id: &str) -> u64 {
    id.strip_prefix("s-")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The registry: in-memory view of the persisted document plus its store.
///
/// Every mutation re-reads the document under the store lock, applies the
/// change, and writes the whole document back before releasing the lock, so
/// concurrent CLI invocations and watch threads serialize on the store.
pub struct Registry {
    doc: RegistryDoc,
    store: RegistryStore,
    policy: AmbiguityPolicy,
}

impl Registry {
    /// Open the registry backed by the given document path.
    pub fn open(path: impl Into<std::path::PathBuf>) -> Result<Self> {
        let store = RegistryStore::new(path);
        let doc = store.load()?;
        Ok(Registry {
            doc,
            store,
            policy: AmbiguityPolicy::default(),
        })
    }

    /// Set how host name collisions are handled by targeted operations
    /// (`execute`, `close`, `restart`). `FirstMatch`, the default, trusts
    /// the host's own resolution rule; `Strict` refuses to act when more
    /// than one open session carries the target's name.
    pub fn set_policy(&mut self, policy: AmbiguityPolicy) {
        self.policy = policy;
    }

    /// Re-read the document from disk.
    pub fn refresh(&mut self) -> Result<()> {
        self.doc = self.store.load()?;
        Ok(())
    }

    /// All records in insertion (id-sequence) order.
    pub fn records(&self) -> Vec<&SessionRecord> {
        let mut records: Vec<&SessionRecord> = self.doc.sessions.values().collect();
        records.sort_by_key(|r| id_seq(&r.id));
        records
    }

    /// Look up one record by id.
    pub fn get(&self, id: &str) -> Result<&SessionRecord> {
        self.doc
            .sessions
            .get(id)
            .ok_or_else(|| SupervisorError::not_found(format!("session '{}'", id)))
    }

    /// Records in insertion order, optionally filtered to one group.
    pub fn list(&self, group: Option<&str>) -> Result<Vec<&SessionRecord>> {
        match group {
            None => Ok(self.records()),
            Some(g) => {
                let members: Vec<&SessionRecord> = self
                    .records()
                    .into_iter()
                    .filter(|r| r.group == g)
                    .collect();
                if members.is_empty() && !self.doc.groups.contains_key(g) {
                    return Err(SupervisorError::not_found(format!("group '{}'", g)));
                }
                Ok(members)
            }
        }
    }

    /// Create a session in the host and, only once the adapter confirmed it,
    /// record it and append it to its group.
    pub fn create(
        &mut self,
        adapter: &mut dyn TerminalAdapter,
        name: &str,
        opts: CreateOpts,
    ) -> Result<String> {
        let _guard = self.store.lock()?;
        self.doc = self.store.load()?;

        // Adapter first: a failed creation must leave no phantom record.
        adapter.create_session(name, opts.command.as_deref())?;

        let id = format!("s-{}", self.doc.next_seq);
        self.doc.next_seq += 1;
        let group = opts.group.unwrap_or_else(|| DEFAULT_GROUP.to_string());
        let record = SessionRecord {
            id: id.clone(),
            name: name.to_string(),
            group: group.clone(),
            command: opts.command,
            created_at_ms: now_ms(),
            status: SessionStatus::Running,
        };
        self.doc.sessions.insert(id.clone(), record);
        self.doc.groups.entry(group).or_default().push(id.clone());
        self.store.save(&self.doc)?;
        tracing::info!(id = %id, name = %name, "session created");
        Ok(id)
    }

    /// Inject a submitted line of text into a running session.
    pub fn execute(
        &mut self,
        adapter: &mut dyn TerminalAdapter,
        id: &str,
        text: &str,
    ) -> Result<()> {
        let record = self.running(id)?;
        let name = record.name.clone();
        self.ensure_unambiguous(adapter, &name)?;
        adapter.write(&name, text)?;
        Ok(())
    }

    /// Read the tail window of a session's visible output.
    pub fn read(
        &mut self,
        adapter: &mut dyn TerminalAdapter,
        id: &str,
        lines: usize,
    ) -> Result<String> {
        let name = self.get(id)?.name.clone();
        let output = adapter.read_output(&name)?;
        Ok(tail_window(&output, lines))
    }

    /// Close a session: adapter first, then flip status and drop the id from
    /// its group list. Adapter failure leaves the record untouched. A second
    /// close of the same id is `NotFound`.
    pub fn close(&mut self, adapter: &mut dyn TerminalAdapter, id: &str) -> Result<()> {
        let _guard = self.store.lock()?;
        self.doc = self.store.load()?;

        let record = match self.doc.sessions.get(id) {
            Some(r) if r.status == SessionStatus::Running => r.clone(),
            _ => {
                return Err(SupervisorError::not_found(format!(
                    "running session '{}'",
                    id
                )))
            }
        };

        self.ensure_unambiguous(adapter, &record.name)?;
        let found = adapter.close(&record.name)?;
        if !found {
            tracing::warn!(id = %id, name = %record.name, "host had no session to close");
        }

        if let Some(r) = self.doc.sessions.get_mut(id) {
            r.status = SessionStatus::Closed;
        }
        if let Some(members) = self.doc.groups.get_mut(&record.group) {
            members.retain(|m| m != id);
            if members.is_empty() {
                self.doc.groups.remove(&record.group);
            }
        }
        self.store.save(&self.doc)?;
        tracing::info!(id = %id, name = %record.name, "session closed");
        Ok(())
    }

    /// Restart a session in place: interrupt, then re-inject the stored
    /// command. The record keeps its id and stays `Running`.
    pub fn restart(&mut self, adapter: &mut dyn TerminalAdapter, id: &str) -> Result<()> {
        self.refresh()?;
        let record = self.running(id)?;
        let name = record.name.clone();
        let command = record.command.clone().ok_or_else(|| {
            SupervisorError::config(format!("session '{}' has no stored command", id))
        })?;
        self.ensure_unambiguous(adapter, &name)?;
        adapter.interrupt(&name)?;
        adapter.write(&name, &command)?;
        tracing::info!(id = %id, name = %name, "session restarted");
        Ok(())
    }

    /// Export the whole registry document to an external path.
    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        self.refresh()?;
        let json = serde_json::to_string_pretty(&self.doc).map_err(|e| {
            SupervisorError::persistence(format!("cannot serialize registry: {}", e))
        })?;
        std::fs::write(path, json).map_err(|e| {
            SupervisorError::persistence(format!("cannot write {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    /// Relaunch every running, command-bearing record of a saved document.
    ///
    /// Template semantics: each relaunch mints a fresh id; the saved ids are
    /// not revived. Per-record failures are collected, not fatal.
    pub fn restore_from(
        &mut self,
        adapter: &mut dyn TerminalAdapter,
        path: &Path,
    ) -> Result<BulkReport> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SupervisorError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let saved: RegistryDoc = serde_json::from_str(&content).map_err(|e| {
            SupervisorError::config(format!("malformed saved state {}: {}", path.display(), e))
        })?;

        // Never mint an id the saved document already knows, even when
        // restoring into a fresh registry.
        {
            let _guard = self.store.lock()?;
            self.doc = self.store.load()?;
            if saved.next_seq > self.doc.next_seq {
                self.doc.next_seq = saved.next_seq;
                self.store.save(&self.doc)?;
            }
        }

        let mut templates: Vec<&SessionRecord> = saved
            .sessions
            .values()
            .filter(|r| r.status == SessionStatus::Running && r.command.is_some())
            .collect();
        templates.sort_by_key(|r| id_seq(&r.id));

        let mut report = BulkReport::default();
        for t in templates {
            let opts = CreateOpts {
                group: Some(t.group.clone()),
                command: t.command.clone(),
            };
            match self.create(adapter, &t.name, opts) {
                Ok(new_id) => report.completed.push(new_id),
                Err(e) => report.failures.push((t.id.clone(), e.to_string())),
            }
        }
        Ok(report)
    }

    /// Relaunch every current member of a group from its stored template.
    /// New ids, preserved name/command/group triples.
    pub fn start_group(
        &mut self,
        adapter: &mut dyn TerminalAdapter,
        group: &str,
    ) -> Result<BulkReport> {
        self.refresh()?;
        let member_ids = self
            .doc
            .groups
            .get(group)
            .cloned()
            .ok_or_else(|| SupervisorError::not_found(format!("group '{}'", group)))?;

        let templates: Vec<(String, String, Option<String>)> = member_ids
            .iter()
            .filter_map(|id| self.doc.sessions.get(id))
            .map(|r| (r.id.clone(), r.name.clone(), r.command.clone()))
            .collect();

        let mut report = BulkReport::default();
        for (old_id, name, command) in templates {
            let opts = CreateOpts {
                group: Some(group.to_string()),
                command,
            };
            match self.create(adapter, &name, opts) {
                Ok(new_id) => report.completed.push(new_id),
                Err(e) => report.failures.push((old_id, e.to_string())),
            }
        }
        Ok(report)
    }

    /// Close every current member of a group. Per-member failures are
    /// collected, not fatal.
    pub fn stop_group(
        &mut self,
        adapter: &mut dyn TerminalAdapter,
        group: &str,
    ) -> Result<BulkReport> {
        self.refresh()?;
        let member_ids = self
            .doc
            .groups
            .get(group)
            .cloned()
            .ok_or_else(|| SupervisorError::not_found(format!("group '{}'", group)))?;

        let mut report = BulkReport::default();
        for id in member_ids {
            match self.close(adapter, &id) {
                Ok(()) => report.completed.push(id),
                Err(e) => report.failures.push((id, e.to_string())),
            }
        }
        Ok(report)
    }

    /// Erase the whole registry. The only operation that deletes records.
    /// The id counter survives so ids are never reused.
    pub fn clear(&mut self) -> Result<()> {
        let _guard = self.store.lock()?;
        let next_seq = self.store.load()?.next_seq;
        self.doc = RegistryDoc {
            next_seq,
            ..RegistryDoc::default()
        };
        self.store.save(&self.doc)?;
        tracing::info!("registry cleared");
        Ok(())
    }

    /// Under `Strict`, refuse a targeted operation when the host holds more
    /// than one session with this name. `FirstMatch` needs no pre-flight
    /// lookup; it is the host's native rule.
    fn ensure_unambiguous(
        &self,
        adapter: &mut dyn TerminalAdapter,
        name: &str,
    ) -> Result<()> {
        if self.policy == AmbiguityPolicy::Strict {
            resolve(adapter, name, self.policy)?;
        }
        Ok(())
    }

    fn running(&self, id: &str) -> Result<&SessionRecord> {
        match self.doc.sessions.get(id) {
            Some(r) if r.status == SessionStatus::Running => Ok(r),
            _ => Err(SupervisorError::not_found(format!(
                "running session '{}'",
                id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::mock::MockAdapter;
    use crate::error::AdapterError;

    fn registry() -> (Registry, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let r = Registry::open(dir.path().join("registry.json")).unwrap();
        (r, dir)
    }

    fn opts(group: &str, command: &str) -> CreateOpts {
        CreateOpts {
            group: Some(group.into()),
            command: Some(command.into()),
        }
    }

    #[test]
    fn create_then_get_is_running() {
        let (mut reg, _dir) = registry();
        let mut adapter = MockAdapter::new();
        let id = reg.create(&mut adapter, "web", opts("dev", "npm start")).unwrap();
        let record = reg.get(&id).unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.status, SessionStatus::Running);
        assert_eq!(record.group, "dev");
        assert!(adapter.is_open("web"));
    }

    #[test]
    fn failed_creation_leaves_no_phantom_record() {
        let (mut reg, _dir) = registry();
        let mut adapter = MockAdapter::new();
        adapter.fail_next_create(AdapterError::HostUnreachable {
            reason: "down".into(),
        });
        assert!(reg
            .create(&mut adapter, "web", CreateOpts::default())
            .is_err());
        assert!(reg.records().is_empty());
        assert!(reg.list(None).unwrap().is_empty());
    }

    #[test]
    fn ids_are_unique_and_ordered() {
        let (mut reg, _dir) = registry();
        let mut adapter = MockAdapter::new();
        let a = reg.create(&mut adapter, "a", CreateOpts::default()).unwrap();
        let b = reg.create(&mut adapter, "b", CreateOpts::default()).unwrap();
        assert_ne!(a, b);
        let ids: Vec<&str> = reg.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![a.as_str(), b.as_str()]);
    }

    #[test]
    fn list_filters_by_group() {
        let (mut reg, _dir) = registry();
        let mut adapter = MockAdapter::new();
        reg.create(&mut adapter, "web", opts("dev", "npm start")).unwrap();
        reg.create(&mut adapter, "db", opts("infra", "postgres")).unwrap();
        let dev = reg.list(Some("dev")).unwrap();
        assert_eq!(dev.len(), 1);
        assert_eq!(dev[0].name, "web");
        assert!(matches!(
            reg.list(Some("nope")),
            Err(SupervisorError::NotFound { .. })
        ));
    }

    #[test]
    fn close_flips_status_and_leaves_group() {
        let (mut reg, _dir) = registry();
        let mut adapter = MockAdapter::new();
        let id = reg.create(&mut adapter, "web", opts("dev", "npm start")).unwrap();
        reg.close(&mut adapter, &id).unwrap();

        let record = reg.get(&id).unwrap();
        assert_eq!(record.status, SessionStatus::Closed);
        assert!(!adapter.is_open("web"));
        // Record retained, id dropped from the group list.
        assert!(reg.doc.groups.get("dev").is_none());
        // Second close is NotFound.
        assert!(matches!(
            reg.close(&mut adapter, &id),
            Err(SupervisorError::NotFound { .. })
        ));
    }

    #[test]
    fn close_adapter_failure_leaves_record_running() {
        let (mut reg, _dir) = registry();
        let mut adapter = MockAdapter::new();
        let id = reg.create(&mut adapter, "web", opts("dev", "npm start")).unwrap();

        // An unreachable host must not flip the record.
        struct FailingClose(MockAdapter);
        impl TerminalAdapter for FailingClose {
            fn create_session(
                &mut self,
                name: &str,
                command: Option<&str>,
            ) -> std::result::Result<crate::adapter::SessionRef, AdapterError> {
                self.0.create_session(name, command)
            }
            fn write(&mut self, s: &str, t: &str) -> std::result::Result<(), AdapterError> {
                self.0.write(s, t)
            }
            fn interrupt(&mut self, s: &str) -> std::result::Result<(), AdapterError> {
                self.0.interrupt(s)
            }
            fn read_output(&mut self, s: &str) -> std::result::Result<String, AdapterError> {
                self.0.read_output(s)
            }
            fn close(&mut self, _: &str) -> std::result::Result<bool, AdapterError> {
                Err(AdapterError::HostUnreachable {
                    reason: "down".into(),
                })
            }
            fn lookup_by_name(
                &mut self,
                n: &str,
            ) -> std::result::Result<Vec<crate::adapter::SessionRef>, AdapterError> {
                self.0.lookup_by_name(n)
            }
        }

        let mut failing = FailingClose(adapter);
        assert!(reg.close(&mut failing, &id).is_err());
        assert_eq!(reg.get(&id).unwrap().status, SessionStatus::Running);
    }

    #[test]
    fn restart_interrupts_and_reinjects() {
        let (mut reg, _dir) = registry();
        let mut adapter = MockAdapter::new();
        let id = reg.create(&mut adapter, "web", opts("dev", "npm start")).unwrap();
        reg.restart(&mut adapter, &id).unwrap();
        assert_eq!(adapter.interrupts_for("web"), 1);
        assert_eq!(
            adapter.written().last().unwrap(),
            &("web".to_string(), "npm start".to_string())
        );
        assert_eq!(reg.get(&id).unwrap().status, SessionStatus::Running);
    }

    #[test]
    fn restart_without_command_is_config_error() {
        let (mut reg, _dir) = registry();
        let mut adapter = MockAdapter::new();
        let id = reg.create(&mut adapter, "shell", CreateOpts::default()).unwrap();
        assert!(matches!(
            reg.restart(&mut adapter, &id),
            Err(SupervisorError::Config { .. })
        ));
    }

    #[test]
    fn execute_and_read_go_through_adapter() {
        let (mut reg, _dir) = registry();
        let mut adapter = MockAdapter::new();
        let id = reg.create(&mut adapter, "web", opts("dev", "npm start")).unwrap();
        reg.execute(&mut adapter, &id, "ls").unwrap();
        adapter.set_capture("web", "a\nb\nc\nd");
        assert_eq!(reg.read(&mut adapter, &id, 2).unwrap(), "c\nd");
    }

    #[test]
    fn strict_policy_rejects_duplicate_names() {
        let (mut reg, _dir) = registry();
        let mut adapter = MockAdapter::new();
        let a = reg.create(&mut adapter, "web", opts("dev", "npm start")).unwrap();
        reg.create(&mut adapter, "web", opts("dev", "npm start")).unwrap();

        reg.set_policy(AmbiguityPolicy::Strict);
        assert!(matches!(
            reg.execute(&mut adapter, &a, "ls"),
            Err(SupervisorError::Adapter(AdapterError::Ambiguous { .. }))
        ));
        assert!(matches!(
            reg.restart(&mut adapter, &a),
            Err(SupervisorError::Adapter(AdapterError::Ambiguous { .. }))
        ));
        assert!(matches!(
            reg.close(&mut adapter, &a),
            Err(SupervisorError::Adapter(AdapterError::Ambiguous { .. }))
        ));
        // The refused close changed nothing.
        assert_eq!(reg.get(&a).unwrap().status, SessionStatus::Running);
        assert!(adapter.written().is_empty());
        assert_eq!(adapter.interrupts_for("web"), 0);

        // First-match still works on the same registry.
        reg.set_policy(AmbiguityPolicy::FirstMatch);
        reg.execute(&mut adapter, &a, "ls").unwrap();
    }

    #[test]
    fn start_group_relaunches_templates_with_new_ids() {
        let (mut reg, _dir) = registry();
        let mut adapter = MockAdapter::new();
        let a = reg.create(&mut adapter, "web", opts("dev", "npm start")).unwrap();
        let b = reg.create(&mut adapter, "api", opts("dev", "cargo run")).unwrap();

        let report = reg.start_group(&mut adapter, "dev").unwrap();
        assert_eq!(report.completed.len(), 2);
        assert!(report.failures.is_empty());
        for new_id in &report.completed {
            assert_ne!(new_id, &a);
            assert_ne!(new_id, &b);
            let r = reg.get(new_id).unwrap();
            assert_eq!(r.group, "dev");
            assert!(r.command.is_some());
        }
        // Name/command/group triples preserved.
        let names: Vec<String> = report
            .completed
            .iter()
            .map(|id| reg.get(id).unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["web".to_string(), "api".to_string()]);
    }

    #[test]
    fn stop_group_closes_every_member() {
        let (mut reg, _dir) = registry();
        let mut adapter = MockAdapter::new();
        let a = reg.create(&mut adapter, "web", opts("dev", "npm start")).unwrap();
        let b = reg.create(&mut adapter, "api", opts("dev", "cargo run")).unwrap();
        let report = reg.stop_group(&mut adapter, "dev").unwrap();
        assert_eq!(report.completed, vec![a.clone(), b.clone()]);
        assert_eq!(reg.get(&a).unwrap().status, SessionStatus::Closed);
        assert_eq!(reg.get(&b).unwrap().status, SessionStatus::Closed);
    }

    #[test]
    fn save_and_restore_are_content_idempotent_identity_lossy() {
        let (mut reg, dir) = registry();
        let mut adapter = MockAdapter::new();
        let old = reg.create(&mut adapter, "web", opts("dev", "npm start")).unwrap();
        let export = dir.path().join("export.json");
        reg.save_to(&export).unwrap();

        let (mut fresh, _dir2) = registry();
        let report = fresh.restore_from(&mut adapter, &export).unwrap();
        assert_eq!(report.completed.len(), 1);
        let new_id = &report.completed[0];
        assert_ne!(new_id, &old);
        let r = fresh.get(new_id).unwrap();
        assert_eq!(r.name, "web");
        assert_eq!(r.command.as_deref(), Some("npm start"));
        assert_eq!(r.group, "dev");
    }

    #[test]
    fn restore_skips_closed_and_commandless_records() {
        let (mut reg, dir) = registry();
        let mut adapter = MockAdapter::new();
        let closed = reg.create(&mut adapter, "old", opts("dev", "x")).unwrap();
        reg.close(&mut adapter, &closed).unwrap();
        reg.create(&mut adapter, "shell", CreateOpts::default()).unwrap();
        reg.create(&mut adapter, "web", opts("dev", "npm start")).unwrap();
        let export = dir.path().join("export.json");
        reg.save_to(&export).unwrap();

        let (mut fresh, _dir2) = registry();
        let report = fresh.restore_from(&mut adapter, &export).unwrap();
        assert_eq!(report.completed.len(), 1);
        assert_eq!(fresh.get(&report.completed[0]).unwrap().name, "web");
    }

    #[test]
    fn restore_malformed_document_is_config_error() {
        let (mut reg, dir) = registry();
        let mut adapter = MockAdapter::new();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{]").unwrap();
        assert!(matches!(
            reg.restore_from(&mut adapter, &bad),
            Err(SupervisorError::Config { .. })
        ));
    }

    #[test]
    fn clear_erases_everything() {
        let (mut reg, _dir) = registry();
        let mut adapter = MockAdapter::new();
        reg.create(&mut adapter, "web", CreateOpts::default()).unwrap();
        reg.clear().unwrap();
        assert!(reg.records().is_empty());
    }

    #[test]
    fn mutations_are_visible_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        let mut adapter = MockAdapter::new();

        let mut first = Registry::open(&path).unwrap();
        let id = first.create(&mut adapter, "web", opts("dev", "npm start")).unwrap();

        let mut second = Registry::open(&path).unwrap();
        assert_eq!(second.get(&id).unwrap().name, "web");
        second.close(&mut adapter, &id).unwrap();

        first.refresh().unwrap();
        assert_eq!(first.get(&id).unwrap().status, SessionStatus::Closed);
    }
}
