//! Mock terminal adapter for tests.
//!
//! Records every call, keeps a logical list of open sessions (duplicates
//! allowed — host names are not unique), serves canned output captures, and
//! can be scripted to fail specific operations.

use std::collections::{HashMap, HashSet};

use super::{SessionRef, TerminalAdapter};
use crate::error::AdapterError;

/// One recorded adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    CreateSession { name: String, command: Option<String> },
    Write { selector: String, text: String },
    Interrupt { selector: String },
    ReadOutput { selector: String },
    Close { selector: String },
    Lookup { name: String },
}

/// Test-double `TerminalAdapter`.
pub struct MockAdapter {
    /// All calls made against this adapter, in order.
    pub calls: Vec<MockCall>,
    /// Names of open sessions, in host order. Duplicates are legal.
    sessions: Vec<String>,
    /// Canned visible output per session name.
    captures: HashMap<String, String>,
    /// Session names whose reads fail with `HostUnreachable`.
    failing_reads: HashSet<String>,
    /// Error to return from the next `create_session` call.
    fail_next_create: Option<AdapterError>,
    next_handle: u64,
}

impl MockAdapter {
    pub fn new() -> Self {
        MockAdapter {
            calls: Vec::new(),
            sessions: Vec::new(),
            captures: HashMap::new(),
            failing_reads: HashSet::new(),
            fail_next_create: None,
            next_handle: 1,
        }
    }

    /// Create a mock with some sessions already open in the host.
    pub fn with_sessions(sessions: Vec<String>) -> Self {
        let mut m = Self::new();
        m.sessions = sessions;
        m
    }

    /// Pre-load the visible output for a session name.
    pub fn set_capture(&mut self, name: &str, content: &str) {
        self.captures.insert(name.to_string(), content.to_string());
    }

    /// Make `read_output` fail for this session name.
    pub fn fail_reads_for(&mut self, name: &str) {
        self.failing_reads.insert(name.to_string());
    }

    /// Make the next `create_session` call fail with the given error.
    pub fn fail_next_create(&mut self, err: AdapterError) {
        self.fail_next_create = Some(err);
    }

    /// Whether a session with this name is currently open.
    pub fn is_open(&self, name: &str) -> bool {
        self.sessions.iter().any(|s| s == name)
    }

    /// Text written to sessions so far, in order.
    pub fn written(&self) -> Vec<(String, String)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                MockCall::Write { selector, text } => {
                    Some((selector.clone(), text.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Number of interrupts sent to the given session.
    pub fn interrupts_for(&self, name: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, MockCall::Interrupt { selector } if selector == name))
            .count()
    }

    fn require_open(&self, name: &str) -> Result<(), AdapterError> {
        if self.is_open(name) {
            Ok(())
        } else {
            Err(AdapterError::TargetMissing { name: name.into() })
        }
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalAdapter for MockAdapter {
    fn create_session(
        &mut self,
        name: &str,
        command: Option<&str>,
    ) -> Result<SessionRef, AdapterError> {
        self.calls.push(MockCall::CreateSession {
            name: name.to_string(),
            command: command.map(str::to_string),
        });
        if let Some(err) = self.fail_next_create.take() {
            return Err(err);
        }
        self.sessions.push(name.to_string());
        let handle = self.next_handle.to_string();
        self.next_handle += 1;
        Ok(SessionRef {
            name: name.to_string(),
            handle,
        })
    }

    fn write(&mut self, selector: &str, text: &str) -> Result<(), AdapterError> {
        self.calls.push(MockCall::Write {
            selector: selector.to_string(),
            text: text.to_string(),
        });
        self.require_open(selector)
    }

    fn interrupt(&mut self, selector: &str) -> Result<(), AdapterError> {
        self.calls.push(MockCall::Interrupt {
            selector: selector.to_string(),
        });
        self.require_open(selector)
    }

    fn read_output(&mut self, selector: &str) -> Result<String, AdapterError> {
        self.calls.push(MockCall::ReadOutput {
            selector: selector.to_string(),
        });
        if self.failing_reads.contains(selector) {
            return Err(AdapterError::HostUnreachable {
                reason: format!("scripted read failure for '{}'", selector),
            });
        }
        self.require_open(selector)?;
        Ok(self.captures.get(selector).cloned().unwrap_or_default())
    }

    fn close(&mut self, selector: &str) -> Result<bool, AdapterError> {
        self.calls.push(MockCall::Close {
            selector: selector.to_string(),
        });
        // First match wins, mirroring the host's resolution rule.
        match self.sessions.iter().position(|s| s == selector) {
            Some(idx) => {
                self.sessions.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn lookup_by_name(&mut self, name: &str) -> Result<Vec<SessionRef>, AdapterError> {
        self.calls.push(MockCall::Lookup {
            name: name.to_string(),
        });
        Ok(self
            .sessions
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_str() == name)
            .map(|(i, s)| SessionRef {
                name: s.clone(),
                handle: i.to_string(),
            })
            .collect())
    }
}
