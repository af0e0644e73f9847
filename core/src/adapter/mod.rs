//! Terminal control adapters.
//!
//! Provides the `TerminalAdapter` trait — the supervisor's only way to touch
//! the external terminal host — plus the AppleScript production adapter and a
//! mock for tests. The production adapter builds automation scripts without
//! spawning processes itself; a `CommandRunner` executes them, keeping the
//! builder layer pure and testable.
//!
//! The host resolves sessions by display name and names are not unique.
//! `lookup_by_name` exposes the full 0..n match list so callers pick an
//! explicit `AmbiguityPolicy` instead of inheriting a silent first-match.

pub mod applescript;
pub mod mock;
pub mod runner;

use crate::error::AdapterError;

/// Handle to one session inside the host terminal application.
///
/// `handle` is an opaque host-side identifier (window/tab id for the
/// AppleScript adapter); it is only stable while the session stays open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRef {
    pub name: String,
    pub handle: String,
}

/// How to resolve a name that matches more than one open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguityPolicy {
    /// Take the first match — the host's own resolution rule.
    #[default]
    FirstMatch,
    /// Refuse to act on an ambiguous name.
    Strict,
}

/// Driver for sessions hosted in the external terminal application.
///
/// All operations are synchronous and best-effort: the adapter reports what
/// the host said and never retries.
pub trait TerminalAdapter {
    /// Create a new named session, optionally seeding it with a command.
    fn create_session(
        &mut self,
        name: &str,
        command: Option<&str>,
    ) -> Result<SessionRef, AdapterError>;

    /// Inject a line of text (submitted as if typed) into the session.
    fn write(&mut self, selector: &str, text: &str) -> Result<(), AdapterError>;

    /// Send an interrupt keystroke to the session's foreground process.
    fn interrupt(&mut self, selector: &str) -> Result<(), AdapterError>;

    /// Read the currently visible output of the session.
    fn read_output(&mut self, selector: &str) -> Result<String, AdapterError>;

    /// Close the first session matching the selector. Returns whether a
    /// session was found to close.
    fn close(&mut self, selector: &str) -> Result<bool, AdapterError>;

    /// All open sessions whose display name equals `name`, in host order.
    fn lookup_by_name(&mut self, name: &str) -> Result<Vec<SessionRef>, AdapterError>;
}

/// Resolve a name to a single session under the given policy.
pub fn resolve(
    adapter: &mut dyn TerminalAdapter,
    name: &str,
    policy: AmbiguityPolicy,
) -> Result<SessionRef, AdapterError> {
    let mut matches = adapter.lookup_by_name(name)?;
    match (matches.len(), policy) {
        (0, _) => Err(AdapterError::TargetMissing { name: name.into() }),
        (1, _) | (_, AmbiguityPolicy::FirstMatch) => Ok(matches.remove(0)),
        (n, AmbiguityPolicy::Strict) => Err(AdapterError::Ambiguous {
            name: name.into(),
            matches: n,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockAdapter;
    use super::*;

    #[test]
    fn resolve_missing_name() {
        let mut adapter = MockAdapter::new();
        let err = resolve(&mut adapter, "ghost", AmbiguityPolicy::FirstMatch).unwrap_err();
        assert!(matches!(err, AdapterError::TargetMissing { .. }));
    }

    #[test]
    fn resolve_first_match_on_duplicates() {
        let mut adapter = MockAdapter::with_sessions(vec!["web".into(), "web".into()]);
        let r = resolve(&mut adapter, "web", AmbiguityPolicy::FirstMatch).unwrap();
        assert_eq!(r.name, "web");
    }

    #[test]
    fn resolve_strict_rejects_duplicates() {
        let mut adapter = MockAdapter::with_sessions(vec!["web".into(), "web".into()]);
        let err = resolve(&mut adapter, "web", AmbiguityPolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            AdapterError::Ambiguous {
                name: "web".into(),
                matches: 2
            }
        );
    }
}
