//! Error taxonomy for the supervisor.
//!
//! Two layers: `AdapterError` covers everything that can go wrong while
//! driving the external terminal host, and `SupervisorError` is the surface
//! the registry, monitor, and collector operations return to callers.
//! Registry operations pass adapter and persistence failures through
//! unmodified; nothing in this crate swallows them.

use thiserror::Error;

/// Failure while driving the external terminal host.
///
/// The adapter performs no retries of its own; retry policy belongs entirely
/// to the caller (in practice, the health monitor's bounded restarts).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdapterError {
    /// No open session in the host matches the selector.
    #[error("no session in the host matches '{name}'")]
    TargetMissing { name: String },

    /// More than one open session matches and the caller asked for a
    /// unique resolution.
    #[error("{matches} sessions in the host match '{name}'")]
    Ambiguous { name: String, matches: usize },

    /// The host application could not be reached or refused automation.
    #[error("terminal host unreachable: {reason}")]
    HostUnreachable { reason: String },

    /// The automation command ran but reported failure.
    #[error("host command failed: {reason}")]
    CommandFailed { reason: String },
}

/// Top-level error surface for registry, monitor, and collector operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Unknown session id, name, or group.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// The terminal host rejected or failed an operation.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// A watch loop consumed its restart budget.
    #[error("restart budget exhausted after {restarts} attempts")]
    Exhausted { restarts: u32 },

    /// The registry document could not be read, parsed, or written.
    #[error("registry persistence failed: {reason}")]
    Persistence { reason: String },

    /// Malformed arguments, pattern files, or saved state.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

impl SupervisorError {
    pub fn not_found(what: impl Into<String>) -> Self {
        SupervisorError::NotFound { what: what.into() }
    }

    pub fn persistence(reason: impl Into<String>) -> Self {
        SupervisorError::Persistence {
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        SupervisorError::Config {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
