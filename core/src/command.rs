//! The operator command surface, as a typed enum.
//!
//! Each variant maps 1:1 onto a registry, monitor, or collector operation.
//! Parsing lives in `cli::parse`; execution lives in the `tdk` binary.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `tdk create <name> [--group <g>] [--command <c>]`
    Create {
        name: String,
        group: Option<String>,
        command: Option<String>,
    },
    /// `tdk list [--group <g>]`
    List { group: Option<String> },
    /// `tdk get <id>`
    Get { id: String },
    /// `tdk execute <id> <text> [--strict]`
    Execute {
        id: String,
        text: String,
        strict: bool,
    },
    /// `tdk read <id> [--lines <n>]`
    Read { id: String, lines: Option<usize> },
    /// `tdk close <id> [--strict]`
    Close { id: String, strict: bool },
    /// `tdk restart <id> [--strict]`
    Restart { id: String, strict: bool },
    /// `tdk save <path>`
    Save { path: PathBuf },
    /// `tdk restore <path>`
    Restore { path: PathBuf },
    /// `tdk group-start <name>`
    GroupStart { name: String },
    /// `tdk group-stop <name>`
    GroupStop { name: String },
    /// `tdk watch <id> [--interval <secs>] [--auto-restart] [--max-restarts <n>] [--patterns <file>]`
    Watch {
        id: String,
        interval_secs: Option<u64>,
        auto_restart: bool,
        max_restarts: Option<u32>,
        patterns: Option<PathBuf>,
    },
    /// `tdk check <id> [--patterns <file>]`
    Check {
        id: String,
        patterns: Option<PathBuf>,
    },
    /// `tdk logs <id> [--lines <n>] [--output <path>]`
    Logs {
        id: String,
        lines: Option<usize>,
        output: Option<PathBuf>,
    },
    /// `tdk collect-all [--output-dir <dir>]`
    CollectAll { output_dir: Option<PathBuf> },
    /// `tdk status [--patterns <file>]`
    Status { patterns: Option<PathBuf> },
    /// `tdk clear`
    Clear,
    /// `tdk help`
    Help,
}
