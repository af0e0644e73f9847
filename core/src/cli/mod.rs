//! Command-line parsing for the `tdk` binary.

mod parse;

pub use parse::parse_args;

/// Usage text printed by `tdk help` and on parse errors.
pub const USAGE: &str = "\
tdk — terminal session supervisor

Usage:
  tdk create <name> [--group <g>] [--command <c>]
  tdk list [--group <g>]
  tdk get <id>
  tdk execute <id> <text> [--strict]
  tdk read <id> [--lines <n>]
  tdk close <id> [--strict]
  tdk restart <id> [--strict]
  tdk save <path>
  tdk restore <path>
  tdk group-start <name>
  tdk group-stop <name>
  tdk watch <id> [--interval <secs>] [--auto-restart] [--max-restarts <n>] [--patterns <file>]
  tdk check <id> [--patterns <file>]
  tdk logs <id> [--lines <n>] [--output <path>]
  tdk collect-all [--output-dir <dir>]
  tdk status [--patterns <file>]
  tdk clear
  tdk help

The registry lives in $TDK_CONFIG_DIR (default ~/.config/termdeck).
--strict refuses to act when several open sessions share the target's name;
the default takes the host's first match.
";
