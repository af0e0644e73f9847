use std::path::PathBuf;

use crate::command::Command;

/// Parse CLI arguments into a typed `Command`.
///
/// `args` is expected WITHOUT the program name (i.e. `["create", "web"]`,
/// not `["tdk", "create", "web"]`).
pub fn parse_args(args: &[&str]) -> Result<Command, String> {
    if args.is_empty() {
        return Err("no command specified. Run 'tdk help' for usage.".into());
    }
    match args[0] {
        "create" => parse_create(args),
        "list" => parse_list(args),
        "get" => parse_one_id(args, "get").map(|id| Command::Get { id }),
        "execute" => parse_execute(args),
        "read" => parse_read(args),
        "close" => {
            parse_id_with_strict(args, "close").map(|(id, strict)| Command::Close { id, strict })
        }
        "restart" => parse_id_with_strict(args, "restart")
            .map(|(id, strict)| Command::Restart { id, strict }),
        "save" => parse_one_path(args, "save").map(|path| Command::Save { path }),
        "restore" => parse_one_path(args, "restore").map(|path| Command::Restore { path }),
        "group-start" => parse_one_id(args, "group-start").map(|name| Command::GroupStart { name }),
        "group-stop" => parse_one_id(args, "group-stop").map(|name| Command::GroupStop { name }),
        "watch" => parse_watch(args),
        "check" => parse_check(args),
        "logs" => parse_logs(args),
        "collect-all" => parse_collect_all(args),
        "status" => parse_status(args),
        "clear" => Ok(Command::Clear),
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => Err(format!("unknown command: '{}'", other)),
    }
}

// ---------------------------------------------------------------------------
// Sub-parsers
// ---------------------------------------------------------------------------

/// `tdk create <name> [--group <g>] [--command <c>]`
fn parse_create(args: &[&str]) -> Result<Command, String> {
    if args.len() < 2 {
        return Err("usage: tdk create <name> [--group <g>] [--command <c>]".into());
    }
    let name = args[1].to_string();
    let mut group = None;
    let mut command = None;
    let rest = &args[2..];
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            "--group" => {
                i += 1;
                group = Some(take_arg(rest, i, "--group")?);
            }
            "--command" => {
                i += 1;
                command = Some(take_arg(rest, i, "--command")?);
            }
            other => return Err(format!("unknown flag for create: '{}'", other)),
        }
        i += 1;
    }
    Ok(Command::Create {
        name,
        group,
        command,
    })
}

/// `tdk list [--group <g>]`
fn parse_list(args: &[&str]) -> Result<Command, String> {
    let mut group = None;
    let rest = &args[1..];
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            "--group" => {
                i += 1;
                group = Some(take_arg(rest, i, "--group")?);
            }
            other => return Err(format!("unknown flag for list: '{}'", other)),
        }
        i += 1;
    }
    Ok(Command::List { group })
}

/// `tdk execute <id> <text> [--strict]`
fn parse_execute(args: &[&str]) -> Result<Command, String> {
    if args.len() < 3 {
        return Err("usage: tdk execute <id> <text> [--strict]".into());
    }
    let mut strict = false;
    let mut words = Vec::new();
    for a in &args[2..] {
        if *a == "--strict" {
            strict = true;
        } else {
            words.push(*a);
        }
    }
    if words.is_empty() {
        return Err("usage: tdk execute <id> <text> [--strict]".into());
    }
    Ok(Command::Execute {
        id: args[1].into(),
        text: words.join(" "),
        strict,
    })
}

/// `tdk read <id> [--lines <n>]`
fn parse_read(args: &[&str]) -> Result<Command, String> {
    if args.len() < 2 {
        return Err("usage: tdk read <id> [--lines <n>]".into());
    }
    let id = args[1].to_string();
    let mut lines = None;
    let rest = &args[2..];
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            "--lines" => {
                i += 1;
                lines = Some(take_usize(rest, i, "--lines")?);
            }
            other => return Err(format!("unknown flag for read: '{}'", other)),
        }
        i += 1;
    }
    Ok(Command::Read { id, lines })
}

/// `tdk watch <id> [--interval <secs>] [--auto-restart] [--max-restarts <n>] [--patterns <file>]`
fn parse_watch(args: &[&str]) -> Result<Command, String> {
    if args.len() < 2 {
        return Err(
            "usage: tdk watch <id> [--interval <secs>] [--auto-restart] \
             [--max-restarts <n>] [--patterns <file>]"
                .into(),
        );
    }
    let id = args[1].to_string();
    let mut interval_secs = None;
    let mut auto_restart = false;
    let mut max_restarts = None;
    let mut patterns = None;
    let rest = &args[2..];
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            "--interval" => {
                i += 1;
                interval_secs = Some(
                    take_arg(rest, i, "--interval")?
                        .parse::<u64>()
                        .map_err(|_| "--interval expects a number of seconds".to_string())?,
                );
            }
            "--auto-restart" => auto_restart = true,
            "--max-restarts" => {
                i += 1;
                max_restarts = Some(
                    take_arg(rest, i, "--max-restarts")?
                        .parse::<u32>()
                        .map_err(|_| "--max-restarts expects a number".to_string())?,
                );
            }
            "--patterns" => {
                i += 1;
                patterns = Some(PathBuf::from(take_arg(rest, i, "--patterns")?));
            }
            other => return Err(format!("unknown flag for watch: '{}'", other)),
        }
        i += 1;
    }
    Ok(Command::Watch {
        id,
        interval_secs,
        auto_restart,
        max_restarts,
        patterns,
    })
}

/// `tdk check <id> [--patterns <file>]`
fn parse_check(args: &[&str]) -> Result<Command, String> {
    if args.len() < 2 {
        return Err("usage: tdk check <id> [--patterns <file>]".into());
    }
    let id = args[1].to_string();
    let mut patterns = None;
    let rest = &args[2..];
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            "--patterns" => {
                i += 1;
                patterns = Some(PathBuf::from(take_arg(rest, i, "--patterns")?));
            }
            other => return Err(format!("unknown flag for check: '{}'", other)),
        }
        i += 1;
    }
    Ok(Command::Check { id, patterns })
}

/// `tdk logs <id> [--lines <n>] [--output <path>]`
fn parse_logs(args: &[&str]) -> Result<Command, String> {
    if args.len() < 2 {
        return Err("usage: tdk logs <id> [--lines <n>] [--output <path>]".into());
    }
    let id = args[1].to_string();
    let mut lines = None;
    let mut output = None;
    let rest = &args[2..];
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            "--lines" => {
                i += 1;
                lines = Some(take_usize(rest, i, "--lines")?);
            }
            "--output" => {
                i += 1;
                output = Some(PathBuf::from(take_arg(rest, i, "--output")?));
            }
            other => return Err(format!("unknown flag for logs: '{}'", other)),
        }
        i += 1;
    }
    Ok(Command::Logs { id, lines, output })
}

/// `tdk collect-all [--output-dir <dir>]`
fn parse_collect_all(args: &[&str]) -> Result<Command, String> {
    let mut output_dir = None;
    let rest = &args[1..];
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            "--output-dir" => {
                i += 1;
                output_dir = Some(PathBuf::from(take_arg(rest, i, "--output-dir")?));
            }
            other => return Err(format!("unknown flag for collect-all: '{}'", other)),
        }
        i += 1;
    }
    Ok(Command::CollectAll { output_dir })
}

/// `tdk status [--patterns <file>]`
fn parse_status(args: &[&str]) -> Result<Command, String> {
    let mut patterns = None;
    let rest = &args[1..];
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            "--patterns" => {
                i += 1;
                patterns = Some(PathBuf::from(take_arg(rest, i, "--patterns")?));
            }
            other => return Err(format!("unknown flag for status: '{}'", other)),
        }
        i += 1;
    }
    Ok(Command::Status { patterns })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Commands of the shape `tdk <cmd> <one-positional>`.
fn parse_one_id(args: &[&str], cmd: &str) -> Result<String, String> {
    if args.len() != 2 {
        return Err(format!("usage: tdk {} <arg>", cmd));
    }
    Ok(args[1].to_string())
}

/// Commands of the shape `tdk <cmd> <id> [--strict]`.
fn parse_id_with_strict(args: &[&str], cmd: &str) -> Result<(String, bool), String> {
    if args.len() < 2 {
        return Err(format!("usage: tdk {} <id> [--strict]", cmd));
    }
    let id = args[1].to_string();
    let mut strict = false;
    for a in &args[2..] {
        match *a {
            "--strict" => strict = true,
            other => return Err(format!("unknown flag for {}: '{}'", cmd, other)),
        }
    }
    Ok((id, strict))
}

fn parse_one_path(args: &[&str], cmd: &str) -> Result<PathBuf, String> {
    if args.len() != 2 {
        return Err(format!("usage: tdk {} <path>", cmd));
    }
    Ok(PathBuf::from(args[1]))
}

fn take_arg(rest: &[&str], i: usize, flag: &str) -> Result<String, String> {
    rest.get(i)
        .map(|s| s.to_string())
        .ok_or_else(|| format!("{} expects a value", flag))
}

fn take_usize(rest: &[&str], i: usize, flag: &str) -> Result<usize, String> {
    take_arg(rest, i, flag)?
        .parse::<usize>()
        .map_err(|_| format!("{} expects a number", flag))
}
