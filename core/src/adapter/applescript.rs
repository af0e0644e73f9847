//! AppleScript automation adapter for the host terminal application.
//!
//! `ScriptBuilder` produces AppleScript source strings addressing sessions by
//! display name, first match wins — the host's own resolution rule. It never
//! executes anything; `AppleScriptAdapter` feeds the scripts to `osascript`
//! through a `CommandRunner`, which is where the only process spawning in
//! this crate happens.
//!
//! Scripts that need a target session print the sentinel `__no_match__` when
//! no open session carries the requested name, which the adapter maps to
//! `AdapterError::TargetMissing`.

use super::runner::CommandRunner;
use super::{SessionRef, TerminalAdapter};
use crate::error::AdapterError;

/// Sentinel printed by scripts when no session matched the selector.
const NO_MATCH: &str = "__no_match__";

// ---------------------------------------------------------------------------
// Script builder
// ---------------------------------------------------------------------------

/// Builds AppleScript source strings without executing them.
pub struct ScriptBuilder {
    app: String,
}

impl ScriptBuilder {
    pub fn new(app: &str) -> Self {
        ScriptBuilder { app: app.into() }
    }

    /// Create a new window, name its session, and optionally seed a command.
    pub fn create_session(&self, name: &str, command: Option<&str>) -> String {
        let seed = match command {
            Some(cmd) => format!("\n        write text \"{}\"", escape(cmd)),
            None => String::new(),
        };
        format!(
            "tell application \"{app}\"\n\
             \x20   set newWindow to (create window with default profile)\n\
             \x20   tell current session of newWindow\n\
             \x20       set name to \"{name}\"{seed}\n\
             \x20   end tell\n\
             \x20   return id of newWindow\n\
             end tell",
            app = escape(&self.app),
            name = escape(name),
            seed = seed,
        )
    }

    /// Enumerate every open session as `name<TAB>window-id` lines.
    pub fn list_sessions(&self) -> String {
        format!(
            "set out to \"\"\n\
             tell application \"{app}\"\n\
             \x20   repeat with w in windows\n\
             \x20       repeat with t in tabs of w\n\
             \x20           repeat with s in sessions of t\n\
             \x20               set out to out & (name of s) & tab & (id of w) & linefeed\n\
             \x20           end repeat\n\
             \x20       end repeat\n\
             \x20   end repeat\n\
             end tell\n\
             return out",
            app = escape(&self.app),
        )
    }

    /// Inject a submitted line of text into the first session named `name`.
    pub fn write_text(&self, name: &str, text: &str) -> String {
        self.with_target(name, &format!("tell s to write text \"{}\"", escape(text)))
    }

    /// Send an interrupt keystroke (ETX) to the first session named `name`.
    pub fn send_interrupt(&self, name: &str) -> String {
        self.with_target(name, "tell s to write text (character id 3) newline NO")
    }

    /// Return the visible text of the first session named `name`.
    pub fn read_output(&self, name: &str) -> String {
        self.with_target(name, "return text of s")
    }

    /// Close the first session named `name`. Prints `closed` on success.
    pub fn close_session(&self, name: &str) -> String {
        self.with_target(name, "tell s to close\n                    return \"closed\"")
    }

    /// Wrap `action` in a first-match lookup over all open sessions.
    fn with_target(&self, name: &str, action: &str) -> String {
        format!(
            "tell application \"{app}\"\n\
             \x20   repeat with w in windows\n\
             \x20       repeat with t in tabs of w\n\
             \x20           repeat with s in sessions of t\n\
             \x20               if name of s is \"{name}\" then\n\
             \x20                   {action}\n\
             \x20                   return \"ok\"\n\
             \x20               end if\n\
             \x20           end repeat\n\
             \x20       end repeat\n\
             \x20   end repeat\n\
             end tell\n\
             return \"{no_match}\"",
            app = escape(&self.app),
            name = escape(name),
            action = action,
            no_match = NO_MATCH,
        )
    }
}

/// Escape a string for embedding in a double-quoted AppleScript literal.
pub fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Production `TerminalAdapter` driving the host via `osascript`.
pub struct AppleScriptAdapter<R: CommandRunner> {
    builder: ScriptBuilder,
    runner: R,
}

impl<R: CommandRunner> AppleScriptAdapter<R> {
    pub fn new(app: &str, runner: R) -> Self {
        AppleScriptAdapter {
            builder: ScriptBuilder::new(app),
            runner,
        }
    }

    fn run_script(&self, script: &str) -> Result<String, AdapterError> {
        self.runner
            .run("osascript", &["-e".into(), script.into()])
            .map_err(|reason| {
                if reason.contains("isn't running") || reason.contains("not running") {
                    AdapterError::HostUnreachable { reason }
                } else {
                    AdapterError::CommandFailed { reason }
                }
            })
    }

    /// Run a first-match script, mapping the no-match sentinel to an error.
    fn run_targeted(&self, script: &str, name: &str) -> Result<String, AdapterError> {
        let out = self.run_script(script)?;
        if out.trim() == NO_MATCH {
            Err(AdapterError::TargetMissing { name: name.into() })
        } else {
            Ok(out)
        }
    }
}

impl<R: CommandRunner> TerminalAdapter for AppleScriptAdapter<R> {
    fn create_session(
        &mut self,
        name: &str,
        command: Option<&str>,
    ) -> Result<SessionRef, AdapterError> {
        let out = self.run_script(&self.builder.create_session(name, command))?;
        Ok(SessionRef {
            name: name.into(),
            handle: out.trim().to_string(),
        })
    }

    fn write(&mut self, selector: &str, text: &str) -> Result<(), AdapterError> {
        self.run_targeted(&self.builder.write_text(selector, text), selector)
            .map(|_| ())
    }

    fn interrupt(&mut self, selector: &str) -> Result<(), AdapterError> {
        self.run_targeted(&self.builder.send_interrupt(selector), selector)
            .map(|_| ())
    }

    fn read_output(&mut self, selector: &str) -> Result<String, AdapterError> {
        self.run_targeted(&self.builder.read_output(selector), selector)
    }

    fn close(&mut self, selector: &str) -> Result<bool, AdapterError> {
        let out = self.run_script(&self.builder.close_session(selector))?;
        Ok(out.trim() != NO_MATCH)
    }

    fn lookup_by_name(&mut self, name: &str) -> Result<Vec<SessionRef>, AdapterError> {
        let out = self.run_script(&self.builder.list_sessions())?;
        Ok(out
            .lines()
            .filter_map(|line| {
                let (session, handle) = line.split_once('\t')?;
                if session == name {
                    Some(SessionRef {
                        name: session.to_string(),
                        handle: handle.trim().to_string(),
                    })
                } else {
                    None
                }
            })
            .collect())
    }
}
