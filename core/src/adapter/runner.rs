//! Process runner abstraction for host automation commands.
//!
//! `CommandRunner` is the trait the AppleScript adapter uses to actually
//! execute automation binaries. `ProcessRunner` is the production
//! implementation that spawns the program directly (no shell in between, so
//! script bodies need no shell escaping). `MockRunner` records calls and
//! serves preset responses for tests.

use std::process::Command;
use std::sync::Mutex;

/// Trait for executing an automation program with arguments.
pub trait CommandRunner: Send {
    /// Run `program` with `args`, returning stdout on success or a
    /// human-readable reason on failure.
    fn run(&self, program: &str, args: &[String]) -> Result<String, String>;
}

/// Production runner that spawns the program as a child process.
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String, String> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| format!("failed to launch {}: {}", program, e))?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }
}

/// Test-double runner that records invocations and replays canned responses.
///
/// Responses are served in the order they were supplied; once they run out,
/// further calls succeed with empty output.
pub struct MockRunner {
    responses: Mutex<Vec<Result<String, String>>>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl MockRunner {
    pub fn new() -> Self {
        MockRunner {
            responses: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_responses(responses: Vec<Result<String, String>>) -> Self {
        let mut reversed = responses;
        reversed.reverse();
        MockRunner {
            responses: Mutex::new(reversed),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// All `(program, args)` pairs run so far.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String, String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((program.to_string(), args.to_vec()));
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut r| r.pop())
            .unwrap_or_else(|| Ok(String::new()))
    }
}
