//! Output classifier — pattern-based health verdicts over captured text.
//!
//! Two independent ordered rule lists: *readiness* rules run against the full
//! window and short-circuit on the first match; *failure* rules run against
//! every line, collecting all matching lines. The passes are not mutually
//! exclusive — a healthy process can still carry a stale error line in its
//! visible tail.
//!
//! Rules are plain data (serde), so deployments can swap the pattern file
//! without code changes; compiled-in defaults cover the common dev-server and
//! package-manager vocabulary. Callers are expected to pass a bounded tail
//! window, not full session history: errors older than the window age out of
//! visibility by design.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SupervisorError};

/// Number of tail lines classified when the caller does not say otherwise.
pub const DEFAULT_TAIL_LINES: usize = 100;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// One classification rule: a label for reporting plus a regex pattern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub label: String,
    pub pattern: String,
}

impl Rule {
    pub fn new(label: &str, pattern: &str) -> Self {
        Rule {
            label: label.into(),
            pattern: pattern.into(),
        }
    }
}

/// Ordered readiness and failure rule lists, as stored in a pattern file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleSet {
    pub readiness: Vec<Rule>,
    pub failure: Vec<Rule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet {
            readiness: vec![
                Rule::new("listening", r"(?i)listening on"),
                Rule::new("server-up", r"(?i)server (listening|started|running)"),
                Rule::new("ready-in", r"(?i)ready in \d"),
                Rule::new("compiled", r"(?i)compiled successfully"),
                Rule::new("watching", r"(?i)watching for file changes"),
                Rule::new("dev-url", r"(?i)local:\s+https?://"),
                Rule::new("started", r"(?i)started (dev |development )?server"),
            ],
            failure: vec![
                Rule::new("npm-err", r"npm ERR!"),
                Rule::new("error-word", r"(?i)\berror\b"),
                Rule::new("fatal", r"(?i)\bfatal\b"),
                Rule::new("exception", r"(?i)exception"),
                Rule::new("conn-refused", r"ECONNREFUSED|(?i)connection refused"),
                Rule::new("addr-in-use", r"EADDRINUSE|(?i)address already in use"),
                Rule::new("module-missing", r"(?i)cannot find module"),
                Rule::new("panic", r"panicked at|(?i)segmentation fault"),
                Rule::new("traceback", r"Traceback \(most recent call last\)"),
                Rule::new("crash", r"(?i)\bcrash(ed)?\b"),
                Rule::new("cmd-missing", r"(?i)command not found"),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Health verdict over one tail window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub running: bool,
    pub has_errors: bool,
    pub last_error: Option<String>,
    pub error_lines: Vec<String>,
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Compiled classifier. Construction validates every pattern up front so
/// `classify` itself cannot fail.
pub struct Classifier {
    readiness: Vec<(Rule, Regex)>,
    failure: Vec<(Rule, Regex)>,
}

impl Classifier {
    /// Compile a rule set. Invalid patterns are a configuration error.
    pub fn from_rules(rules: RuleSet) -> Result<Self> {
        let compile = |rules: Vec<Rule>| -> Result<Vec<(Rule, Regex)>> {
            rules
                .into_iter()
                .map(|r| {
                    let re = Regex::new(&r.pattern).map_err(|e| {
                        SupervisorError::config(format!(
                            "bad pattern '{}' ({}): {}",
                            r.pattern, r.label, e
                        ))
                    })?;
                    Ok((r, re))
                })
                .collect()
        };
        Ok(Classifier {
            readiness: compile(rules.readiness)?,
            failure: compile(rules.failure)?,
        })
    }

    /// Classifier with the compiled-in default rules.
    pub fn with_defaults() -> Self {
        // Default patterns are known-good literals.
        match Self::from_rules(RuleSet::default()) {
            Ok(c) => c,
            Err(_) => unreachable!("default rule set always compiles"),
        }
    }

    /// Load a rule set from a JSON pattern file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SupervisorError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let rules: RuleSet = serde_json::from_str(&content).map_err(|e| {
            SupervisorError::config(format!("malformed pattern file {}: {}", path.display(), e))
        })?;
        Self::from_rules(rules)
    }

    /// Classify one tail window of captured output.
    pub fn classify(&self, text: &str) -> Verdict {
        let running = self
            .readiness
            .iter()
            .any(|(_, re)| re.is_match(text));

        let mut error_lines = Vec::new();
        for line in text.lines() {
            if self.failure.iter().any(|(_, re)| re.is_match(line)) {
                error_lines.push(line.to_string());
            }
        }

        Verdict {
            running,
            has_errors: !error_lines.is_empty(),
            last_error: error_lines.last().cloned(),
            error_lines,
        }
    }
}

/// The last `lines` lines of `text`, preserving original line content.
pub fn tail_window(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
