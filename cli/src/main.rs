//! tdk — the command-line entry point for termdeck.
//!
//! # Usage
//!
//! ```text
//! tdk create web --group dev --command "npm start"
//! tdk status
//! tdk watch s-1 --auto-restart --max-restarts 3
//! tdk collect-all --output-dir ./logs
//! ```

use std::path::PathBuf;
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use termdeck_core::adapter::applescript::AppleScriptAdapter;
use termdeck_core::adapter::runner::ProcessRunner;
use termdeck_core::adapter::AmbiguityPolicy;
use termdeck_core::classify::{Classifier, DEFAULT_TAIL_LINES};
use termdeck_core::cli::{parse_args, USAGE};
use termdeck_core::collector::{self, CollectOpts, DEFAULT_COLLECT_LINES};
use termdeck_core::command::Command;
use termdeck_core::config;
use termdeck_core::error::{Result, SupervisorError};
use termdeck_core::monitor::{WatchConfig, WatchLoop, WatchOutcome};
use termdeck_core::registry::{BulkReport, CreateOpts, Registry};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let arg_refs: Vec<&str> = args[1..].iter().map(|s| s.as_str()).collect();

    let cmd = match parse_args(&arg_refs) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("tdk: {}", e);
            process::exit(1);
        }
    };

    if matches!(cmd, Command::Help) {
        print!("{}", USAGE);
        return;
    }

    if let Err(e) = run(cmd) {
        eprintln!("tdk: {}", e);
        process::exit(1);
    }
}

fn run(cmd: Command) -> Result<()> {
    let mut registry = Registry::open(config::registry_path())?;
    let mut adapter = AppleScriptAdapter::new(config::HOST_APP, ProcessRunner);

    match cmd {
        Command::Create {
            name,
            group,
            command,
        } => {
            let id = registry.create(&mut adapter, &name, CreateOpts { group, command })?;
            println!("{}", id);
        }
        Command::List { group } => {
            for r in registry.list(group.as_deref())? {
                println!("{}\t{}\t{}\t{:?}", r.id, r.name, r.group, r.status);
            }
        }
        Command::Get { id } => {
            let record = registry.get(&id)?;
            let json = serde_json::to_string_pretty(record)
                .map_err(|e| SupervisorError::config(format!("cannot render record: {}", e)))?;
            println!("{}", json);
        }
        Command::Execute { id, text, strict } => {
            if strict {
                registry.set_policy(AmbiguityPolicy::Strict);
            }
            registry.execute(&mut adapter, &id, &text)?;
        }
        Command::Read { id, lines } => {
            let text = registry.read(&mut adapter, &id, lines.unwrap_or(DEFAULT_TAIL_LINES))?;
            println!("{}", text);
        }
        Command::Close { id, strict } => {
            if strict {
                registry.set_policy(AmbiguityPolicy::Strict);
            }
            registry.close(&mut adapter, &id)?;
        }
        Command::Restart { id, strict } => {
            if strict {
                registry.set_policy(AmbiguityPolicy::Strict);
            }
            registry.restart(&mut adapter, &id)?;
        }
        Command::Save { path } => {
            registry.save_to(&path)?;
            println!("saved registry to {}", path.display());
        }
        Command::Restore { path } => {
            let report = registry.restore_from(&mut adapter, &path)?;
            print_bulk("restored", &report);
        }
        Command::GroupStart { name } => {
            let report = registry.start_group(&mut adapter, &name)?;
            print_bulk("started", &report);
        }
        Command::GroupStop { name } => {
            let report = registry.stop_group(&mut adapter, &name)?;
            print_bulk("stopped", &report);
        }
        Command::Watch {
            id,
            interval_secs,
            auto_restart,
            max_restarts,
            patterns,
        } => {
            let defaults = WatchConfig::default();
            let cfg = WatchConfig {
                interval: interval_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.interval),
                auto_restart,
                max_restarts: max_restarts.unwrap_or(defaults.max_restarts),
                ..defaults
            };
            let mut watch = WatchLoop::new(
                &id,
                cfg,
                load_classifier(patterns)?,
                Arc::new(AtomicBool::new(false)),
            );
            match watch.run(&mut registry, &mut adapter)? {
                WatchOutcome::Stopped => {}
                WatchOutcome::Exhausted { restarts } => {
                    return Err(SupervisorError::Exhausted { restarts });
                }
            }
        }
        Command::Check { id, patterns } => {
            let classifier = load_classifier(patterns)?;
            let tail = registry.read(&mut adapter, &id, DEFAULT_TAIL_LINES)?;
            let v = classifier.classify(&tail);
            println!("running: {}", v.running);
            println!("errors:  {}", v.has_errors);
            if let Some(last) = &v.last_error {
                println!("last:    {}", last);
            }
        }
        Command::Logs { id, lines, output } => {
            let opts = CollectOpts {
                lines: lines.unwrap_or(DEFAULT_COLLECT_LINES),
                output_path: output,
            };
            let snapshot = collector::collect(&mut registry, &mut adapter, &id, &opts)?;
            match &snapshot.path {
                Some(p) => println!("wrote {}", p.display()),
                None => println!("{}", snapshot.text),
            }
        }
        Command::CollectAll { output_dir } => {
            let report = collector::collect_all(
                &mut registry,
                &mut adapter,
                output_dir.as_deref(),
                DEFAULT_COLLECT_LINES,
            )?;
            for p in &report.written {
                println!("wrote {}", p.display());
            }
            if report.written.is_empty() {
                println!("collected {} snapshots", report.snapshots.len());
            }
            for f in &report.failures {
                eprintln!("tdk: {} ({}): {}", f.id, f.name, f.reason);
            }
        }
        Command::Status { patterns } => {
            let classifier = load_classifier(patterns)?;
            let rows = collector::status(
                &mut registry,
                &mut adapter,
                &classifier,
                DEFAULT_TAIL_LINES,
            )?;
            for r in rows {
                let health = match &r.read_error {
                    Some(e) => format!("unreadable ({})", e),
                    None => match (r.running, r.has_errors) {
                        (true, false) => "healthy".to_string(),
                        (true, true) => format!(
                            "running, stale error: {}",
                            r.last_error.as_deref().unwrap_or("?")
                        ),
                        (false, true) => {
                            format!("degraded: {}", r.last_error.as_deref().unwrap_or("?"))
                        }
                        (false, false) => "no readiness signal".to_string(),
                    },
                };
                println!(
                    "{}\t{}\t{}\t{:?}\t{}",
                    r.id, r.name, r.group, r.status, health
                );
            }
        }
        Command::Clear => {
            registry.clear()?;
        }
        Command::Help => unreachable!("handled in main"),
    }
    Ok(())
}

fn load_classifier(patterns: Option<PathBuf>) -> Result<Classifier> {
    match patterns {
        Some(p) => Classifier::from_file(&p),
        None => Ok(Classifier::with_defaults()),
    }
}

fn print_bulk(verb: &str, report: &BulkReport) {
    for id in &report.completed {
        println!("{} {}", verb, id);
    }
    for (id, reason) in &report.failures {
        eprintln!("tdk: {}: {}", id, reason);
    }
}
