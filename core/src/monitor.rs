//! Health monitor — per-session polling loops with bounded auto-restart.
//!
//! Each watched session gets its own loop: read the tail window through the
//! adapter, classify it, and advance a six-state machine. The transition
//! logic is a pure function (`advance`) so the state machine is testable
//! without threads or sleeps; `WatchLoop::tick` adds the side effects
//! (adapter read, registry restart) and `WatchLoop::run` adds the schedule.
//!
//! A per-tick adapter failure counts as "cannot prove health" and is treated
//! exactly like a degraded classification. A persistence failure during a
//! restart attempt stops that one watch instance: continuing against a
//! registry we can no longer trust would hide real state.
//!
//! Cancellation: every loop polls an `Arc<AtomicBool>` stop flag between
//! wait slices, so `WatchSupervisor::stop_all` interrupts all loops without
//! tearing down the process and without a registry write in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::adapter::TerminalAdapter;
use crate::classify::{Classifier, DEFAULT_TAIL_LINES};
use crate::error::{Result, SupervisorError};
use crate::registry::Registry;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Watch loop states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchState {
    /// Waiting for the next tick.
    Idle,
    /// A check is in progress.
    Checking,
    /// Last check saw a readiness match and no errors.
    Healthy,
    /// Last check saw errors without readiness, or the adapter failed.
    Degraded { reason: String },
    /// A restart is about to be issued (attempt number is 1-based).
    RestartPending { attempt: u32 },
    /// Restart budget consumed; the loop has stopped ticking.
    Exhausted,
}

/// What one health check concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Healthy,
    Degraded { reason: String },
    /// The adapter call itself failed — equivalent to Degraded.
    AdapterFailed { reason: String },
}

/// Watch loop parameters.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub interval: Duration,
    pub auto_restart: bool,
    pub max_restarts: u32,
    /// Delay after a restart before the next check.
    pub settle: Duration,
    pub tail_lines: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            interval: Duration::from_secs(5),
            auto_restart: false,
            max_restarts: 3,
            settle: Duration::from_secs(2),
            tail_lines: DEFAULT_TAIL_LINES,
        }
    }
}

/// Pure transition function: the state after one check outcome.
///
/// `restarts_used` is the number of restart attempts already performed.
pub fn advance(
    outcome: &CheckOutcome,
    restarts_used: u32,
    cfg: &WatchConfig,
) -> WatchState {
    match outcome {
        CheckOutcome::Healthy => WatchState::Healthy,
        CheckOutcome::Degraded { reason } | CheckOutcome::AdapterFailed { reason } => {
            if !cfg.auto_restart {
                WatchState::Degraded {
                    reason: reason.clone(),
                }
            } else if restarts_used < cfg.max_restarts {
                WatchState::RestartPending {
                    attempt: restarts_used + 1,
                }
            } else {
                WatchState::Exhausted
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Watch loop
// ---------------------------------------------------------------------------

/// How a watch loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Stopped by the cancellation flag.
    Stopped,
    /// Restart budget consumed.
    Exhausted { restarts: u32 },
}

/// One session's polling loop. Ticks are strictly sequential; the loop only
/// touches its own restart counter and its own session's record.
pub struct WatchLoop {
    session_id: String,
    cfg: WatchConfig,
    classifier: Classifier,
    stop: Arc<AtomicBool>,
    state: WatchState,
    restarts_used: u32,
}

impl WatchLoop {
    pub fn new(
        session_id: &str,
        cfg: WatchConfig,
        classifier: Classifier,
        stop: Arc<AtomicBool>,
    ) -> Self {
        WatchLoop {
            session_id: session_id.to_string(),
            cfg,
            classifier,
            stop,
            state: WatchState::Idle,
            restarts_used: 0,
        }
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    pub fn restarts_used(&self) -> u32 {
        self.restarts_used
    }

    /// Run one tick: check, advance, and perform a pending restart.
    ///
    /// Errors returned here are fatal to the watch instance: an unknown or
    /// closed session, or a persistence failure during a restart attempt.
    pub fn tick(
        &mut self,
        registry: &mut Registry,
        adapter: &mut dyn TerminalAdapter,
    ) -> Result<&WatchState> {
        self.state = WatchState::Checking;

        let outcome = match registry.read(adapter, &self.session_id, self.cfg.tail_lines) {
            Ok(tail) => {
                let verdict = self.classifier.classify(&tail);
                if verdict.running && !verdict.has_errors {
                    CheckOutcome::Healthy
                } else {
                    CheckOutcome::Degraded {
                        reason: verdict
                            .last_error
                            .unwrap_or_else(|| "no readiness signal".into()),
                    }
                }
            }
            Err(SupervisorError::Adapter(e)) => CheckOutcome::AdapterFailed {
                reason: e.to_string(),
            },
            // NotFound (session gone) or persistence trouble ends the watch.
            Err(e) => return Err(e),
        };

        self.state = advance(&outcome, self.restarts_used, &self.cfg);
        tracing::debug!(
            session = %self.session_id,
            state = ?self.state,
            "health check"
        );

        if let WatchState::RestartPending { attempt } = self.state {
            tracing::warn!(
                session = %self.session_id,
                attempt,
                max = self.cfg.max_restarts,
                "degraded, restarting"
            );
            match registry.restart(adapter, &self.session_id) {
                Ok(()) => {}
                Err(SupervisorError::Adapter(e)) => {
                    // The restart itself could not reach the host; the next
                    // check will see the session still degraded.
                    tracing::warn!(session = %self.session_id, error = %e, "restart failed");
                }
                Err(e) => return Err(e),
            }
            self.restarts_used += 1;
            self.wait(self.cfg.settle);
            self.state = WatchState::Checking;
        }

        if self.state == WatchState::Exhausted {
            tracing::error!(
                session = %self.session_id,
                restarts = self.restarts_used,
                "restart budget exhausted, watch stopped"
            );
        }
        Ok(&self.state)
    }

    /// Poll until cancelled or exhausted.
    pub fn run(
        &mut self,
        registry: &mut Registry,
        adapter: &mut dyn TerminalAdapter,
    ) -> Result<WatchOutcome> {
        loop {
            if self.stop.load(Ordering::Relaxed) {
                return Ok(WatchOutcome::Stopped);
            }
            self.tick(registry, adapter)?;
            if self.state == WatchState::Exhausted {
                return Ok(WatchOutcome::Exhausted {
                    restarts: self.restarts_used,
                });
            }
            if !self.wait(self.cfg.interval) {
                return Ok(WatchOutcome::Stopped);
            }
        }
    }

    /// Sleep in short slices, returning false if cancelled meanwhile.
    fn wait(&self, total: Duration) -> bool {
        let slice = Duration::from_millis(100);
        let mut remaining = total;
        while remaining > Duration::ZERO {
            if self.stop.load(Ordering::Relaxed) {
                return false;
            }
            let step = remaining.min(slice);
            thread::sleep(step);
            remaining = remaining.saturating_sub(step);
        }
        !self.stop.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Supervisor over watch threads
// ---------------------------------------------------------------------------

/// Handle to one spawned watch thread.
struct WatchHandle {
    session_id: String,
    stop: Arc<AtomicBool>,
    join: JoinHandle<Result<WatchOutcome>>,
}

/// Owns one watch thread per monitored session and can stop them all
/// without terminating the process.
#[derive(Default)]
pub struct WatchSupervisor {
    handles: Vec<WatchHandle>,
}

impl WatchSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a watch loop for one session on its own thread.
    ///
    /// `env` builds the thread's registry handle and adapter inside the
    /// thread, so each loop owns its resources outright.
    pub fn spawn<F>(
        &mut self,
        session_id: &str,
        cfg: WatchConfig,
        classifier: Classifier,
        env: F,
    ) where
        F: FnOnce() -> Result<(Registry, Box<dyn TerminalAdapter + Send>)>
            + Send
            + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let id = session_id.to_string();
        let join = thread::spawn(move || {
            let (mut registry, mut adapter) = env()?;
            let mut watch = WatchLoop::new(&id, cfg, classifier, thread_stop);
            watch.run(&mut registry, adapter.as_mut())
        });
        self.handles.push(WatchHandle {
            session_id: session_id.to_string(),
            stop,
            join,
        });
    }

    pub fn watched(&self) -> Vec<&str> {
        self.handles.iter().map(|h| h.session_id.as_str()).collect()
    }

    /// Signal every loop to stop and collect their outcomes.
    pub fn stop_all(self) -> Vec<(String, Result<WatchOutcome>)> {
        for h in &self.handles {
            h.stop.store(true, Ordering::Relaxed);
        }
        self.handles
            .into_iter()
            .map(|h| {
                let outcome = h
                    .join
                    .join()
                    .unwrap_or_else(|_| Err(SupervisorError::config("watch thread panicked")));
                (h.session_id, outcome)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::mock::MockAdapter;
    use crate::registry::{CreateOpts, Registry};

    fn fast_cfg(auto_restart: bool, max_restarts: u32) -> WatchConfig {
        WatchConfig {
            interval: Duration::from_millis(1),
            auto_restart,
            max_restarts,
            settle: Duration::ZERO,
            tail_lines: DEFAULT_TAIL_LINES,
        }
    }

    fn setup(command: &str) -> (Registry, MockAdapter, String, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = Registry::open(dir.path().join("registry.json")).unwrap();
        let mut adapter = MockAdapter::new();
        let id = reg
            .create(
                &mut adapter,
                "web",
                CreateOpts {
                    group: Some("dev".into()),
                    command: Some(command.into()),
                },
            )
            .unwrap();
        (reg, adapter, id, dir)
    }

    #[test]
    fn advance_healthy() {
        let cfg = fast_cfg(true, 3);
        assert_eq!(advance(&CheckOutcome::Healthy, 0, &cfg), WatchState::Healthy);
    }

    #[test]
    fn advance_degraded_without_auto_restart_stays_degraded() {
        let cfg = fast_cfg(false, 3);
        let s = advance(
            &CheckOutcome::Degraded {
                reason: "npm ERR!".into(),
            },
            0,
            &cfg,
        );
        assert!(matches!(s, WatchState::Degraded { .. }));
    }

    #[test]
    fn advance_adapter_failure_counts_as_degraded() {
        let cfg = fast_cfg(true, 3);
        let s = advance(
            &CheckOutcome::AdapterFailed {
                reason: "host down".into(),
            },
            0,
            &cfg,
        );
        assert_eq!(s, WatchState::RestartPending { attempt: 1 });
    }

    #[test]
    fn advance_exhausts_after_budget() {
        let cfg = fast_cfg(true, 2);
        let degraded = CheckOutcome::Degraded { reason: "e".into() };
        assert_eq!(
            advance(&degraded, 1, &cfg),
            WatchState::RestartPending { attempt: 2 }
        );
        assert_eq!(advance(&degraded, 2, &cfg), WatchState::Exhausted);
    }

    #[test]
    fn tick_healthy_session() {
        let (mut reg, mut adapter, id, _dir) = setup("npm start");
        adapter.set_capture("web", "Server listening on 3000");
        let mut watch = WatchLoop::new(
            &id,
            fast_cfg(true, 3),
            Classifier::with_defaults(),
            Arc::new(AtomicBool::new(false)),
        );
        watch.tick(&mut reg, &mut adapter).unwrap();
        assert_eq!(watch.state(), &WatchState::Healthy);
        assert_eq!(watch.restarts_used(), 0);
    }

    #[test]
    fn three_degraded_ticks_two_restarts_then_exhausted() {
        let (mut reg, mut adapter, id, _dir) = setup("npm start");
        adapter.set_capture("web", "npm ERR! missing script: start");
        let mut watch = WatchLoop::new(
            &id,
            fast_cfg(true, 2),
            Classifier::with_defaults(),
            Arc::new(AtomicBool::new(false)),
        );

        watch.tick(&mut reg, &mut adapter).unwrap();
        assert_eq!(watch.restarts_used(), 1);
        watch.tick(&mut reg, &mut adapter).unwrap();
        assert_eq!(watch.restarts_used(), 2);
        watch.tick(&mut reg, &mut adapter).unwrap();
        assert_eq!(watch.state(), &WatchState::Exhausted);
        // Exactly two restart attempts reached the session.
        assert_eq!(adapter.interrupts_for("web"), 2);
        assert_eq!(watch.restarts_used(), 2);
    }

    #[test]
    fn degraded_without_auto_restart_never_restarts() {
        let (mut reg, mut adapter, id, _dir) = setup("npm start");
        adapter.set_capture("web", "Error: bind failed");
        let mut watch = WatchLoop::new(
            &id,
            fast_cfg(false, 3),
            Classifier::with_defaults(),
            Arc::new(AtomicBool::new(false)),
        );
        for _ in 0..5 {
            watch.tick(&mut reg, &mut adapter).unwrap();
            assert!(matches!(watch.state(), WatchState::Degraded { .. }));
        }
        assert_eq!(adapter.interrupts_for("web"), 0);
    }

    #[test]
    fn adapter_read_failure_is_degraded_not_fatal() {
        let (mut reg, mut adapter, id, _dir) = setup("npm start");
        adapter.fail_reads_for("web");
        let mut watch = WatchLoop::new(
            &id,
            fast_cfg(false, 3),
            Classifier::with_defaults(),
            Arc::new(AtomicBool::new(false)),
        );
        watch.tick(&mut reg, &mut adapter).unwrap();
        assert!(matches!(watch.state(), WatchState::Degraded { .. }));
    }

    #[test]
    fn unknown_session_is_fatal_to_the_watch() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = Registry::open(dir.path().join("registry.json")).unwrap();
        let mut adapter = MockAdapter::new();
        let mut watch = WatchLoop::new(
            "s-99",
            fast_cfg(false, 3),
            Classifier::with_defaults(),
            Arc::new(AtomicBool::new(false)),
        );
        assert!(watch.tick(&mut reg, &mut adapter).is_err());
    }

    #[test]
    fn run_stops_on_cancellation() {
        let (mut reg, mut adapter, id, _dir) = setup("npm start");
        adapter.set_capture("web", "Server listening on 3000");
        let stop = Arc::new(AtomicBool::new(false));
        stop.store(true, Ordering::Relaxed);
        let mut watch = WatchLoop::new(
            &id,
            fast_cfg(false, 3),
            Classifier::with_defaults(),
            Arc::clone(&stop),
        );
        let outcome = watch.run(&mut reg, &mut adapter).unwrap();
        assert_eq!(outcome, WatchOutcome::Stopped);
    }

    #[test]
    fn run_returns_exhausted() {
        let (mut reg, mut adapter, id, _dir) = setup("npm start");
        adapter.set_capture("web", "npm ERR! missing script: start");
        let mut watch = WatchLoop::new(
            &id,
            fast_cfg(true, 1),
            Classifier::with_defaults(),
            Arc::new(AtomicBool::new(false)),
        );
        let outcome = watch.run(&mut reg, &mut adapter).unwrap();
        assert_eq!(outcome, WatchOutcome::Exhausted { restarts: 1 });
    }

    #[test]
    fn supervisor_stops_spawned_loops() {
        let (reg, mut adapter, id, dir) = setup("npm start");
        adapter.set_capture("web", "Server listening on 3000");
        drop(reg);
        let path = dir.path().join("registry.json");

        let mut sup = WatchSupervisor::new();
        sup.spawn(
            &id,
            fast_cfg(false, 3),
            Classifier::with_defaults(),
            move || {
                let registry = Registry::open(&path)?;
                Ok((registry, Box::new(adapter) as Box<dyn TerminalAdapter + Send>))
            },
        );
        assert_eq!(sup.watched(), vec![id.as_str()]);

        // Give the loop a moment to tick, then cancel.
        thread::sleep(Duration::from_millis(20));
        let outcomes = sup.stop_all();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].1.as_ref().unwrap(), &WatchOutcome::Stopped);
    }
}
