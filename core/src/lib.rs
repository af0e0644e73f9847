//! termdeck-core — supervisor for sessions hosted in an external terminal
//! application.
//!
//! The supervisor owns a durable registry of named sessions and groups,
//! drives the host purely through text injection and text reading (no PIDs,
//! no signals), classifies captured output into health verdicts, polls
//! health per session with bounded auto-restart, and batch-collects log
//! snapshots.
//!
//! Layering, leaves first: `classify` is pure; `adapter` is the only code
//! that touches the host; `registry` is the only stateful data component;
//! `monitor` and `collector` compose the three.

pub mod adapter;
pub mod classify;
pub mod cli;
pub mod collector;
pub mod command;
pub mod config;
pub mod error;
pub mod monitor;
pub mod registry;
