//! telemetry/mod.rs
//! Per-call telemetry: location counters, stage timers, and immutable snapshots.
//!
//! Notes:
//! - The engine keeps no state between calls, so every embed/extract builds
//!   its own counters and hands back a snapshot inside its report.
//! - The batch runner merges snapshots from its workers.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
