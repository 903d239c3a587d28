//! src/telemetry/snapshot.rs
//!
//! Immutable telemetry snapshot handed back in embed/extract reports.

use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{Stage, StageTimes, TelemetryTimer};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub counters: TelemetryCounters,
    pub compression_ratio: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, timer: &TelemetryTimer) -> Self {
        let compression_ratio = if counters.bytes_plaintext > 0 {
            counters.bytes_compressed as f64 / counters.bytes_plaintext as f64
        } else {
            0.0
        };

        Self {
            counters: counters.clone(),
            compression_ratio,
            elapsed: timer.elapsed(),
            stage_times: timer.stage_times.clone(),
        }
    }

    /// Fold another snapshot into this one (batch totals).
    pub fn merge(&mut self, other: &TelemetrySnapshot) {
        self.counters.merge(&other.counters);
        self.stage_times.merge(&other.stage_times);
        self.elapsed += other.elapsed;
        self.compression_ratio = if self.counters.bytes_plaintext > 0 {
            self.counters.bytes_compressed as f64 / self.counters.bytes_plaintext as f64
        } else {
            0.0
        };
    }

    pub fn stage_ms(&self, stage: Stage) -> f64 {
        self.stage_times.get_ms(stage)
    }

    /// Sanity check: no stage can take longer than the whole call.
    pub fn sanity_check(&self) -> bool {
        self.stage_times.iter().all(|(_, d)| *d <= self.elapsed)
    }
}
