//! batch.rs
//! Many independent container jobs on a bounded worker pool.
//!
//! Wiring: feeder -> bounded job channel -> N workers -> result channel -> collector.
//! Each worker opens its own container; only the engine is shared.
//! Results come back in input order.

use std::path::PathBuf;
use std::thread;

use crossbeam::channel::bounded;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::{EmbedReport, Verified, WatermarkEngine};
use crate::record::WatermarkRecord;
use crate::telemetry::TelemetrySnapshot;
use crate::types::WatermarkError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchProfile {
    /// Worker threads; 0 means one per logical CPU.
    pub workers: usize,
    /// Jobs buffered ahead of the workers.
    pub inflight: usize,
}

impl Default for BatchProfile {
    fn default() -> Self {
        Self { workers: 0, inflight: 16 }
    }
}

impl BatchProfile {
    pub fn single_threaded() -> Self {
        Self { workers: 1, inflight: 1 }
    }

    pub fn validate(&self) -> Result<(), WatermarkError> {
        if self.inflight == 0 {
            return Err(WatermarkError::Config("inflight must be at least 1".into()));
        }
        Ok(())
    }

    /// Effective worker count for `jobs` jobs.
    pub fn worker_count(&self, jobs: usize) -> usize {
        let wanted = if self.workers == 0 { num_cpus::get() } else { self.workers };
        wanted.min(jobs).max(1)
    }
}

#[derive(Debug, Clone)]
pub enum BatchOp {
    Embed { record: WatermarkRecord, password: String, output: PathBuf },
    Verify { password: String },
}

#[derive(Debug, Clone)]
pub struct BatchJob {
    pub input: PathBuf,
    pub op: BatchOp,
}

impl BatchJob {
    pub fn embed(input: impl Into<PathBuf>, output: impl Into<PathBuf>, record: WatermarkRecord, password: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            op: BatchOp::Embed { record, password: password.into(), output: output.into() },
        }
    }

    pub fn verify(input: impl Into<PathBuf>, password: impl Into<String>) -> Self {
        Self { input: input.into(), op: BatchOp::Verify { password: password.into() } }
    }
}

#[derive(Debug)]
pub enum BatchOutcome {
    Embedded(EmbedReport),
    Verified(Verified),
}

#[derive(Debug)]
pub struct BatchResult {
    pub input: PathBuf,
    pub outcome: Result<BatchOutcome, WatermarkError>,
}

impl BatchResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

fn run_job(engine: &WatermarkEngine, job: &BatchJob) -> Result<BatchOutcome, WatermarkError> {
    match &job.op {
        BatchOp::Embed { record, password, output } => {
            engine.embed_file(&job.input, output, record, password).map(BatchOutcome::Embedded)
        }
        BatchOp::Verify { password } => engine.verify_file(&job.input, password).map(BatchOutcome::Verified),
    }
}

/// Run `jobs` on a bounded pool. One result per job, in input order.
pub fn run_batch(
    engine: &WatermarkEngine,
    jobs: Vec<BatchJob>,
    profile: &BatchProfile,
) -> Result<Vec<BatchResult>, WatermarkError> {
    profile.validate()?;
    if jobs.is_empty() {
        return Ok(Vec::new());
    }

    let total = jobs.len();
    let workers = profile.worker_count(total);
    debug!(jobs = total, workers, "starting batch");

    let (job_tx, job_rx) = bounded::<(usize, BatchJob)>(profile.inflight);
    let (out_tx, out_rx) = bounded::<(usize, BatchResult)>(profile.inflight);

    let mut slots: Vec<Option<BatchResult>> = (0..total).map(|_| None).collect();

    thread::scope(|scope| {
        // ---- Feeder ----
        scope.spawn(move || {
            for (i, job) in jobs.into_iter().enumerate() {
                if job_tx.send((i, job)).is_err() {
                    break;
                }
            }
        });

        // ---- Workers ----
        for w in 0..workers {
            let rx = job_rx.clone();
            let tx = out_tx.clone();
            scope.spawn(move || {
                for (i, job) in rx.iter() {
                    debug!(worker = w, job = i, input = %job.input.display(), "running job");
                    let outcome = run_job(engine, &job);
                    if tx.send((i, BatchResult { input: job.input, outcome })).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(out_tx);

        // ---- Ordered collector ----
        for (i, result) in out_rx.iter() {
            slots[i] = Some(result);
        }
    });

    let results: Vec<BatchResult> = slots.into_iter().flatten().collect();
    let ok = results.iter().filter(|r| r.is_ok()).count();
    info!(jobs = total, ok, failed = total - ok, "batch finished");
    Ok(results)
}

/// Merged telemetry of every successful embed in `results`.
pub fn batch_telemetry(results: &[BatchResult]) -> TelemetrySnapshot {
    let mut total = TelemetrySnapshot::default();
    for r in results {
        if let Ok(BatchOutcome::Embedded(report)) = &r.outcome {
            total.merge(&report.telemetry);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_count_is_bounded_by_jobs() {
        let p = BatchProfile { workers: 8, inflight: 4 };
        assert_eq!(p.worker_count(3), 3);
        assert_eq!(p.worker_count(0), 1);
        assert!(BatchProfile::default().worker_count(1000) >= 1);
    }

    #[test]
    fn zero_inflight_is_rejected() {
        let p = BatchProfile { workers: 1, inflight: 0 };
        assert!(matches!(p.validate(), Err(WatermarkError::Config(_))));
    }

    #[test]
    fn empty_batch_is_empty() {
        let engine = WatermarkEngine::default();
        assert!(run_batch(&engine, Vec::new(), &BatchProfile::default()).unwrap().is_empty());
    }
}
