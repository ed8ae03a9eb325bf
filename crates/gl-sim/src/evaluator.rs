//! Bounded-pool parallel evaluation of one candidate configuration.
//!
//! Each job builds its own season runner, plays a full season, and reports
//! back over a channel. One job's failure is logged and excluded from the
//! result list; siblings keep running. Per-season state drops at the end of
//! each job, bounding peak memory without any collector involvement.

use std::thread;

use crossbeam_channel::{bounded, unbounded};
use parking_lot::Mutex;
use tracing::{debug, error};

use gl_types::{GlResult, SeasonOutcome};

use crate::league::SeasonRunner;

/// Progress observer: `(completed_count, total_count)` after each finished
/// simulation, in completion order.
pub type ProgressFn = Box<dyn Fn(usize, usize) + Send + Sync>;

struct Progress {
    completed: Mutex<usize>,
    callback: ProgressFn,
}

impl Progress {
    /// Invoked from worker threads; the mutex serializes both the counter
    /// bump and the callback.
    fn bump(&self, total: usize) {
        let mut completed = self.completed.lock();
        *completed += 1;
        (self.callback)(*completed, total);
    }
}

/// Runs many independent season simulations for one candidate on a bounded
/// worker pool.
pub struct ParallelEvaluator {
    max_workers: usize,
    progress: Option<Progress>,
}

impl ParallelEvaluator {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressFn) -> Self {
        self.progress = Some(Progress {
            completed: Mutex::new(0),
            callback,
        });
        self
    }

    /// Run `n_simulations` seasons, each built by `make_runner(sim_index)`.
    /// Returns the successful outcomes (unordered; aggregation downstream is
    /// commutative). `n_simulations == 0` returns empty without spawning.
    pub fn evaluate<F, R>(&self, make_runner: F, n_simulations: usize) -> Vec<SeasonOutcome>
    where
        F: Fn(usize) -> GlResult<R> + Sync,
        R: SeasonRunner,
    {
        if n_simulations == 0 {
            return Vec::new();
        }

        let workers = self.max_workers.min(n_simulations);
        let (job_tx, job_rx) = bounded::<usize>(n_simulations);
        let (result_tx, result_rx) = unbounded::<Result<SeasonOutcome, gl_types::GlError>>();
        for index in 0..n_simulations {
            // Channel has capacity for every job.
            let _ = job_tx.send(index);
        }
        drop(job_tx);

        let mut outcomes = Vec::with_capacity(n_simulations);
        thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let make_runner = &make_runner;
                let progress = self.progress.as_ref();
                scope.spawn(move || {
                    while let Ok(index) = job_rx.recv() {
                        let result = run_one(make_runner, index);
                        if let Some(progress) = progress {
                            progress.bump(n_simulations);
                        }
                        if result_tx.send(result).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(result_tx);

            for result in result_rx.iter() {
                match result {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => error!(error = %e, "season simulation failed; excluding from batch"),
                }
            }
        });

        debug!(
            requested = n_simulations,
            succeeded = outcomes.len(),
            "candidate evaluation batch complete"
        );
        outcomes
    }
}

/// One job: build the runner, draft, play. `cleanup` runs on every path.
fn run_one<F, R>(make_runner: &F, index: usize) -> Result<SeasonOutcome, gl_types::GlError>
where
    F: Fn(usize) -> GlResult<R>,
    R: SeasonRunner,
{
    let mut runner = make_runner(index)?;
    let result = runner.run_draft().and_then(|_| runner.run_season());
    let outcome = runner.outcome();
    runner.cleanup();
    result.map(|_| outcome)
}
