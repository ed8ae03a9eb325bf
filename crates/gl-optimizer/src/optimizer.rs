//! The coordinate-descent optimization loop.
//!
//! One parameter at a time: generate candidate values, materialize one full
//! configuration per candidate per horizon, evaluate each across every
//! historical season, adopt the winner into all horizon baselines, and
//! checkpoint. Startup scans the output directory and resumes after the
//! last completed parameter when the checkpoint log is valid.

use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use gl_config::{generate_values, lookup, ConfigSet, Materializer};
use gl_sim::{discover_seasons, LeagueSimulation, ParallelEvaluator, SeasonData};
use gl_types::{ConfigError, GlResult, Horizon, WeekRange};

use crate::checkpoint::{CheckpointStore, ResumeState};
use crate::results::ResultsStore;

/// Cooperative shutdown flag, set from a signal handler and checked between
/// candidates.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Settings for one optimization run.
#[derive(Debug, Clone)]
pub struct OptimizerSettings {
    pub config_dir: PathBuf,
    pub data_root: PathBuf,
    pub output_dir: PathBuf,
    /// Directory of numbered draft-order strategy files.
    pub draft_order_dir: PathBuf,
    pub simulations_per_season: usize,
    pub max_workers: usize,
    pub test_values: usize,
    pub seed: Option<u64>,
}

impl OptimizerSettings {
    pub fn new(
        config_dir: impl Into<PathBuf>,
        data_root: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let config_dir = config_dir.into();
        let draft_order_dir = config_dir.join("draft_order_possibilities");
        Self {
            config_dir,
            data_root: data_root.into(),
            output_dir: output_dir.into(),
            draft_order_dir,
            simulations_per_season: 100,
            max_workers: 4,
            test_values: 5,
            seed: None,
        }
    }

    pub fn with_simulations(mut self, n: usize) -> Self {
        self.simulations_per_season = n;
        self
    }

    pub fn with_workers(mut self, n: usize) -> Self {
        self.max_workers = n.max(1);
        self
    }

    pub fn with_test_values(mut self, n: usize) -> Self {
        self.test_values = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_draft_order_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.draft_order_dir = dir.into();
        self
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// All parameters optimized; path of the final optimal folder.
    Completed(PathBuf),
    /// Shutdown was requested; a best-effort snapshot of the latest
    /// known-good baselines was written.
    Interrupted,
}

pub struct IterativeOptimizer {
    settings: OptimizerSettings,
    checkpoints: CheckpointStore,
    materializer: Materializer,
    shutdown: ShutdownFlag,
    rng: StdRng,
    seed_base: u64,
}

impl IterativeOptimizer {
    pub fn new(settings: OptimizerSettings) -> Self {
        let seed_base = settings.seed.unwrap_or_else(rand::random);
        Self {
            checkpoints: CheckpointStore::new(&settings.output_dir),
            materializer: Materializer::new(&settings.draft_order_dir),
            shutdown: ShutdownFlag::default(),
            rng: StdRng::seed_from_u64(seed_base),
            seed_base,
            settings,
        }
    }

    /// Flag handle for a signal handler to request a graceful stop.
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    /// Drive the full coordinate-descent pass.
    pub fn run(&mut self) -> GlResult<RunOutcome> {
        let order = gl_config::parameter_order();
        let seasons: Vec<Arc<SeasonData>> = discover_seasons(&self.settings.data_root)?
            .into_iter()
            .map(Arc::new)
            .collect();

        let (mut set, start) = match self.checkpoints.detect_resume(&order)? {
            ResumeState::From { next_index, folder } => {
                let set = self.checkpoints.load_folder(&folder)?;
                info!(
                    resumed_at = next_index + 1,
                    total = order.len(),
                    "resuming optimization"
                );
                (set, next_index)
            }
            ResumeState::Fresh => {
                self.checkpoints.cleanup_intermediates();
                let set = ConfigSet::load_from_dir(&self.settings.config_dir)?;
                info!(total = order.len(), "starting optimization from the beginning");
                (set, 0)
            }
        };

        info!(
            parameters = order.len() - start,
            configs_per_parameter = self.settings.test_values + 1,
            simulations_per_season = self.settings.simulations_per_season,
            seasons = seasons.len(),
            "optimization plan"
        );

        let mut last_performance = json!({});
        for (index, param) in order.iter().enumerate().skip(start) {
            if self.shutdown.is_requested() {
                return self.snapshot_and_stop(&set);
            }
            info!(
                parameter = *param,
                position = index + 1,
                total = order.len(),
                "optimizing parameter"
            );
            let Some(performance) = self.optimize_parameter(param, &seasons, &mut set)? else {
                return self.snapshot_and_stop(&set);
            };
            self.checkpoints
                .save_intermediate(index + 1, param, &set, &performance)?;
            last_performance = performance;
        }

        let folder = self.checkpoints.save_optimal(&set, &last_performance)?;
        self.checkpoints.cleanup_intermediates();
        info!(folder = %folder.display(), "optimization complete");
        Ok(RunOutcome::Completed(folder))
    }

    /// Best-effort write of the latest known-good baselines before exit.
    /// Advisory, not transactional: progress since the last checkpoint is
    /// lost and resume falls back to that checkpoint.
    fn snapshot_and_stop(&self, set: &ConfigSet) -> GlResult<RunOutcome> {
        let snapshot = self.checkpoints.output_dir().join("interrupted_snapshot");
        if let Err(e) = set.save_to_dir(&snapshot) {
            warn!(error = %e, "failed to write interruption snapshot");
        } else {
            info!(folder = %snapshot.display(), "wrote interruption snapshot");
        }
        Ok(RunOutcome::Interrupted)
    }

    /// Evaluate one parameter's candidate values across all horizons and
    /// seasons, adopt the winner, and report its performance metrics.
    /// Returns `None` without touching the baselines when shutdown is
    /// requested between candidates.
    fn optimize_parameter(
        &mut self,
        param: &str,
        seasons: &[Arc<SeasonData>],
        set: &mut ConfigSet,
    ) -> GlResult<Option<Value>> {
        let entry = lookup(param).ok_or_else(|| ConfigError::UnknownParameter {
            name: param.to_string(),
        })?;
        let current = set
            .horizon(Horizon::Ros)
            .current_value(entry)
            .ok_or_else(|| ConfigError::InvalidValue {
                parameter: param.to_string(),
                message: "missing from baseline configuration".to_string(),
            })?;

        let values = generate_values(&entry.def, current, self.settings.test_values, &mut self.rng);
        debug!(parameter = param, candidates = values.len(), "generated test values");

        // Fresh store per parameter; earlier parameters' results are gone,
        // only the updated baselines carry forward.
        let mut store = ResultsStore::new();

        // Each candidate runs the full per-season batch: every valid season
        // gets `simulations_per_season` simulations.
        let per_season = self.settings.simulations_per_season;
        let total_jobs = per_season * seasons.len();

        for (value_index, value) in values.iter().enumerate() {
            if self.shutdown.is_requested() {
                info!(
                    parameter = param,
                    "shutdown requested; stopping before the next candidate"
                );
                return Ok(None);
            }
            let overrides = single_override(param, *value);
            for horizon in Horizon::WEEKLY {
                let candidate = self
                    .materializer
                    .materialize(set.horizon(horizon), &overrides)?;
                let config_id = format!("{param}_{value_index}_horizon_{horizon}");
                store.register(&config_id);

                let evaluator = ParallelEvaluator::new(self.settings.max_workers).with_progress(
                    Box::new(|completed, total| {
                        debug!(completed, total, "simulation progress");
                    }),
                );
                let seed_base = self.seed_base;
                let id_for_seed = config_id.clone();
                let outcomes = evaluator.evaluate(
                    |sim_index| {
                        let season = &seasons[season_for_job(sim_index, per_season)];
                        let seed = job_seed(seed_base, &id_for_seed, sim_index);
                        Ok(LeagueSimulation::new(&candidate, Arc::clone(season), seed))
                    },
                    total_jobs,
                );
                for outcome in &outcomes {
                    store.record(&config_id, outcome)?;
                }
            }
            debug!(
                parameter = param,
                value,
                completed = value_index + 1,
                total = values.len(),
                "completed test value"
            );
        }

        let (winning_index, performance) = {
            let best = store
                .best()
                .ok_or_else(|| gl_types::internal_error!("no candidates evaluated for {param}"))?;
            info!(
                parameter = param,
                best = %best,
                "selected best value"
            );
            (
                winning_value_index(&best.config_id, param).ok_or_else(|| {
                    gl_types::internal_error!("unparseable winning config id {}", best.config_id)
                })?,
                self.performance_report(param, &store)?,
            )
        };

        // Adopt the winner: replace every horizon's baseline with a fresh
        // materialization carrying the winning value.
        let winning_value = values[winning_index];
        let overrides = single_override(param, winning_value);
        for horizon in Horizon::ALL {
            let updated = self
                .materializer
                .materialize(set.horizon(horizon), &overrides)?;
            set.replace(horizon, updated);
        }
        info!(parameter = param, value = winning_value, "updated horizon baselines");

        Ok(Some(performance))
    }

    fn performance_report(&self, param: &str, store: &ResultsStore) -> GlResult<Value> {
        let best = store
            .best()
            .ok_or_else(|| gl_types::internal_error!("empty results store for {param}"))?;
        let mut ranges = serde_json::Map::new();
        for range in WeekRange::ALL {
            if let Some(range_best) = store.best_for_range(range) {
                ranges.insert(
                    range.label().to_string(),
                    json!({
                        "win_rate": range_best.win_rate_for_range(range),
                        "config_id": range_best.config_id,
                    }),
                );
            }
        }
        let stats = store.stats().map(|s| {
            json!({
                "configs": s.count,
                "min_win_rate": s.min_win_rate,
                "max_win_rate": s.max_win_rate,
                "avg_win_rate": s.avg_win_rate,
            })
        });
        Ok(json!({
            "parameter": param,
            "overall": {
                "win_rate": best.win_rate(),
                "total_wins": best.total_wins,
                "total_losses": best.total_losses,
                "config_id": best.config_id,
            },
            "week_range_performance": Value::Object(ranges),
            "stats": stats.unwrap_or(Value::Null),
        }))
    }
}

fn single_override(param: &str, value: f64) -> BTreeMap<String, f64> {
    let mut overrides = BTreeMap::new();
    overrides.insert(param.to_string(), value);
    overrides
}

/// Season responsible for one batch job: jobs are laid out in contiguous
/// blocks of `per_season`, so every season receives its full share.
fn season_for_job(sim_index: usize, per_season: usize) -> usize {
    sim_index / per_season
}

/// Extract the candidate value index from an id of the form
/// `{param}_{index}_horizon_{horizon}`.
fn winning_value_index(config_id: &str, param: &str) -> Option<usize> {
    let rest = config_id.strip_prefix(param)?.strip_prefix('_')?;
    let (index, rest) = rest.split_once('_')?;
    if !rest.starts_with("horizon_") {
        return None;
    }
    index.parse().ok()
}

/// Stable per-job seed derived from the run seed and the candidate id.
fn job_seed(seed_base: u64, config_id: &str, sim_index: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed_base.hash(&mut hasher);
    config_id.hash(&mut hasher);
    sim_index.hash(&mut hasher);
    hasher.finish()
}
