use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gl_optimizer::{IterativeOptimizer, OptimizerSettings, RunOutcome};

/// Simulation-driven optimizer for fantasy league scoring configurations.
#[derive(Debug, Parser)]
#[command(name = "gridline", version, about)]
struct Args {
    /// Directory holding league_config.json and the five horizon files.
    #[arg(long, default_value = "configs")]
    config_dir: PathBuf,

    /// Root directory of historical season data (one folder per year).
    #[arg(long, default_value = "sim_data")]
    data_root: PathBuf,

    /// Output directory for checkpoints and final result folders.
    #[arg(long, default_value = "optimized_configs")]
    output_dir: PathBuf,

    /// Directory of numbered draft-order strategy files. Defaults to
    /// `draft_order_possibilities` under the config directory.
    #[arg(long)]
    draft_order_dir: Option<PathBuf>,

    /// Simulations per historical season for each candidate configuration.
    #[arg(long, default_value_t = 100)]
    simulations: usize,

    /// Maximum concurrent simulation workers.
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Candidate values sampled per parameter (the current value is always
    /// tested too).
    #[arg(long, default_value_t = 5)]
    test_values: usize,

    /// Seed for reproducible runs; omit for a random seed.
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut settings = OptimizerSettings::new(args.config_dir, args.data_root, args.output_dir)
        .with_simulations(args.simulations)
        .with_workers(args.workers)
        .with_test_values(args.test_values);
    if let Some(seed) = args.seed {
        settings = settings.with_seed(seed);
    }
    if let Some(dir) = args.draft_order_dir {
        settings = settings.with_draft_order_dir(dir);
    }

    let mut optimizer = IterativeOptimizer::new(settings);

    let shutdown = optimizer.shutdown_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; finishing the current candidate batch before stopping");
            shutdown.request();
        }
    });

    let outcome = tokio::task::spawn_blocking(move || optimizer.run()).await??;
    match outcome {
        RunOutcome::Completed(folder) => {
            info!(folder = %folder.display(), "optimal configuration written");
        }
        RunOutcome::Interrupted => {
            warn!("optimization interrupted; rerun to resume from the last checkpoint");
        }
    }
    Ok(())
}
