//! # gl-optimizer
//!
//! The top of the GridLine stack: per-candidate performance aggregation, the
//! results store for one parameter's trials, checkpoint persistence with
//! resume detection, and the coordinate-descent optimization loop itself.

mod checkpoint;
mod optimizer;
mod performance;
mod results;

pub use checkpoint::{CheckpointStore, ResumeState, MAX_OPTIMAL_FOLDERS};
pub use optimizer::{IterativeOptimizer, OptimizerSettings, RunOutcome, ShutdownFlag};
pub use performance::ConfigPerformance;
pub use results::{ResultsStore, StoreStats};
