//! # gl-sim
//!
//! The simulation side of GridLine: discovery and validation of historical
//! season data, the season-runner contract with its default league
//! implementation, and the bounded-pool parallel evaluator.

pub mod data;
pub mod evaluator;
pub mod league;

pub use data::{discover_seasons, PlayerRow, SeasonData, MIN_VALID_PLAYERS};
pub use evaluator::{ParallelEvaluator, ProgressFn};
pub use league::{LeagueSimulation, SeasonRunner};
