//! # gl-types
//!
//! Core types shared by every GridLine crate: the error taxonomy, week-range
//! and horizon definitions, and per-season simulation outcomes.

pub mod errors;
pub mod outcome;

pub use errors::*;
pub use outcome::*;
