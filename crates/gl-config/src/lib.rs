//! # gl-config
//!
//! The configuration side of GridLine: the closed catalog of tunable
//! parameters (bounds, precision, write routes), candidate value generation
//! for the coordinate-descent search, and materialization of full candidate
//! configurations from a baseline plus a single-parameter override.

mod catalog;
mod doc;
mod generator;
mod materializer;

pub use catalog::{
    catalog, lookup, parameter_order, CatalogEntry, ParamRoute, ParameterDef,
    BASE_SECTIONS, WEEK_SECTIONS,
};
pub use doc::{ConfigDoc, ConfigSet};
pub use generator::{discrete_domain, generate_values, round_to_precision};
pub use materializer::Materializer;
