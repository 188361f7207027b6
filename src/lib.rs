//! Resolution of East-Asian historical date expressions (dynasty, ruler,
//! era, year, lunar month and day) to civil years and Julian Day Numbers.

pub mod candidate;
pub mod context;
pub mod error;
pub mod filter;
pub mod ganzhi;
pub mod julian;
pub mod loader;
pub mod normalise;
pub mod numerals;
pub mod params;
pub mod pipeline;
pub mod resolver;
pub mod solver;
pub mod tables;

#[cfg(test)]
mod fixtures;

pub use context::ImpliedContext;
pub use error::{ResolveError, Result};
pub use params::{Civilization, RunParams};
pub use pipeline::{DateResolver, Resolution};
pub use tables::ReferenceTables;

pub use era_types::{DateToken, Diagnostic, LunarPhase, ResolvedDate};
