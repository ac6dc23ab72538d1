//! Compute module - the evolution engine.

pub mod evolution;

pub use evolution::{EpochReport, Genome, GenomeRng, PersistError, Population};
