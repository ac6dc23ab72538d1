//! genalg - Genetic algorithm population engine.
//!
//! This crate evolves populations of parameter vectors ranked by a caller-supplied
//! fitness. It protects elites, recovers from diversity collapse with KT events,
//! adapts the population size to progress, and can interpret genes as the base
//! functions and links of a small neural network.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, variant layouts and persisted state
//! - `compute`: The evolution engine (genomes, variants, population, epoch step)
//!
//! # Example
//!
//! ```rust,no_run
//! use genalg::{
//!     compute::{GenomeRng, Population},
//!     schema::PopulationConfig,
//! };
//!
//! let config = PopulationConfig {
//!     float_gene_count: 3,
//!     float_bounds: vec![(-1.0, 1.0); 3],
//!     ..Default::default()
//! };
//! let mut population = Population::from_config(&config).unwrap();
//! let mut rng = GenomeRng::new(7);
//! population.init(&mut rng);
//!
//! for _ in 0..100 {
//!     for rank in population.new_ranks().collect::<Vec<_>>() {
//!         let sum: f32 = population.genome(rank).float_genes().iter().sum();
//!         population.set_value(rank, -sum.abs());
//!     }
//!     let report = population.step(&mut rng);
//!     if report.kt_event {
//!         println!("KT event at epoch {}", report.epoch);
//!     }
//! }
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{EpochReport, Genome, GenomeRng, PersistError, Population};
pub use schema::{ConfigError, PopulationConfig, PopulationSnapshot, VariantKind};
