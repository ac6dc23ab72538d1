//! Genetic algorithm population engine.
//!
//! A [`Population`] holds a ranked set of [`Genome`]s, each made of a float gene
//! vector (with a per-gene mutation momentum) and an integer gene vector, all kept
//! inside per-gene [`GeneBounds`]. Every epoch the caller scores the new genomes and
//! calls [`Population::step`], which:
//!
//! 1. ranks genomes by fitness and snapshots the best one ever seen,
//! 2. reseeds the lagging genomes (a KT event) when the leaders lost their diversity
//!    or the leader stayed too long without improving,
//! 3. otherwise ages the elites and refills every other slot with a mutated child of
//!    two distinct elites,
//! 4. shrinks the population after an improvement and grows it on stagnation.
//!
//! How genes are read, recombined and mutated is delegated to a [`GenomeVariant`]:
//! plain parameter vectors, NeuraNet base functions and links, or NeuraNetConv
//! convolution cells.
//!
//! # Example
//!
//! ```rust
//! use genalg::compute::evolution::{GenomeRng, Population};
//!
//! let mut rng = GenomeRng::new(42);
//! let mut population = Population::new(20, 4, 2, 0).unwrap();
//! population.set_float_bounds(0, -1.0, 1.0).unwrap();
//! population.set_float_bounds(1, -1.0, 1.0).unwrap();
//! population.init(&mut rng);
//!
//! for _ in 0..100 {
//!     let new: Vec<usize> = population.new_ranks().collect();
//!     for rank in new {
//!         let genes = population.genome(rank).float_genes();
//!         let error = (genes[0] - 0.5).abs() + (genes[1] + 0.25).abs();
//!         population.set_value(rank, -error);
//!     }
//!     population.step(&mut rng);
//! }
//!
//! let best = population.best_ever().unwrap();
//! println!("best {:?} after {} epochs", best.float_genes(), population.epoch());
//! ```

mod bounds;
mod diversity;
mod engine;
mod genealogy;
mod genome;
mod mutation;
mod persist;
mod population;
mod rng;
pub mod variant;

pub use bounds::GeneBounds;
pub use diversity::diversity;
pub use engine::EpochReport;
pub use genealogy::Genealogy;
pub use genome::Genome;
pub use mutation::{MIN_INT_AMPLITUDE, MutationParams, mirror_f, mirror_i};
pub use persist::PersistError;
pub use population::Population;
pub use rng::GenomeRng;
pub use variant::{
    DefaultVariant, GenomeVariant, NeuraNetConvVariant, NeuraNetVariant, variant_for,
};
