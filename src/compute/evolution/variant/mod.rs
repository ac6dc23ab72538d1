//! Genome interpretation strategies.
//!
//! A variant decides how the flat gene vectors are initialised, recombined and
//! mutated. One strategy object is chosen per population and stays fixed.

mod conv;
mod default;
mod neuranet;

use std::fmt;
use std::ops::Range;

pub use conv::NeuraNetConvVariant;
pub use default::DefaultVariant;
pub use neuranet::NeuraNetVariant;

use crate::schema::{ConfigError, VariantKind};

use super::bounds::GeneBounds;
use super::genome::Genome;
use super::mutation::MutationParams;
use super::rng::GenomeRng;

/// Strategy interface implemented once per [`VariantKind`].
pub trait GenomeVariant: fmt::Debug + Send + Sync {
    /// Kind and layout this strategy implements.
    fn kind(&self) -> VariantKind;

    /// Number of independently mutated units for the given gene counts.
    fn unit_count(&self, float_gene_count: usize, int_gene_count: usize) -> usize;

    /// Write any structural bounds the variant imposes.
    fn install_bounds(&self, _bounds: &mut GeneBounds) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Check the structural invariants of a genome whose genes are already known to
    /// lie within the installed bounds.
    fn check_genome(&self, _genome: &Genome) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Set the per-gene mutation weights of `genome`.
    fn apply_mutability(&self, genome: &mut Genome) {
        genome.float_mutability.fill(1.0);
        genome.int_mutability.fill(1.0);
    }

    /// Randomly initialise every gene of `genome` within `bounds`.
    fn init(&self, genome: &mut Genome, bounds: &GeneBounds, rng: &mut GenomeRng);

    /// Overwrite the genes of `child` with a mix of `a` and `b`.
    fn reproduce(&self, a: &Genome, b: &Genome, child: &mut Genome, rng: &mut GenomeRng);

    /// Mutate `child` in place, keeping every gene within `bounds`.
    fn mutate(
        &self,
        child: &mut Genome,
        params: MutationParams,
        bounds: &GeneBounds,
        rng: &mut GenomeRng,
    );
}

/// Build the strategy for `kind`.
pub fn variant_for(kind: VariantKind) -> Box<dyn GenomeVariant> {
    match kind {
        VariantKind::Default => Box::new(DefaultVariant),
        VariantKind::NeuraNet(layout) => Box::new(NeuraNetVariant::new(layout)),
        VariantKind::NeuraNetConv(layout) => Box::new(NeuraNetConvVariant::new(layout)),
    }
}

/// Copy float genes and their momentum in `range` from `src`.
#[inline]
pub(crate) fn copy_floats(child: &mut Genome, src: &Genome, range: Range<usize>) {
    child.float_genes[range.clone()].copy_from_slice(&src.float_genes[range.clone()]);
    child.delta_float_genes[range.clone()].copy_from_slice(&src.delta_float_genes[range]);
}

/// Copy integer genes in `range` from `src`.
#[inline]
pub(crate) fn copy_ints(child: &mut Genome, src: &Genome, range: Range<usize>) {
    child.int_genes[range.clone()].copy_from_slice(&src.int_genes[range]);
}

/// Pick one of two parents with equal probability.
#[inline]
pub(crate) fn pick<'a>(a: &'a Genome, b: &'a Genome, rng: &mut GenomeRng) -> &'a Genome {
    if rng.chance(0.5) { a } else { b }
}
