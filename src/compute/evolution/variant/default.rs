//! Plain parameter vector: every gene is an independent scalar.

use crate::schema::VariantKind;

use super::{GenomeVariant, copy_floats, copy_ints, pick};
use crate::compute::evolution::bounds::GeneBounds;
use crate::compute::evolution::genome::Genome;
use crate::compute::evolution::mutation::{MutationParams, mutate_float_gene, mutate_int_gene};
use crate::compute::evolution::rng::GenomeRng;

/// Uniform crossover and per-gene mutation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVariant;

impl GenomeVariant for DefaultVariant {
    fn kind(&self) -> VariantKind {
        VariantKind::Default
    }

    fn unit_count(&self, float_gene_count: usize, int_gene_count: usize) -> usize {
        float_gene_count + int_gene_count
    }

    fn init(&self, genome: &mut Genome, bounds: &GeneBounds, rng: &mut GenomeRng) {
        genome.randomize(bounds, rng);
    }

    fn reproduce(&self, a: &Genome, b: &Genome, child: &mut Genome, rng: &mut GenomeRng) {
        for i in 0..child.float_gene_count() {
            copy_floats(child, pick(a, b, rng), i..i + 1);
        }
        for i in 0..child.int_gene_count() {
            copy_ints(child, pick(a, b, rng), i..i + 1);
        }
    }

    fn mutate(
        &self,
        child: &mut Genome,
        params: MutationParams,
        bounds: &GeneBounds,
        rng: &mut GenomeRng,
    ) {
        for i in 0..child.float_gene_count() {
            if rng.chance(params.probability * child.mutability_f(i)) {
                mutate_float_gene(child, i, bounds.float(i), params.amplitude, rng);
            }
        }
        for i in 0..child.int_gene_count() {
            if rng.chance(params.probability * child.mutability_i(i)) {
                mutate_int_gene(child, i, bounds.int(i), params.amplitude, rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossover_takes_each_gene_from_a_parent() {
        let mut rng = GenomeRng::new(9);
        let mut a = Genome::new(0, 6, 6);
        let mut b = Genome::new(1, 6, 6);
        for i in 0..6 {
            a.set_gene_f(i, 1.0);
            a.set_delta_gene_f(i, 0.1);
            b.set_gene_f(i, 2.0);
            b.set_delta_gene_f(i, 0.2);
            a.set_gene_i(i, 1);
            b.set_gene_i(i, 2);
        }
        let mut child = Genome::new(2, 6, 6);
        DefaultVariant.reproduce(&a, &b, &mut child, &mut rng);

        for i in 0..6 {
            let g = child.gene_f(i);
            assert!(g == 1.0 || g == 2.0);
            // Delta travels with its gene
            assert_eq!(child.delta_gene_f(i), g / 10.0);
            assert!(child.gene_i(i) == 1 || child.gene_i(i) == 2);
        }
    }

    #[test]
    fn test_frozen_genes_do_not_mutate() {
        let mut rng = GenomeRng::new(4);
        let bounds = GeneBounds::new(2, 2);
        let mut child = Genome::new(0, 2, 2);
        child.set_mutability_f(0, 0.0);
        child.set_mutability_i(1, 0.0);
        let params = MutationParams {
            probability: 1.0,
            amplitude: 0.5,
        };
        for _ in 0..50 {
            DefaultVariant.mutate(&mut child, params, &bounds, &mut rng);
        }
        assert_eq!(child.gene_f(0), 0.0);
        assert_eq!(child.gene_i(1), 0);
        assert!(child.is_within(&bounds));
    }
}
