//! NeuraNetConv genomes.
//!
//! The float vector starts with a convolution block made of cells of base functions
//! shared by every output, followed by per-output base function triplets. Integer
//! genes are initialised within bounds but do not evolve.

use crate::compute::evolution::bounds::GeneBounds;
use crate::compute::evolution::genome::Genome;
use crate::compute::evolution::mutation::{MutationParams, mutate_float_gene};
use crate::compute::evolution::rng::GenomeRng;
use crate::schema::{ConfigError, ConvLayout, TRIPLET, VariantKind};

use super::{GenomeVariant, copy_floats, copy_ints, pick};

/// Strategy for [`VariantKind::NeuraNetConv`].
#[derive(Debug, Clone, Copy)]
pub struct NeuraNetConvVariant {
    layout: ConvLayout,
}

impl NeuraNetConvVariant {
    pub fn new(layout: ConvLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ConvLayout {
        &self.layout
    }

    /// Float gene ranges of every evolution unit: each convolution cell, then each
    /// per-output triplet.
    fn units(&self, float_gene_count: usize) -> impl Iterator<Item = std::ops::Range<usize>> {
        let cell_len = self.layout.cell_len();
        let conv_len = self.layout.conv_len();
        let cells = (0..self.layout.cell_count()).map(move |c| c * cell_len..(c + 1) * cell_len);
        let tail = (conv_len..float_gene_count)
            .step_by(TRIPLET)
            .map(|start| start..start + TRIPLET);
        cells.chain(tail)
    }
}

impl GenomeVariant for NeuraNetConvVariant {
    fn kind(&self) -> VariantKind {
        VariantKind::NeuraNetConv(self.layout)
    }

    fn unit_count(&self, float_gene_count: usize, _int_gene_count: usize) -> usize {
        self.units(float_gene_count).count()
    }

    fn install_bounds(&self, bounds: &mut GeneBounds) -> Result<(), ConfigError> {
        self.layout.validate(bounds.float_len())
    }

    fn apply_mutability(&self, genome: &mut Genome) {
        genome.float_mutability.fill(1.0);
        genome.int_mutability.fill(0.0);
    }

    fn init(&self, genome: &mut Genome, bounds: &GeneBounds, rng: &mut GenomeRng) {
        genome.randomize(bounds, rng);
    }

    fn reproduce(&self, a: &Genome, b: &Genome, child: &mut Genome, rng: &mut GenomeRng) {
        for unit in self.units(child.float_gene_count()) {
            copy_floats(child, pick(a, b, rng), unit);
        }
        copy_ints(child, a, 0..child.int_gene_count());
    }

    fn mutate(
        &self,
        child: &mut Genome,
        params: MutationParams,
        bounds: &GeneBounds,
        rng: &mut GenomeRng,
    ) {
        for unit in self.units(child.float_gene_count()) {
            if !rng.chance(params.probability * child.mutability_f(unit.start)) {
                continue;
            }
            for i in unit {
                mutate_float_gene(child, i, bounds.float(i), params.amplitude, rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant() -> NeuraNetConvVariant {
        NeuraNetConvVariant::new(ConvLayout {
            base_conv: 4,
            bases_per_cell: 2,
        })
    }

    #[test]
    fn test_units() {
        let units: Vec<_> = variant().units(18).collect();
        assert_eq!(units, vec![0..6, 6..12, 12..15, 15..18]);
        assert_eq!(variant().unit_count(18, 3), 4);
    }

    #[test]
    fn test_cells_copied_atomically() {
        let mut rng = GenomeRng::new(8);
        let a = Genome::new(0, 18, 3);
        let mut b = Genome::new(1, 18, 3);
        for i in 0..18 {
            b.set_gene_f(i, 1.0);
        }
        for i in 0..3 {
            b.set_gene_i(i, 1);
        }
        for _ in 0..20 {
            let mut child = Genome::new(2, 18, 3);
            variant().reproduce(&a, &b, &mut child, &mut rng);
            for unit in variant().units(18) {
                let first = child.gene_f(unit.start);
                assert!(unit.clone().all(|i| child.gene_f(i) == first));
            }
            // Integers come from the first parent
            assert_eq!(child.int_genes(), a.int_genes());
        }
    }

    #[test]
    fn test_int_genes_do_not_mutate() {
        let mut rng = GenomeRng::new(6);
        let mut bounds = GeneBounds::new(18, 3);
        for i in 0..3 {
            bounds.set_int(i, 0, 9).unwrap();
        }
        let mut genome = Genome::new(0, 18, 3);
        variant().init(&mut genome, &bounds, &mut rng);
        variant().apply_mutability(&mut genome);
        let ints = genome.int_genes().to_vec();
        let params = MutationParams {
            probability: 1.0,
            amplitude: 0.8,
        };
        for _ in 0..20 {
            variant().mutate(&mut genome, params, &bounds, &mut rng);
        }
        assert_eq!(genome.int_genes(), ints.as_slice());
        assert!(genome.is_within(&bounds));
    }
}
