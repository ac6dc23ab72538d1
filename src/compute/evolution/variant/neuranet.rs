//! NeuraNet genomes: float triplets are base functions, integer triplets are links.
//!
//! A link is `(base, input, output)` where `base` indexes a base function or is `-1`
//! for an inactive link. Nodes are numbered inputs first, then hidden, then outputs,
//! and an active link always points forward in that order. Every output keeps at
//! least one active incoming link.

use log::warn;

use crate::compute::evolution::bounds::GeneBounds;
use crate::compute::evolution::genome::Genome;
use crate::compute::evolution::mutation::{MutationParams, mutate_float_gene};
use crate::compute::evolution::rng::GenomeRng;
use crate::schema::{ConfigError, NeuraNetLayout, TRIPLET, VariantKind};

use super::{GenomeVariant, copy_floats, copy_ints, pick};

/// Base index of an inactive link.
pub const INACTIVE_LINK: i64 = -1;

/// Mutation passes attempted before giving up on producing a change.
const MAX_MUTATION_PASSES: usize = 10_000;

/// Strategy for [`VariantKind::NeuraNet`].
#[derive(Debug, Clone, Copy)]
pub struct NeuraNetVariant {
    layout: NeuraNetLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Link {
    base: i64,
    input: usize,
    output: usize,
}

impl Link {
    #[inline]
    fn is_active(&self) -> bool {
        self.base != INACTIVE_LINK
    }
}

impl NeuraNetVariant {
    pub fn new(layout: NeuraNetLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &NeuraNetLayout {
        &self.layout
    }

    /// Whether links can be toggled and rewired.
    pub fn mutable_links(&self) -> bool {
        self.layout.mutable_links
    }

    fn link(genome: &Genome, k: usize) -> Link {
        let i = k * TRIPLET;
        Link {
            base: genome.int_genes[i],
            input: genome.int_genes[i + 1] as usize,
            output: genome.int_genes[i + 2] as usize,
        }
    }

    fn set_link(genome: &mut Genome, k: usize, link: Link) {
        let i = k * TRIPLET;
        genome.int_genes[i] = link.base;
        genome.int_genes[i + 1] = link.input as i64;
        genome.int_genes[i + 2] = link.output as i64;
    }

    /// Nodes that can feed a newly activated link: every input plus hidden nodes fed
    /// by an active link.
    fn nodes_in_use(&self, genome: &Genome) -> Vec<usize> {
        let mut in_use: Vec<usize> = (0..self.layout.inputs).collect();
        for k in 0..genome.int_gene_count() / TRIPLET {
            let link = Self::link(genome, k);
            if link.is_active()
                && self.layout.is_hidden(link.output)
                && !in_use.contains(&link.output)
            {
                in_use.push(link.output);
            }
        }
        in_use
    }

    /// A random non-input node strictly after `input`.
    fn random_output(&self, input: usize, rng: &mut GenomeRng) -> usize {
        let first = (input + 1).max(self.layout.inputs);
        first + rng.index(self.layout.node_count() - first)
    }

    fn random_base(genome: &Genome, rng: &mut GenomeRng) -> i64 {
        rng.index(genome.float_gene_count() / TRIPLET) as i64
    }

    fn random_link(&self, genome: &Genome, rng: &mut GenomeRng) -> Link {
        let in_use = self.nodes_in_use(genome);
        let input = in_use[rng.index(in_use.len())];
        Link {
            base: Self::random_base(genome, rng),
            input,
            output: self.random_output(input, rng),
        }
    }

    /// Apply one structural change to link `k`. Returns whether the link changed.
    fn mutate_link(&self, genome: &mut Genome, k: usize, rng: &mut GenomeRng) -> bool {
        let before = Self::link(genome, k);
        let after = if !before.is_active() {
            self.random_link(genome, rng)
        } else {
            match rng.index(3) {
                0 => Link {
                    base: INACTIVE_LINK,
                    ..before
                },
                1 => Link {
                    base: Self::random_base(genome, rng),
                    ..before
                },
                _ => {
                    let rewired = self.random_link(genome, rng);
                    Link {
                        base: before.base,
                        ..rewired
                    }
                }
            }
        };
        Self::set_link(genome, k, after);
        after != before
    }

    /// Give every output without an active incoming link a fresh link from a random
    /// input node.
    fn repair_outputs(&self, genome: &mut Genome, rng: &mut GenomeRng) {
        let layout = self.layout;
        let links = genome.int_gene_count() / TRIPLET;
        let mut incoming = vec![0usize; layout.outputs];
        for k in 0..links {
            let link = Self::link(genome, k);
            if link.is_active() && layout.is_output(link.output) {
                incoming[link.output - layout.first_output()] += 1;
            }
        }

        for o in 0..layout.outputs {
            if incoming[o] > 0 {
                continue;
            }
            // A slot whose removal leaves no other output orphaned always exists
            // because there are at least as many links as outputs.
            let slot = (0..links)
                .find(|&k| !Self::link(genome, k).is_active())
                .or_else(|| {
                    (0..links).find(|&k| {
                        let link = Self::link(genome, k);
                        !layout.is_output(link.output)
                            || incoming[link.output - layout.first_output()] > 1
                    })
                });
            let Some(k) = slot else {
                continue;
            };
            let old = Self::link(genome, k);
            if old.is_active() && layout.is_output(old.output) {
                incoming[old.output - layout.first_output()] -= 1;
            }
            let link = Link {
                base: Self::random_base(genome, rng),
                input: rng.index(layout.inputs),
                output: layout.first_output() + o,
            };
            Self::set_link(genome, k, link);
            incoming[o] += 1;
        }
    }
}

impl GenomeVariant for NeuraNetVariant {
    fn kind(&self) -> VariantKind {
        VariantKind::NeuraNet(self.layout)
    }

    fn unit_count(&self, float_gene_count: usize, int_gene_count: usize) -> usize {
        let links = if self.layout.mutable_links {
            int_gene_count / TRIPLET
        } else {
            0
        };
        float_gene_count / TRIPLET + links
    }

    fn install_bounds(&self, bounds: &mut GeneBounds) -> Result<(), ConfigError> {
        let last_base = (bounds.float_len() / TRIPLET) as i64 - 1;
        let last_input = self.layout.first_output() as i64 - 1;
        let last_node = self.layout.node_count() as i64 - 1;
        for k in 0..bounds.int_len() / TRIPLET {
            let i = k * TRIPLET;
            bounds.set_int(i, INACTIVE_LINK, last_base)?;
            bounds.set_int(i + 1, 0, last_input)?;
            bounds.set_int(i + 2, self.layout.inputs as i64, last_node)?;
        }
        Ok(())
    }

    fn check_genome(&self, genome: &Genome) -> Result<(), ConfigError> {
        let layout = self.layout;
        let mut incoming = vec![false; layout.outputs];
        for k in 0..genome.int_gene_count() / TRIPLET {
            let link = Self::link(genome, k);
            if !link.is_active() {
                continue;
            }
            if link.output <= link.input {
                return Err(ConfigError::InvalidGenome {
                    id: genome.id,
                    reason: format!(
                        "link {k} points backward ({} -> {})",
                        link.input, link.output
                    ),
                });
            }
            if layout.is_output(link.output) {
                incoming[link.output - layout.first_output()] = true;
            }
        }
        match incoming.iter().position(|&fed| !fed) {
            Some(o) => Err(ConfigError::InvalidGenome {
                id: genome.id,
                reason: format!(
                    "output node {} has no incoming link",
                    layout.first_output() + o
                ),
            }),
            None => Ok(()),
        }
    }

    fn apply_mutability(&self, genome: &mut Genome) {
        genome.float_mutability.fill(1.0);
        let weight = if self.layout.mutable_links { 1.0 } else { 0.0 };
        genome.int_mutability.fill(weight);
    }

    fn init(&self, genome: &mut Genome, bounds: &GeneBounds, rng: &mut GenomeRng) {
        for (i, gene) in genome.float_genes.iter_mut().enumerate() {
            let (min, max) = bounds.float(i);
            *gene = rng.uniform(min, max);
        }
        genome.delta_float_genes.fill(0.0);

        let layout = self.layout;
        let bases = genome.float_gene_count() / TRIPLET;
        let links = genome.int_gene_count() / TRIPLET;
        let idle = Link {
            base: INACTIVE_LINK,
            input: 0,
            output: layout.first_output(),
        };
        for k in 0..links {
            Self::set_link(genome, k, idle);
        }
        for k in 0..links {
            let link = if k < layout.outputs {
                Link {
                    base: (k % bases) as i64,
                    input: k % layout.inputs,
                    output: layout.first_output() + k,
                }
            } else if layout.mutable_links {
                Link {
                    base: INACTIVE_LINK,
                    input: k % layout.inputs,
                    output: layout.first_output() + k % layout.outputs,
                }
            } else {
                self.random_link(genome, rng)
            };
            Self::set_link(genome, k, link);
        }
    }

    fn reproduce(&self, a: &Genome, b: &Genome, child: &mut Genome, rng: &mut GenomeRng) {
        for unit in 0..child.float_gene_count() / TRIPLET {
            let start = unit * TRIPLET;
            copy_floats(child, pick(a, b, rng), start..start + TRIPLET);
        }
        for unit in 0..child.int_gene_count() / TRIPLET {
            let start = unit * TRIPLET;
            copy_ints(child, pick(a, b, rng), start..start + TRIPLET);
        }
        self.repair_outputs(child, rng);
    }

    fn mutate(
        &self,
        child: &mut Genome,
        params: MutationParams,
        bounds: &GeneBounds,
        rng: &mut GenomeRng,
    ) {
        let links = child.int_gene_count() / TRIPLET;
        let mut changed = false;
        let mut passes = 0;

        while !changed && passes < MAX_MUTATION_PASSES {
            passes += 1;

            let mut active_bases: Vec<usize> = (0..links)
                .map(|k| Self::link(child, k))
                .filter(Link::is_active)
                .map(|link| link.base as usize)
                .collect();
            active_bases.sort_unstable();
            active_bases.dedup();

            for &base in &active_bases {
                let start = base * TRIPLET;
                if !rng.chance(params.probability * child.mutability_f(start)) {
                    continue;
                }
                for i in start..start + TRIPLET {
                    let before = child.gene_f(i);
                    mutate_float_gene(child, i, bounds.float(i), params.amplitude, rng);
                    changed |= child.gene_f(i) != before;
                }
            }

            if self.layout.mutable_links {
                for k in 0..links {
                    if rng.chance(params.probability * child.mutability_i(k * TRIPLET)) {
                        changed |= self.mutate_link(child, k, rng);
                    }
                }
            }
        }

        if !changed {
            warn!(
                "NeuraNet mutation of genome {} produced no change after {passes} passes",
                child.id()
            );
        }
        self.repair_outputs(child, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(mutable_links: bool) -> NeuraNetLayout {
        NeuraNetLayout {
            inputs: 2,
            hidden: 2,
            outputs: 2,
            mutable_links,
        }
    }

    fn setup(mutable_links: bool) -> (NeuraNetVariant, GeneBounds) {
        let variant = NeuraNetVariant::new(layout(mutable_links));
        let mut bounds = GeneBounds::new(9, 18);
        for i in 0..9 {
            bounds.set_float(i, -1.0, 1.0).unwrap();
        }
        variant.install_bounds(&mut bounds).unwrap();
        (variant, bounds)
    }

    fn assert_structure(variant: &NeuraNetVariant, genome: &Genome, bounds: &GeneBounds) {
        let layout = variant.layout();
        assert!(genome.is_within(bounds));
        let mut fed = vec![false; layout.outputs];
        for k in 0..genome.int_gene_count() / TRIPLET {
            let link = NeuraNetVariant::link(genome, k);
            if link.is_active() {
                assert!(link.output > link.input);
                assert!(link.output >= layout.inputs);
                if layout.is_output(link.output) {
                    fed[link.output - layout.first_output()] = true;
                }
            }
        }
        assert!(fed.iter().all(|&f| f), "every output needs an incoming link");
        assert!(variant.check_genome(genome).is_ok());
    }

    #[test]
    fn test_install_bounds() {
        let (_, bounds) = setup(true);
        assert_eq!(bounds.int(0), (-1, 2));
        assert_eq!(bounds.int(1), (0, 3));
        assert_eq!(bounds.int(2), (2, 5));
    }

    #[test]
    fn test_init_links() {
        let (variant, bounds) = setup(true);
        let mut rng = GenomeRng::new(1);
        let mut genome = Genome::new(0, 9, 18);
        variant.init(&mut genome, &bounds, &mut rng);

        // One deterministic link per output sourced from an input
        let first = NeuraNetVariant::link(&genome, 0);
        assert_eq!((first.base, first.input, first.output), (0, 0, 4));
        let second = NeuraNetVariant::link(&genome, 1);
        assert_eq!((second.base, second.input, second.output), (1, 1, 5));
        for k in 2..6 {
            assert!(!NeuraNetVariant::link(&genome, k).is_active());
        }
        assert_structure(&variant, &genome, &bounds);
    }

    #[test]
    fn test_check_genome_rejects_broken_links() {
        let (variant, bounds) = setup(true);
        let mut rng = GenomeRng::new(4);
        let mut genome = Genome::new(7, 9, 18);
        variant.init(&mut genome, &bounds, &mut rng);

        let mut backward = genome.clone();
        NeuraNetVariant::set_link(
            &mut backward,
            2,
            Link {
                base: 0,
                input: 3,
                output: 2,
            },
        );
        assert!(matches!(
            variant.check_genome(&backward),
            Err(ConfigError::InvalidGenome { id: 7, .. })
        ));

        let mut orphan = genome;
        NeuraNetVariant::set_link(
            &mut orphan,
            1,
            Link {
                base: INACTIVE_LINK,
                input: 1,
                output: 5,
            },
        );
        assert!(variant.check_genome(&orphan).is_err());
    }

    #[test]
    fn test_fixed_links_are_all_active() {
        let (variant, bounds) = setup(false);
        let mut rng = GenomeRng::new(2);
        let mut genome = Genome::new(0, 9, 18);
        variant.init(&mut genome, &bounds, &mut rng);
        variant.apply_mutability(&mut genome);
        assert!((0..6).all(|k| NeuraNetVariant::link(&genome, k).is_active()));
        assert_eq!(variant.unit_count(9, 18), 3);

        let links = genome.int_genes().to_vec();
        let params = MutationParams {
            probability: 1.0,
            amplitude: 0.5,
        };
        variant.mutate(&mut genome, params, &bounds, &mut rng);
        assert_eq!(genome.int_genes(), links.as_slice());
    }

    #[test]
    fn test_mutation_keeps_structure() {
        let (variant, bounds) = setup(true);
        let mut rng = GenomeRng::new(3);
        let mut a = Genome::new(0, 9, 18);
        let mut b = Genome::new(1, 9, 18);
        variant.init(&mut a, &bounds, &mut rng);
        variant.init(&mut b, &bounds, &mut rng);
        let params = MutationParams {
            probability: 0.3,
            amplitude: 0.5,
        };
        for _ in 0..200 {
            let before = a.clone();
            variant.mutate(&mut a, params, &bounds, &mut rng);
            assert_ne!(a, before, "mutation must change something");
            assert_structure(&variant, &a, &bounds);

            let mut child = Genome::new(2, 9, 18);
            variant.reproduce(&a, &b, &mut child, &mut rng);
            assert_structure(&variant, &child, &bounds);
            b.copy_from(&child);
        }
    }
}
