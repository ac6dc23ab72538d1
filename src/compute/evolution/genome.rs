//! Genome data model: gene vectors, mutation momentum and bookkeeping.

use super::bounds::GeneBounds;
use super::rng::GenomeRng;

/// Genes split off the end of a genome while a step only evolves a prefix.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GeneTail {
    float_genes: Vec<f32>,
    delta_float_genes: Vec<f32>,
    int_genes: Vec<i64>,
}

impl GeneTail {
    /// Fresh tail genes drawn inside the bounds of gene indices from
    /// `float_start` and `int_start` on.
    pub(crate) fn random(
        bounds: &GeneBounds,
        float_start: usize,
        int_start: usize,
        rng: &mut GenomeRng,
    ) -> Self {
        let float_genes: Vec<f32> = bounds.floats()[float_start..]
            .iter()
            .map(|&(min, max)| rng.uniform(min, max))
            .collect();
        let int_genes = bounds.ints()[int_start..]
            .iter()
            .map(|&(min, max)| rng.uniform_int(min, max))
            .collect();
        Self {
            delta_float_genes: vec![0.0; float_genes.len()],
            float_genes,
            int_genes,
        }
    }
}

/// One candidate solution.
///
/// Gene vector lengths are fixed for the lifetime of the population that owns the
/// genome. Index arguments out of range are caller bugs and panic.
#[derive(Debug, Clone, PartialEq)]
pub struct Genome {
    pub(crate) id: u64,
    pub(crate) age: u64,
    pub(crate) value: f32,
    pub(crate) float_genes: Vec<f32>,
    pub(crate) delta_float_genes: Vec<f32>,
    pub(crate) int_genes: Vec<i64>,
    pub(crate) float_mutability: Vec<f32>,
    pub(crate) int_mutability: Vec<f32>,
    pub(crate) parent_ids: (u64, u64),
}

impl Genome {
    /// Create a zeroed genome with the given id and gene counts.
    pub fn new(id: u64, float_gene_count: usize, int_gene_count: usize) -> Self {
        Self {
            id,
            age: 1,
            value: 0.0,
            float_genes: vec![0.0; float_gene_count],
            delta_float_genes: vec![0.0; float_gene_count],
            int_genes: vec![0; int_gene_count],
            float_mutability: vec![1.0; float_gene_count],
            int_mutability: vec![1.0; int_gene_count],
            parent_ids: (id, id),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Generations survived, 1 for a genome born this epoch.
    #[inline]
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Last fitness assigned by the caller.
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Whether the genome still needs an evaluation.
    #[inline]
    pub fn is_new(&self) -> bool {
        self.age == 1
    }

    #[inline]
    pub fn parent_ids(&self) -> (u64, u64) {
        self.parent_ids
    }

    #[inline]
    pub fn float_genes(&self) -> &[f32] {
        &self.float_genes
    }

    #[inline]
    pub fn delta_float_genes(&self) -> &[f32] {
        &self.delta_float_genes
    }

    #[inline]
    pub fn int_genes(&self) -> &[i64] {
        &self.int_genes
    }

    #[inline]
    pub fn float_gene_count(&self) -> usize {
        self.float_genes.len()
    }

    #[inline]
    pub fn int_gene_count(&self) -> usize {
        self.int_genes.len()
    }

    #[inline]
    pub fn gene_f(&self, i: usize) -> f32 {
        self.check_float_index(i);
        self.float_genes[i]
    }

    #[inline]
    pub fn set_gene_f(&mut self, i: usize, gene: f32) {
        self.check_float_index(i);
        self.float_genes[i] = gene;
    }

    /// Change applied to float gene `i` by its last mutation.
    #[inline]
    pub fn delta_gene_f(&self, i: usize) -> f32 {
        self.check_float_index(i);
        self.delta_float_genes[i]
    }

    #[inline]
    pub fn set_delta_gene_f(&mut self, i: usize, delta: f32) {
        self.check_float_index(i);
        self.delta_float_genes[i] = delta;
    }

    #[inline]
    pub fn gene_i(&self, i: usize) -> i64 {
        self.check_int_index(i);
        self.int_genes[i]
    }

    #[inline]
    pub fn set_gene_i(&mut self, i: usize, gene: i64) {
        self.check_int_index(i);
        self.int_genes[i] = gene;
    }

    /// Relative mutation weight of float gene `i` (0 freezes the gene).
    #[inline]
    pub fn mutability_f(&self, i: usize) -> f32 {
        self.check_float_index(i);
        self.float_mutability[i]
    }

    #[inline]
    pub fn set_mutability_f(&mut self, i: usize, weight: f32) {
        self.check_float_index(i);
        self.float_mutability[i] = weight;
    }

    /// Relative mutation weight of integer gene `i` (0 freezes the gene).
    #[inline]
    pub fn mutability_i(&self, i: usize) -> f32 {
        self.check_int_index(i);
        self.int_mutability[i]
    }

    #[inline]
    pub fn set_mutability_i(&mut self, i: usize, weight: f32) {
        self.check_int_index(i);
        self.int_mutability[i] = weight;
    }

    /// Deep copy of `src` into `self`, reusing the gene buffers.
    pub fn copy_from(&mut self, src: &Genome) {
        self.id = src.id;
        self.age = src.age;
        self.value = src.value;
        self.parent_ids = src.parent_ids;
        self.float_genes.clone_from(&src.float_genes);
        self.delta_float_genes.clone_from(&src.delta_float_genes);
        self.int_genes.clone_from(&src.int_genes);
        self.float_mutability.clone_from(&src.float_mutability);
        self.int_mutability.clone_from(&src.int_mutability);
    }

    /// Draw every gene uniformly inside its bounds and clear the momentum.
    pub fn randomize(&mut self, bounds: &GeneBounds, rng: &mut GenomeRng) {
        for (i, gene) in self.float_genes.iter_mut().enumerate() {
            let (min, max) = bounds.float(i);
            *gene = rng.uniform(min, max);
        }
        for (i, gene) in self.int_genes.iter_mut().enumerate() {
            let (min, max) = bounds.int(i);
            *gene = rng.uniform_int(min, max);
        }
        self.delta_float_genes.fill(0.0);
    }

    /// Stamp a birth: new id, age 1, cleared value, given parents.
    pub(crate) fn mark_born(&mut self, id: u64, parent_ids: (u64, u64)) {
        self.id = id;
        self.age = 1;
        self.value = 0.0;
        self.parent_ids = parent_ids;
    }

    /// Cut the genome down to its first `float_count` and `int_count` genes and
    /// return the rest.
    pub(crate) fn split_tail(&mut self, float_count: usize, int_count: usize) -> GeneTail {
        self.float_mutability.truncate(float_count);
        self.int_mutability.truncate(int_count);
        GeneTail {
            float_genes: self.float_genes.split_off(float_count),
            delta_float_genes: self.delta_float_genes.split_off(float_count),
            int_genes: self.int_genes.split_off(int_count),
        }
    }

    /// Append tail genes. New genes get a mutability of 1.
    pub(crate) fn join_tail(&mut self, tail: &GeneTail) {
        self.float_genes.extend_from_slice(&tail.float_genes);
        self.delta_float_genes.extend_from_slice(&tail.delta_float_genes);
        self.int_genes.extend_from_slice(&tail.int_genes);
        self.float_mutability.resize(self.float_genes.len(), 1.0);
        self.int_mutability.resize(self.int_genes.len(), 1.0);
    }

    /// Whether every gene lies within `bounds`.
    pub fn is_within(&self, bounds: &GeneBounds) -> bool {
        let floats_ok = self.float_genes.iter().enumerate().all(|(i, &g)| {
            let (min, max) = bounds.float(i);
            g >= min && g <= max
        });
        let ints_ok = self.int_genes.iter().enumerate().all(|(i, &g)| {
            let (min, max) = bounds.int(i);
            g >= min && g <= max
        });
        floats_ok && ints_ok
    }

    #[inline]
    fn check_float_index(&self, i: usize) {
        assert!(
            i < self.float_genes.len(),
            "float gene index {i} out of range (0..{})",
            self.float_genes.len()
        );
    }

    #[inline]
    fn check_int_index(&self, i: usize) {
        assert!(
            i < self.int_genes.len(),
            "int gene index {i} out of range (0..{})",
            self.int_genes.len()
        );
    }
}
