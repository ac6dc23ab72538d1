//! Persisted population state and genealogy records.

use serde::{Deserialize, Serialize};

use super::VariantKind;

/// Serialized genome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomeRecord {
    /// Unique identifier.
    pub id: u64,
    /// Generations survived (1 = new).
    pub age: u64,
    /// Last assigned fitness.
    pub value: f32,
    /// Float genes.
    pub float_genes: Vec<f32>,
    /// Mutation momentum of each float gene.
    pub delta_float_genes: Vec<f32>,
    /// Integer genes.
    pub int_genes: Vec<i64>,
    /// Ids of the two parents.
    #[serde(default)]
    pub parent_ids: (u64, u64),
}

/// Complete exported state of a population.
///
/// Genomes are stored in rank order (best first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    /// Gene interpretation and its layout metadata.
    pub variant: VariantKind,
    /// Number of elites.
    pub elite_count: usize,
    /// Lower size limit.
    pub min_size: usize,
    /// Upper size limit.
    pub max_size: usize,
    /// KT event trigger.
    pub diversity_threshold: f32,
    /// Leader term limit.
    pub max_age: u64,
    /// Length of the float gene vector.
    pub float_gene_count: usize,
    /// Length of the integer gene vector.
    pub int_gene_count: usize,
    /// Per-gene float bounds.
    pub float_bounds: Vec<(f32, f32)>,
    /// Per-gene integer bounds.
    pub int_bounds: Vec<(i64, i64)>,
    /// Genomes in rank order.
    pub genomes: Vec<GenomeRecord>,
    /// Best genome seen so far, if any epoch completed.
    pub best_ever: Option<GenomeRecord>,
    /// Completed epochs.
    pub epoch: u64,
    /// Id given to the next born genome.
    pub next_id: u64,
    /// Number of KT events so far.
    pub kt_event_count: u64,
}

/// One entry of the genealogy log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthEvent {
    /// Epoch during which the genome was born.
    pub epoch: u64,
    /// Ids of the parents (the child's own id twice for random births).
    pub parent_ids: (u64, u64),
    /// Id of the new genome.
    pub child_id: u64,
}
