//! Ranked population of genomes and its configuration.

use log::debug;

use crate::schema::{
    ConfigError, DEFAULT_MAX_AGE, EPSILON, PopulationConfig, VariantKind,
    validate_diversity_threshold, validate_population_size, validate_size_range,
};

use super::bounds::GeneBounds;
use super::diversity::diversity;
use super::genealogy::Genealogy;
use super::genome::Genome;
use super::rng::GenomeRng;
use super::variant::{GenomeVariant, variant_for};

/// A population of genomes evolved by [`Population::step`].
///
/// Genomes are stored by rank: index 0 is the best genome as of the last step.
/// Between steps the caller assigns a fitness to every new genome (see
/// [`Genome::is_new`]) through [`Population::set_value`].
#[derive(Debug)]
pub struct Population {
    pub(crate) genomes: Vec<Genome>,
    pub(crate) elite_count: usize,
    pub(crate) min_size: usize,
    pub(crate) max_size: usize,
    pub(crate) diversity_threshold: f32,
    pub(crate) max_age: u64,
    pub(crate) bounds: GeneBounds,
    pub(crate) variant: Box<dyn GenomeVariant>,
    pub(crate) best_ever: Option<Genome>,
    pub(crate) epoch: u64,
    pub(crate) next_id: u64,
    pub(crate) kt_event_count: u64,
    pub(crate) genealogy: Option<Genealogy>,
}

impl Clone for Population {
    fn clone(&self) -> Self {
        Self {
            genomes: self.genomes.clone(),
            elite_count: self.elite_count,
            min_size: self.min_size,
            max_size: self.max_size,
            diversity_threshold: self.diversity_threshold,
            max_age: self.max_age,
            bounds: self.bounds.clone(),
            variant: variant_for(self.variant.kind()),
            best_ever: self.best_ever.clone(),
            epoch: self.epoch,
            next_id: self.next_id,
            kt_event_count: self.kt_event_count,
            genealogy: self.genealogy.clone(),
        }
    }
}

impl Population {
    /// Create a population of `size` zeroed genomes with ids `0..size`.
    ///
    /// Every gene is bounded to `[0, 1]` and the variant is
    /// [`VariantKind::Default`] until configured otherwise. Call [`Population::init`]
    /// before the first step.
    pub fn new(
        size: usize,
        elite_count: usize,
        float_gene_count: usize,
        int_gene_count: usize,
    ) -> Result<Self, ConfigError> {
        validate_population_size(size, elite_count)?;
        let genomes = (0..size)
            .map(|id| Genome::new(id as u64, float_gene_count, int_gene_count))
            .collect();
        Ok(Self {
            genomes,
            elite_count,
            min_size: size,
            max_size: size,
            diversity_threshold: EPSILON,
            max_age: DEFAULT_MAX_AGE,
            bounds: GeneBounds::new(float_gene_count, int_gene_count),
            variant: variant_for(VariantKind::Default),
            best_ever: None,
            epoch: 0,
            next_id: size as u64,
            kt_event_count: 0,
            genealogy: None,
        })
    }

    /// Build a fully configured, not yet initialised population.
    ///
    /// The construction size is clamped into the configured size range.
    pub fn from_config(config: &PopulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let size = config.size.clamp(config.min_size(), config.max_size());
        let mut population = Self::new(
            size,
            config.elite_count,
            config.float_gene_count,
            config.int_gene_count,
        )?;
        population.min_size = config.min_size();
        population.max_size = config.max_size();
        population.diversity_threshold = config.diversity_threshold;
        population.max_age = config.max_age;
        population.set_variant(config.variant)?;
        for (i, &(min, max)) in config.float_bounds.iter().enumerate() {
            population.set_float_bounds(i, min, max)?;
        }
        for (i, &(min, max)) in config.int_bounds.iter().enumerate() {
            population.set_int_bounds(i, min, max)?;
        }
        Ok(population)
    }

    /// Choose how genes are interpreted.
    ///
    /// The layout is checked against the gene counts and NeuraNet installs the
    /// structural bounds of its links. On error nothing changes.
    pub fn set_variant(&mut self, kind: VariantKind) -> Result<(), ConfigError> {
        kind.validate(self.bounds.float_len(), self.bounds.int_len())?;
        let variant = variant_for(kind);
        let mut bounds = self.bounds.clone();
        variant.install_bounds(&mut bounds)?;
        for genome in &mut self.genomes {
            variant.apply_mutability(genome);
        }
        self.bounds = bounds;
        self.variant = variant;
        Ok(())
    }

    /// Set the bounds of float gene `i`.
    ///
    /// # Panics
    /// If `i` is not a float gene index.
    pub fn set_float_bounds(&mut self, i: usize, min: f32, max: f32) -> Result<(), ConfigError> {
        self.bounds.set_float(i, min, max)
    }

    /// Set the bounds of integer gene `i`.
    ///
    /// Bounds the variant derives from its layout (NeuraNet links) can only be set to
    /// their structural value.
    ///
    /// # Panics
    /// If `i` is not an integer gene index.
    pub fn set_int_bounds(&mut self, i: usize, min: i64, max: i64) -> Result<(), ConfigError> {
        let mut bounds = self.bounds.clone();
        bounds.set_int(i, min, max)?;
        self.variant.install_bounds(&mut bounds)?;
        let (fixed_min, fixed_max) = bounds.int(i);
        if (fixed_min, fixed_max) != (min, max) {
            return Err(ConfigError::StructuralBounds {
                index: i,
                min: fixed_min,
                max: fixed_max,
            });
        }
        self.bounds = bounds;
        Ok(())
    }

    /// Set the size range and bring the population into it.
    ///
    /// Shrinking drops the worst ranks; growing appends freshly initialised genomes.
    pub fn set_size_range(
        &mut self,
        min: usize,
        max: usize,
        rng: &mut GenomeRng,
    ) -> Result<(), ConfigError> {
        validate_size_range(min, max, self.elite_count)?;
        self.min_size = min;
        self.max_size = max;
        let len = self.genomes.len().clamp(min, max);
        self.resize_to(len, rng);
        Ok(())
    }

    /// Change the number of elites.
    ///
    /// The size range is raised, and the population grown, so that at least one
    /// non-elite genome always remains.
    pub fn set_elite_count(
        &mut self,
        elite_count: usize,
        rng: &mut GenomeRng,
    ) -> Result<(), ConfigError> {
        if elite_count <= 1 {
            return Err(ConfigError::InvalidEliteCount {
                elite_count,
                size: self.genomes.len(),
            });
        }
        self.elite_count = elite_count;
        self.min_size = self.min_size.max(elite_count + 1);
        self.max_size = self.max_size.max(self.min_size);
        let len = self.genomes.len().clamp(self.min_size, self.max_size);
        self.resize_to(len, rng);
        Ok(())
    }

    pub fn set_diversity_threshold(&mut self, threshold: f32) -> Result<(), ConfigError> {
        validate_diversity_threshold(threshold)?;
        self.diversity_threshold = threshold;
        Ok(())
    }

    pub fn set_max_age(&mut self, max_age: u64) -> Result<(), ConfigError> {
        if max_age == 0 {
            return Err(ConfigError::InvalidMaxAge);
        }
        self.max_age = max_age;
        Ok(())
    }

    /// Start recording every birth.
    pub fn enable_genealogy(&mut self) {
        if self.genealogy.is_none() {
            self.genealogy = Some(Genealogy::default());
        }
    }

    /// Birth log, if recording is enabled.
    pub fn genealogy(&self) -> Option<&Genealogy> {
        self.genealogy.as_ref()
    }

    /// Randomly initialise every genome through the variant.
    pub fn init(&mut self, rng: &mut GenomeRng) {
        for genome in &mut self.genomes {
            self.variant.init(genome, &self.bounds, rng);
            self.variant.apply_mutability(genome);
            let id = genome.id;
            genome.mark_born(id, (id, id));
            if let Some(genealogy) = self.genealogy.as_mut() {
                genealogy.record(self.epoch, (id, id), id);
            }
        }
    }

    /// Assign the fitness of the genome at `rank`. Higher is better.
    ///
    /// # Panics
    /// If `rank` is out of range.
    pub fn set_value(&mut self, rank: usize, value: f32) {
        self.check_rank(rank);
        self.genomes[rank].value = value;
    }

    /// Genome at `rank`.
    ///
    /// # Panics
    /// If `rank` is out of range.
    pub fn genome(&self, rank: usize) -> &Genome {
        self.check_rank(rank);
        &self.genomes[rank]
    }

    /// Mutable genome at `rank`, for callers that edit genes directly.
    ///
    /// # Panics
    /// If `rank` is out of range.
    pub fn genome_mut(&mut self, rank: usize) -> &mut Genome {
        self.check_rank(rank);
        &mut self.genomes[rank]
    }

    /// Genomes in rank order.
    #[inline]
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// Ranks of the genomes still waiting for a fitness value.
    pub fn new_ranks(&self) -> impl Iterator<Item = usize> + '_ {
        self.genomes
            .iter()
            .enumerate()
            .filter(|(_, genome)| genome.is_new())
            .map(|(rank, _)| rank)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    #[inline]
    pub fn elite_count(&self) -> usize {
        self.elite_count
    }

    #[inline]
    pub fn min_size(&self) -> usize {
        self.min_size
    }

    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    #[inline]
    pub fn diversity_threshold(&self) -> f32 {
        self.diversity_threshold
    }

    #[inline]
    pub fn max_age(&self) -> u64 {
        self.max_age
    }

    /// Completed epochs.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Id the next born genome will receive.
    #[inline]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    #[inline]
    pub fn kt_event_count(&self) -> u64 {
        self.kt_event_count
    }

    /// Best genome seen so far; its age is the epoch count when it was recorded.
    #[inline]
    pub fn best_ever(&self) -> Option<&Genome> {
        self.best_ever.as_ref()
    }

    #[inline]
    pub fn bounds(&self) -> &GeneBounds {
        &self.bounds
    }

    #[inline]
    pub fn variant(&self) -> VariantKind {
        self.variant.kind()
    }

    #[inline]
    pub fn float_gene_count(&self) -> usize {
        self.bounds.float_len()
    }

    #[inline]
    pub fn int_gene_count(&self) -> usize {
        self.bounds.int_len()
    }

    /// Distance between the best genome and the worst elite.
    pub fn diversity(&self) -> f32 {
        diversity(
            &self.genomes[0],
            &self.genomes[self.elite_count - 1],
            &self.bounds,
        )
    }

    /// Take a fresh id.
    pub(crate) fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn record_birth(&mut self, child_id: u64, parent_ids: (u64, u64)) {
        if let Some(genealogy) = self.genealogy.as_mut() {
            genealogy.record(self.epoch, parent_ids, child_id);
        }
    }

    /// Reinitialise the genome at `rank` as a new individual.
    pub(crate) fn reseed(&mut self, rank: usize, rng: &mut GenomeRng) {
        let id = self.allocate_id();
        let genome = &mut self.genomes[rank];
        self.variant.init(genome, &self.bounds, rng);
        genome.mark_born(id, (id, id));
        self.record_birth(id, (id, id));
    }

    /// Truncate the worst ranks or append freshly initialised genomes.
    pub(crate) fn resize_to(&mut self, len: usize, rng: &mut GenomeRng) {
        let old = self.genomes.len();
        if len == old {
            return;
        }
        if len < old {
            self.genomes.truncate(len);
        } else {
            let (float_count, int_count) = (self.float_gene_count(), self.int_gene_count());
            for _ in old..len {
                let id = self.allocate_id();
                let mut genome = Genome::new(id, float_count, int_count);
                self.variant.init(&mut genome, &self.bounds, rng);
                self.variant.apply_mutability(&mut genome);
                self.genomes.push(genome);
                self.record_birth(id, (id, id));
            }
        }
        debug!("Population resized from {old} to {len}");
    }

    #[inline]
    fn check_rank(&self, rank: usize) {
        assert!(
            rank < self.genomes.len(),
            "rank {rank} out of range (0..{})",
            self.genomes.len()
        );
    }
}
