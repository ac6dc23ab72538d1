//! Epoch step: ranking, best tracking, KT events, reproduction and resizing.

use std::collections::HashMap;

use log::{debug, info};

use crate::schema::ConfigError;

use super::bounds::GeneBounds;
use super::diversity::diversity;
use super::genome::{GeneTail, Genome};
use super::mutation::MutationParams;
use super::population::Population;
use super::rng::GenomeRng;

/// What happened during one call to [`Population::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    /// Index of the epoch that just completed.
    pub epoch: u64,
    /// Whether the best genome improved on the best ever.
    pub improved: bool,
    /// Whether the epoch reseeded genomes instead of reproducing.
    pub kt_event: bool,
    /// Diversity between the best genome and the worst elite after ranking.
    pub diversity: f32,
    /// Population size after resizing.
    pub size: usize,
}

/// Sort key placing NaN fitness below everything else.
#[inline]
fn rank_key(genome: &Genome) -> f32 {
    if genome.value.is_nan() {
        f32::NEG_INFINITY
    } else {
        genome.value
    }
}

impl Population {
    /// Advance the population by one epoch.
    ///
    /// Every genome must carry its fitness. Non-elite slots are refilled with
    /// children of the elites unless diversity collapsed or the leader overstayed
    /// its term, in which case a KT event reseeds the lagging genomes instead.
    pub fn step(&mut self, rng: &mut GenomeRng) -> EpochReport {
        self.rank();
        let improved = self.track_best();

        let mut kt_event = false;
        if !improved && self.genomes[0].age > self.max_age {
            debug!(
                "Leader {} reached age {} without improving, reseeding it",
                self.genomes[0].id, self.genomes[0].age
            );
            self.reseed(0, rng);
            kt_event = true;
        }

        let diversity = self.diversity();
        if kt_event || diversity < self.diversity_threshold {
            self.kt_event(rng);
            kt_event = true;
        } else {
            self.reproduce_non_elites(rng);
        }

        self.adapt_size(improved, rng);

        let report = EpochReport {
            epoch: self.epoch,
            improved,
            kt_event,
            diversity,
            size: self.genomes.len(),
        };
        self.epoch += 1;
        report
    }

    /// Advance one epoch evolving only the first `float_count` float and
    /// `int_count` integer genes.
    ///
    /// Ranking, diversity and KT events only look at those genes. The remaining
    /// genes of an elite are kept, children inherit them from their first parent and
    /// reseeded genomes draw them afresh. The variant must be able to treat the
    /// prefix as a complete genome on its own.
    pub fn step_subset(
        &mut self,
        float_count: usize,
        int_count: usize,
        rng: &mut GenomeRng,
    ) -> Result<EpochReport, ConfigError> {
        let (float_len, int_len) = (self.float_gene_count(), self.int_gene_count());
        if float_count > float_len || int_count > int_len || float_count + int_count == 0 {
            return Err(ConfigError::InvalidSubset {
                float_count,
                int_count,
                float_len,
                int_len,
            });
        }
        self.variant.kind().validate(float_count, int_count)?;
        let subset = self.bounds.subset(float_count, int_count);
        let mut structural = subset.clone();
        self.variant.install_bounds(&mut structural)?;
        if structural != subset {
            return Err(ConfigError::InvalidLayout(format!(
                "variant links depend on genes outside the first {float_count} float \
                 and {int_count} int genes"
            )));
        }

        let mut tails = HashMap::with_capacity(self.genomes.len() + 1);
        for genome in &mut self.genomes {
            tails.insert(genome.id, genome.split_tail(float_count, int_count));
        }
        if let Some(best) = self.best_ever.as_mut() {
            let tail = best.split_tail(float_count, int_count);
            tails.entry(best.id).or_insert(tail);
        }

        let full = std::mem::replace(&mut self.bounds, subset);
        let report = self.step(rng);
        self.bounds = full;

        for genome in &mut self.genomes {
            restore_tail(genome, &tails, &self.bounds, rng);
            self.variant.apply_mutability(genome);
        }
        if let Some(best) = self.best_ever.as_mut() {
            restore_tail(best, &tails, &self.bounds, rng);
            self.variant.apply_mutability(best);
        }
        Ok(report)
    }

    /// Stable sort by decreasing fitness.
    fn rank(&mut self) {
        self.genomes.sort_by(|a, b| rank_key(b).total_cmp(&rank_key(a)));
    }

    /// Snapshot the leader if it beats the best ever. Returns whether it did.
    fn track_best(&mut self) -> bool {
        let leader = &self.genomes[0];
        let improved = match &self.best_ever {
            None => true,
            Some(best) => self.epoch == 0 || leader.value > best.value,
        };
        if !improved {
            return false;
        }

        if let Some(best) = self.best_ever.as_mut() {
            best.copy_from(leader);
        } else {
            self.best_ever = Some(leader.clone());
        }
        if let Some(best) = self.best_ever.as_mut() {
            best.age = self.epoch + 1;
            debug!(
                "Epoch {}: new best genome {} with value {}",
                self.epoch, best.id, best.value
            );
        }
        true
    }

    /// Reseed every genome from the first one, after rank 0, that is no longer
    /// distinct from the worst elite.
    fn kt_event(&mut self, rng: &mut GenomeRng) {
        let last_elite = self.elite_count - 1;
        let len = self.genomes.len();
        let mut boundary = 1;
        while boundary < len
            && diversity(
                &self.genomes[boundary],
                &self.genomes[last_elite],
                &self.bounds,
            ) > self.diversity_threshold
        {
            boundary += 1;
        }

        for rank in boundary..len {
            self.reseed(rank, rng);
        }
        self.kt_event_count += 1;
        info!(
            "KT event #{} at epoch {}: reseeded ranks {boundary}..{len} ({} genomes)",
            self.kt_event_count,
            self.epoch,
            len - boundary
        );
    }

    /// Two distinct elite ranks, lowest first.
    fn select_parents(&self, rng: &mut GenomeRng) -> (usize, usize) {
        loop {
            let p0 = rng.index(self.elite_count);
            let p1 = rng.index(self.elite_count);
            if p0 != p1 {
                return (p0.min(p1), p0.max(p1));
            }
        }
    }

    fn reproduce_non_elites(&mut self, rng: &mut GenomeRng) {
        let elite_count = self.elite_count;
        for genome in &mut self.genomes[..elite_count] {
            genome.age += 1;
            genome.parent_ids = (genome.id, genome.id);
        }

        let len = self.genomes.len();
        let non_elites = len - elite_count;
        let units = self
            .variant
            .unit_count(self.bounds.float_len(), self.bounds.int_len());

        for rank in elite_count..len {
            let (p0, p1) = self.select_parents(rng);
            let id = self.allocate_id();

            let (elites, rest) = self.genomes.split_at_mut(elite_count);
            let (a, b) = (&elites[p0], &elites[p1]);
            let child = &mut rest[rank - elite_count];
            let parent_ids = (a.id, b.id);

            self.variant.reproduce(a, b, child, rng);
            child.mark_born(id, parent_ids);
            let params =
                MutationParams::new(rank - elite_count, non_elites, a.age, self.max_age, units);
            self.variant.mutate(child, params, &self.bounds, rng);

            self.record_birth(id, parent_ids);
        }
    }

    /// Shrink toward the minimum size after an improvement, grow toward the maximum
    /// otherwise.
    fn adapt_size(&mut self, improved: bool, rng: &mut GenomeRng) {
        let len = self.genomes.len();
        let target = if improved {
            len - len.saturating_sub(self.min_size).div_ceil(2)
        } else {
            len + self.max_size.saturating_sub(len).div_ceil(2)
        };
        self.resize_to(target, rng);
    }
}

/// Put back the tail genes of `genome`: its own if it survived, its first
/// parent's if it is a child, fresh random genes otherwise.
fn restore_tail(
    genome: &mut Genome,
    tails: &HashMap<u64, GeneTail>,
    bounds: &GeneBounds,
    rng: &mut GenomeRng,
) {
    match tails
        .get(&genome.id)
        .or_else(|| tails.get(&genome.parent_ids.0))
    {
        Some(tail) => genome.join_tail(tail),
        None => {
            let tail = GeneTail::random(
                bounds,
                genome.float_gene_count(),
                genome.int_gene_count(),
                rng,
            );
            genome.join_tail(&tail);
        }
    }
}
