//! Bounds-preserving mutation primitives.
//!
//! Out-of-range values are mirrored back across the violated bound instead of being
//! clamped, so mutated genes do not pile up on the edges of their range.

use crate::schema::EPSILON;

use super::genome::Genome;
use super::rng::GenomeRng;

/// Smallest integer step amplitude, so rounding never reduces a mutation to a no-op.
pub const MIN_INT_AMPLITUDE: f32 = 2.0;

/// Reflect `value` into `[min, max]`.
///
/// Equivalent to reflecting across whichever bound is violated until the value is in
/// range. A zero-width range collapses to `min`.
pub fn mirror_f(value: f32, min: f32, max: f32) -> f32 {
    let width = max - min;
    if width <= 0.0 || !value.is_finite() {
        return min;
    }
    if (min..=max).contains(&value) {
        return value;
    }
    let period = 2.0 * width;
    let mut t = (value - min).rem_euclid(period);
    if t > width {
        t = period - t;
    }
    (min + t).clamp(min, max)
}

/// Integer counterpart of [`mirror_f`].
pub fn mirror_i(value: i64, min: i64, max: i64) -> i64 {
    if min >= max {
        return min;
    }
    if (min..=max).contains(&value) {
        return value;
    }
    // Widened so that spans of the full i64 range cannot overflow
    let (lo, width) = (min as i128, max as i128 - min as i128);
    let period = 2 * width;
    let mut t = (value as i128 - lo).rem_euclid(period);
    if t > width {
        t = period - t;
    }
    (lo + t) as i64
}

/// Mutation strength for one child.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationParams {
    /// Per-unit mutation probability.
    pub probability: f32,
    /// Step amplitude as a fraction of the gene range.
    pub amplitude: f32,
}

impl MutationParams {
    /// Derive the mutation strength of a child.
    ///
    /// `rank` is the child's position among the `non_elites` replaced slots,
    /// `parent_age` the age of its first parent and `units` the number of mutation
    /// units of the active variant. Worse ranks and older parents mutate more; young
    /// parents produce small steps.
    pub fn new(
        rank: usize,
        non_elites: usize,
        parent_age: u64,
        max_age: u64,
        units: usize,
    ) -> Self {
        let rank_term = if non_elites == 0 || units == 0 {
            0.0
        } else {
            (rank as f32 / non_elites as f32).sqrt() / units as f32
        };
        let age_term = parent_age as f32 / max_age.max(1) as f32;
        let probability = (rank_term + age_term).max(EPSILON);
        let amplitude = 1.0 - 1.0 / ((parent_age as f32) + 1.0).sqrt();
        Self {
            probability,
            amplitude,
        }
    }
}

/// Mutate float gene `i` of `genome` inside `[min, max]` and record its new momentum.
pub fn mutate_float_gene(
    genome: &mut Genome,
    i: usize,
    (min, max): (f32, f32),
    amplitude: f32,
    rng: &mut GenomeRng,
) {
    let old = genome.gene_f(i);
    let momentum = genome.delta_gene_f(i);
    let step = (max - min) * amplitude * (rng.unit() - 0.5 + momentum);
    let new = mirror_f(old + step, min, max);
    genome.set_gene_f(i, new);
    genome.set_delta_gene_f(i, new - old);
}

/// Mutate integer gene `i` of `genome` inside `[min, max]`.
pub fn mutate_int_gene(
    genome: &mut Genome,
    i: usize,
    (min, max): (i64, i64),
    amplitude: f32,
    rng: &mut GenomeRng,
) {
    let old = genome.gene_i(i);
    let span = ((max as f64 - min as f64) * amplitude as f64).max(MIN_INT_AMPLITUDE as f64);
    let step = (span * (rng.unit() as f64 - 0.5)).round() as i64;
    genome.set_gene_i(i, mirror_i(old.saturating_add(step), min, max));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::evolution::bounds::GeneBounds;
    use proptest::prelude::*;

    #[test]
    fn test_mirror_reflects_instead_of_clamping() {
        assert_eq!(mirror_f(0.5, 0.0, 1.0), 0.5);
        assert!((mirror_f(1.25, 0.0, 1.0) - 0.75).abs() < 1e-6);
        assert!((mirror_f(-0.25, 0.0, 1.0) - 0.25).abs() < 1e-6);
        // Several widths away
        assert!((mirror_f(3.25, 0.0, 1.0) - 0.75).abs() < 1e-5);
        assert_eq!(mirror_f(5.0, 2.0, 2.0), 2.0);
        assert_eq!(mirror_f(f32::NAN, -1.0, 1.0), -1.0);

        assert_eq!(mirror_i(12, 1, 10), 8);
        assert_eq!(mirror_i(0, 1, 10), 2);
        assert_eq!(mirror_i(-30, 1, 10), 6);
        assert_eq!(mirror_i(7, 4, 4), 4);
    }

    #[test]
    fn test_params() {
        let fresh = MutationParams::new(0, 10, 0, 1000, 4);
        assert_eq!(fresh.amplitude, 0.0);
        assert_eq!(fresh.probability, EPSILON);

        let old = MutationParams::new(9, 10, 99, 1000, 4);
        assert!((old.amplitude - 0.9).abs() < 1e-6);
        assert!(old.probability > fresh.probability);
    }

    #[test]
    fn test_int_step_never_zero_amplitude() {
        let mut rng = GenomeRng::new(11);
        let mut genome = Genome::new(0, 0, 1);
        genome.set_gene_i(0, 5);
        let mut moved = false;
        for _ in 0..200 {
            mutate_int_gene(&mut genome, 0, (1, 10), 0.0, &mut rng);
            moved |= genome.gene_i(0) != 5;
        }
        assert!(moved);
    }

    #[test]
    fn test_extreme_int_bounds() {
        assert_eq!(mirror_i(i64::MAX, i64::MIN, 0), i64::MIN + 1);
        assert_eq!(mirror_i(i64::MIN, 0, i64::MAX), i64::MAX - 1);
        assert_eq!(mirror_i(5, i64::MIN, i64::MAX), 5);

        let mut rng = GenomeRng::new(4);
        let mut genome = Genome::new(0, 0, 1);
        genome.set_gene_i(0, i64::MAX);
        for _ in 0..200 {
            mutate_int_gene(&mut genome, 0, (i64::MIN, i64::MAX), 0.9, &mut rng);
        }
        genome.set_gene_i(0, i64::MIN);
        for _ in 0..200 {
            mutate_int_gene(&mut genome, 0, (i64::MIN, -1), 0.9, &mut rng);
            assert!(genome.gene_i(0) < 0);
        }
    }

    #[test]
    fn test_float_mutation_records_delta() {
        let mut rng = GenomeRng::new(2);
        let mut genome = Genome::new(0, 1, 0);
        genome.set_gene_f(0, 0.2);
        mutate_float_gene(&mut genome, 0, (-1.0, 1.0), 0.5, &mut rng);
        let delta = genome.delta_gene_f(0);
        assert!((genome.gene_f(0) - 0.2 - delta).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_mirror_in_range(v in -1e6f32..1e6, min in -100.0f32..100.0, width in 0.0f32..50.0) {
            let max = min + width;
            let m = mirror_f(v, min, max);
            prop_assert!(m >= min && m <= max);
        }

        #[test]
        fn prop_mutation_stays_in_bounds(
            seed in any::<u64>(),
            start in prop::sample::select(vec![-1.0f32, -0.999, 0.0, 0.999, 1.0]),
            int_start in 1i64..=10,
            amplitude in 0.0f32..1.0,
            momentum in -2.0f32..2.0,
        ) {
            let mut rng = GenomeRng::new(seed);
            let mut bounds = GeneBounds::new(1, 1);
            bounds.set_float(0, -1.0, 1.0).unwrap();
            bounds.set_int(0, 1, 10).unwrap();
            let mut genome = Genome::new(0, 1, 1);
            genome.set_gene_f(0, start);
            genome.set_delta_gene_f(0, momentum);
            genome.set_gene_i(0, int_start);
            for _ in 0..50 {
                mutate_float_gene(&mut genome, 0, bounds.float(0), amplitude, &mut rng);
                mutate_int_gene(&mut genome, 0, bounds.int(0), amplitude, &mut rng);
                prop_assert!(genome.is_within(&bounds));
            }
        }
    }
}
