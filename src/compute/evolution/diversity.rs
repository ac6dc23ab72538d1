//! Normalised genetic distance between genomes.

use super::bounds::GeneBounds;
use super::genome::Genome;

/// Distance between two genomes of the same population.
///
/// Each gene kind contributes the Euclidean distance of its vector divided by the norm
/// of its bounds-range vector, so identical genomes are at 0 and genomes at opposite
/// corners of the bounds are at 1. Float and integer parts are averaged when both
/// kinds are present.
pub fn diversity(a: &Genome, b: &Genome, bounds: &GeneBounds) -> f32 {
    let float_part = (!a.float_genes.is_empty()).then(|| {
        let sq: f32 = a
            .float_genes
            .iter()
            .zip(&b.float_genes)
            .map(|(x, y)| (x - y) * (x - y))
            .sum();
        sq.sqrt() / bounds.float_norm()
    });
    let int_part = (!a.int_genes.is_empty()).then(|| {
        let sq: f64 = a
            .int_genes
            .iter()
            .zip(&b.int_genes)
            .map(|(&x, &y)| (x as f64 - y as f64).powi(2))
            .sum();
        sq.sqrt() as f32 / bounds.int_norm()
    });

    match (float_part, int_part) {
        (Some(f), Some(i)) => 0.5 * (f + i),
        (Some(f), None) => f,
        (None, Some(i)) => i,
        (None, None) => 0.0,
    }
}
