//! Per-gene value bounds shared by a whole population.

use crate::schema::{ConfigError, EPSILON, validate_float_bounds, validate_int_bounds};

/// `[min, max]` bounds for every float and integer gene index.
///
/// Also caches the Euclidean norm of each kind's range vector, used to normalise
/// diversity.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneBounds {
    float: Vec<(f32, f32)>,
    int: Vec<(i64, i64)>,
    float_norm: f32,
    int_norm: f32,
}

impl GeneBounds {
    /// Create bounds with every gene in `[0, 1]`.
    pub fn new(float_gene_count: usize, int_gene_count: usize) -> Self {
        let mut bounds = Self {
            float: vec![(0.0, 1.0); float_gene_count],
            int: vec![(0, 1); int_gene_count],
            float_norm: 1.0,
            int_norm: 1.0,
        };
        bounds.update_norms();
        bounds
    }

    #[inline]
    pub fn float_len(&self) -> usize {
        self.float.len()
    }

    #[inline]
    pub fn int_len(&self) -> usize {
        self.int.len()
    }

    /// Bounds of float gene `i`.
    #[inline]
    pub fn float(&self, i: usize) -> (f32, f32) {
        assert!(
            i < self.float.len(),
            "float gene index {i} out of range (0..{})",
            self.float.len()
        );
        self.float[i]
    }

    /// Bounds of integer gene `i`.
    #[inline]
    pub fn int(&self, i: usize) -> (i64, i64) {
        assert!(
            i < self.int.len(),
            "int gene index {i} out of range (0..{})",
            self.int.len()
        );
        self.int[i]
    }

    #[inline]
    pub fn floats(&self) -> &[(f32, f32)] {
        &self.float
    }

    #[inline]
    pub fn ints(&self) -> &[(i64, i64)] {
        &self.int
    }

    /// Set the bounds of float gene `i`.
    pub fn set_float(&mut self, i: usize, min: f32, max: f32) -> Result<(), ConfigError> {
        assert!(
            i < self.float.len(),
            "float gene index {i} out of range (0..{})",
            self.float.len()
        );
        validate_float_bounds(i, min, max)?;
        self.float[i] = (min, max);
        self.update_norms();
        Ok(())
    }

    /// Set the bounds of integer gene `i`.
    pub fn set_int(&mut self, i: usize, min: i64, max: i64) -> Result<(), ConfigError> {
        assert!(
            i < self.int.len(),
            "int gene index {i} out of range (0..{})",
            self.int.len()
        );
        validate_int_bounds(i, min, max)?;
        self.int[i] = (min, max);
        self.update_norms();
        Ok(())
    }

    /// Bounds of the first `float_count` float and `int_count` integer genes.
    pub(crate) fn subset(&self, float_count: usize, int_count: usize) -> Self {
        let mut bounds = Self {
            float: self.float[..float_count].to_vec(),
            int: self.int[..int_count].to_vec(),
            float_norm: 1.0,
            int_norm: 1.0,
        };
        bounds.update_norms();
        bounds
    }

    /// Norm of the float range vector, never below `EPSILON`.
    #[inline]
    pub fn float_norm(&self) -> f32 {
        self.float_norm
    }

    /// Norm of the integer range vector, never below `EPSILON`.
    #[inline]
    pub fn int_norm(&self) -> f32 {
        self.int_norm
    }

    fn update_norms(&mut self) {
        let float_sq: f64 = self
            .float
            .iter()
            .map(|&(min, max)| (max as f64 - min as f64).powi(2))
            .sum();
        let int_sq: f64 = self
            .int
            .iter()
            .map(|&(min, max)| (max as f64 - min as f64).powi(2))
            .sum();
        self.float_norm = (float_sq.sqrt() as f32).max(EPSILON);
        self.int_norm = (int_sq.sqrt() as f32).max(EPSILON);
    }
}
