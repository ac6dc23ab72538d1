//! Configuration types for population parameters.

use serde::{Deserialize, Serialize};

use super::VariantKind;

/// Small positive floor used for degenerate numeric cases.
pub const EPSILON: f32 = 1e-6;

/// Default age limit of a non-improving leader.
pub const DEFAULT_MAX_AGE: u64 = 1000;

/// Top-level population configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of genomes at construction.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Number of elite genomes protected from replacement each epoch.
    #[serde(default = "default_elite_count")]
    pub elite_count: usize,
    /// Length of the float gene vector.
    #[serde(default)]
    pub float_gene_count: usize,
    /// Length of the integer gene vector.
    #[serde(default)]
    pub int_gene_count: usize,
    /// Lower size limit for adaptive resizing (defaults to `size`).
    #[serde(default)]
    pub min_size: Option<usize>,
    /// Upper size limit for adaptive resizing (defaults to `size`).
    #[serde(default)]
    pub max_size: Option<usize>,
    /// Diversity under which a KT event is triggered.
    #[serde(default = "default_diversity_threshold")]
    pub diversity_threshold: f32,
    /// Age after which a non-improving leader is reseeded.
    #[serde(default = "default_max_age")]
    pub max_age: u64,
    /// Interpretation of the gene vectors.
    #[serde(default)]
    pub variant: VariantKind,
    /// Per-gene float bounds; empty keeps the default `[0, 1]`.
    #[serde(default)]
    pub float_bounds: Vec<(f32, f32)>,
    /// Per-gene integer bounds; empty keeps the default `[0, 1]`.
    #[serde(default)]
    pub int_bounds: Vec<(i64, i64)>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            elite_count: default_elite_count(),
            float_gene_count: 0,
            int_gene_count: 0,
            min_size: None,
            max_size: None,
            diversity_threshold: default_diversity_threshold(),
            max_age: default_max_age(),
            variant: VariantKind::default(),
            float_bounds: Vec::new(),
            int_bounds: Vec::new(),
        }
    }
}

fn default_population_size() -> usize {
    100
}
fn default_elite_count() -> usize {
    20
}
fn default_diversity_threshold() -> f32 {
    EPSILON
}
fn default_max_age() -> u64 {
    DEFAULT_MAX_AGE
}

impl PopulationConfig {
    /// Effective lower size limit.
    #[inline]
    pub fn min_size(&self) -> usize {
        self.min_size.unwrap_or(self.size)
    }

    /// Effective upper size limit.
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size.unwrap_or(self.size)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_population_size(self.size, self.elite_count)?;
        validate_size_range(self.min_size(), self.max_size(), self.elite_count)?;
        if self.max_age == 0 {
            return Err(ConfigError::InvalidMaxAge);
        }
        validate_diversity_threshold(self.diversity_threshold)?;
        if !self.float_bounds.is_empty() && self.float_bounds.len() != self.float_gene_count {
            return Err(ConfigError::BoundsLengthMismatch {
                kind: "float",
                expected: self.float_gene_count,
                got: self.float_bounds.len(),
            });
        }
        if !self.int_bounds.is_empty() && self.int_bounds.len() != self.int_gene_count {
            return Err(ConfigError::BoundsLengthMismatch {
                kind: "int",
                expected: self.int_gene_count,
                got: self.int_bounds.len(),
            });
        }
        for (index, &(min, max)) in self.float_bounds.iter().enumerate() {
            validate_float_bounds(index, min, max)?;
        }
        for (index, &(min, max)) in self.int_bounds.iter().enumerate() {
            validate_int_bounds(index, min, max)?;
        }
        if matches!(self.variant, VariantKind::NeuraNet(_)) && !self.int_bounds.is_empty() {
            return Err(ConfigError::InvalidLayout(
                "NeuraNet link bounds follow from the layout, int_bounds must be empty".into(),
            ));
        }
        self.variant
            .validate(self.float_gene_count, self.int_gene_count)
    }
}

/// Check `size > 2` and `1 < elite_count < size`.
pub fn validate_population_size(size: usize, elite_count: usize) -> Result<(), ConfigError> {
    if size <= 2 {
        return Err(ConfigError::PopulationTooSmall { size });
    }
    if elite_count <= 1 || elite_count >= size {
        return Err(ConfigError::InvalidEliteCount { elite_count, size });
    }
    Ok(())
}

/// Check `elite_count < min <= max`.
pub fn validate_size_range(min: usize, max: usize, elite_count: usize) -> Result<(), ConfigError> {
    if min <= elite_count || min > max {
        return Err(ConfigError::InvalidSizeRange {
            min,
            max,
            elite_count,
        });
    }
    Ok(())
}

pub fn validate_diversity_threshold(threshold: f32) -> Result<(), ConfigError> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(ConfigError::InvalidDiversityThreshold(threshold));
    }
    Ok(())
}

pub fn validate_float_bounds(index: usize, min: f32, max: f32) -> Result<(), ConfigError> {
    if !min.is_finite() || !max.is_finite() || min > max || !(max - min).is_finite() {
        return Err(ConfigError::InvalidFloatBounds { index, min, max });
    }
    Ok(())
}

pub fn validate_int_bounds(index: usize, min: i64, max: i64) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::InvalidIntBounds { index, min, max });
    }
    Ok(())
}

/// Settings for the command line curve-fitting run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Population to evolve.
    pub population: PopulationConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Stop after this many epochs.
    #[serde(default = "default_max_epochs")]
    pub max_epochs: u64,
    /// Stop once the best error falls below this value.
    #[serde(default = "default_target_error")]
    pub target_error: f32,
    /// Where to write the final population snapshot.
    #[serde(default)]
    pub snapshot_path: Option<String>,
    /// Where to write the genealogy log (enables recording).
    #[serde(default)]
    pub genealogy_path: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            population: PopulationConfig {
                size: 100,
                elite_count: 20,
                float_gene_count: 4,
                int_gene_count: 4,
                min_size: Some(40),
                max_size: Some(100),
                float_bounds: vec![(-1.0, 1.0); 4],
                int_bounds: vec![(0, 4); 4],
                ..Default::default()
            },
            seed: None,
            max_epochs: default_max_epochs(),
            target_error: default_target_error(),
            snapshot_path: None,
            genealogy_path: None,
        }
    }
}

fn default_max_epochs() -> u64 {
    2000
}
fn default_target_error() -> f32 {
    EPSILON
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be greater than 2 (got {size})")]
    PopulationTooSmall { size: usize },
    #[error("Elite count must be in (1, {size}) (got {elite_count})")]
    InvalidEliteCount { elite_count: usize, size: usize },
    #[error("Size range [{min}, {max}] must satisfy {elite_count} < min <= max")]
    InvalidSizeRange {
        min: usize,
        max: usize,
        elite_count: usize,
    },
    #[error("Float bounds for gene {index} are invalid ([{min}, {max}])")]
    InvalidFloatBounds { index: usize, min: f32, max: f32 },
    #[error("Int bounds for gene {index} are invalid ([{min}, {max}])")]
    InvalidIntBounds { index: usize, min: i64, max: i64 },
    #[error("Expected {expected} {kind} bounds, got {got}")]
    BoundsLengthMismatch {
        kind: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("Maximum age must be non-zero")]
    InvalidMaxAge,
    #[error("Diversity threshold must be finite and non-negative (got {0})")]
    InvalidDiversityThreshold(f32),
    #[error("Invalid variant layout: {0}")]
    InvalidLayout(String),
    #[error("Int bounds of gene {index} are fixed by the variant to [{min}, {max}]")]
    StructuralBounds { index: usize, min: i64, max: i64 },
    #[error("Genome {id} breaks the variant structure: {reason}")]
    InvalidGenome { id: u64, reason: String },
    #[error(
        "Gene subset of {float_count} float and {int_count} int genes is invalid \
         (population has {float_len} float and {int_len} int genes)"
    )]
    InvalidSubset {
        float_count: usize,
        int_count: usize,
        float_len: usize,
        int_len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NeuraNetLayout;

    #[test]
    fn test_default_config_is_valid() {
        let config = PopulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_size(), config.size);
        assert_eq!(config.max_size(), config.size);
        assert!(RunConfig::default().population.validate().is_ok());
    }

    #[test]
    fn test_size_validation() {
        assert_eq!(
            validate_population_size(2, 1),
            Err(ConfigError::PopulationTooSmall { size: 2 })
        );
        assert!(validate_population_size(3, 1).is_err());
        assert!(validate_population_size(3, 3).is_err());
        assert!(validate_population_size(3, 2).is_ok());
    }

    #[test]
    fn test_bounds_validation() {
        let config = PopulationConfig {
            size: 10,
            elite_count: 3,
            float_gene_count: 2,
            float_bounds: vec![(0.0, 1.0), (2.0, 1.0)],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFloatBounds { index: 1, .. })
        ));
        // Range wider than f32 can represent
        assert!(validate_float_bounds(0, -f32::MAX, f32::MAX).is_err());
        assert!(validate_int_bounds(0, i64::MIN, i64::MAX).is_ok());

        let config = PopulationConfig {
            size: 10,
            elite_count: 3,
            int_gene_count: 2,
            int_bounds: vec![(0, 1)],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BoundsLengthMismatch { kind: "int", .. })
        ));
    }

    #[test]
    fn test_size_range_validation() {
        let config = PopulationConfig {
            size: 10,
            elite_count: 4,
            min_size: Some(4),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSizeRange { .. })
        ));
    }

    #[test]
    fn test_neuranet_rejects_int_bounds() {
        let mut config = PopulationConfig {
            size: 10,
            elite_count: 3,
            float_gene_count: 6,
            int_gene_count: 6,
            variant: VariantKind::NeuraNet(NeuraNetLayout {
                inputs: 1,
                hidden: 0,
                outputs: 2,
                mutable_links: true,
            }),
            int_bounds: vec![(-1, 100); 6],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLayout(_))
        ));
        config.int_bounds.clear();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: PopulationConfig =
            serde_json::from_str(r#"{"size": 8, "elite_count": 3, "float_gene_count": 2}"#)
                .unwrap();
        assert_eq!(config.max_age, 1000);
        assert_eq!(config.variant, VariantKind::Default);
        assert!(config.float_bounds.is_empty());
        assert!(config.validate().is_ok());
    }
}
