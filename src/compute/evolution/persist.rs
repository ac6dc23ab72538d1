//! Export and import of complete population state.
//!
//! Import checks the whole snapshot before building anything, so a failed load
//! never leaves a half-built population behind.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::warn;

use crate::schema::{
    ConfigError, GenomeRecord, PopulationSnapshot, validate_diversity_threshold,
    validate_population_size, validate_size_range,
};

use super::bounds::GeneBounds;
use super::genome::Genome;
use super::population::Population;
use super::variant::variant_for;

/// Errors raised while saving or loading a population.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid snapshot: {0}")]
    Invalid(String),
}

impl From<ConfigError> for PersistError {
    fn from(err: ConfigError) -> Self {
        PersistError::Invalid(err.to_string())
    }
}

impl From<&Genome> for GenomeRecord {
    fn from(genome: &Genome) -> Self {
        Self {
            id: genome.id,
            age: genome.age,
            value: genome.value,
            float_genes: genome.float_genes.clone(),
            delta_float_genes: genome.delta_float_genes.clone(),
            int_genes: genome.int_genes.clone(),
            parent_ids: genome.parent_ids,
        }
    }
}

impl GenomeRecord {
    fn check(&self, bounds: &GeneBounds) -> Result<(), PersistError> {
        let float_count = bounds.float_len();
        let int_count = bounds.int_len();
        if self.float_genes.len() != float_count
            || self.delta_float_genes.len() != float_count
            || self.int_genes.len() != int_count
        {
            return Err(PersistError::Invalid(format!(
                "genome {} has the wrong number of genes (expected {float_count} float, {int_count} int)",
                self.id
            )));
        }
        if self.age == 0 {
            return Err(PersistError::Invalid(format!("genome {} has age 0", self.id)));
        }
        if self.delta_float_genes.iter().any(|d| !d.is_finite()) {
            return Err(PersistError::Invalid(format!(
                "genome {} has a non-finite gene delta",
                self.id
            )));
        }
        let genome = self.to_genome();
        if !genome.is_within(bounds) {
            return Err(PersistError::Invalid(format!(
                "genome {} has genes outside their bounds",
                self.id
            )));
        }
        Ok(())
    }

    fn to_genome(&self) -> Genome {
        let mut genome = Genome::new(self.id, self.float_genes.len(), self.int_genes.len());
        genome.age = self.age;
        genome.value = self.value;
        genome.float_genes.clone_from(&self.float_genes);
        genome.delta_float_genes.clone_from(&self.delta_float_genes);
        genome.int_genes.clone_from(&self.int_genes);
        genome.parent_ids = self.parent_ids;
        genome
    }
}

impl Population {
    /// Capture the complete state of the population.
    pub fn export(&self) -> PopulationSnapshot {
        PopulationSnapshot {
            variant: self.variant.kind(),
            elite_count: self.elite_count,
            min_size: self.min_size,
            max_size: self.max_size,
            diversity_threshold: self.diversity_threshold,
            max_age: self.max_age,
            float_gene_count: self.bounds.float_len(),
            int_gene_count: self.bounds.int_len(),
            float_bounds: self.bounds.floats().to_vec(),
            int_bounds: self.bounds.ints().to_vec(),
            genomes: self.genomes.iter().map(GenomeRecord::from).collect(),
            best_ever: self.best_ever.as_ref().map(GenomeRecord::from),
            epoch: self.epoch,
            next_id: self.next_id,
            kt_event_count: self.kt_event_count,
        }
    }

    /// Rebuild a population from a snapshot.
    ///
    /// Genealogy recording starts disabled.
    pub fn import(snapshot: PopulationSnapshot) -> Result<Self, PersistError> {
        Self::build(snapshot).inspect_err(|err| warn!("Population import failed: {err}"))
    }

    fn build(snapshot: PopulationSnapshot) -> Result<Self, PersistError> {
        let size = snapshot.genomes.len();
        validate_population_size(size, snapshot.elite_count)?;
        validate_size_range(snapshot.min_size, snapshot.max_size, snapshot.elite_count)?;
        if size < snapshot.min_size || size > snapshot.max_size {
            return Err(PersistError::Invalid(format!(
                "{size} genomes outside the size range [{}, {}]",
                snapshot.min_size, snapshot.max_size
            )));
        }
        validate_diversity_threshold(snapshot.diversity_threshold)?;
        if snapshot.max_age == 0 {
            return Err(ConfigError::InvalidMaxAge.into());
        }
        snapshot
            .variant
            .validate(snapshot.float_gene_count, snapshot.int_gene_count)?;

        if snapshot.float_bounds.len() != snapshot.float_gene_count
            || snapshot.int_bounds.len() != snapshot.int_gene_count
        {
            return Err(PersistError::Invalid(format!(
                "{} float and {} int bounds for {} float and {} int genes",
                snapshot.float_bounds.len(),
                snapshot.int_bounds.len(),
                snapshot.float_gene_count,
                snapshot.int_gene_count
            )));
        }
        let mut bounds = GeneBounds::new(snapshot.float_gene_count, snapshot.int_gene_count);
        for (i, &(min, max)) in snapshot.float_bounds.iter().enumerate() {
            bounds.set_float(i, min, max)?;
        }
        for (i, &(min, max)) in snapshot.int_bounds.iter().enumerate() {
            bounds.set_int(i, min, max)?;
        }
        let variant = variant_for(snapshot.variant);
        let mut structural = bounds.clone();
        variant.install_bounds(&mut structural)?;
        if structural != bounds {
            return Err(PersistError::Invalid(
                "int bounds do not match the variant layout".into(),
            ));
        }

        let mut ids = HashSet::with_capacity(size);
        for record in &snapshot.genomes {
            record.check(&bounds)?;
            variant.check_genome(&record.to_genome())?;
            if record.id >= snapshot.next_id {
                return Err(PersistError::Invalid(format!(
                    "genome id {} is not below next id {}",
                    record.id, snapshot.next_id
                )));
            }
            if !ids.insert(record.id) {
                return Err(PersistError::Invalid(format!("duplicate genome id {}", record.id)));
            }
        }
        if let Some(best) = &snapshot.best_ever {
            best.check(&bounds)?;
            variant.check_genome(&best.to_genome())?;
        }

        let genomes = snapshot
            .genomes
            .iter()
            .map(|record| {
                let mut genome = record.to_genome();
                variant.apply_mutability(&mut genome);
                genome
            })
            .collect();
        let best_ever = snapshot.best_ever.as_ref().map(|record| {
            let mut genome = record.to_genome();
            variant.apply_mutability(&mut genome);
            genome
        });

        Ok(Self {
            genomes,
            elite_count: snapshot.elite_count,
            min_size: snapshot.min_size,
            max_size: snapshot.max_size,
            diversity_threshold: snapshot.diversity_threshold,
            max_age: snapshot.max_age,
            bounds,
            variant,
            best_ever,
            epoch: snapshot.epoch,
            next_id: snapshot.next_id,
            kt_event_count: snapshot.kt_event_count,
            genealogy: None,
        })
    }

    /// Write the snapshot as pretty-printed JSON.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), PersistError> {
        serde_json::to_writer_pretty(writer, &self.export())?;
        Ok(())
    }

    /// Read a population from JSON written by [`Population::write_json`].
    pub fn read_json<R: Read>(reader: R) -> Result<Self, PersistError> {
        let snapshot = serde_json::from_reader::<_, PopulationSnapshot>(reader)
            .inspect_err(|err| warn!("Population import failed: {err}"))?;
        Self::import(snapshot)
    }

    /// Save to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_json(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Load from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersistError> {
        let file = File::open(path)?;
        Self::read_json(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::evolution::rng::GenomeRng;
    use crate::schema::{NeuraNetLayout, VariantKind};

    fn evolved() -> Population {
        let mut rng = GenomeRng::new(21);
        let mut population = Population::new(6, 2, 3, 2).unwrap();
        for i in 0..3 {
            population.set_float_bounds(i, -1.0, 1.0).unwrap();
        }
        population.set_int_bounds(1, 1, 10).unwrap();
        population.init(&mut rng);
        for _ in 0..5 {
            for rank in population.new_ranks().collect::<Vec<_>>() {
                let value: f32 = population.genome(rank).float_genes().iter().sum();
                population.set_value(rank, value);
            }
            population.step(&mut rng);
        }
        population
    }

    #[test]
    fn test_round_trip_through_file() {
        let population = evolved();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("population.json");
        population.save(&path).unwrap();

        let loaded = Population::load(&path).unwrap();
        assert_eq!(loaded.bounds(), population.bounds());
        assert_eq!(loaded.genomes(), population.genomes());
        assert_eq!(loaded.best_ever(), population.best_ever());
        assert_eq!(loaded.epoch(), population.epoch());
        assert_eq!(loaded.next_id(), population.next_id());
        assert_eq!(loaded.kt_event_count(), population.kt_event_count());
        assert_eq!(loaded.export(), population.export());
    }

    #[test]
    fn test_round_trip_neuranet() {
        let mut rng = GenomeRng::new(5);
        let mut population = Population::new(4, 2, 6, 6).unwrap();
        let kind = VariantKind::NeuraNet(NeuraNetLayout {
            inputs: 1,
            hidden: 0,
            outputs: 2,
            mutable_links: true,
        });
        population.set_variant(kind).unwrap();
        population.init(&mut rng);

        let mut buffer = Vec::new();
        population.write_json(&mut buffer).unwrap();
        let loaded = Population::read_json(buffer.as_slice()).unwrap();
        assert_eq!(loaded.variant(), kind);
        assert_eq!(loaded.genomes(), population.genomes());
    }

    #[test]
    fn test_import_rejects_broken_links() {
        let mut rng = GenomeRng::new(9);
        let mut population = Population::new(4, 2, 6, 9).unwrap();
        population
            .set_variant(VariantKind::NeuraNet(NeuraNetLayout {
                inputs: 1,
                hidden: 1,
                outputs: 2,
                mutable_links: true,
            }))
            .unwrap();
        population.init(&mut rng);
        let good = population.export();

        // Widened link bounds admitting a base function that does not exist
        let mut snapshot = good.clone();
        snapshot.int_bounds[0] = (-1, 100);
        for record in &mut snapshot.genomes {
            record.int_genes[0] = 50;
        }
        assert!(matches!(Population::import(snapshot), Err(PersistError::Invalid(_))));

        // Self loop on the hidden node, inside the link bounds
        let mut snapshot = good.clone();
        snapshot.genomes[1].int_genes[6..9].copy_from_slice(&[0, 1, 1]);
        assert!(matches!(Population::import(snapshot), Err(PersistError::Invalid(_))));

        // Output node 2 left without an incoming link
        let mut snapshot = good.clone();
        snapshot.genomes[2].int_genes[0] = -1;
        assert!(matches!(Population::import(snapshot), Err(PersistError::Invalid(_))));

        let mut snapshot = good.clone();
        let mut best = snapshot.genomes[0].clone();
        best.int_genes[3] = -1;
        snapshot.best_ever = Some(best);
        assert!(Population::import(snapshot).is_err());

        let mut imported = Population::import(good).unwrap();
        for rank in 0..imported.len() {
            imported.set_value(rank, rank as f32);
        }
        imported.step(&mut rng);
        assert_eq!(imported.epoch(), 1);
    }

    #[test]
    fn test_malformed_imports_fail() {
        let good = evolved().export();

        let mut snapshot = good.clone();
        snapshot.genomes[0].float_genes.pop();
        assert!(matches!(Population::import(snapshot), Err(PersistError::Invalid(_))));

        let mut snapshot = good.clone();
        snapshot.genomes[1].id = snapshot.genomes[0].id;
        assert!(Population::import(snapshot).is_err());

        let mut snapshot = good.clone();
        snapshot.next_id = 0;
        assert!(Population::import(snapshot).is_err());

        let mut snapshot = good.clone();
        snapshot.genomes[2].int_genes[1] = 11;
        assert!(Population::import(snapshot).is_err());

        let mut snapshot = good.clone();
        snapshot.elite_count = snapshot.genomes.len();
        assert!(Population::import(snapshot).is_err());

        let mut snapshot = good.clone();
        snapshot.float_bounds[0] = (1.0, -1.0);
        assert!(Population::import(snapshot).is_err());

        let mut snapshot = good;
        snapshot.genomes.truncate(2);
        assert!(Population::import(snapshot).is_err());

        assert!(matches!(
            Population::read_json(&b"{\"epoch\": 3}"[..]),
            Err(PersistError::Json(_))
        ));
        assert!(matches!(
            Population::load("/nonexistent/population.json"),
            Err(PersistError::Io(_))
        ));
    }
}
