//! Append-only log of genome births.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::schema::BirthEvent;

use super::persist::PersistError;

/// Every birth recorded since genealogy was enabled, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Genealogy {
    births: Vec<BirthEvent>,
}

impl Genealogy {
    /// Append one birth.
    pub fn record(&mut self, epoch: u64, parent_ids: (u64, u64), child_id: u64) {
        self.births.push(BirthEvent {
            epoch,
            parent_ids,
            child_id,
        });
    }

    #[inline]
    pub fn births(&self) -> &[BirthEvent] {
        &self.births
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.births.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.births.is_empty()
    }

    /// Births of one epoch.
    pub fn epoch(&self, epoch: u64) -> impl Iterator<Item = &BirthEvent> {
        self.births.iter().filter(move |birth| birth.epoch == epoch)
    }

    /// Write the log as a JSON array.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, &self.births)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersistError> {
        let reader = BufReader::new(File::open(path)?);
        let births = serde_json::from_reader(reader)?;
        Ok(Self { births })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_save() {
        let mut genealogy = Genealogy::default();
        genealogy.record(0, (3, 3), 3);
        genealogy.record(1, (0, 2), 7);
        genealogy.record(1, (1, 2), 8);
        assert_eq!(genealogy.len(), 3);
        assert_eq!(genealogy.epoch(1).count(), 2);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genealogy.json");
        genealogy.save(&path).unwrap();
        assert_eq!(Genealogy::load(&path).unwrap(), genealogy);
    }
}
