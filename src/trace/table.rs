//! Append-only result table

use super::TraceRecord;
use std::path::Path;
use thiserror::Error;

/// Errors persisting or loading the result table
#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ordered collection of trace records for a whole run.
///
/// Records are only ever appended. The table is written to disk once, at
/// the end of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    records: Vec<TraceRecord>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the records of one sentence
    pub fn append(&mut self, records: Vec<TraceRecord>) {
        self.records.extend(records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TraceRecord> {
        self.records
    }

    /// Write the table as CSV with a header row
    pub fn write_csv(&self, path: &Path) -> Result<(), TableError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a table previously written by [`ResultTable::write_csv`]
    pub fn read_csv(path: &Path) -> Result<Self, TableError> {
        let mut reader = csv::Reader::from_path(path)?;
        let records = reader
            .deserialize()
            .collect::<Result<Vec<TraceRecord>, _>>()?;
        Ok(Self { records })
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a TraceRecord;
    type IntoIter = std::slice::Iter<'a, TraceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
