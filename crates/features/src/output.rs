//! CSV writers for feature and neighbor files

use crate::errors::{FeatureError, Result};
use crate::processor::FeatureRecord;
use authormatch_common::catalog::AuthorId;
use authormatch_similarity::compare::AggregateComparator;
use authormatch_similarity::neighbor::NeighborMatch;
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Receives feature rows as they are emitted
pub trait RecordSink {
    fn write_record(&mut self, record: &FeatureRecord) -> Result<()>;
}

impl RecordSink for Vec<FeatureRecord> {
    fn write_record(&mut self, record: &FeatureRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// `AuthorId, PaperId, PaperYear, <author columns>, <paper columns>, mark`
pub fn feature_header(comparator: &AggregateComparator) -> Vec<String> {
    ["AuthorId", "PaperId", "PaperYear"]
        .iter()
        .chain(comparator.author_columns())
        .chain(comparator.paper_columns())
        .chain(["mark"].iter())
        .map(|column| column.to_string())
        .collect()
}

fn create_writer(path: &Path, flexible: bool) -> Result<Writer<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| FeatureError::output(path, e))?;
    }

    WriterBuilder::new()
        .flexible(flexible)
        .from_path(path)
        .map_err(|e| FeatureError::output(path, e))
}

/// Feature CSV; the header is written on creation
pub struct FeatureWriter {
    path: PathBuf,
    writer: Writer<File>,
    rows: usize,
}

impl FeatureWriter {
    pub fn create(path: impl Into<PathBuf>, header: &[String]) -> Result<Self> {
        let path = path.into();
        let mut writer = create_writer(&path, false)?;
        writer
            .write_record(header)
            .map_err(|e| FeatureError::output(&path, e))?;

        Ok(Self {
            path,
            writer,
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and return the number of data rows written
    pub fn finish(mut self) -> Result<usize> {
        self.writer
            .flush()
            .map_err(|e| FeatureError::output(&self.path, e))?;
        Ok(self.rows)
    }
}

impl RecordSink for FeatureWriter {
    fn write_record(&mut self, record: &FeatureRecord) -> Result<()> {
        self.writer
            .write_record(record.fields())
            .map_err(|e| FeatureError::output(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }
}

/// Neighbor CSV: one row per query author with a variable-width tail
pub struct NeighborWriter {
    path: PathBuf,
    writer: Writer<File>,
    rows: usize,
}

impl NeighborWriter {
    /// Header `AuthorId, NeighborId1, Score1, ..., NeighborIdK, ScoreK`
    pub fn create(path: impl Into<PathBuf>, k: usize) -> Result<Self> {
        let path = path.into();
        let mut writer = create_writer(&path, true)?;

        let mut header = vec!["AuthorId".to_string()];
        for i in 1..=k {
            header.push(format!("NeighborId{}", i));
            header.push(format!("Score{}", i));
        }
        writer
            .write_record(&header)
            .map_err(|e| FeatureError::output(&path, e))?;

        Ok(Self {
            path,
            writer,
            rows: 0,
        })
    }

    pub fn write(&mut self, author: AuthorId, neighbors: &[NeighborMatch]) -> Result<()> {
        let mut row = Vec::with_capacity(1 + 2 * neighbors.len());
        row.push(author.to_string());
        for neighbor in neighbors {
            row.push(neighbor.author.to_string());
            row.push(neighbor.score.to_string());
        }

        self.writer
            .write_record(&row)
            .map_err(|e| FeatureError::output(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize> {
        self.writer
            .flush()
            .map_err(|e| FeatureError::output(&self.path, e))?;
        Ok(self.rows)
    }
}
