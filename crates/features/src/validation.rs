//! Validation-to-training conversion
//!
//! Turns ValidSolution (confirmed ids) and Valid (all candidate ids) into a
//! Train-format table so the validation authors can be used for training.

use crate::errors::{FeatureError, Result};
use authormatch_common::catalog::{format_ids, AuthorId, QueryRow, TrainRow};
use csv::Writer;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Build Train rows from the validation tables
///
/// Authors appear in first-appearance order across `solution` then `valid`.
/// Confirmed ids are deduplicated and merged across rows of one author;
/// deleted ids are the Valid ids neither confirmed nor already deleted.
pub fn build_validation_training(solution: &[QueryRow], valid: &[QueryRow]) -> Vec<TrainRow> {
    let mut rows: Vec<TrainRow> = Vec::new();
    let mut index: HashMap<AuthorId, usize> = HashMap::new();

    let mut row_for = |rows: &mut Vec<TrainRow>, author: AuthorId| -> usize {
        *index.entry(author).or_insert_with(|| {
            rows.push(TrainRow {
                author,
                confirmed: Vec::new(),
                deleted: Vec::new(),
            });
            rows.len() - 1
        })
    };

    for query in solution {
        let slot = row_for(&mut rows, query.author);
        let row = &mut rows[slot];
        for &paper in &query.papers {
            if !row.confirmed.contains(&paper) {
                row.confirmed.push(paper);
            }
        }
    }

    for query in valid {
        let slot = row_for(&mut rows, query.author);
        let row = &mut rows[slot];
        for &paper in &query.papers {
            if !row.confirmed.contains(&paper) && !row.deleted.contains(&paper) {
                row.deleted.push(paper);
            }
        }
    }

    rows
}

/// Write Train-format rows; an empty list is written as an empty field
pub fn write_train_csv(path: &Path, rows: &[TrainRow]) -> Result<()> {
    let mut writer = Writer::from_path(path).map_err(|e| FeatureError::output(path, e))?;
    writer
        .write_record(["AuthorId", "ConfirmedPaperIds", "DeletedPaperIds"])
        .map_err(|e| FeatureError::output(path, e))?;

    for row in rows {
        writer
            .write_record([
                row.author.to_string(),
                format_ids(&row.confirmed),
                format_ids(&row.deleted),
            ])
            .map_err(|e| FeatureError::output(path, e))?;
    }

    writer.flush().map_err(|e| FeatureError::output(path, e))?;
    info!(path = %path.display(), authors = rows.len(), "Validation training table written");
    Ok(())
}
