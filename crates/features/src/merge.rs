//! CSV concatenation

use crate::errors::{FeatureError, Result};
use authormatch_common::AppError;
use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;
use tracing::{debug, info};

/// Concatenate CSV files into `dest`, keeping only the first input's header
///
/// `dest` is truncated first. Returns the number of data rows written.
pub fn merge_csv(inputs: &[impl AsRef<Path>], dest: &Path) -> Result<usize> {
    if inputs.is_empty() {
        return Err(FeatureError::Usage("merge needs at least one input".to_string()));
    }

    let missing = inputs
        .iter()
        .map(|p| -> &Path { p.as_ref() })
        .find(|p| !p.is_file());
    if let Some(missing) = missing {
        return Err(AppError::MissingInput {
            path: missing.to_path_buf(),
        }
        .into());
    }

    let mut writer = WriterBuilder::new()
        .flexible(true)
        .from_path(dest)
        .map_err(|e| FeatureError::output(dest, e))?;

    let mut rows = 0usize;
    for (i, input) in inputs.iter().enumerate() {
        let input: &Path = input.as_ref();
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(input)?;

        let mut records = reader.byte_records();
        let header = records.next().transpose()?;
        if let (0, Some(header)) = (i, &header) {
            writer
                .write_byte_record(header)
                .map_err(|e| FeatureError::output(dest, e))?;
        }

        let mut copied = 0usize;
        for record in records {
            writer
                .write_byte_record(&record?)
                .map_err(|e| FeatureError::output(dest, e))?;
            copied += 1;
        }

        debug!(input = %input.display(), rows = copied, "Merged input");
        rows += copied;
    }

    writer.flush().map_err(|e| FeatureError::output(dest, e))?;
    info!(dest = %dest.display(), inputs = inputs.len(), rows, "CSV merge complete");
    Ok(rows)
}
