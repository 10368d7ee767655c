//! Raw table compaction
//!
//! Writes copies of the raw tables that hold only usable rows:
//! - papers with a title, a year inside the configured range and a venue
//! - conferences and journals with a full name that a kept paper cites
//! - PaperAuthor edges to kept papers, and Author rows of the authors
//!   those edges link
//! - label rows of linked authors, restricted to kept papers, while at
//!   least one id remains
//!
//! Kept entity rows are copied unchanged. Label tables are optional and an
//! absent one is skipped. The output directory holds the same file names,
//! so it can stand in for the data directory.

use super::loader::{field, parse_field, parse_query_row, parse_train_row};
use super::models::{format_ids, AuthorId, PaperId, RowStatus, VenueId};
use crate::config::{PathsConfig, YearConfig};
use crate::errors::{AppError, Result};
use crate::metrics::{record_compaction, StageTimer};
use csv::{ByteRecord, ReaderBuilder, WriterBuilder};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Rows kept and dropped in one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub kept: usize,
    pub dropped: usize,
}

/// Per-table outcome, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompactionReport {
    pub tables: Vec<(&'static str, TableCounts)>,
}

impl CompactionReport {
    pub fn table(&self, name: &str) -> Option<TableCounts> {
        self.tables
            .iter()
            .find(|(table, _)| *table == name)
            .map(|(_, counts)| *counts)
    }
}

/// Copy the header and every row `keep` returns from `src` into `dest`
fn filter_table(
    src: &Path,
    dest: &Path,
    table: &'static str,
    mut keep: impl FnMut(&ByteRecord) -> Option<ByteRecord>,
) -> Result<TableCounts> {
    if !src.is_file() {
        return Err(AppError::MissingInput {
            path: src.to_path_buf(),
        });
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(src)?;
    let mut writer = WriterBuilder::new().flexible(true).from_path(dest)?;

    let header = reader.byte_headers()?.clone();
    if !header.is_empty() {
        writer.write_byte_record(&header)?;
    }

    let mut counts = TableCounts::default();
    for (index, result) in reader.byte_records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                counts.dropped += 1;
                debug!(table, row = index + 1, error = %e, "Dropping undecodable row");
                continue;
            }
        };

        match keep(&record) {
            Some(kept) => {
                writer.write_byte_record(&kept)?;
                counts.kept += 1;
            }
            None => counts.dropped += 1,
        }
    }
    writer.flush()?;

    record_compaction(table, counts.kept, counts.dropped);
    info!(table, kept = counts.kept, dropped = counts.dropped, "Table compacted");
    Ok(counts)
}

/// Id and venue ids of a paper row worth keeping
fn usable_paper(record: &ByteRecord, years: YearConfig) -> Option<(PaperId, i64, i64)> {
    if record.len() < 5 {
        return None;
    }

    let id: PaperId = parse_field(record, 0)?;
    let title = field(record, 1)?;
    let year: i32 = parse_field(record, 2)?;
    let conference: i64 = parse_field(record, 3)?;
    let journal: i64 = parse_field(record, 4)?;

    let usable = !title.trim().is_empty()
        && (years.min_year..=years.max_year).contains(&year)
        && (conference > 0 || journal > 0);
    usable.then_some((id, conference, journal))
}

fn cited_venue(record: &ByteRecord, cited: &HashSet<VenueId>) -> bool {
    let Some(id) = parse_field::<VenueId>(record, 0) else {
        return false;
    };
    let named = field(record, 2).is_some_and(|name| !name.trim().is_empty());
    named && cited.contains(&id)
}

/// Label table pass; `None` when the table is absent
fn compact_label_table(
    src: &Path,
    dest: &Path,
    table: &'static str,
    mut compact: impl FnMut(&ByteRecord) -> Option<(AuthorId, RowStatus, ByteRecord)>,
) -> Result<Option<TableCounts>> {
    if !src.is_file() {
        info!(table, path = %src.display(), "No label table, skipping");
        return Ok(None);
    }

    let counts = filter_table(src, dest, table, |record| {
        let (author, status, row) = compact(record)?;
        match status {
            RowStatus::Kept => Some(row),
            RowStatus::UnlinkedAuthor => {
                warn!(table, author, "Author not in PaperAuthor, dropping row");
                None
            }
            RowStatus::LackOfData => {
                warn!(table, author, "Lack of data, dropping row");
                None
            }
        }
    })?;
    Ok(Some(counts))
}

/// Write compacted copies of the raw tables into `paths.compact_dir`
#[instrument(skip_all, fields(dest = %paths.compact_dir.display()))]
pub fn compact_tables(paths: &PathsConfig, years: YearConfig) -> Result<CompactionReport> {
    if paths.compact_dir == paths.data_dir {
        return Err(AppError::Configuration {
            message: "paths.compact_dir must differ from paths.data_dir".to_string(),
        });
    }
    std::fs::create_dir_all(&paths.compact_dir)?;

    let timer = StageTimer::start("compact");
    let out = &paths.compact_dir;
    let mut report = CompactionReport::default();

    let mut papers: HashSet<PaperId> = HashSet::new();
    let mut conferences: HashSet<VenueId> = HashSet::new();
    let mut journals: HashSet<VenueId> = HashSet::new();
    let counts = filter_table(
        &paths.input(&paths.paper_file),
        &out.join(&paths.paper_file),
        "paper",
        |record| {
            let (id, conference, journal) = usable_paper(record, years)?;
            papers.insert(id);
            if conference > 0 {
                conferences.insert(conference as VenueId);
            }
            if journal > 0 {
                journals.insert(journal as VenueId);
            }
            Some(record.clone())
        },
    )?;
    report.tables.push(("paper", counts));

    for (file, table, cited) in [
        (&paths.conference_file, "conference", &conferences),
        (&paths.journal_file, "journal", &journals),
    ] {
        let counts = filter_table(&paths.input(file), &out.join(file), table, |record| {
            cited_venue(record, cited).then(|| record.clone())
        })?;
        report.tables.push((table, counts));
    }

    let mut authors: HashSet<AuthorId> = HashSet::new();
    let counts = filter_table(
        &paths.input(&paths.paper_author_file),
        &out.join(&paths.paper_author_file),
        "paper_author",
        |record| {
            let paper: PaperId = parse_field(record, 0)?;
            let author: AuthorId = parse_field(record, 1)?;
            papers.contains(&paper).then(|| {
                authors.insert(author);
                record.clone()
            })
        },
    )?;
    report.tables.push(("paper_author", counts));

    let counts = filter_table(
        &paths.input(&paths.author_file),
        &out.join(&paths.author_file),
        "author",
        |record| {
            let author: AuthorId = parse_field(record, 0)?;
            authors.contains(&author).then(|| record.clone())
        },
    )?;
    report.tables.push(("author", counts));

    let known = |paper: PaperId| papers.contains(&paper);

    let train = compact_label_table(
        &paths.input(&paths.train_file),
        &out.join(&paths.train_file),
        "train",
        |record| {
            let mut row = parse_train_row(record)?;
            let status = row.compact(authors.contains(&row.author), known);
            let out = ByteRecord::from(vec![
                row.author.to_string(),
                format_ids(&row.confirmed),
                format_ids(&row.deleted),
            ]);
            Some((row.author, status, out))
        },
    )?;
    if let Some(counts) = train {
        report.tables.push(("train", counts));
    }

    for (file, table) in [
        (&paths.valid_file, "valid"),
        (&paths.valid_solution_file, "valid_solution"),
        (&paths.test_file, "test"),
    ] {
        let counts = compact_label_table(&paths.input(file), &out.join(file), table, |record| {
            let mut row = parse_query_row(record)?;
            let status = row.compact(authors.contains(&row.author), known);
            let out = ByteRecord::from(vec![row.author.to_string(), format_ids(&row.papers)]);
            Some((row.author, status, out))
        })?;
        if let Some(counts) = counts {
            report.tables.push((table, counts));
        }
    }

    timer.finish();
    info!(
        papers = papers.len(),
        authors = authors.len(),
        tables = report.tables.len(),
        "Compaction complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    fn fixture() -> (TempDir, PathsConfig) {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("original_data");
        fs::create_dir_all(&data).unwrap();

        write(
            &data,
            "Paper.csv",
            "Id,Title,Year,ConferenceId,JournalId,Keyword\n\
             1,Fast Algorithm,2000,10,0,graphs\n\
             2,Slow Algorithm,2005,0,20,\n\
             3,,2000,10,0,\n\
             4,Old Paper,1850,12,0,\n\
             5,Nowhere,2001,0,0,\n\
             6,Future,2020,11,0,\n\
             bad,row,2000,10,0,\n",
        );
        write(
            &data,
            "Conference.csv",
            "Id,ShortName,FullName,HomePage\n\
             10,NN,Neural Networks,\n\
             11,FT,Future Topics,\n\
             13,EM,,\n",
        );
        write(
            &data,
            "Journal.csv",
            "Id,ShortName,FullName,HomePage\n20,ML,Machine Learning,\n21,X,Other,\n",
        );
        write(
            &data,
            "PaperAuthor.csv",
            "PaperId,AuthorId,Name,Affiliation\n\
             1,100,Ann,MIT\n\
             2,100,Ann,\n\
             3,200,Bob,\n\
             4,300,Cy,\n\
             2,300,Cy,\n",
        );
        write(
            &data,
            "Author.csv",
            "Id,Name,Affiliation\n100,Ann,MIT\n200,Bob,\n300,Cy,\n400,Dee,\n",
        );
        write(
            &data,
            "Train.csv",
            "AuthorId,ConfirmedPaperIds,DeletedPaperIds\n\
             100,1 3,2\n\
             200,1,\n\
             300,4,5\n",
        );
        write(&data, "Valid.csv", "AuthorId,PaperIds\n100,1 2 6\n200,1\n");

        let paths = PathsConfig {
            data_dir: data,
            compact_dir: dir.path().join("compressed_data"),
            ..PathsConfig::default()
        };
        (dir, paths)
    }

    fn read(paths: &PathsConfig, file: &str) -> String {
        fs::read_to_string(paths.compact_dir.join(file)).unwrap()
    }

    #[test]
    fn test_entity_tables() {
        let (_dir, paths) = fixture();
        let report = compact_tables(&paths, YearConfig::default()).unwrap();

        assert_eq!(report.table("paper"), Some(TableCounts { kept: 2, dropped: 5 }));
        assert_eq!(
            read(&paths, "Paper.csv"),
            "Id,Title,Year,ConferenceId,JournalId,Keyword\n\
             1,Fast Algorithm,2000,10,0,graphs\n\
             2,Slow Algorithm,2005,0,20,\n"
        );

        // Only venues cited by kept papers
        assert_eq!(
            read(&paths, "Conference.csv"),
            "Id,ShortName,FullName,HomePage\n10,NN,Neural Networks,\n"
        );
        assert_eq!(report.table("journal"), Some(TableCounts { kept: 1, dropped: 1 }));

        assert_eq!(
            read(&paths, "PaperAuthor.csv"),
            "PaperId,AuthorId,Name,Affiliation\n1,100,Ann,MIT\n2,100,Ann,\n2,300,Cy,\n"
        );
        assert_eq!(read(&paths, "Author.csv"), "Id,Name,Affiliation\n100,Ann,MIT\n300,Cy,\n");
    }

    #[test]
    fn test_label_tables() {
        let (_dir, paths) = fixture();
        let report = compact_tables(&paths, YearConfig::default()).unwrap();

        // 200 has no kept PaperAuthor edge; 300 keeps no paper
        assert_eq!(report.table("train"), Some(TableCounts { kept: 1, dropped: 2 }));
        assert_eq!(
            read(&paths, "Train.csv"),
            "AuthorId,ConfirmedPaperIds,DeletedPaperIds\n100,1,2\n"
        );
        assert_eq!(read(&paths, "Valid.csv"), "AuthorId,PaperIds\n100,1 2\n");

        assert_eq!(report.table("test"), None);
        assert!(!paths.compact_dir.join("Test.csv").exists());
    }

    #[test]
    fn test_year_range_follows_config() {
        let (_dir, paths) = fixture();
        let years = YearConfig {
            min_year: 1800,
            max_year: 2013,
        };
        let report = compact_tables(&paths, years).unwrap();
        assert_eq!(report.table("paper"), Some(TableCounts { kept: 3, dropped: 4 }));
    }

    #[test]
    fn test_rejects_in_place_compaction() {
        let (_dir, mut paths) = fixture();
        paths.compact_dir = paths.data_dir.clone();
        let err = compact_tables(&paths, YearConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[test]
    fn test_missing_entity_table_is_fatal() {
        let (_dir, paths) = fixture();
        fs::remove_file(paths.input(&paths.paper_author_file)).unwrap();
        let err = compact_tables(&paths, YearConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::MissingInput { .. }));
    }
}
