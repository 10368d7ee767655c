//! Raw table parsing and cached catalog population
//!
//! Each derivation is a pure function from one raw CSV table (plus, for
//! co-authorship, the already assembled catalog) to a serializable table.
//! The artifact cache memoizes every derivation under a fixed name.

use super::models::{
    merge_affiliation, AuthorId, CoAuthorship, PaperId, PublishProfile, QueryRow, RawPaper,
    TrainRow, VenueId, VenueTable, YearScale,
};
use super::Catalog;
use crate::cache::ArtifactCache;
use crate::config::{AppConfig, PathsConfig};
use crate::errors::{AppError, Result};
use crate::metrics::{record_table, StageTimer};
use crate::text::{Normalizer, CONFERENCE_STOP_WORDS, JOURNAL_STOP_WORDS};
use csv::{ByteRecord, ReaderBuilder};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Artifact names
pub const AUTHOR_ARTIFACT: &str = "author";
pub const PAPER_ARTIFACT: &str = "paper";
pub const CONFERENCE_ARTIFACT: &str = "conference";
pub const JOURNAL_ARTIFACT: &str = "journal";
pub const PAPER_AUTHOR_ARTIFACT: &str = "paper_author";

/// Everything derived from the PaperAuthor table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoAuthorTable {
    pub coauthors: CoAuthorship,

    /// Publish-count profiles of every author with a venue-bearing paper
    pub profiles: HashMap<AuthorId, PublishProfile>,

    /// Longest affiliation variant per author seen in this table
    pub affiliations: HashMap<AuthorId, String>,
}

pub(super) fn field(record: &ByteRecord, index: usize) -> Option<Cow<'_, str>> {
    record.get(index).map(String::from_utf8_lossy)
}

pub(super) fn parse_field<T: std::str::FromStr>(record: &ByteRecord, index: usize) -> Option<T> {
    field(record, index)?.trim().parse().ok()
}

/// Space separated id list; any unparsable id rejects the whole list
fn parse_ids(record: &ByteRecord, index: usize) -> Option<Vec<PaperId>> {
    field(record, index)?
        .split_whitespace()
        .map(|id| id.parse().ok())
        .collect()
}

/// Read every data row of a table, skipping malformed rows
///
/// A missing file and I/O failures are fatal; rows that fail to decode or
/// that `parse` rejects are counted and skipped.
fn read_rows<T>(
    path: &Path,
    table: &str,
    mut parse: impl FnMut(&ByteRecord) -> Option<T>,
) -> Result<Vec<T>> {
    if !path.is_file() {
        return Err(AppError::MissingInput {
            path: path.to_path_buf(),
        });
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    let mut malformed = 0usize;

    for (index, result) in reader.byte_records().enumerate() {
        match result {
            Ok(record) => match parse(&record) {
                Some(row) => rows.push(row),
                None => {
                    malformed += 1;
                    debug!(table, row = index + 1, "Skipping malformed row");
                }
            },
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                malformed += 1;
                debug!(table, row = index + 1, error = %e, "Skipping undecodable row");
            }
        }
    }

    if malformed > 0 {
        warn!(table, malformed, "Skipped malformed rows");
    }
    record_table(table, rows.len(), malformed);
    debug!(table, rows = rows.len(), "Table read");

    Ok(rows)
}

/// Author table: id, name, affiliation
pub fn read_affiliations(
    path: &Path,
    normalizer: &Normalizer,
) -> Result<HashMap<AuthorId, String>> {
    let rows = read_rows(path, "author", |record| {
        let id: AuthorId = parse_field(record, 0)?;
        let affiliation = normalizer.normalize(&field(record, 2)?);
        Some((id, affiliation))
    })?;

    let mut affiliations: HashMap<AuthorId, String> = HashMap::new();
    for (id, affiliation) in rows {
        if affiliation.is_empty() {
            continue;
        }
        merge_affiliation(affiliations.entry(id).or_default(), &affiliation);
    }

    Ok(affiliations)
}

/// Paper table: id, title, year, conference id, journal id, [keywords]
pub fn read_papers(
    path: &Path,
    normalizer: &Normalizer,
    scale: YearScale,
) -> Result<Vec<RawPaper>> {
    read_rows(path, "paper", |record| {
        if record.len() < 5 {
            return None;
        }

        Some(RawPaper {
            id: parse_field(record, 0)?,
            title: normalizer.normalize(&field(record, 1)?),
            year: scale.normalize(parse_field(record, 2)?),
            conference_id: parse_field(record, 3)?,
            journal_id: parse_field(record, 4)?,
            keywords: field(record, 5)
                .map(|keywords| normalizer.normalize(&keywords))
                .unwrap_or_default(),
        })
    })
}

/// Conference or Journal table: id, short name, full name
///
/// `max_id` covers every parsed row, including rows whose normalized name
/// is empty and is therefore not kept.
pub fn read_venues(path: &Path, table: &str, normalizer: &Normalizer) -> Result<VenueTable> {
    let rows = read_rows(path, table, |record| {
        let id: VenueId = parse_field(record, 0)?;
        let name = normalizer.normalize(&field(record, 2)?);
        Some((id, name))
    })?;

    let max_id = rows.iter().map(|(id, _)| *id).max().unwrap_or(0);
    let names = rows.into_iter().filter(|(_, name)| !name.is_empty()).collect();

    Ok(VenueTable { names, max_id })
}

/// PaperAuthor table: paper id, author id, name, [affiliation]
///
/// A paper's venue is counted into the author's profile once per distinct
/// (paper, author) pair. Papers absent from the catalog still get an edge.
pub fn read_paper_authors(
    path: &Path,
    normalizer: &Normalizer,
    catalog: &Catalog,
) -> Result<CoAuthorTable> {
    let rows = read_rows(path, "paper_author", |record| {
        let paper: PaperId = parse_field(record, 0)?;
        let author: AuthorId = parse_field(record, 1)?;
        let affiliation = field(record, 3)
            .map(|aff| normalizer.normalize(&aff))
            .unwrap_or_default();
        Some((paper, author, affiliation))
    })?;

    let mut coauthors = CoAuthorship::new();
    let mut counts: HashMap<AuthorId, BTreeMap<VenueId, u32>> = HashMap::new();
    let mut affiliations: HashMap<AuthorId, String> = HashMap::new();

    for (paper, author, affiliation) in rows {
        if !affiliation.is_empty() {
            merge_affiliation(affiliations.entry(author).or_default(), &affiliation);
        }

        if !coauthors.link(paper, author) {
            continue;
        }

        if let Some(venue) = catalog.paper_venue(paper) {
            *counts.entry(author).or_default().entry(venue).or_insert(0) += 1;
        }
    }

    let profiles = counts
        .into_iter()
        .map(|(author, counts)| (author, PublishProfile::from_counts(counts)))
        .collect();

    Ok(CoAuthorTable {
        coauthors,
        profiles,
        affiliations,
    })
}

pub(super) fn parse_train_row(record: &ByteRecord) -> Option<TrainRow> {
    if record.len() < 3 {
        return None;
    }
    Some(TrainRow {
        author: parse_field(record, 0)?,
        confirmed: parse_ids(record, 1)?,
        deleted: parse_ids(record, 2)?,
    })
}

pub(super) fn parse_query_row(record: &ByteRecord) -> Option<QueryRow> {
    Some(QueryRow {
        author: parse_field(record, 0)?,
        papers: parse_ids(record, 1)?,
    })
}

/// Train table: author id, confirmed ids, deleted ids
pub fn read_train_rows(path: &Path) -> Result<Vec<TrainRow>> {
    read_rows(path, "train", parse_train_row)
}

/// Valid, Test or ValidSolution table: author id, paper ids
pub fn read_query_rows(path: &Path, table: &str) -> Result<Vec<QueryRow>> {
    read_rows(path, table, parse_query_row)
}

/// Populates a [`Catalog`] from the raw tables through the artifact cache
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    paths: PathsConfig,
    scale: YearScale,
    normalizer: Arc<Normalizer>,
    cache: ArtifactCache,
    parallel: bool,
}

impl CatalogLoader {
    pub fn new(
        paths: PathsConfig,
        scale: YearScale,
        normalizer: Normalizer,
        cache: ArtifactCache,
    ) -> Self {
        Self {
            paths,
            scale,
            normalizer: Arc::new(normalizer),
            cache,
            parallel: false,
        }
    }

    /// Loader for an application config, opening the configured cache and
    /// stop-word list
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let normalizer = match &config.paths.stop_words_file {
            Some(path) => Normalizer::from_file(path)?,
            None => Normalizer::english(),
        };
        let cache = ArtifactCache::open(&config.paths.cache_dir)?;

        Ok(Self::new(
            config.paths.clone(),
            YearScale::from(config.years),
            normalizer,
            cache,
        )
        .with_parallel(config.pipeline.parallel_population))
    }

    /// Run the independent derivations on worker tasks
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    /// Build the catalog
    ///
    /// Authors, papers, conferences and journals are derived first (on
    /// worker tasks when parallel), then assembled; co-authorship is
    /// ingested last because profiles need paper venues.
    #[instrument(skip(self), fields(parallel = self.parallel))]
    pub async fn populate(&self) -> Result<Catalog> {
        let timer = StageTimer::start("populate");

        let mut catalog = if self.parallel {
            self.assemble_parallel().await?
        } else {
            Catalog::assemble(
                self.derive_affiliations()?,
                self.derive_papers()?,
                self.derive_conferences()?,
                self.derive_journals()?,
            )
        };

        let table = self.derive_paper_authors(&catalog)?;
        catalog.install(table);

        timer.finish();
        info!(
            papers = catalog.paper_count(),
            venues = catalog.venue_count(),
            authors = catalog.author_count(),
            journal_pad = catalog.journal_pad(),
            "Catalog populated"
        );

        Ok(catalog)
    }

    async fn assemble_parallel(&self) -> Result<Catalog> {
        let authors = {
            let loader = self.clone();
            tokio::task::spawn_blocking(move || loader.derive_affiliations())
        };
        let papers = {
            let loader = self.clone();
            tokio::task::spawn_blocking(move || loader.derive_papers())
        };
        let conferences = {
            let loader = self.clone();
            tokio::task::spawn_blocking(move || loader.derive_conferences())
        };
        let journals = {
            let loader = self.clone();
            tokio::task::spawn_blocking(move || loader.derive_journals())
        };

        let (authors, papers, conferences, journals) =
            tokio::try_join!(authors, papers, conferences, journals)?;

        Ok(Catalog::assemble(authors?, papers?, conferences?, journals?))
    }

    fn derive_affiliations(&self) -> Result<HashMap<AuthorId, String>> {
        let timer = StageTimer::start(AUTHOR_ARTIFACT);
        let path = self.paths.input(&self.paths.author_file);
        let table = self
            .cache
            .get_or_compute(AUTHOR_ARTIFACT, || read_affiliations(&path, &self.normalizer))?;
        timer.finish();
        Ok(table)
    }

    fn derive_papers(&self) -> Result<Vec<RawPaper>> {
        let timer = StageTimer::start(PAPER_ARTIFACT);
        let path = self.paths.input(&self.paths.paper_file);
        let table = self.cache.get_or_compute(PAPER_ARTIFACT, || {
            read_papers(&path, &self.normalizer, self.scale)
        })?;
        timer.finish();
        Ok(table)
    }

    fn derive_conferences(&self) -> Result<VenueTable> {
        let timer = StageTimer::start(CONFERENCE_ARTIFACT);
        let path = self.paths.input(&self.paths.conference_file);
        let table = self.cache.get_or_compute(CONFERENCE_ARTIFACT, || {
            let normalizer = self.normalizer.with_extra(CONFERENCE_STOP_WORDS);
            read_venues(&path, CONFERENCE_ARTIFACT, &normalizer)
        })?;
        timer.finish();
        Ok(table)
    }

    fn derive_journals(&self) -> Result<VenueTable> {
        let timer = StageTimer::start(JOURNAL_ARTIFACT);
        let path = self.paths.input(&self.paths.journal_file);
        let table = self.cache.get_or_compute(JOURNAL_ARTIFACT, || {
            let normalizer = self.normalizer.with_extra(JOURNAL_STOP_WORDS);
            read_venues(&path, JOURNAL_ARTIFACT, &normalizer)
        })?;
        timer.finish();
        Ok(table)
    }

    fn derive_paper_authors(&self, catalog: &Catalog) -> Result<CoAuthorTable> {
        let timer = StageTimer::start(PAPER_AUTHOR_ARTIFACT);
        let path = self.paths.input(&self.paths.paper_author_file);
        let table = self.cache.get_or_compute(PAPER_AUTHOR_ARTIFACT, || {
            read_paper_authors(&path, &self.normalizer, catalog)
        })?;
        timer.finish();
        Ok(table)
    }
}
