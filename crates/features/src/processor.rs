//! Feature processor
//!
//! Core logic for a label-file pass: one feature row per (author, paper,
//! label), label bookkeeping and lack-of-data accounting. Neighbor search
//! over query rows lives here too since it shares the row filtering.

use crate::errors::Result;
use crate::output::{NeighborWriter, RecordSink};
use authormatch_common::catalog::{
    AuthorId, Catalog, Label, LabelList, LabelSets, PaperId, QueryRow, RowStatus, TrainRow,
};
use authormatch_common::metrics::{record_features, record_lack_of_data, record_unlinked_authors};
use authormatch_similarity::compare::AggregateComparator;
use authormatch_similarity::neighbor::NeighborMatcher;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// One emitted feature row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub author: AuthorId,
    pub paper: PaperId,

    /// Normalized paper year, 0 when the paper is unknown
    pub year: f64,

    pub author_similarity: Vec<f64>,
    pub paper_similarity: Vec<f64>,
    pub label: Label,
}

impl FeatureRecord {
    /// CSV fields in header order
    pub fn fields(&self) -> Vec<String> {
        let width = 4 + self.author_similarity.len() + self.paper_similarity.len();
        let mut fields = Vec::with_capacity(width);
        fields.push(self.author.to_string());
        fields.push(self.paper.to_string());
        fields.push(self.year.to_string());
        fields.extend(self.author_similarity.iter().map(|v| v.to_string()));
        fields.extend(self.paper_similarity.iter().map(|v| v.to_string()));
        fields.push(self.label.value().to_string());
        fields
    }
}

/// Counts for one pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassStats {
    pub rows: usize,
    pub confirmed: usize,
    pub deleted: usize,
    pub unknown: usize,
    pub lack_of_data: usize,

    /// Rows of authors without any PaperAuthor entry
    pub unlinked: usize,
}

impl PassStats {
    /// Count a skipped row; true when the row goes on to emission
    fn admit(&mut self, pass: &str, author: AuthorId, status: RowStatus) -> bool {
        match status {
            RowStatus::Kept => return true,
            RowStatus::UnlinkedAuthor => {
                self.unlinked += 1;
                warn!(pass, author, "Author not in PaperAuthor, skipping label row");
            }
            RowStatus::LackOfData => {
                self.lack_of_data += 1;
                warn!(pass, author, "Lack of data, skipping label row");
            }
        }
        false
    }

    fn count(&mut self, label: Label) {
        match label {
            Label::Confirmed => self.confirmed += 1,
            Label::Deleted => self.deleted += 1,
            Label::Unknown => self.unknown += 1,
        }
    }

    fn record(&self, pass: &str) {
        for (label, rows) in [
            (Label::Confirmed, self.confirmed),
            (Label::Deleted, self.deleted),
            (Label::Unknown, self.unknown),
        ] {
            if rows > 0 {
                record_features(pass, label.as_str(), rows);
            }
        }
        record_lack_of_data(pass, self.lack_of_data);
        if self.unlinked > 0 {
            record_unlinked_authors(pass, self.unlinked);
        }
    }
}

/// Emits feature rows for label files over a populated catalog
pub struct FeatureEmitter<'a> {
    catalog: &'a Catalog,
    comparator: AggregateComparator,
    filter_labels: bool,
}

impl<'a> FeatureEmitter<'a> {
    pub fn new(catalog: &'a Catalog, comparator: AggregateComparator, filter_labels: bool) -> Self {
        Self {
            catalog,
            comparator,
            filter_labels,
        }
    }

    pub fn comparator(&self) -> &AggregateComparator {
        &self.comparator
    }

    /// Feature row for one (author, paper, label)
    pub fn record(&self, author: AuthorId, paper: PaperId, label: Label) -> FeatureRecord {
        FeatureRecord {
            author,
            paper,
            year: self.catalog.paper_year(paper),
            author_similarity: self.comparator.coauthor_similarity(self.catalog, author, paper),
            paper_similarity: self.comparator.publication_similarity(self.catalog, author, paper),
            label,
        }
    }

    /// Training pass: confirmed rows then deleted rows per author, in input
    /// order, recording every list into `labels`
    #[instrument(skip_all, fields(pass = pass, rows = rows.len()))]
    pub fn emit_training(
        &self,
        pass: &str,
        rows: Vec<TrainRow>,
        labels: &mut LabelSets,
        sink: &mut impl RecordSink,
    ) -> Result<PassStats> {
        let mut stats = PassStats::default();

        for mut row in rows {
            stats.rows += 1;
            let status = if self.filter_labels {
                row.retain_known(self.catalog)
            } else {
                row.status()
            };
            if !stats.admit(pass, row.author, status) {
                continue;
            }

            labels.record_training(&row, self.catalog);

            let pairs = row
                .confirmed
                .iter()
                .map(|&pid| (pid, Label::Confirmed))
                .chain(row.deleted.iter().map(|&pid| (pid, Label::Deleted)));
            for (paper, label) in pairs {
                sink.write_record(&self.record(row.author, paper, label))?;
                stats.count(label);
            }
        }

        self.finish(pass, &stats);
        Ok(stats)
    }

    /// Unknown-label pass over Valid or Test rows
    #[instrument(skip_all, fields(pass = pass, rows = rows.len()))]
    pub fn emit_unknown(
        &self,
        pass: &str,
        rows: Vec<QueryRow>,
        unknown: &mut LabelList,
        sink: &mut impl RecordSink,
    ) -> Result<PassStats> {
        let mut stats = PassStats::default();

        for mut row in rows {
            stats.rows += 1;
            let status = if self.filter_labels {
                row.retain_known(self.catalog)
            } else {
                row.status()
            };
            if !stats.admit(pass, row.author, status) {
                continue;
            }

            for &paper in &row.papers {
                sink.write_record(&self.record(row.author, paper, Label::Unknown))?;
                stats.count(Label::Unknown);
            }
            unknown.entry(row.author).or_default().extend(row.papers);
        }

        self.finish(pass, &stats);
        Ok(stats)
    }

    fn finish(&self, pass: &str, stats: &PassStats) {
        stats.record(pass);
        info!(
            pass,
            confirmed = stats.confirmed,
            deleted = stats.deleted,
            unknown = stats.unknown,
            lack_of_data = stats.lack_of_data,
            unlinked = stats.unlinked,
            "Feature pass complete"
        );
    }
}

/// Neighbor search for every query row, written as it goes
#[instrument(skip_all, fields(rows = rows.len()))]
pub fn emit_neighbors(
    catalog: &Catalog,
    labels: &LabelSets,
    matcher: &NeighborMatcher,
    rows: Vec<QueryRow>,
    filter_labels: bool,
    writer: &mut NeighborWriter,
) -> Result<usize> {
    if labels.labeled_count() == 0 {
        warn!("No labeled authors, neighbor lists will be empty");
    }

    let mut queries = 0;
    for mut row in rows {
        // Query authors are never skipped, only their unknown papers
        if filter_labels {
            row.retain_papers(|pid| catalog.contains_paper(pid));
        }
        let neighbors = matcher.nearest(catalog, labels, row.author, &row.papers);
        writer.write(row.author, &neighbors)?;
        queries += 1;
    }

    info!(queries, labeled = labels.labeled_count(), "Neighbor search complete");
    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use authormatch_common::catalog::{Paper, Venue};

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        for (id, title, year, venue) in [
            (1, "fast algorithm", 0.5, 10),
            (2, "slow algorithm", 0.6, 20),
            (3, "graph algorithm", 0.7, 10),
        ] {
            catalog.insert_paper(Paper {
                id,
                title: title.into(),
                year,
                venue: Some(venue),
                keywords: String::new(),
            });
        }
        catalog.insert_venue(Venue { id: 10, name: "neural networks".into() });
        catalog.insert_venue(Venue { id: 20, name: "machine learning".into() });
        for (paper, author) in [(1, 100), (2, 100), (3, 100), (3, 200)] {
            catalog.link_author(paper, author);
        }
        catalog
    }

    #[test]
    fn test_training_order_and_labels() {
        let catalog = catalog();
        let emitter = FeatureEmitter::new(&catalog, AggregateComparator::default(), false);
        let mut labels = LabelSets::new();
        let mut sink: Vec<FeatureRecord> = Vec::new();

        let stats = emitter
            .emit_training(
                "train",
                vec![TrainRow {
                    author: 100,
                    confirmed: vec![3, 1],
                    deleted: vec![2],
                }],
                &mut labels,
                &mut sink,
            )
            .unwrap();

        let order: Vec<(PaperId, i8)> = sink.iter().map(|r| (r.paper, r.label.value())).collect();
        assert_eq!(order, vec![(3, 1), (1, 1), (2, -1)]);
        assert_eq!(stats.confirmed, 2);
        assert_eq!(stats.deleted, 1);
        assert_eq!(labels.confirmed(100), &[3, 1]);
        assert!((labels.train_year(100) - 0.6).abs() < 1e-12);

        // Paper 3 has co-author 200
        assert_eq!(sink[0].author_similarity.len(), 1);
        assert_eq!(sink[0].paper_similarity.len(), 2);
    }

    #[test]
    fn test_lack_of_data_rows() {
        let catalog = catalog();
        let mut labels = LabelSets::new();
        let mut sink: Vec<FeatureRecord> = Vec::new();
        let rows = vec![
            TrainRow {
                author: 100,
                confirmed: vec![99],
                deleted: vec![],
            },
            TrainRow {
                author: 200,
                confirmed: vec![],
                deleted: vec![],
            },
        ];

        let filtered = FeatureEmitter::new(&catalog, AggregateComparator::default(), true);
        let stats = filtered
            .emit_training("train", rows.clone(), &mut labels, &mut sink)
            .unwrap();
        assert_eq!(stats.lack_of_data, 2);
        assert!(sink.is_empty());

        // Unfiltered, the unknown paper is kept and lookups default
        let unfiltered = FeatureEmitter::new(&catalog, AggregateComparator::default(), false);
        let stats = unfiltered
            .emit_training("train", rows, &mut labels, &mut sink)
            .unwrap();
        assert_eq!(stats.lack_of_data, 1);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].year, 0.0);
        assert_eq!(sink[0].author_similarity, vec![0.0]);
    }

    #[test]
    fn test_unlinked_author_rows_are_skipped() {
        let catalog = catalog();
        let mut labels = LabelSets::new();
        let mut sink: Vec<FeatureRecord> = Vec::new();
        let rows = vec![TrainRow {
            author: 999,
            confirmed: vec![1],
            deleted: vec![],
        }];

        let filtered = FeatureEmitter::new(&catalog, AggregateComparator::default(), true);
        let stats = filtered
            .emit_training("train", rows.clone(), &mut labels, &mut sink)
            .unwrap();
        assert_eq!(stats.rows, 1);
        assert_eq!(stats.unlinked, 1);
        assert_eq!(stats.lack_of_data, 0);
        assert!(sink.is_empty());
        assert_eq!(labels.labeled_count(), 0);

        let mut unknown = LabelList::new();
        let stats = filtered
            .emit_unknown(
                "test",
                vec![QueryRow { author: 999, papers: vec![1] }],
                &mut unknown,
                &mut sink,
            )
            .unwrap();
        assert_eq!(stats.unlinked, 1);
        assert!(unknown.is_empty());

        // Without filtering the row is emitted as given
        let unfiltered = FeatureEmitter::new(&catalog, AggregateComparator::default(), false);
        let stats = unfiltered
            .emit_training("train", rows, &mut labels, &mut sink)
            .unwrap();
        assert_eq!(stats.unlinked, 0);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_unknown_pass_appends() {
        let catalog = catalog();
        let emitter = FeatureEmitter::new(&catalog, AggregateComparator::default(), false);
        let mut unknown = LabelList::new();
        let mut sink: Vec<FeatureRecord> = Vec::new();

        let stats = emitter
            .emit_unknown(
                "test",
                vec![
                    QueryRow { author: 200, papers: vec![1, 1] },
                    QueryRow { author: 200, papers: vec![2] },
                ],
                &mut unknown,
                &mut sink,
            )
            .unwrap();

        assert_eq!(stats.unknown, 3);
        assert_eq!(unknown[&200], vec![1, 1, 2]);
        assert!(sink.iter().all(|r| r.label == Label::Unknown));
    }

    #[test]
    fn test_record_fields() {
        let record = FeatureRecord {
            author: 1,
            paper: 2,
            year: 0.25,
            author_similarity: vec![0.5],
            paper_similarity: vec![0.0, 1.5],
            label: Label::Confirmed,
        };
        assert_eq!(record.fields(), vec!["1", "2", "0.25", "0.5", "0", "1.5", "1"]);
    }

    #[test]
    fn test_neighbor_pass() {
        let catalog = catalog();
        let labels = LabelSets::from_training(
            &[TrainRow {
                author: 100,
                confirmed: vec![1],
                deleted: vec![],
            }],
            &catalog,
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testfull.csv");
        let mut writer = NeighborWriter::create(&path, 5).unwrap();

        let queries = emit_neighbors(
            &catalog,
            &labels,
            &NeighborMatcher::default(),
            vec![QueryRow { author: 200, papers: vec![3] }],
            false,
            &mut writer,
        )
        .unwrap();
        writer.finish().unwrap();

        assert_eq!(queries, 1);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.lines().nth(1).unwrap().starts_with("200,100,"));
    }
}
