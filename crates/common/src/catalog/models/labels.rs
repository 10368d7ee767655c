//! Label sets and the training profile derived from them

use super::{AuthorId, PaperId, VenueId};
use crate::catalog::Catalog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Assignment label of an (author, paper) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Confirmed,
    Deleted,
    Unknown,
}

impl Label {
    /// Value written in the label column
    pub fn value(self) -> i8 {
        match self {
            Label::Confirmed => 1,
            Label::Deleted => -1,
            Label::Unknown => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Confirmed => "confirmed",
            Label::Deleted => "deleted",
            Label::Unknown => "unknown",
        }
    }
}

/// author -> paper ids, in input order, duplicates kept
pub type LabelList = BTreeMap<AuthorId, Vec<PaperId>>;

/// Space separated id list as written in label files
pub fn format_ids(ids: &[PaperId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a label row survives compaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Kept,

    /// The author has no PaperAuthor entry
    UnlinkedAuthor,

    /// No paper id is left
    LackOfData,
}

/// One Train row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainRow {
    pub author: AuthorId,
    pub confirmed: Vec<PaperId>,
    pub deleted: Vec<PaperId>,
}

impl TrainRow {
    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty() && self.deleted.is_empty()
    }

    pub fn status(&self) -> RowStatus {
        if self.is_empty() {
            RowStatus::LackOfData
        } else {
            RowStatus::Kept
        }
    }

    /// Keep the ids `known` accepts; an unlinked author keeps nothing
    pub fn compact(&mut self, linked: bool, known: impl Fn(PaperId) -> bool) -> RowStatus {
        if !linked {
            return RowStatus::UnlinkedAuthor;
        }
        self.confirmed.retain(|&pid| known(pid));
        self.deleted.retain(|&pid| known(pid));
        self.status()
    }

    /// Compact against the catalog's paper and PaperAuthor tables
    pub fn retain_known(&mut self, catalog: &Catalog) -> RowStatus {
        self.compact(catalog.has_publications(self.author), |pid| {
            catalog.contains_paper(pid)
        })
    }
}

/// One Valid/Test/ValidSolution row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRow {
    pub author: AuthorId,
    pub papers: Vec<PaperId>,
}

impl QueryRow {
    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    pub fn status(&self) -> RowStatus {
        if self.is_empty() {
            RowStatus::LackOfData
        } else {
            RowStatus::Kept
        }
    }

    pub fn compact(&mut self, linked: bool, known: impl Fn(PaperId) -> bool) -> RowStatus {
        if !linked {
            return RowStatus::UnlinkedAuthor;
        }
        self.retain_papers(known);
        self.status()
    }

    /// Drop ids `known` rejects, whatever the author
    pub fn retain_papers(&mut self, known: impl Fn(PaperId) -> bool) {
        self.papers.retain(|&pid| known(pid));
    }

    pub fn retain_known(&mut self, catalog: &Catalog) -> RowStatus {
        self.compact(catalog.has_publications(self.author), |pid| {
            catalog.contains_paper(pid)
        })
    }
}

/// Confirmed, deleted and unknown assignments plus the training profile
///
/// Append-only. `train_year` is the mean normalized year of an author's
/// confirmed papers; `train_count` counts those papers per venue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelSets {
    confirmed: LabelList,
    deleted: LabelList,
    unknown: LabelList,
    train_year: BTreeMap<AuthorId, f64>,
    train_count: BTreeMap<AuthorId, BTreeMap<VenueId, f64>>,
}

static EMPTY_COUNTS: BTreeMap<VenueId, f64> = BTreeMap::new();

impl LabelSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label sets for a whole Train table
    pub fn from_training(rows: &[TrainRow], catalog: &Catalog) -> Self {
        let mut labels = Self::new();
        for row in rows {
            labels.record_training(row, catalog);
        }
        labels
    }

    /// Append one Train row and refresh the author's training profile
    pub fn record_training(&mut self, row: &TrainRow, catalog: &Catalog) {
        if !row.deleted.is_empty() {
            self.deleted
                .entry(row.author)
                .or_default()
                .extend_from_slice(&row.deleted);
        }

        if row.confirmed.is_empty() {
            return;
        }

        let confirmed = self.confirmed.entry(row.author).or_default();
        confirmed.extend_from_slice(&row.confirmed);

        let year_sum: f64 = confirmed.iter().map(|&pid| catalog.paper_year(pid)).sum();
        self.train_year
            .insert(row.author, year_sum / confirmed.len() as f64);

        let counts = self.train_count.entry(row.author).or_default();
        for venue in row.confirmed.iter().filter_map(|&pid| catalog.paper_venue(pid)) {
            *counts.entry(venue).or_insert(0.0) += 1.0;
        }
    }

    /// Append unknown assignments for an author
    pub fn record_unknown(&mut self, author: AuthorId, papers: &[PaperId]) {
        if papers.is_empty() {
            return;
        }
        self.unknown
            .entry(author)
            .or_default()
            .extend_from_slice(papers);
    }

    /// Append unknown assignments gathered elsewhere
    pub fn extend_unknown(&mut self, other: LabelList) {
        for (author, papers) in other {
            self.record_unknown(author, &papers);
        }
    }

    pub fn confirmed(&self, author: AuthorId) -> &[PaperId] {
        self.confirmed.get(&author).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn deleted(&self, author: AuthorId) -> &[PaperId] {
        self.deleted.get(&author).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn unknown(&self, author: AuthorId) -> &[PaperId] {
        self.unknown.get(&author).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Authors holding a confirmed list, ascending id order
    pub fn labeled_authors(&self) -> impl Iterator<Item = AuthorId> + '_ {
        self.confirmed.keys().copied()
    }

    pub fn labeled_count(&self) -> usize {
        self.confirmed.len()
    }

    /// Mean normalized confirmed year (0 for unlabeled authors)
    pub fn train_year(&self, author: AuthorId) -> f64 {
        self.train_year.get(&author).copied().unwrap_or(0.0)
    }

    /// Confirmed paper counts per venue (empty for unlabeled authors)
    pub fn train_count(&self, author: AuthorId) -> &BTreeMap<VenueId, f64> {
        self.train_count.get(&author).unwrap_or(&EMPTY_COUNTS)
    }
}
