//! Nearest labeled authors for a query author
//!
//! Fallback for authors without labels. Every labeled author is scored by a
//! weighted blend of affiliation distance, mean-year distance and
//! venue-count distance; the two numeric terms are scaled by their maxima
//! over all labeled authors for the query. The top `k` scores are reported
//! in descending order.

use authormatch_common::catalog::{AuthorId, Catalog, LabelSets, PaperId, VenueId};
use authormatch_common::config::NeighborConfig;
use authormatch_common::metrics::record_neighbor_query;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::distance::{euclidean_both_sides, string_distance};

/// One reported neighbor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborMatch {
    pub author: AuthorId,
    pub score: f64,
}

/// Mean normalized year and raw venue counts over a paper list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryProfile {
    pub year: f64,
    pub counts: BTreeMap<VenueId, f64>,
}

impl QueryProfile {
    /// Profile of a paper list; an empty list has mean year 0
    pub fn of(catalog: &Catalog, papers: &[PaperId]) -> Self {
        let mut counts = BTreeMap::new();
        for venue in papers.iter().filter_map(|&pid| catalog.paper_venue(pid)) {
            *counts.entry(venue).or_insert(0.0) += 1.0;
        }

        let year = if papers.is_empty() {
            0.0
        } else {
            papers.iter().map(|&pid| catalog.paper_year(pid)).sum::<f64>() / papers.len() as f64
        };

        Self { year, counts }
    }
}

/// Scores labeled authors against query authors
#[derive(Debug, Clone, Copy, Default)]
pub struct NeighborMatcher {
    config: NeighborConfig,
}

impl NeighborMatcher {
    pub fn new(config: NeighborConfig) -> Self {
        Self { config }
    }

    /// Top-k labeled authors for `author` with candidate papers `papers`
    ///
    /// Ties keep ascending author id order. Fewer than `k` results only when
    /// fewer labeled authors exist.
    pub fn nearest(
        &self,
        catalog: &Catalog,
        labels: &LabelSets,
        author: AuthorId,
        papers: &[PaperId],
    ) -> Vec<NeighborMatch> {
        let query = QueryProfile::of(catalog, papers);
        let affiliation = catalog.affiliation(author);

        // (candidate, affiliation, year, count) in ascending candidate order
        let terms: Vec<(AuthorId, f64, f64, f64)> = labels
            .labeled_authors()
            .map(|candidate| {
                let aff = string_distance(
                    self.config.string_metric,
                    affiliation,
                    catalog.affiliation(candidate),
                );
                let year = (labels.train_year(candidate) - query.year).abs();
                let count = euclidean_both_sides(&query.counts, labels.train_count(candidate));
                (candidate, aff, year, count)
            })
            .collect();

        let max_year = terms.iter().map(|t| t.2).fold(0.0, f64::max);
        let max_count = terms.iter().map(|t| t.3).fold(0.0, f64::max);

        let mut scored: Vec<NeighborMatch> = terms
            .into_iter()
            .map(|(candidate, aff, year, count)| NeighborMatch {
                author: candidate,
                score: self.config.affiliation_weight * aff
                    + self.config.year_weight * scaled(year, max_year)
                    + self.config.count_weight * scaled(count, max_count),
            })
            .collect();

        // Stable sort: equal scores stay in ascending author id order
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.config.k);

        debug!(
            author,
            papers = papers.len(),
            neighbors = scored.len(),
            "Neighbor query complete"
        );
        record_neighbor_query(scored.len());

        scored
    }
}

fn scaled(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value / max
    } else {
        0.0
    }
}
