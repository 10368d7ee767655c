//! Aggregate comparators
//!
//! Provides:
//! - Author-pair similarity (publish-count profile [, affiliation])
//! - Paper-pair similarity (title, venue name [, keywords])
//! - Component-wise means over a candidate list
//!
//! The active component sets, metrics and averaging rule come from
//! [`SimilarityConfig`].

use authormatch_common::catalog::{AuthorId, Catalog, PaperId, VenueId};
use authormatch_common::config::{AuthorFields, MeanPolicy, PaperFields, SimilarityConfig};
use std::collections::BTreeMap;

use crate::distance::{string_distance, vector_distance};

/// Author-side inputs to a pairwise comparison
#[derive(Debug, Clone, Copy)]
pub struct AuthorInfo<'a> {
    pub profile: &'a BTreeMap<VenueId, f64>,
    pub affiliation: &'a str,
}

impl<'a> AuthorInfo<'a> {
    pub fn of(catalog: &'a Catalog, author: AuthorId) -> Self {
        Self {
            profile: catalog.publish_profile(author),
            affiliation: catalog.affiliation(author),
        }
    }
}

/// Paper-side inputs to a pairwise comparison
#[derive(Debug, Clone, Copy)]
pub struct PaperInfo<'a> {
    pub title: &'a str,
    pub venue: &'a str,
    pub keywords: &'a str,
}

impl<'a> PaperInfo<'a> {
    pub fn of(catalog: &'a Catalog, paper: PaperId) -> Self {
        Self {
            title: catalog.paper_title(paper),
            venue: catalog.paper_venue_name(paper),
            keywords: catalog.paper_keywords(paper),
        }
    }
}

/// Author and paper similarity aggregated across candidate lists
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateComparator {
    config: SimilarityConfig,
}

impl AggregateComparator {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Feature column names of the author components
    pub fn author_columns(&self) -> &'static [&'static str] {
        match self.config.author_fields {
            AuthorFields::PublishCount => &["PublishCount"],
            AuthorFields::PublishCountAffiliation => &["PublishCount", "Affiliation"],
        }
    }

    /// Feature column names of the paper components
    pub fn paper_columns(&self) -> &'static [&'static str] {
        match self.config.paper_fields {
            PaperFields::TitleVenue => &["PaperTitle", "Publish"],
            PaperFields::TitleVenueKeywords => &["PaperTitle", "Publish", "Keywords"],
        }
    }

    pub fn author_width(&self) -> usize {
        self.author_columns().len()
    }

    pub fn paper_width(&self) -> usize {
        self.paper_columns().len()
    }

    /// Component vector for one pair of authors
    pub fn author_pair(&self, a: &AuthorInfo<'_>, b: &AuthorInfo<'_>) -> Vec<f64> {
        let profile = vector_distance(self.config.profile_metric, a.profile, b.profile);
        let mut components = vec![profile];

        if self.config.author_fields == AuthorFields::PublishCountAffiliation {
            components.push(string_distance(
                self.config.string_metric,
                a.affiliation,
                b.affiliation,
            ));
        }

        components
    }

    /// Component vector for one pair of papers
    pub fn paper_pair(&self, a: &PaperInfo<'_>, b: &PaperInfo<'_>) -> Vec<f64> {
        let metric = self.config.string_metric;
        let mut components = vec![
            string_distance(metric, a.title, b.title),
            string_distance(metric, a.venue, b.venue),
        ];

        if self.config.paper_fields == PaperFields::TitleVenueKeywords {
            components.push(string_distance(metric, a.keywords, b.keywords));
        }

        components
    }

    /// Mean author similarity between `author` and the other authors of `paper`
    pub fn coauthor_similarity(
        &self,
        catalog: &Catalog,
        author: AuthorId,
        paper: PaperId,
    ) -> Vec<f64> {
        let target = AuthorInfo::of(catalog, author);
        let rows = catalog
            .co_authors(paper)
            .iter()
            .filter(|&&coauthor| coauthor != author)
            .map(|&coauthor| self.author_pair(&target, &AuthorInfo::of(catalog, coauthor)));

        self.aggregate(self.author_width(), rows)
    }

    /// Mean paper similarity between `paper` and the author's other publications
    pub fn publication_similarity(
        &self,
        catalog: &Catalog,
        author: AuthorId,
        paper: PaperId,
    ) -> Vec<f64> {
        let target = PaperInfo::of(catalog, paper);
        let rows = catalog
            .publications(author)
            .iter()
            .filter(|&&publication| publication != paper)
            .map(|&publication| self.paper_pair(&target, &PaperInfo::of(catalog, publication)));

        self.aggregate(self.paper_width(), rows)
    }

    /// Component-wise mean; a component without contributions is 0
    pub fn aggregate(&self, width: usize, rows: impl Iterator<Item = Vec<f64>>) -> Vec<f64> {
        let mut sums = vec![0.0; width];
        let mut nonzero = vec![0usize; width];
        let mut candidates = 0usize;

        for row in rows {
            candidates += 1;
            for (i, value) in row.into_iter().enumerate().take(width) {
                sums[i] += value;
                if value != 0.0 {
                    nonzero[i] += 1;
                }
            }
        }

        sums.into_iter()
            .zip(nonzero)
            .map(|(sum, count)| {
                let denominator = match self.config.mean_policy {
                    MeanPolicy::NonZeroContributions => count,
                    MeanPolicy::AllCandidates => candidates,
                };
                if denominator == 0 {
                    0.0
                } else {
                    sum / denominator as f64
                }
            })
            .collect()
    }
}
