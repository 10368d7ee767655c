//! Entity catalog
//!
//! In-memory tables for papers, venues, authors and co-authorship. Every
//! lookup degrades to a neutral default when the entity is absent, and no
//! read ever creates an entry.

pub mod compact;
pub mod loader;
pub mod models;

pub use compact::{compact_tables, CompactionReport};
pub use loader::{CatalogLoader, CoAuthorTable};
pub use models::*;

use std::collections::{BTreeMap, HashMap};

static EMPTY_SCORES: BTreeMap<VenueId, f64> = BTreeMap::new();

/// Populated entity tables, passed by reference into every component
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    papers: HashMap<PaperId, Paper>,
    venues: HashMap<VenueId, Venue>,
    authors: HashMap<AuthorId, Author>,
    coauthors: CoAuthorship,

    /// Largest conference id; journal ids are shifted by it
    journal_pad: VenueId,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the catalog from the independent raw derivations
    pub fn assemble(
        affiliations: HashMap<AuthorId, String>,
        papers: Vec<RawPaper>,
        conferences: VenueTable,
        journals: VenueTable,
    ) -> Self {
        let journal_pad = conferences.max_id;
        let mut catalog = Self {
            journal_pad,
            ..Self::default()
        };

        for venue in conferences.venues(0).chain(journals.venues(journal_pad)) {
            catalog.insert_venue(venue);
        }

        for raw in papers {
            catalog.insert_paper(raw.into_paper(journal_pad));
        }

        for (author, affiliation) in affiliations {
            catalog.merge_affiliation(author, &affiliation);
        }

        catalog
    }

    /// Install the co-authorship derivation
    ///
    /// Affiliation candidates from co-authorship rows go through the same
    /// longest-wins rule as the author table, applied after it.
    pub fn install(&mut self, table: CoAuthorTable) {
        let CoAuthorTable {
            coauthors,
            profiles,
            affiliations,
        } = table;

        for (author, affiliation) in affiliations {
            self.merge_affiliation(author, &affiliation);
        }

        for (author, profile) in profiles {
            self.authors
                .entry(author)
                .or_insert_with(|| Author::new(author))
                .profile = profile;
        }

        self.coauthors = coauthors;
    }

    pub fn insert_paper(&mut self, paper: Paper) {
        self.papers.insert(paper.id, paper);
    }

    pub fn insert_venue(&mut self, venue: Venue) {
        self.venues.insert(venue.id, venue);
    }

    /// Offer an affiliation for an author
    pub fn merge_affiliation(&mut self, author: AuthorId, candidate: &str) {
        if candidate.is_empty() {
            return;
        }
        let entry = self
            .authors
            .entry(author)
            .or_insert_with(|| Author::new(author));
        merge_affiliation(&mut entry.affiliation, candidate);
    }

    /// Link an author to a paper, counting the paper's venue into the
    /// author's profile when the pair is new
    pub fn link_author(&mut self, paper: PaperId, author: AuthorId) -> bool {
        if !self.coauthors.link(paper, author) {
            return false;
        }

        if let Some(venue) = self.paper_venue(paper) {
            self.authors
                .entry(author)
                .or_insert_with(|| Author::new(author))
                .profile
                .record(venue);
        }
        true
    }

    pub fn paper(&self, id: PaperId) -> Option<&Paper> {
        self.papers.get(&id)
    }

    pub fn contains_paper(&self, id: PaperId) -> bool {
        self.papers.contains_key(&id)
    }

    /// Normalized year, 0 when the paper is unknown
    pub fn paper_year(&self, id: PaperId) -> f64 {
        self.papers.get(&id).map(|p| p.year).unwrap_or(0.0)
    }

    pub fn paper_title(&self, id: PaperId) -> &str {
        self.papers.get(&id).map(|p| p.title.as_str()).unwrap_or("")
    }

    pub fn paper_keywords(&self, id: PaperId) -> &str {
        self.papers.get(&id).map(|p| p.keywords.as_str()).unwrap_or("")
    }

    pub fn paper_venue(&self, id: PaperId) -> Option<VenueId> {
        self.papers.get(&id).and_then(|p| p.venue)
    }

    pub fn venue_name(&self, id: VenueId) -> &str {
        self.venues.get(&id).map(|v| v.name.as_str()).unwrap_or("")
    }

    /// Name of the venue a paper appeared in, empty when either is unknown
    pub fn paper_venue_name(&self, id: PaperId) -> &str {
        self.paper_venue(id)
            .map(|venue| self.venue_name(venue))
            .unwrap_or("")
    }

    pub fn affiliation(&self, id: AuthorId) -> &str {
        self.authors
            .get(&id)
            .map(|a| a.affiliation.as_str())
            .unwrap_or("")
    }

    /// Normalized publish-count profile
    pub fn publish_profile(&self, id: AuthorId) -> &BTreeMap<VenueId, f64> {
        self.authors
            .get(&id)
            .map(|a| a.profile.scores())
            .unwrap_or(&EMPTY_SCORES)
    }

    /// Authors listed on a paper
    pub fn co_authors(&self, paper: PaperId) -> &[AuthorId] {
        self.coauthors.authors_of(paper)
    }

    /// Papers listing an author
    pub fn publications(&self, author: AuthorId) -> &[PaperId] {
        self.coauthors.papers_of(author)
    }

    /// Whether the author has any PaperAuthor entry
    pub fn has_publications(&self, author: AuthorId) -> bool {
        !self.publications(author).is_empty()
    }

    pub fn journal_pad(&self) -> VenueId {
        self.journal_pad
    }

    pub fn paper_count(&self) -> usize {
        self.papers.len()
    }

    pub fn venue_count(&self) -> usize {
        self.venues.len()
    }

    pub fn author_count(&self) -> usize {
        self.authors.len()
    }
}
