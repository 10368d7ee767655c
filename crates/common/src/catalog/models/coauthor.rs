//! Paper <-> author co-authorship relation

use super::{AuthorId, PaperId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bidirectional many-to-many relation, kept in first-seen order
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoAuthorship {
    /// paper -> authors listed on it
    paper_authors: HashMap<PaperId, Vec<AuthorId>>,

    /// author -> papers listing them
    author_papers: HashMap<AuthorId, Vec<PaperId>>,
}

impl CoAuthorship {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge; returns false when the pair was already linked
    pub fn link(&mut self, paper: PaperId, author: AuthorId) -> bool {
        let authors = self.paper_authors.entry(paper).or_default();
        if authors.contains(&author) {
            return false;
        }
        authors.push(author);
        self.author_papers.entry(author).or_default().push(paper);
        true
    }

    /// Authors listed on a paper
    pub fn authors_of(&self, paper: PaperId) -> &[AuthorId] {
        self.paper_authors.get(&paper).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Papers listing an author
    pub fn papers_of(&self, author: AuthorId) -> &[PaperId] {
        self.author_papers.get(&author).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn paper_count(&self) -> usize {
        self.paper_authors.len()
    }

    pub fn author_count(&self) -> usize {
        self.author_papers.len()
    }
}
