//! Entity models
//!
//! Catalog entities for AuthorMatch

mod author;
mod coauthor;
mod labels;
mod paper;
mod venue;

/// Paper identifier
pub type PaperId = u64;

/// Author identifier
pub type AuthorId = u64;

/// Venue identifier in the unified conference/journal space
pub type VenueId = u64;

pub use author::{merge_affiliation, Author, PublishProfile};
pub use coauthor::CoAuthorship;
pub use labels::{format_ids, Label, LabelList, LabelSets, QueryRow, RowStatus, TrainRow};
pub use paper::{Paper, RawPaper, YearScale};
pub use venue::{Venue, VenueTable};
