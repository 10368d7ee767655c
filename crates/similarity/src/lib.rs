//! AuthorMatch Similarity Engine
//!
//! Provides:
//! - Composite string distances and sparse Euclidean distances
//! - Aggregate author and paper comparators
//! - Nearest labeled author search

pub mod compare;
pub mod distance;
pub mod neighbor;

pub use compare::{AggregateComparator, AuthorInfo, PaperInfo};
pub use neighbor::{NeighborMatch, NeighborMatcher, QueryProfile};
