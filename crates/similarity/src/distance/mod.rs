//! Pure distance functions
//!
//! - String distance over normalized text (weighted, truncating and division-safe variants)
//! - Sparse Euclidean distance over venue count profiles

mod string;
mod vector;

pub use string::{division_safe, string_distance, weighted, weighted_floor};
pub use vector::{euclidean_both_sides, euclidean_overlap, vector_distance};
