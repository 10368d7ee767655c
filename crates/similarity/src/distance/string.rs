//! Composite string distance
//!
//! Both variants blend Jaro similarity with Levenshtein and
//! Damerau-Levenshtein edit counts. Despite the name, larger values mean
//! more similar strings, and an empty side always scores 0.

use authormatch_common::config::StringMetric;
use strsim::{damerau_levenshtein, jaro, levenshtein};

fn blend(a: &str, b: &str, ratio: impl Fn(usize, usize) -> f64) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let norm = a.chars().count().max(b.chars().count());
    let lev = ratio(levenshtein(a, b), norm);
    let damerau = ratio(damerau_levenshtein(a, b), norm);

    0.5 * jaro(a, b) + 0.25 * (1.0 - lev) + 0.25 * (1.0 - damerau)
}

/// `0.5*J + 0.25*(1 - L/norm) + 0.25*(1 - D/norm)`, `norm` the longer
/// length in characters
pub fn weighted(a: &str, b: &str) -> f64 {
    blend(a, b, |edits, norm| edits as f64 / norm as f64)
}

/// [`weighted`] with truncating integer division of the edit counts
///
/// Edit counts never exceed `norm`, so each edit term is 1 unless the
/// edit count equals `norm`.
pub fn weighted_floor(a: &str, b: &str) -> f64 {
    blend(a, b, |edits, norm| (edits / norm) as f64)
}

/// `0.5*J + 0.5*(1/L + 1/D)`, or `0.5*J + 1` when either edit count is 0
pub fn division_safe(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let similarity = 0.5 * jaro(a, b);
    let lev = levenshtein(a, b);
    let damerau = damerau_levenshtein(a, b);

    if lev == 0 || damerau == 0 {
        return similarity + 1.0;
    }

    similarity + 0.5 * (1.0 / lev as f64 + 1.0 / damerau as f64)
}

/// Dispatch on the configured variant
pub fn string_distance(metric: StringMetric, a: &str, b: &str) -> f64 {
    match metric {
        StringMetric::Weighted => weighted(a, b),
        StringMetric::WeightedFloor => weighted_floor(a, b),
        StringMetric::DivisionSafe => division_safe(a, b),
    }
}
