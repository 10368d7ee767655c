//! Sparse Euclidean distance over keyed profiles

use authormatch_common::config::VectorMetric;
use std::collections::BTreeMap;

/// Shared dimensions contribute their squared difference, one-sided
/// dimensions their squared value
pub fn euclidean_both_sides<K: Ord>(p: &BTreeMap<K, f64>, q: &BTreeMap<K, f64>) -> f64 {
    let from_p: f64 = p
        .iter()
        .map(|(key, &x)| match q.get(key) {
            Some(&y) => (x - y).powi(2),
            None => x.powi(2),
        })
        .sum();

    let only_q: f64 = q
        .iter()
        .filter(|(key, _)| !p.contains_key(key))
        .map(|(_, &y)| y.powi(2))
        .sum();

    (from_p + only_q).sqrt()
}

/// Only dimensions present on both sides contribute
pub fn euclidean_overlap<K: Ord>(p: &BTreeMap<K, f64>, q: &BTreeMap<K, f64>) -> f64 {
    p.iter()
        .filter_map(|(key, &x)| q.get(key).map(|&y| (x - y).powi(2)))
        .sum::<f64>()
        .sqrt()
}

/// Dispatch on the configured variant
pub fn vector_distance<K: Ord>(
    metric: VectorMetric,
    p: &BTreeMap<K, f64>,
    q: &BTreeMap<K, f64>,
) -> f64 {
    match metric {
        VectorMetric::BothSides => euclidean_both_sides(p, q),
        VectorMetric::Overlap => euclidean_overlap(p, q),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_both_sides() {
        let p = BTreeMap::from([(1u64, 1.0), (2, 2.0)]);
        let q = BTreeMap::from([(2u64, 1.0), (3, 2.0)]);
        // 1^2 + (2-1)^2 + 2^2
        assert!((euclidean_both_sides(&p, &q) - 6f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_overlap_only() {
        let p = BTreeMap::from([(1u64, 1.0), (2, 2.0)]);
        let q = BTreeMap::from([(2u64, 0.5), (3, 2.0)]);
        assert!((euclidean_overlap(&p, &q) - 1.5).abs() < 1e-12);

        let disjoint = BTreeMap::from([(9u64, 4.0)]);
        assert_eq!(euclidean_overlap(&p, &disjoint), 0.0);
    }

    #[test]
    fn test_empty_profiles() {
        let empty: BTreeMap<u64, f64> = BTreeMap::new();
        let q = BTreeMap::from([(1u64, 3.0), (2, 4.0)]);
        assert_eq!(vector_distance(VectorMetric::BothSides, &empty, &q), 5.0);
        assert_eq!(vector_distance(VectorMetric::Overlap, &empty, &q), 0.0);
    }

    fn profile() -> impl Strategy<Value = BTreeMap<u64, f64>> {
        prop::collection::btree_map(0u64..8, 0.0f64..10.0, 0..6)
    }

    proptest! {
        #[test]
        fn symmetric(p in profile(), q in profile()) {
            let both = euclidean_both_sides(&p, &q) - euclidean_both_sides(&q, &p);
            prop_assert!(both.abs() < 1e-9);
            prop_assert!((euclidean_overlap(&p, &q) - euclidean_overlap(&q, &p)).abs() < 1e-9);
        }

        #[test]
        fn overlap_never_exceeds_both_sides(p in profile(), q in profile()) {
            prop_assert!(euclidean_overlap(&p, &q) <= euclidean_both_sides(&p, &q) + 1e-9);
        }

        #[test]
        fn self_distance_is_zero(p in profile()) {
            prop_assert_eq!(euclidean_both_sides(&p, &p), 0.0);
        }
    }
}
