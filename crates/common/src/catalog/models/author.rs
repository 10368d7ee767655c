//! Author entity and publish-count profile

use super::{AuthorId, VenueId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-author paper counts by venue, with min-max normalized scores
///
/// Scores are recomputed from the raw counts after every update, so
/// re-normalizing never compounds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishProfile {
    counts: BTreeMap<VenueId, u32>,
    scores: BTreeMap<VenueId, f64>,
}

impl PublishProfile {
    pub fn from_counts(counts: BTreeMap<VenueId, u32>) -> Self {
        let mut profile = Self {
            counts,
            scores: BTreeMap::new(),
        };
        profile.renormalize();
        profile
    }

    /// Count one more paper at `venue`
    pub fn record(&mut self, venue: VenueId) {
        *self.counts.entry(venue).or_insert(0) += 1;
        self.renormalize();
    }

    fn renormalize(&mut self) {
        let max = self.counts.values().copied().max().unwrap_or(0);
        let min = self.counts.values().copied().min().unwrap_or(0);

        self.scores = self
            .counts
            .iter()
            .map(|(&venue, &count)| {
                let score = if max == min {
                    1.0
                } else {
                    (count - min) as f64 / (max - min) as f64
                };
                (venue, score)
            })
            .collect();
    }

    pub fn counts(&self) -> &BTreeMap<VenueId, u32> {
        &self.counts
    }

    pub fn scores(&self) -> &BTreeMap<VenueId, f64> {
        &self.scores
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,

    /// Normalized affiliation, longest variant seen
    pub affiliation: String,

    pub profile: PublishProfile,
}

impl Author {
    pub fn new(id: AuthorId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

/// Apply the affiliation rule: empty candidates are ignored, a strictly
/// longer current value is kept, otherwise the candidate replaces it.
pub fn merge_affiliation(current: &mut String, candidate: &str) {
    if candidate.is_empty() || current.len() > candidate.len() {
        return;
    }
    *current = candidate.to_string();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_normalization() {
        let profile = PublishProfile::from_counts(BTreeMap::from([(1, 3), (2, 5)]));
        assert_eq!(profile.scores(), &BTreeMap::from([(1, 0.0), (2, 1.0)]));

        let profile = PublishProfile::from_counts(BTreeMap::from([(1, 4), (2, 4)]));
        assert_eq!(profile.scores(), &BTreeMap::from([(1, 1.0), (2, 1.0)]));
    }

    #[test]
    fn test_incremental_record() {
        let mut profile = PublishProfile::default();
        assert!(profile.is_empty());

        profile.record(7);
        assert_eq!(profile.scores()[&7], 1.0);

        profile.record(7);
        profile.record(9);
        assert_eq!(profile.counts()[&7], 2);
        assert_eq!(profile.scores()[&7], 1.0);
        assert_eq!(profile.scores()[&9], 0.0);

        // Re-normalizing unchanged counts is a no-op
        let before = profile.clone();
        profile.renormalize();
        assert_eq!(profile, before);
    }

    #[test]
    fn test_three_level_scores() {
        let profile = PublishProfile::from_counts(BTreeMap::from([(1, 1), (2, 2), (3, 3)]));
        assert_eq!(profile.scores()[&2], 0.5);
    }

    #[test]
    fn test_merge_affiliation() {
        let mut aff = String::new();
        merge_affiliation(&mut aff, "mit");
        assert_eq!(aff, "mit");

        merge_affiliation(&mut aff, "");
        assert_eq!(aff, "mit");

        merge_affiliation(&mut aff, "ab");
        assert_eq!(aff, "mit");

        // Ties go to the later value
        merge_affiliation(&mut aff, "cmu");
        assert_eq!(aff, "cmu");

        merge_affiliation(&mut aff, "stanford university");
        assert_eq!(aff, "stanford university");
    }
}
