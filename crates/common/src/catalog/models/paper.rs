//! Paper entity

use super::{PaperId, VenueId};
use crate::config::YearConfig;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: PaperId,

    /// Normalized title, possibly empty
    pub title: String,

    /// Publication year scaled to [0, 1]
    pub year: f64,

    /// Unified conference/journal reference
    pub venue: Option<VenueId>,

    /// Normalized keywords, possibly empty
    pub keywords: String,
}

/// Paper row as parsed, before conference and journal ids are unified
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawPaper {
    pub id: PaperId,
    pub title: String,
    pub year: f64,
    pub conference_id: i64,
    pub journal_id: i64,
    pub keywords: String,
}

impl RawPaper {
    /// Resolve the unified venue: conference first, then padded journal
    pub fn venue(&self, journal_pad: VenueId) -> Option<VenueId> {
        if self.conference_id > 0 {
            Some(self.conference_id as VenueId)
        } else if self.journal_id > 0 {
            Some(self.journal_id as VenueId + journal_pad)
        } else {
            None
        }
    }

    pub fn into_paper(self, journal_pad: VenueId) -> Paper {
        let venue = self.venue(journal_pad);
        Paper {
            id: self.id,
            title: self.title,
            year: self.year,
            venue,
            keywords: self.keywords,
        }
    }
}

/// Linear year scale with clamping
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct YearScale {
    pub min_year: f64,
    pub max_year: f64,
}

impl YearScale {
    pub fn new(min_year: f64, max_year: f64) -> Self {
        Self { min_year, max_year }
    }

    /// Map a year onto [0, 1], clamping out-of-range years
    pub fn normalize(&self, year: f64) -> f64 {
        if year < self.min_year {
            0.0
        } else if year > self.max_year {
            1.0
        } else {
            (year - self.min_year) / (self.max_year - self.min_year)
        }
    }
}

impl Default for YearScale {
    fn default() -> Self {
        YearConfig::default().into()
    }
}

impl From<YearConfig> for YearScale {
    fn from(config: YearConfig) -> Self {
        Self::new(config.min_year as f64, config.max_year as f64)
    }
}
