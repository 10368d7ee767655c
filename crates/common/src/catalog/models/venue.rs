//! Venue entity (conferences and journals in one id space)

use super::VenueId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: VenueId,

    /// Normalized full name
    pub name: String,
}

/// Conference or journal table as parsed
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueTable {
    /// (raw id, normalized full name), rows with an empty name omitted
    pub names: Vec<(VenueId, String)>,

    /// Largest raw id seen, including rows with an empty name
    pub max_id: VenueId,
}

impl VenueTable {
    /// Venues with ids shifted by `offset`
    pub fn venues(&self, offset: VenueId) -> impl Iterator<Item = Venue> + '_ {
        self.names.iter().map(move |(id, name)| Venue {
            id: id + offset,
            name: name.clone(),
        })
    }
}
