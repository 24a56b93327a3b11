//! The nested one-to-one sub-entity of the kindred data model.

use serde::{Deserialize, Serialize};

use crate::id::AddressId;

/// Coarse compass region an address belongs to. Stored as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    North,
    South,
    East,
    West,
}

impl Region {
    /// The TEXT form written to the store.
    pub fn as_str(self) -> &'static str {
        match self {
            Region::North => "North",
            Region::South => "South",
            Region::East => "East",
            Region::West => "West",
        }
    }

    /// Parses the stored TEXT form, case-insensitively.
    pub fn from_label(label: &str) -> Region {
        match label.to_ascii_lowercase().as_str() {
            "north" => Region::North,
            "south" => Region::South,
            "east" => Region::East,
            "west" => Region::West,
            _ => Region::North, // fallback
        }
    }
}

/// A postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Assigned by the store at insert time; `None` until then.
    pub id: Option<AddressId>,
    pub street_address: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub county: Option<String>,
    pub region: Region,
    pub country: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_label_roundtrip() {
        for region in [Region::North, Region::South, Region::East, Region::West] {
            assert_eq!(Region::from_label(region.as_str()), region);
        }
    }

    #[test]
    fn region_parse_is_case_insensitive() {
        assert_eq!(Region::from_label("WEST"), Region::West);
        assert_eq!(Region::from_label("east"), Region::East);
    }

    #[test]
    fn region_parse_falls_back_on_unknown() {
        assert_eq!(Region::from_label("atlantis"), Region::North);
    }
}
