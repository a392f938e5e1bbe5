//! Campus location catalog and place-name resolution.
//!
//! The catalog is a static, ordered list of named points loaded once at
//! startup. Resolution is case-insensitive: an exact name match wins, then the
//! first location (in list order) whose name contains the query.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Query text that stands for the device's live position.
pub const CURRENT_LOCATION_SENTINEL: &str = "my location";

const EMBEDDED_LOCATIONS: &str = include_str!("../data/campus_locations.json");

/// Minimum Jaro-Winkler similarity for a name to be offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Geographic coordinates in `(lon, lat)` order, serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinates {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(value: Coordinates) -> Self {
        [value.lon, value.lat]
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lon, self.lat)
    }
}

/// A named campus point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Deserialize)]
struct LocationFile {
    locations: Vec<Location>,
}

/// Returns `true` when `query` asks for the live device position instead of a place.
pub fn is_current_location(query: &str) -> bool {
    query.is_empty() || query.eq_ignore_ascii_case(CURRENT_LOCATION_SENTINEL)
}

/// Immutable, ordered set of campus locations.
#[derive(Debug, Clone, Default)]
pub struct LocationCatalog {
    locations: Vec<Location>,
}

impl LocationCatalog {
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }

    /// Catalog bundled with the library.
    pub fn embedded() -> Result<Self> {
        Self::from_json_str(EMBEDDED_LOCATIONS)
    }

    /// Parse a `{"locations": [{"name": .., "coordinates": [lon, lat]}]}` document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: LocationFile = serde_json::from_str(json)?;
        if file.locations.is_empty() {
            return Err(Error::LocationCatalog {
                message: "catalog contains no locations".to_string(),
            });
        }
        debug!(count = file.locations.len(), "loaded location catalog");
        Ok(Self::new(file.locations))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    /// Resolve a free-text place name to its coordinates.
    ///
    /// Returns `None` for an empty query, for the "my location" sentinel, and
    /// when nothing matches. Callers treat `None` as "query not ready".
    pub fn resolve(&self, query: &str) -> Option<Coordinates> {
        self.find(query).map(|location| location.coordinates)
    }

    /// Same as [`resolve`](Self::resolve) but returns the whole location.
    pub fn find(&self, query: &str) -> Option<&Location> {
        if is_current_location(query) {
            return None;
        }
        let needle = query.to_lowercase();

        self.locations
            .iter()
            .find(|loc| loc.name.to_lowercase() == needle)
            .or_else(|| {
                self.locations
                    .iter()
                    .find(|loc| loc.name.to_lowercase().contains(&needle))
            })
    }

    /// Resolve or fail with an [`Error::UnknownLocation`] carrying suggestions.
    pub fn require(&self, query: &str) -> Result<&Location> {
        self.find(query).ok_or_else(|| Error::UnknownLocation {
            name: query.to_string(),
            suggestions: self.suggestions(query, 3),
        })
    }

    /// Names most similar to `query`, best first.
    pub fn suggestions(&self, query: &str, limit: usize) -> Vec<String> {
        let needle = query.to_lowercase();
        let mut scored: Vec<(f64, &str)> = self
            .locations
            .iter()
            .map(|loc| {
                let score = strsim::jaro_winkler(&needle, &loc.name.to_lowercase());
                (score, loc.name.as_str())
            })
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.to_string())
            .collect()
    }
}
