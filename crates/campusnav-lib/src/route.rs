use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::location::Coordinates;
use crate::map::LineStyle;

/// Travel mode selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Walking,
    Wheelchair,
}

impl TravelMode {
    /// Directions-provider profile identifier for this mode.
    pub fn profile(self) -> &'static str {
        match self {
            TravelMode::Walking => "foot-walking",
            TravelMode::Wheelchair => "wheelchair",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TravelMode::Walking => TravelMode::Wheelchair,
            TravelMode::Wheelchair => TravelMode::Walking,
        }
    }

    /// Stroke used for a confirmed route in this mode.
    pub fn line_style(self) -> LineStyle {
        match self {
            TravelMode::Walking => LineStyle::WALKING,
            TravelMode::Wheelchair => LineStyle::WHEELCHAIR,
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            TravelMode::Walking => "walking",
            TravelMode::Wheelchair => "wheelchair",
        };
        f.write_str(value)
    }
}

impl FromStr for TravelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "walking" | "walk" | "foot-walking" => Ok(TravelMode::Walking),
            "wheelchair" => Ok(TravelMode::Wheelchair),
            other => Err(format!("unknown travel mode '{other}'")),
        }
    }
}

/// One maneuver of the turn-by-turn list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnStep {
    pub kind: String,
    pub instruction: String,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// One alternative route returned for a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteCandidate {
    /// Rank within the current result set, 0 being the provider's primary pick.
    pub id: usize,
    pub summary: String,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub path: Vec<Coordinates>,
    pub steps: Vec<TurnStep>,
    pub origin_label: String,
    pub destination_label: String,
    pub mode: TravelMode,
}

impl RouteCandidate {
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds / 60.0
    }

    /// Same route regardless of its rank in a result set.
    pub fn same_route(&self, other: &RouteCandidate) -> bool {
        self.mode == other.mode
            && self.origin_label == other.origin_label
            && self.destination_label == other.destination_label
            && self.path == other.path
    }
}

/// A fully resolved routing request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteQuery {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub mode: TravelMode,
    pub origin_label: String,
    pub destination_label: String,
}

/// Human-readable name for a provider maneuver code.
pub fn maneuver_name(code: u8) -> &'static str {
    match code {
        0 => "left",
        1 => "right",
        2 => "sharp-left",
        3 => "sharp-right",
        4 => "slight-left",
        5 => "slight-right",
        6 => "straight",
        7 => "enter-roundabout",
        8 => "exit-roundabout",
        9 => "u-turn",
        10 => "goal",
        11 => "depart",
        12 => "keep-left",
        13 => "keep-right",
        _ => "unknown",
    }
}
