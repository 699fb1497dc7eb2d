//! Itinerary candidates

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Stable identifier for a stored itinerary
///
/// Assigned by the planner after parsing; never part of provider output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItineraryId(String);

impl ItineraryId {
    /// Generate a fresh time-ordered ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItineraryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItineraryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One candidate itinerary
///
/// `cities`, `days_per_city`, and `notes` are aligned by position. The
/// provider spells `days_per_city` as `days`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Itinerary {
    #[serde(default = "ItineraryId::generate")]
    pub id: ItineraryId,
    pub name: String,
    pub cities: Vec<String>,
    #[serde(rename = "days")]
    pub days_per_city: Vec<u32>,
    pub notes: Vec<String>,
}

/// How well an itinerary honours the alignment and duration contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItineraryConformance {
    /// cities, days, and notes all have the same length
    pub aligned: bool,
    /// sum of days_per_city
    pub total_days: u32,
    /// total_days equals the requested duration
    pub matches_duration: bool,
}

impl ItineraryConformance {
    pub fn is_conformant(&self) -> bool {
        self.aligned && self.matches_duration
    }
}

impl Itinerary {
    pub fn new(name: impl Into<String>, cities: Vec<String>, days_per_city: Vec<u32>, notes: Vec<String>) -> Self {
        Self {
            id: ItineraryId::generate(),
            name: name.into(),
            cities,
            days_per_city,
            notes,
        }
    }

    /// Check alignment and total length against the requested duration
    pub fn conformance(&self, duration_days: u32) -> ItineraryConformance {
        let total_days = self.days_per_city.iter().sum();
        ItineraryConformance {
            aligned: self.cities.len() == self.days_per_city.len() && self.cities.len() == self.notes.len(),
            total_days,
            matches_duration: total_days == duration_days,
        }
    }

    /// Days planned in a city; 0 when the city is absent or has no day count
    pub fn days_in(&self, city: &str) -> u32 {
        self.cities
            .iter()
            .zip(self.days_per_city.iter())
            .filter(|(c, _)| c.as_str() == city)
            .map(|(_, d)| *d)
            .sum()
    }

    pub fn contains_city(&self, city: &str) -> bool {
        self.cities.iter().any(|c| c == city)
    }

    /// Consecutive (origin, destination) pairs in travel order
    pub fn legs(&self) -> Vec<(&str, &str)> {
        debug!(city_count = self.cities.len(), "legs: called");
        self.cities
            .windows(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
            .collect()
    }

    /// Rows of (city, days, notes), padding missing positions
    ///
    /// Tolerates misaligned itineraries so a malformed reply still renders.
    pub fn rows(&self) -> Vec<(&str, Option<u32>, Option<&str>)> {
        let len = self.cities.len().max(self.days_per_city.len()).max(self.notes.len());
        (0..len)
            .map(|i| {
                (
                    self.cities.get(i).map(String::as_str).unwrap_or(""),
                    self.days_per_city.get(i).copied(),
                    self.notes.get(i).map(String::as_str),
                )
            })
            .collect()
    }
}
