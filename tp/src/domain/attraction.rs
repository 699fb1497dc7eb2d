//! Attractions and the per-city saved set

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A point of interest suggested for a city
///
/// `city` is attached after parsing; providers are not asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attraction {
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub city: String,
}

/// Attractions the user kept, grouped by city and keyed by name
///
/// Saving an attraction with a name already present in its city replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedAttractions(BTreeMap<String, BTreeMap<String, Attraction>>);

impl SavedAttractions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by (city, name)
    pub fn save(&mut self, attraction: Attraction) {
        self.0
            .entry(attraction.city.clone())
            .or_default()
            .insert(attraction.name.clone(), attraction);
    }

    /// Saved attractions for a city, ordered by name
    pub fn for_city(&self, city: &str) -> Vec<Attraction> {
        self.0.get(city).map(|m| m.values().cloned().collect()).unwrap_or_default()
    }

    pub fn get(&self, city: &str, name: &str) -> Option<&Attraction> {
        self.0.get(city).and_then(|m| m.get(name))
    }

    pub fn count_for(&self, city: &str) -> usize {
        self.0.get(city).map(|m| m.len()).unwrap_or(0)
    }

    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|m| m.is_empty())
    }

    /// Drop every city not in `keep`
    pub fn retain_cities(&mut self, keep: &[String]) {
        self.0.retain(|city, _| keep.iter().any(|k| k == city));
    }
}
