//! Hotel candidates and selections

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::optional_text_or_number;

/// One hotel candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelOption {
    pub name: String,
    pub address: String,
    #[serde(default, deserialize_with = "optional_text_or_number")]
    pub rating: String,
    pub stars: u32,
    /// Free text such as "$150 per night"
    #[serde(default, deserialize_with = "optional_text_or_number")]
    pub cost: String,
}

/// Hotel candidates for one city, anchored to the inferred best area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityHotelBundle {
    pub city_name: String,
    pub optimal_location: String,
    pub hotels: Vec<HotelOption>,
}

/// Chosen hotel per city
pub type SelectedHotels = BTreeMap<String, HotelOption>;
