//! Domain types for tripplanner
//!
//! Typed planning artifacts produced from provider replies and the trip
//! constraints collected at intake.

mod attraction;
mod itinerary;
mod lodging;
mod transport;
mod trip;

pub use attraction::{Attraction, SavedAttractions};
pub use itinerary::{Itinerary, ItineraryConformance, ItineraryId};
pub use lodging::{CityHotelBundle, HotelOption, SelectedHotels};
pub use transport::{TransportLeg, TransportOption};
pub use trip::TripRequest;

use serde::{Deserialize, Deserializer};

/// Deserialize a field that providers emit either as a string or a bare number
///
/// `"200"` and `200` both become `"200"`. Anything else is a shape error.
pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(TextOrNumber::deserialize(deserializer)?.into_text())
}

/// Same as [`text_or_number`] but tolerates a null field
///
/// Pair with `#[serde(default)]` to also tolerate a missing one.
pub(crate) fn optional_text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TextOrNumber>::deserialize(deserializer)?
        .map(TextOrNumber::into_text)
        .unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl TextOrNumber {
    fn into_text(self) -> String {
        match self {
            TextOrNumber::Text(s) => s,
            TextOrNumber::Number(n) => n.to_string(),
        }
    }
}
