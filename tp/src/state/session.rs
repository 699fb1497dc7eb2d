//! Typed per-session workflow state
//!
//! Every mutation lives here as a method so the store actor can apply it as one
//! atomic command. Methods that change upstream data also reset or prune what
//! was derived from it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    Attraction, CityHotelBundle, Itinerary, ItineraryId, SavedAttractions, SelectedHotels, TransportLeg, TripRequest,
};
use crate::error::PlannerError;

use super::messages::StoreError;

/// Opaque session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh time-ordered ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Everything one planning session has collected so far
///
/// `None` means "not produced yet"; `Some(empty)` means "produced, and empty".
/// The two are distinct for stage prerequisites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    trip: Option<TripRequest>,
    itineraries: Option<Vec<Itinerary>>,
    selected: Option<ItineraryId>,
    saved_attractions: SavedAttractions,
    hotel_bundles: Option<Vec<CityHotelBundle>>,
    selected_hotels: Option<SelectedHotels>,
    transport_legs: Option<Vec<TransportLeg>>,
    selected_modes: Option<Vec<String>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    // === Accessors ===

    pub fn trip(&self) -> Option<&TripRequest> {
        self.trip.as_ref()
    }

    /// True once an itinerary set has been generated, even if it is empty
    pub fn has_itineraries(&self) -> bool {
        self.itineraries.is_some()
    }

    pub fn itineraries(&self) -> &[Itinerary] {
        self.itineraries.as_deref().unwrap_or_default()
    }

    pub fn selected_id(&self) -> Option<&ItineraryId> {
        self.selected.as_ref()
    }

    /// Position of the selected itinerary in the current set
    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected.as_ref()?;
        self.itineraries().iter().position(|it| &it.id == id)
    }

    pub fn selected_itinerary(&self) -> Option<&Itinerary> {
        let id = self.selected.as_ref()?;
        self.itineraries().iter().find(|it| &it.id == id)
    }

    pub fn itinerary(&self, id: &ItineraryId) -> Option<&Itinerary> {
        self.itineraries().iter().find(|it| &it.id == id)
    }

    pub fn saved_attractions(&self) -> &SavedAttractions {
        &self.saved_attractions
    }

    pub fn hotel_bundles(&self) -> Option<&[CityHotelBundle]> {
        self.hotel_bundles.as_deref()
    }

    pub fn selected_hotels(&self) -> Option<&SelectedHotels> {
        self.selected_hotels.as_ref()
    }

    pub fn transport_legs(&self) -> Option<&[TransportLeg]> {
        self.transport_legs.as_deref()
    }

    pub fn selected_modes(&self) -> Option<&[String]> {
        self.selected_modes.as_deref()
    }

    // === Mutations ===

    /// Start over from a new trip request, dropping everything downstream
    pub fn start_intake(&mut self, trip: TripRequest) {
        debug!(location = %trip.location, "start_intake: called");
        *self = Self {
            trip: Some(trip),
            ..Self::default()
        };
    }

    /// Record preferences on the current trip request
    pub fn submit_preferences(&mut self, preferences: Vec<String>) -> Result<TripRequest, StoreError> {
        debug!(count = preferences.len(), "submit_preferences: called");
        let trip = self
            .trip
            .as_mut()
            .ok_or_else(|| StoreError::Rejected("no trip request recorded".to_string()))?;
        trip.submit_preferences(preferences).map_err(rejected)?;
        Ok(trip.clone())
    }

    /// Store a freshly generated itinerary set and reset every selection
    ///
    /// `for_trip` is the request the set was generated from; a set for any
    /// other request is stale.
    pub fn set_itineraries(&mut self, for_trip: &TripRequest, itineraries: Vec<Itinerary>) -> Result<(), StoreError> {
        debug!(count = itineraries.len(), location = %for_trip.location, "set_itineraries: called");
        let Some(trip) = self.trip.as_ref().filter(|t| t.has_preferences()) else {
            return Err(StoreError::Rejected("preferences have not been submitted".to_string()));
        };
        if trip != for_trip {
            return Err(StoreError::Stale(format!("itinerary set for {}", for_trip.location)));
        }
        self.itineraries = Some(itineraries);
        self.clear_selection();
        Ok(())
    }

    /// Select an itinerary by position
    ///
    /// Re-selecting the current itinerary keeps downstream state. Selecting a
    /// different one prunes city-keyed state to the new cities and drops
    /// transport.
    pub fn select_itinerary(&mut self, index: usize) -> Result<Itinerary, StoreError> {
        debug!(%index, "select_itinerary: called");
        let itinerary = self
            .itineraries()
            .get(index)
            .cloned()
            .ok_or(StoreError::InvalidIndex {
                index,
                len: self.itineraries().len(),
            })?;

        if self.selected.as_ref() == Some(&itinerary.id) {
            debug!("select_itinerary: same itinerary, keeping downstream state");
            return Ok(itinerary);
        }

        self.selected = Some(itinerary.id.clone());
        self.prune_to_cities(&itinerary.cities);
        self.transport_legs = None;
        self.selected_modes = None;
        Ok(itinerary)
    }

    /// Replace the itinerary with the same id, keeping its position
    ///
    /// Returns true when the replaced itinerary was the selected one, in which
    /// case lodging and transport derived from it are dropped.
    pub fn replace_itinerary(&mut self, replacement: Itinerary) -> Result<bool, StoreError> {
        debug!(id = %replacement.id, "replace_itinerary: called");
        let slot = self
            .itineraries
            .as_mut()
            .and_then(|set| set.iter_mut().find(|it| it.id == replacement.id))
            .ok_or_else(|| StoreError::Stale(format!("itinerary {}", replacement.id)))?;

        let was_selected = self.selected.as_ref() == Some(&replacement.id);
        let cities = replacement.cities.clone();
        *slot = replacement;

        if was_selected {
            debug!("replace_itinerary: selected itinerary replaced, dropping derived state");
            self.saved_attractions.retain_cities(&cities);
            self.hotel_bundles = None;
            self.selected_hotels = None;
            self.transport_legs = None;
            self.selected_modes = None;
        }
        Ok(was_selected)
    }

    /// Upsert an attraction for a city of the selected itinerary
    pub fn save_attraction(&mut self, attraction: Attraction) -> Result<(), StoreError> {
        debug!(name = %attraction.name, city = %attraction.city, "save_attraction: called");
        if attraction.name.trim().is_empty() {
            return Err(StoreError::Rejected("attraction name not provided".to_string()));
        }
        if attraction.city.trim().is_empty() {
            return Err(StoreError::Rejected("city not provided".to_string()));
        }
        let selected = self
            .selected_itinerary()
            .ok_or_else(|| StoreError::Rejected("no itinerary selected".to_string()))?;
        if !selected.contains_city(&attraction.city) {
            return Err(StoreError::Rejected(format!(
                "{} is not part of the selected itinerary",
                attraction.city
            )));
        }
        self.saved_attractions.save(attraction);
        Ok(())
    }

    /// Store discovered hotels, provided `for_itinerary` is still the selection
    ///
    /// The hotel choice and all transport state built on it are dropped.
    pub fn set_hotel_bundles(
        &mut self,
        for_itinerary: &ItineraryId,
        bundles: Vec<CityHotelBundle>,
    ) -> Result<(), StoreError> {
        debug!(%for_itinerary, count = bundles.len(), "set_hotel_bundles: called");
        self.ensure_selected(for_itinerary)?;
        self.hotel_bundles = Some(bundles);
        self.selected_hotels = None;
        self.transport_legs = None;
        self.selected_modes = None;
        Ok(())
    }

    /// Record the chosen hotel per city; cities left out have no hotel
    pub fn select_hotels(&mut self, choices: &BTreeMap<String, usize>) -> Result<SelectedHotels, StoreError> {
        debug!(count = choices.len(), "select_hotels: called");
        let bundles = self
            .hotel_bundles
            .as_ref()
            .ok_or_else(|| StoreError::Rejected("hotels have not been discovered".to_string()))?;

        let mut selected = SelectedHotels::new();
        for (city, &index) in choices {
            let bundle = bundles
                .iter()
                .find(|b| &b.city_name == city)
                .ok_or_else(|| StoreError::Rejected(format!("no hotels discovered for {}", city)))?;
            let hotel = bundle.hotels.get(index).ok_or(StoreError::InvalidIndex {
                index,
                len: bundle.hotels.len(),
            })?;
            selected.insert(city.clone(), hotel.clone());
        }
        self.selected_hotels = Some(selected.clone());
        Ok(selected)
    }

    /// Store loaded transport legs, provided `for_itinerary` is still the selection
    pub fn set_transport_legs(&mut self, for_itinerary: &ItineraryId, legs: Vec<TransportLeg>) -> Result<(), StoreError> {
        debug!(%for_itinerary, count = legs.len(), "set_transport_legs: called");
        self.ensure_selected(for_itinerary)?;
        self.transport_legs = Some(legs);
        self.selected_modes = None;
        Ok(())
    }

    /// Record one mode per consecutive city pair
    pub fn select_transport(&mut self, modes: Vec<String>) -> Result<(), StoreError> {
        debug!(count = modes.len(), "select_transport: called");
        let cities = self
            .selected_itinerary()
            .map(|it| it.cities.len())
            .ok_or_else(|| StoreError::Rejected("no itinerary selected".to_string()))?;
        if self.transport_legs.is_none() {
            return Err(StoreError::Rejected("transport options have not been loaded".to_string()));
        }
        let expected = cities.saturating_sub(1);
        if modes.len() != expected {
            return Err(StoreError::Rejected(format!(
                "expected {} transport modes, got {}",
                expected,
                modes.len()
            )));
        }
        self.selected_modes = Some(modes);
        Ok(())
    }

    fn ensure_selected(&self, id: &ItineraryId) -> Result<(), StoreError> {
        if self.selected.as_ref() == Some(id) && self.selected_itinerary().is_some() {
            Ok(())
        } else {
            Err(StoreError::Stale(format!("itinerary {}", id)))
        }
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.saved_attractions = SavedAttractions::new();
        self.hotel_bundles = None;
        self.selected_hotels = None;
        self.transport_legs = None;
        self.selected_modes = None;
    }

    fn prune_to_cities(&mut self, cities: &[String]) {
        self.saved_attractions.retain_cities(cities);
        if let Some(bundles) = self.hotel_bundles.as_mut() {
            bundles.retain(|b| cities.contains(&b.city_name));
        }
        if let Some(hotels) = self.selected_hotels.as_mut() {
            hotels.retain(|city, _| cities.contains(city));
        }
    }
}

fn rejected(err: PlannerError) -> StoreError {
    match err {
        PlannerError::Validation(msg) => StoreError::Rejected(msg),
        other => StoreError::Rejected(other.to_string()),
    }
}
