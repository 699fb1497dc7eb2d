//! Prompt Builder
//!
//! Renders provider prompts from override files or embedded defaults.

use std::path::PathBuf;

use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::config::PromptsConfig;
use crate::domain::{Attraction, Itinerary, TripRequest};
use crate::error::PlannerError;

#[derive(Debug, Serialize)]
struct TripContext<'a> {
    location: &'a str,
    party_size: u32,
    duration_days: u32,
    preferences: String,
}

impl<'a> TripContext<'a> {
    fn new(trip: &'a TripRequest) -> Self {
        Self {
            location: &trip.location,
            party_size: trip.party_size,
            duration_days: trip.duration_days,
            preferences: trip.preference_list(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RegenerateContext<'a> {
    #[serde(flatten)]
    trip: TripContext<'a>,
    original: String,
    suggestions: &'a str,
}

#[derive(Debug, Serialize)]
struct AttractionsContext<'a> {
    city: &'a str,
    preferences: String,
    user_request: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct LocationContext<'a> {
    city: &'a str,
    attractions: String,
}

#[derive(Debug, Serialize)]
struct TransportContext<'a> {
    origin: &'a str,
    destination: &'a str,
}

/// The itinerary as the provider sees it, without the internal id
#[derive(Debug, Serialize)]
struct ProviderItinerary<'a> {
    name: &'a str,
    cities: &'a [String],
    days: &'a [u32],
    notes: &'a [String],
}

/// Deterministic prompt text for every provider interaction
pub struct PromptBuilder {
    hbs: Handlebars<'static>,
    /// Directory holding `<template>.hbs` overrides
    override_dir: Option<PathBuf>,
}

impl PromptBuilder {
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        hbs.register_escape_fn(handlebars::no_escape);
        Self { hbs, override_dir }
    }

    /// Create a builder that only uses embedded templates
    pub fn embedded_only() -> Self {
        Self::new(None)
    }

    pub fn from_config(config: &PromptsConfig) -> Self {
        Self::new(config.expanded_dir())
    }

    /// Load a template by name
    ///
    /// Checks `<override_dir>/<name>.hbs` first, then the embedded default.
    fn load_template(&self, name: &str) -> Result<String, PlannerError> {
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.hbs", name));
            if path.exists() {
                debug!(path = %path.display(), "load_template: using override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| PlannerError::Prompt(format!("failed to read {}: {}", path.display(), e)));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| PlannerError::Prompt(format!("template not found: {}", name)))
    }

    fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String, PlannerError> {
        let template = self.load_template(name)?;
        info!(template = %name, "Rendering prompt");
        self.hbs
            .render_template(&template, context)
            .map(|text| text.trim().to_string())
            .map_err(|e| PlannerError::Prompt(format!("failed to render {}: {}", name, e)))
    }

    /// Three itineraries for the trip
    pub fn itinerary_set(&self, trip: &TripRequest) -> Result<String, PlannerError> {
        debug!(location = %trip.location, "itinerary_set: called");
        self.render(embedded::ITINERARY_SET, &TripContext::new(trip))
    }

    /// One itinerary revised by the user's suggestions
    pub fn itinerary_regenerate(
        &self,
        original: &Itinerary,
        suggestions: &str,
        trip: &TripRequest,
    ) -> Result<String, PlannerError> {
        debug!(itinerary = %original.name, "itinerary_regenerate: called");
        let view = ProviderItinerary {
            name: &original.name,
            cities: &original.cities,
            days: &original.days_per_city,
            notes: &original.notes,
        };
        let original = serde_json::to_string_pretty(&view)
            .map_err(|e| PlannerError::Prompt(format!("failed to encode itinerary: {}", e)))?;
        self.render(
            embedded::ITINERARY_REGENERATE,
            &RegenerateContext {
                trip: TripContext::new(trip),
                original,
                suggestions,
            },
        )
    }

    /// Attractions in a city, optionally steered by a free-text request
    pub fn attractions(
        &self,
        city: &str,
        trip: &TripRequest,
        user_request: Option<&str>,
    ) -> Result<String, PlannerError> {
        debug!(%city, ?user_request, "attractions: called");
        let user_request = user_request.map(str::trim).filter(|r| !r.is_empty());
        self.render(
            embedded::ATTRACTIONS,
            &AttractionsContext {
                city,
                preferences: trip.preference_list(),
                user_request,
            },
        )
    }

    /// Best area to stay in a city given the saved attractions
    pub fn optimal_location(&self, city: &str, attractions: &[Attraction]) -> Result<String, PlannerError> {
        debug!(%city, count = attractions.len(), "optimal_location: called");
        let names = if attractions.is_empty() {
            "none saved".to_string()
        } else {
            attractions.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ")
        };
        self.render(
            embedded::OPTIMAL_LOCATION,
            &LocationContext {
                city,
                attractions: names,
            },
        )
    }

    /// Transport options for one ordered leg
    pub fn transport_options(&self, origin: &str, destination: &str) -> Result<String, PlannerError> {
        debug!(%origin, %destination, "transport_options: called");
        self.render(embedded::TRANSPORT_OPTIONS, &TransportContext { origin, destination })
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::embedded_only()
    }
}
