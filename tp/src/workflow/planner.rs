//! TripPlanner - one async method per workflow operation
//!
//! Reads go through a snapshot, provider calls happen outside the session
//! store, and every write-back is a single store command.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::regenerate::ItineraryRegenerator;
use super::stage::{Stage, StageController, StageDecision};
use crate::config::Config;
use crate::domain::{
    Attraction, CityHotelBundle, Itinerary, SavedAttractions, SelectedHotels, TransportLeg, TripRequest,
};
use crate::error::PlannerError;
use crate::hotels::{HotelDiscovery, LodgingSource};
use crate::llm::LlmClient;
use crate::parse;
use crate::prompts::PromptBuilder;
use crate::state::{SessionId, SessionState, SessionStore};
use crate::summary::TripSummary;

/// Orchestrates the planning workflow for many independent sessions
pub struct TripPlanner {
    store: SessionStore,
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptBuilder>,
    controller: StageController,
    regenerator: ItineraryRegenerator,
    hotels: HotelDiscovery,
    max_tokens: u32,
    strict_selection: bool,
}

impl TripPlanner {
    /// Build a planner and spawn its session store
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: &Config, llm: Arc<dyn LlmClient>, lodging: Arc<dyn LodgingSource>) -> Self {
        debug!(provider = %config.llm.provider, "TripPlanner::new: called");
        let prompts = Arc::new(PromptBuilder::from_config(&config.prompts));
        let max_tokens = config.llm.max_tokens;
        Self {
            store: SessionStore::spawn(&config.session),
            regenerator: ItineraryRegenerator::new(llm.clone(), prompts.clone(), max_tokens),
            hotels: HotelDiscovery::new(llm.clone(), lodging, prompts.clone(), max_tokens),
            llm,
            prompts,
            controller: StageController::new(),
            max_tokens,
            strict_selection: config.summary.strict_selection,
        }
    }

    /// Snapshot the session and check it may enter `stage`
    async fn require(&self, id: &SessionId, stage: Stage) -> Result<SessionState, PlannerError> {
        let state = self.store.snapshot(id).await?;
        match self.controller.enter(stage, &state) {
            StageDecision::Serve => Ok(state),
            StageDecision::Redirect(redirect) => {
                debug!(%id, %stage, %redirect, "require: prerequisites missing");
                Err(PlannerError::PrerequisiteMissing { stage, redirect })
            }
        }
    }

    // === Session lifecycle ===

    pub async fn start_session(&self) -> Result<SessionId, PlannerError> {
        let id = self.store.create().await?;
        info!(%id, "Started planning session");
        Ok(id)
    }

    /// Current state of a session, for display
    pub async fn session(&self, id: &SessionId) -> Result<SessionState, PlannerError> {
        Ok(self.store.snapshot(id).await?)
    }

    pub async fn enter_stage(&self, id: &SessionId, stage: Stage) -> Result<StageDecision, PlannerError> {
        let state = self.store.snapshot(id).await?;
        Ok(self.controller.enter(stage, &state))
    }

    pub async fn clear_session(&self, id: &SessionId) -> Result<(), PlannerError> {
        self.store.clear(id).await?;
        info!(%id, "Cleared planning session");
        Ok(())
    }

    /// Drop idle sessions, returning how many were removed
    pub async fn purge_expired(&self) -> Result<usize, PlannerError> {
        Ok(self.store.purge_expired().await?)
    }

    // === Intake and preferences ===

    /// Validate and record the trip constraints, resetting everything downstream
    pub async fn intake(
        &self,
        id: &SessionId,
        location: &str,
        party_size: u32,
        duration_days: u32,
    ) -> Result<TripRequest, PlannerError> {
        let trip = TripRequest::new(location, party_size, duration_days)?;
        self.record_intake(id, trip).await
    }

    /// Same as [`TripPlanner::intake`] for fields still in their form text
    pub async fn intake_form(
        &self,
        id: &SessionId,
        location: &str,
        party_size: &str,
        duration_days: &str,
    ) -> Result<TripRequest, PlannerError> {
        let trip = TripRequest::from_form(location, party_size, duration_days)?;
        self.record_intake(id, trip).await
    }

    async fn record_intake(&self, id: &SessionId, trip: TripRequest) -> Result<TripRequest, PlannerError> {
        self.store.start_intake(id, trip.clone()).await?;
        info!(%id, location = %trip.location, party_size = trip.party_size, duration_days = trip.duration_days, "Recorded trip request");
        Ok(trip)
    }

    /// Record preferences and generate the itinerary set
    ///
    /// Preferences are kept even when generation fails; generation can then be
    /// retried with [`TripPlanner::generate_itineraries`].
    pub async fn submit_preferences(
        &self,
        id: &SessionId,
        preferences: Vec<String>,
    ) -> Result<Vec<Itinerary>, PlannerError> {
        self.require(id, Stage::Preferences).await?;
        let trip = self.store.submit_preferences(id, preferences).await?;
        self.generate_for(id, &trip).await
    }

    /// Generate a fresh itinerary set, dropping every selection
    pub async fn generate_itineraries(&self, id: &SessionId) -> Result<Vec<Itinerary>, PlannerError> {
        let state = self.require(id, Stage::Preferences).await?;
        let trip = state
            .trip()
            .filter(|t| t.has_preferences())
            .ok_or_else(|| PlannerError::validation("preferences have not been submitted"))?;
        self.generate_for(id, trip).await
    }

    async fn generate_for(&self, id: &SessionId, trip: &TripRequest) -> Result<Vec<Itinerary>, PlannerError> {
        debug!(%id, "generate_for: called");
        let prompt = self.prompts.itinerary_set(trip)?;
        let raw = self.llm.generate(&prompt, self.max_tokens).await?;
        let itineraries = parse::parse_itinerary_set(&raw, trip.duration_days);
        if itineraries.is_empty() {
            warn!(%id, "No itineraries could be parsed from the provider reply");
        }
        self.store.set_itineraries(id, trip.clone(), itineraries.clone()).await?;
        info!(%id, count = itineraries.len(), "Generated itineraries");
        Ok(itineraries)
    }

    // === Itinerary selection ===

    pub async fn itineraries(&self, id: &SessionId) -> Result<Vec<Itinerary>, PlannerError> {
        let state = self.require(id, Stage::ItinerarySelection).await?;
        Ok(state.itineraries().to_vec())
    }

    pub async fn select_itinerary(&self, id: &SessionId, index: usize) -> Result<Itinerary, PlannerError> {
        self.require(id, Stage::ItinerarySelection).await?;
        let itinerary = self.store.select_itinerary(id, index).await?;
        info!(%id, %index, name = %itinerary.name, "Selected itinerary");
        Ok(itinerary)
    }

    /// Replace one itinerary using the user's suggestions
    ///
    /// On any failure the set is left untouched. If the set changed while the
    /// provider was working, the result is discarded with `StaleArtifact`.
    pub async fn regenerate_itinerary(
        &self,
        id: &SessionId,
        index: usize,
        suggestions: &str,
    ) -> Result<Itinerary, PlannerError> {
        let state = self.require(id, Stage::ItinerarySelection).await?;
        let trip = state
            .trip()
            .ok_or_else(|| PlannerError::validation("no trip request recorded"))?;
        let replacement = self
            .regenerator
            .regenerate(state.itineraries(), index, suggestions, trip)
            .await?;
        let was_selected = self.store.replace_itinerary(id, replacement.clone()).await?;
        info!(%id, %index, %was_selected, "Replaced itinerary");
        Ok(replacement)
    }

    /// Attractions in a city, optionally steered by a free-text request
    pub async fn list_attractions(
        &self,
        id: &SessionId,
        city: &str,
        user_prompt: Option<&str>,
    ) -> Result<Vec<Attraction>, PlannerError> {
        let state = self.require(id, Stage::ItinerarySelection).await?;
        let city = city.trim();
        if city.is_empty() {
            return Err(PlannerError::validation("city not provided"));
        }
        let trip = state
            .trip()
            .ok_or_else(|| PlannerError::validation("no trip request recorded"))?;
        let prompt = self.prompts.attractions(city, trip, user_prompt)?;
        let raw = self.llm.generate(&prompt, self.max_tokens).await?;
        let attractions = parse::parse_attractions(&raw, city);
        debug!(%id, %city, count = attractions.len(), "list_attractions: parsed");
        Ok(attractions)
    }

    // === Attractions and hotels ===

    pub async fn save_attraction(&self, id: &SessionId, attraction: Attraction) -> Result<(), PlannerError> {
        self.require(id, Stage::HotelSelection).await?;
        let (name, city) = (attraction.name.clone(), attraction.city.clone());
        self.store.save_attraction(id, attraction).await?;
        info!(%id, %name, %city, "Saved attraction");
        Ok(())
    }

    pub async fn saved_attractions(&self, id: &SessionId) -> Result<SavedAttractions, PlannerError> {
        Ok(self.store.snapshot(id).await?.saved_attractions().clone())
    }

    /// Infer an area and list hotels for every city of the selected itinerary
    pub async fn discover_hotels(&self, id: &SessionId) -> Result<Vec<CityHotelBundle>, PlannerError> {
        let state = self.require(id, Stage::HotelSelection).await?;
        let itinerary = state
            .selected_itinerary()
            .ok_or_else(|| PlannerError::validation("no itinerary selected"))?;
        let bundles = self
            .hotels
            .discover_all(itinerary, state.saved_attractions())
            .await?;
        self.store
            .set_hotel_bundles(id, itinerary.id.clone(), bundles.clone())
            .await?;
        Ok(bundles)
    }

    /// Choose a hotel per city by its position in that city's bundle
    pub async fn select_hotels(
        &self,
        id: &SessionId,
        choices: BTreeMap<String, usize>,
    ) -> Result<SelectedHotels, PlannerError> {
        self.require(id, Stage::HotelSelection).await?;
        let selected = self.store.select_hotels(id, choices).await?;
        info!(%id, count = selected.len(), "Selected hotels");
        Ok(selected)
    }

    // === Transport ===

    /// Ask for transport options on every consecutive city pair
    ///
    /// A leg whose provider call fails gets an empty option list.
    pub async fn load_transport_options(&self, id: &SessionId) -> Result<Vec<TransportLeg>, PlannerError> {
        let state = self.require(id, Stage::TransportSelection).await?;
        let itinerary = state
            .selected_itinerary()
            .ok_or_else(|| PlannerError::validation("no itinerary selected"))?;

        let mut jobs = Vec::new();
        for (origin, destination) in itinerary.legs() {
            let prompt = self.prompts.transport_options(origin, destination)?;
            jobs.push(self.load_leg(origin, destination, prompt));
        }
        let legs = join_all(jobs).await;

        self.store
            .set_transport_legs(id, itinerary.id.clone(), legs.clone())
            .await?;
        info!(%id, count = legs.len(), "Loaded transport options");
        Ok(legs)
    }

    async fn load_leg(&self, origin: &str, destination: &str, prompt: String) -> TransportLeg {
        let options = match self.llm.generate(&prompt, self.max_tokens).await {
            Ok(raw) => parse::parse_transport_options(&raw),
            Err(e) => {
                warn!(%origin, %destination, error = %e, "Transport options unavailable for leg");
                Vec::new()
            }
        };
        TransportLeg {
            origin: origin.to_string(),
            destination: destination.to_string(),
            options,
        }
    }

    /// Record one mode per consecutive city pair
    pub async fn select_transport(&self, id: &SessionId, modes: Vec<String>) -> Result<(), PlannerError> {
        self.require(id, Stage::TransportSelection).await?;
        self.store.select_transport(id, modes).await?;
        info!(%id, "Selected transport");
        Ok(())
    }

    // === Summary ===

    pub async fn summary(&self, id: &SessionId) -> Result<TripSummary, PlannerError> {
        let state = self.require(id, Stage::Summary).await?;
        let itinerary = state
            .selected_itinerary()
            .ok_or_else(|| PlannerError::validation("no itinerary selected"))?;
        let empty_hotels = SelectedHotels::new();
        let summary = TripSummary::build(
            itinerary,
            state.selected_hotels().unwrap_or(&empty_hotels),
            state.saved_attractions(),
            state.selected_modes().unwrap_or_default(),
            state.transport_legs().unwrap_or_default(),
            self.strict_selection,
        )?;
        info!(
            %id,
            total_cost = summary.transport.total_cost,
            total_emissions = summary.transport.total_emissions,
            grand_total = summary.grand_total,
            "Built trip summary"
        );
        Ok(summary)
    }
}
