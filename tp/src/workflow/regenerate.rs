//! Itinerary regeneration from free-text suggestions

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{Itinerary, TripRequest};
use crate::error::PlannerError;
use crate::llm::LlmClient;
use crate::parse;
use crate::prompts::PromptBuilder;

/// Produces a replacement for one itinerary of a set
///
/// The regenerator never mutates the set; the caller writes the replacement
/// back by id.
pub struct ItineraryRegenerator {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptBuilder>,
    max_tokens: u32,
}

impl ItineraryRegenerator {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptBuilder>, max_tokens: u32) -> Self {
        Self {
            llm,
            prompts,
            max_tokens,
        }
    }

    /// Regenerate `itineraries[index]` with the user's suggestions
    ///
    /// Invalid input is rejected before the provider is contacted. The
    /// provider is called once; a reply that does not parse is an error. The
    /// replacement carries the original's id.
    pub async fn regenerate(
        &self,
        itineraries: &[Itinerary],
        index: usize,
        suggestions: &str,
        trip: &TripRequest,
    ) -> Result<Itinerary, PlannerError> {
        debug!(%index, count = itineraries.len(), "regenerate: called");
        let original = itineraries.get(index).ok_or(PlannerError::InvalidIndex {
            index,
            len: itineraries.len(),
        })?;
        let suggestions = suggestions.trim();
        if suggestions.is_empty() {
            return Err(PlannerError::EmptySuggestions);
        }

        let prompt = self.prompts.itinerary_regenerate(original, suggestions, trip)?;
        let raw = self.llm.generate(&prompt, self.max_tokens).await?;

        let Some(mut replacement) = parse::parse_itinerary(&raw, trip.duration_days) else {
            warn!(itinerary = %original.name, "Regeneration reply did not parse, keeping original");
            return Err(PlannerError::RegenerationParseError);
        };
        replacement.id = original.id.clone();
        info!(from = %original.name, to = %replacement.name, "Regenerated itinerary");
        Ok(replacement)
    }
}
