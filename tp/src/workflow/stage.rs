//! Workflow stages and their prerequisites

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state::SessionState;

/// Ordered planning stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Intake,
    Preferences,
    ItinerarySelection,
    HotelSelection,
    TransportSelection,
    Summary,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Intake,
        Stage::Preferences,
        Stage::ItinerarySelection,
        Stage::HotelSelection,
        Stage::TransportSelection,
        Stage::Summary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Intake => "intake",
            Stage::Preferences => "preferences",
            Stage::ItinerarySelection => "itinerary-selection",
            Stage::HotelSelection => "hotel-selection",
            Stage::TransportSelection => "transport-selection",
            Stage::Summary => "summary",
        }
    }

    /// The stage after this one, if any
    pub fn next(&self) -> Option<Stage> {
        let pos = Self::ALL.iter().position(|s| s == self)?;
        Self::ALL.get(pos + 1).copied()
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of trying to enter a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "stage", rename_all = "kebab-case")]
pub enum StageDecision {
    Serve,
    Redirect(Stage),
}

/// Fail-closed gatekeeper over stage prerequisites
///
/// Any unmet prerequisite sends the caller back to intake.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageController;

impl StageController {
    pub fn new() -> Self {
        Self
    }

    pub fn enter(&self, stage: Stage, state: &SessionState) -> StageDecision {
        let met = Self::prerequisites_met(stage, state);
        debug!(%stage, %met, "enter: called");
        if met {
            StageDecision::Serve
        } else {
            StageDecision::Redirect(Stage::Intake)
        }
    }

    fn prerequisites_met(stage: Stage, state: &SessionState) -> bool {
        match stage {
            Stage::Intake => true,
            Stage::Preferences => state.trip().is_some(),
            Stage::ItinerarySelection => {
                state.trip().is_some_and(|t| t.has_preferences()) && state.has_itineraries()
            }
            Stage::HotelSelection => state.selected_itinerary().is_some(),
            Stage::TransportSelection => state.selected_itinerary().is_some() && state.selected_hotels().is_some(),
            Stage::Summary => match (state.selected_itinerary(), state.selected_modes()) {
                (Some(itinerary), Some(modes)) => {
                    state.selected_hotels().is_some()
                        && state.transport_legs().is_some()
                        && modes.len() == itinerary.cities.len().saturating_sub(1)
                }
                _ => false,
            },
        }
    }
}
