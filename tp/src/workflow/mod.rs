//! Workflow orchestration
//!
//! Stage ordering, the regeneration protocol, and the TripPlanner facade that
//! ties the session store, prompts, parsers, and provider together.

mod planner;
mod regenerate;
mod stage;

pub use planner::TripPlanner;
pub use regenerate::ItineraryRegenerator;
pub use stage::{Stage, StageController, StageDecision};
