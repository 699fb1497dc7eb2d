//! tripplanner - multi-stage group trip planning
//!
//! A session walks a traveler through intake, preferences, itinerary
//! selection, hotel selection, and transport selection before producing a
//! trip summary with cost and emissions totals. Every creative step is a
//! prompt to a generative provider whose reply is parsed into typed
//! artifacts.
//!
//! # Modules
//!
//! - [`workflow`] - Stage ordering and the [`TripPlanner`] facade
//! - [`state`] - Per-session state behind an actor
//! - [`llm`] - Provider trait, HTTP clients, retry wrapper
//! - [`prompts`] - Handlebars prompt templates
//! - [`parse`] - Lenient decoding of provider replies
//! - [`hotels`] - Optimal-location inference and lodging lookup
//! - [`summary`] - Cost and emissions aggregation
//! - [`repl`] - Interactive terminal front end
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod hotels;
pub mod llm;
pub mod parse;
pub mod prompts;
pub mod repl;
pub mod state;
pub mod summary;
pub mod workflow;

// Re-export commonly used types
pub use config::{Config, LlmConfig};
pub use domain::{
    Attraction, CityHotelBundle, HotelOption, Itinerary, ItineraryId, SavedAttractions, TransportLeg, TransportOption,
    TripRequest,
};
pub use error::PlannerError;
pub use hotels::{HotelDiscovery, LodgingSource, StubLodgingSource};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, create_client};
pub use prompts::PromptBuilder;
pub use state::{SessionId, SessionState, SessionStore, StoreError};
pub use summary::{AggregateReport, TripSummary, aggregate};
pub use workflow::{ItineraryRegenerator, Stage, StageController, StageDecision, TripPlanner};
