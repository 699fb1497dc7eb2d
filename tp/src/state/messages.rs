//! Session store messages
//!
//! Commands and responses for the actor pattern.

use std::collections::BTreeMap;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{Attraction, CityHotelBundle, Itinerary, ItineraryId, SelectedHotels, TransportLeg, TripRequest};

use super::session::{SessionId, SessionState};

/// Errors from session store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("The {0} changed while the provider was working")]
    Stale(String),

    #[error("Invalid index {index} (have {len})")]
    InvalidIndex { index: usize, len: usize },

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Channel error")]
    ChannelError,
}

/// Response from session store operations
pub type StoreResponse<T> = Result<T, StoreError>;

/// Commands sent to the SessionStore actor
#[derive(Debug)]
pub enum SessionCommand {
    // Lifecycle
    Create {
        reply: oneshot::Sender<StoreResponse<SessionId>>,
    },
    Snapshot {
        id: SessionId,
        reply: oneshot::Sender<StoreResponse<SessionState>>,
    },
    Clear {
        id: SessionId,
        reply: oneshot::Sender<StoreResponse<()>>,
    },
    PurgeExpired {
        reply: oneshot::Sender<StoreResponse<usize>>,
    },

    // Intake and itineraries
    StartIntake {
        id: SessionId,
        trip: TripRequest,
        reply: oneshot::Sender<StoreResponse<()>>,
    },
    SubmitPreferences {
        id: SessionId,
        preferences: Vec<String>,
        reply: oneshot::Sender<StoreResponse<TripRequest>>,
    },
    SetItineraries {
        id: SessionId,
        for_trip: TripRequest,
        itineraries: Vec<Itinerary>,
        reply: oneshot::Sender<StoreResponse<()>>,
    },
    SelectItinerary {
        id: SessionId,
        index: usize,
        reply: oneshot::Sender<StoreResponse<Itinerary>>,
    },
    ReplaceItinerary {
        id: SessionId,
        itinerary: Itinerary,
        reply: oneshot::Sender<StoreResponse<bool>>,
    },

    // Attractions and lodging
    SaveAttraction {
        id: SessionId,
        attraction: Attraction,
        reply: oneshot::Sender<StoreResponse<()>>,
    },
    SetHotelBundles {
        id: SessionId,
        for_itinerary: ItineraryId,
        bundles: Vec<CityHotelBundle>,
        reply: oneshot::Sender<StoreResponse<()>>,
    },
    SelectHotels {
        id: SessionId,
        choices: BTreeMap<String, usize>,
        reply: oneshot::Sender<StoreResponse<SelectedHotels>>,
    },

    // Transport
    SetTransportLegs {
        id: SessionId,
        for_itinerary: ItineraryId,
        legs: Vec<TransportLeg>,
        reply: oneshot::Sender<StoreResponse<()>>,
    },
    SelectTransport {
        id: SessionId,
        modes: Vec<String>,
        reply: oneshot::Sender<StoreResponse<()>>,
    },

    // Shutdown
    Shutdown,
}
