//! SessionStore - actor that owns every live planning session
//!
//! Processes commands via channels so each read-modify-write on a session is
//! atomic with respect to every other request.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::domain::{Attraction, CityHotelBundle, Itinerary, ItineraryId, SelectedHotels, TransportLeg, TripRequest};

use super::messages::{SessionCommand, StoreError, StoreResponse};
use super::session::{SessionId, SessionState};

struct SessionEntry {
    state: SessionState,
    last_touched: DateTime<Utc>,
}

/// Live sessions with idle expiry
struct Sessions {
    entries: HashMap<SessionId, SessionEntry>,
    ttl: TimeDelta,
}

impl Sessions {
    fn new(ttl: TimeDelta) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    fn create(&mut self) -> SessionId {
        let id = SessionId::generate();
        self.entries.insert(
            id.clone(),
            SessionEntry {
                state: SessionState::new(),
                last_touched: Utc::now(),
            },
        );
        id
    }

    /// Fetch a live session and refresh its idle timer; expired ones are dropped
    fn touch(&mut self, id: &SessionId) -> StoreResponse<&mut SessionState> {
        let now = Utc::now();
        let expired = match self.entries.get(id) {
            Some(entry) => now - entry.last_touched > self.ttl,
            None => return Err(StoreError::NotFound(id.to_string())),
        };
        if expired {
            debug!(%id, "touch: session expired");
            self.entries.remove(id);
            return Err(StoreError::NotFound(id.to_string()));
        }
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        entry.last_touched = now;
        Ok(&mut entry.state)
    }

    fn with<T>(&mut self, id: &SessionId, f: impl FnOnce(&mut SessionState) -> StoreResponse<T>) -> StoreResponse<T> {
        f(self.touch(id)?)
    }

    fn remove(&mut self, id: &SessionId) -> StoreResponse<()> {
        self.touch(id)?;
        self.entries.remove(id);
        Ok(())
    }

    fn purge_expired(&mut self) -> usize {
        let now = Utc::now();
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| now - entry.last_touched <= ttl);
        before - self.entries.len()
    }
}

/// Handle to send commands to the SessionStore
#[derive(Clone)]
pub struct SessionStore {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionStore {
    /// Spawn a new SessionStore actor
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: &SessionConfig) -> Self {
        debug!(ttl_secs = config.ttl_secs, channel_capacity = config.channel_capacity, "spawn: called");
        let ttl = i64::try_from(config.ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));

        tokio::spawn(actor_loop(Sessions::new(ttl), rx));

        info!("SessionStore spawned");
        Self { tx }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<StoreResponse<T>>) -> SessionCommand,
    ) -> StoreResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send(build(reply_tx)).await.map_err(|_| StoreError::ChannelError)?;
        reply_rx.await.map_err(|_| StoreError::ChannelError)?
    }

    // === Lifecycle ===

    /// Allocate an empty session
    pub async fn create(&self) -> StoreResponse<SessionId> {
        debug!("create: called");
        self.request(|reply| SessionCommand::Create { reply }).await
    }

    /// Copy of the session's current state
    pub async fn snapshot(&self, id: &SessionId) -> StoreResponse<SessionState> {
        debug!(%id, "snapshot: called");
        let id = id.clone();
        self.request(|reply| SessionCommand::Snapshot { id, reply }).await
    }

    /// Drop a session
    pub async fn clear(&self, id: &SessionId) -> StoreResponse<()> {
        debug!(%id, "clear: called");
        let id = id.clone();
        self.request(|reply| SessionCommand::Clear { id, reply }).await
    }

    /// Remove idle sessions, returning how many were dropped
    pub async fn purge_expired(&self) -> StoreResponse<usize> {
        debug!("purge_expired: called");
        self.request(|reply| SessionCommand::PurgeExpired { reply }).await
    }

    // === Intake and itineraries ===

    pub async fn start_intake(&self, id: &SessionId, trip: TripRequest) -> StoreResponse<()> {
        debug!(%id, location = %trip.location, "start_intake: called");
        let id = id.clone();
        self.request(|reply| SessionCommand::StartIntake { id, trip, reply })
            .await
    }

    pub async fn submit_preferences(&self, id: &SessionId, preferences: Vec<String>) -> StoreResponse<TripRequest> {
        debug!(%id, count = preferences.len(), "submit_preferences: called");
        let id = id.clone();
        self.request(|reply| SessionCommand::SubmitPreferences { id, preferences, reply })
            .await
    }

    pub async fn set_itineraries(
        &self,
        id: &SessionId,
        for_trip: TripRequest,
        itineraries: Vec<Itinerary>,
    ) -> StoreResponse<()> {
        debug!(%id, count = itineraries.len(), "set_itineraries: called");
        let id = id.clone();
        self.request(|reply| SessionCommand::SetItineraries {
            id,
            for_trip,
            itineraries,
            reply,
        })
        .await
    }

    pub async fn select_itinerary(&self, id: &SessionId, index: usize) -> StoreResponse<Itinerary> {
        debug!(%id, %index, "select_itinerary: called");
        let id = id.clone();
        self.request(|reply| SessionCommand::SelectItinerary { id, index, reply })
            .await
    }

    /// Swap in a regenerated itinerary by id; true if it was the selected one
    pub async fn replace_itinerary(&self, id: &SessionId, itinerary: Itinerary) -> StoreResponse<bool> {
        debug!(%id, itinerary_id = %itinerary.id, "replace_itinerary: called");
        let id = id.clone();
        self.request(|reply| SessionCommand::ReplaceItinerary { id, itinerary, reply })
            .await
    }

    // === Attractions and lodging ===

    pub async fn save_attraction(&self, id: &SessionId, attraction: Attraction) -> StoreResponse<()> {
        debug!(%id, name = %attraction.name, "save_attraction: called");
        let id = id.clone();
        self.request(|reply| SessionCommand::SaveAttraction { id, attraction, reply })
            .await
    }

    pub async fn set_hotel_bundles(
        &self,
        id: &SessionId,
        for_itinerary: ItineraryId,
        bundles: Vec<CityHotelBundle>,
    ) -> StoreResponse<()> {
        debug!(%id, %for_itinerary, count = bundles.len(), "set_hotel_bundles: called");
        let id = id.clone();
        self.request(|reply| SessionCommand::SetHotelBundles {
            id,
            for_itinerary,
            bundles,
            reply,
        })
        .await
    }

    pub async fn select_hotels(
        &self,
        id: &SessionId,
        choices: BTreeMap<String, usize>,
    ) -> StoreResponse<SelectedHotels> {
        debug!(%id, count = choices.len(), "select_hotels: called");
        let id = id.clone();
        self.request(|reply| SessionCommand::SelectHotels { id, choices, reply })
            .await
    }

    // === Transport ===

    pub async fn set_transport_legs(
        &self,
        id: &SessionId,
        for_itinerary: ItineraryId,
        legs: Vec<TransportLeg>,
    ) -> StoreResponse<()> {
        debug!(%id, %for_itinerary, count = legs.len(), "set_transport_legs: called");
        let id = id.clone();
        self.request(|reply| SessionCommand::SetTransportLegs {
            id,
            for_itinerary,
            legs,
            reply,
        })
        .await
    }

    pub async fn select_transport(&self, id: &SessionId, modes: Vec<String>) -> StoreResponse<()> {
        debug!(%id, count = modes.len(), "select_transport: called");
        let id = id.clone();
        self.request(|reply| SessionCommand::SelectTransport { id, modes, reply })
            .await
    }

    /// Shutdown the SessionStore
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        debug!("shutdown: called");
        self.tx
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| StoreError::ChannelError)
    }
}

/// The actor loop that owns the sessions and processes commands
async fn actor_loop(mut sessions: Sessions, mut rx: mpsc::Receiver<SessionCommand>) {
    debug!("SessionStore actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            SessionCommand::Create { reply } => {
                let id = sessions.create();
                debug!(%id, "actor_loop: Create command");
                let _ = reply.send(Ok(id));
            }

            SessionCommand::Snapshot { id, reply } => {
                debug!(%id, "actor_loop: Snapshot command");
                let _ = reply.send(sessions.with(&id, |state| Ok(state.clone())));
            }

            SessionCommand::Clear { id, reply } => {
                debug!(%id, "actor_loop: Clear command");
                let _ = reply.send(sessions.remove(&id));
            }

            SessionCommand::PurgeExpired { reply } => {
                let purged = sessions.purge_expired();
                debug!(%purged, "actor_loop: PurgeExpired command");
                let _ = reply.send(Ok(purged));
            }

            SessionCommand::StartIntake { id, trip, reply } => {
                debug!(%id, "actor_loop: StartIntake command");
                let _ = reply.send(sessions.with(&id, |state| {
                    state.start_intake(trip);
                    Ok(())
                }));
            }

            SessionCommand::SubmitPreferences { id, preferences, reply } => {
                debug!(%id, "actor_loop: SubmitPreferences command");
                let _ = reply.send(sessions.with(&id, |state| state.submit_preferences(preferences)));
            }

            SessionCommand::SetItineraries {
                id,
                for_trip,
                itineraries,
                reply,
            } => {
                debug!(%id, "actor_loop: SetItineraries command");
                let _ = reply.send(sessions.with(&id, |state| state.set_itineraries(&for_trip, itineraries)));
            }

            SessionCommand::SelectItinerary { id, index, reply } => {
                debug!(%id, %index, "actor_loop: SelectItinerary command");
                let _ = reply.send(sessions.with(&id, |state| state.select_itinerary(index)));
            }

            SessionCommand::ReplaceItinerary { id, itinerary, reply } => {
                debug!(%id, "actor_loop: ReplaceItinerary command");
                let _ = reply.send(sessions.with(&id, |state| state.replace_itinerary(itinerary)));
            }

            SessionCommand::SaveAttraction { id, attraction, reply } => {
                debug!(%id, "actor_loop: SaveAttraction command");
                let _ = reply.send(sessions.with(&id, |state| state.save_attraction(attraction)));
            }

            SessionCommand::SetHotelBundles {
                id,
                for_itinerary,
                bundles,
                reply,
            } => {
                debug!(%id, "actor_loop: SetHotelBundles command");
                let _ = reply.send(sessions.with(&id, |state| state.set_hotel_bundles(&for_itinerary, bundles)));
            }

            SessionCommand::SelectHotels { id, choices, reply } => {
                debug!(%id, "actor_loop: SelectHotels command");
                let _ = reply.send(sessions.with(&id, |state| state.select_hotels(&choices)));
            }

            SessionCommand::SetTransportLegs {
                id,
                for_itinerary,
                legs,
                reply,
            } => {
                debug!(%id, "actor_loop: SetTransportLegs command");
                let _ = reply.send(sessions.with(&id, |state| state.set_transport_legs(&for_itinerary, legs)));
            }

            SessionCommand::SelectTransport { id, modes, reply } => {
                debug!(%id, "actor_loop: SelectTransport command");
                let _ = reply.send(sessions.with(&id, |state| state.select_transport(modes)));
            }

            SessionCommand::Shutdown => {
                info!("SessionStore shutting down");
                break;
            }
        }
    }

    debug!("SessionStore actor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(ttl_secs: u64) -> SessionConfig {
        SessionConfig {
            ttl_secs,
            channel_capacity: 8,
        }
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = SessionStore::spawn(&config(3600));

        let id = store.create().await.unwrap();
        let state = store.snapshot(&id).await.unwrap();
        assert!(state.trip().is_none());

        store
            .start_intake(&id, TripRequest::new("Italy", 2, 7).unwrap())
            .await
            .unwrap();
        let state = store.snapshot(&id).await.unwrap();
        assert_eq!(state.trip().unwrap().location, "Italy");

        store.clear(&id).await.unwrap();
        assert!(matches!(store.snapshot(&id).await, Err(StoreError::NotFound(_))));

        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = SessionStore::spawn(&config(3600));
        let result = store.snapshot(&SessionId::from("nope")).await;
        assert!(matches!(result, Err(StoreError::NotFound(ref id)) if id == "nope"));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::spawn(&config(3600));
        let a = store.create().await.unwrap();
        let b = store.create().await.unwrap();
        assert_ne!(a, b);

        store
            .start_intake(&a, TripRequest::new("Peru", 1, 4).unwrap())
            .await
            .unwrap();
        assert!(store.snapshot(&b).await.unwrap().trip().is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_gone() {
        let store = SessionStore::spawn(&config(0));
        let a = store.create().await.unwrap();
        let _b = store.create().await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(matches!(store.snapshot(&a).await, Err(StoreError::NotFound(_))));
        assert_eq!(store.purge_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_saves_are_all_applied() {
        let store = SessionStore::spawn(&config(3600));
        let id = store.create().await.unwrap();
        store
            .start_intake(&id, TripRequest::new("France", 2, 3).unwrap())
            .await
            .unwrap();
        let trip = store.submit_preferences(&id, vec!["art".into()]).await.unwrap();
        store
            .set_itineraries(
                &id,
                trip,
                vec![Itinerary::new("Paris", vec!["Paris".into()], vec![3], vec!["x".into()])],
            )
            .await
            .unwrap();
        store.select_itinerary(&id, 0).await.unwrap();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let store = store.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    store
                        .save_attraction(
                            &id,
                            Attraction {
                                name: format!("Spot {}", i),
                                description: "d".into(),
                                category: "park".into(),
                                city: "Paris".into(),
                            },
                        )
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let state = store.snapshot(&id).await.unwrap();
        assert_eq!(state.saved_attractions().count_for("Paris"), 10);
    }

    #[tokio::test]
    async fn test_after_shutdown_channel_error() {
        let store = SessionStore::spawn(&config(3600));
        store.shutdown().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(store.create().await, Err(StoreError::ChannelError)));
    }
}
