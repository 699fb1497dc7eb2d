//! Integration tests for tripplanner
//!
//! These drive whole planning sessions through the public TripPlanner API with
//! a scripted provider standing in for the network.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use tripplanner::config::Config;
use tripplanner::domain::Attraction;
use tripplanner::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use tripplanner::{PlannerError, Stage, StageDecision, StubLodgingSource, TripPlanner};

const ITINERARIES: &str = r#"```json
[
    {"name": "Classic", "cities": ["Paris", "Rome"], "days": [3, 2], "notes": ["Louvre and Marais", "Forum"]},
    {"name": "Lowlands", "cities": ["Paris", "Amsterdam"], "days": [2, 3], "notes": ["Montmartre", "Canals"]},
    {"name": "South", "cities": ["Nice", "Rome"], "days": [2, 3], "notes": ["Beach", "Vatican"]}
]
```"#;

const PARIS_ATTRACTIONS: &str = r#"[
    {"name": "Louvre", "description": "Art museum", "category": "museum"},
    {"name": "Luxembourg Gardens", "description": "Park", "category": "park"}
]"#;

const PARIS_ROME: &str = r#"[
    {"mode": "flight", "time": 2, "cost": 200, "emissions": 180},
    {"mode": "train", "time": "11", "cost": "150", "emissions": "20"}
]"#;

/// Provider double: routed replies by prompt substring, then a fallback queue
struct ScriptedProvider {
    routes: Vec<(&'static str, Option<&'static str>)>,
    queue: Mutex<Vec<&'static str>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(routes: Vec<(&'static str, Option<&'static str>)>, queue: Vec<&'static str>) -> Self {
        Self {
            routes,
            queue: Mutex::new(queue),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt: String = request.messages.iter().map(|m| m.content.as_str()).collect();
        if let Some((_, reply)) = self.routes.iter().find(|(needle, _)| prompt.contains(needle)) {
            return match reply {
                Some(text) => Ok(CompletionResponse::text(*text)),
                None => Err(LlmError::ApiError {
                    status: 503,
                    message: "unavailable".to_string(),
                }),
            };
        }
        let mut queue = self.queue.lock().unwrap();
        if queue.is_empty() {
            return Err(LlmError::InvalidResponse("script exhausted".to_string()));
        }
        Ok(CompletionResponse::text(queue.remove(0)))
    }
}

fn standard_routes() -> Vec<(&'static str, Option<&'static str>)> {
    vec![
        ("three distinctly different", Some(ITINERARIES)),
        ("For the city of Paris", Some(PARIS_ATTRACTIONS)),
        ("In the city of Paris", Some("Saint-Germain\nclose to the Louvre")),
        ("In the city of Rome", Some("Centro Storico")),
        ("between Paris and Rome", Some(PARIS_ROME)),
    ]
}

fn planner(provider: ScriptedProvider) -> (TripPlanner, Arc<ScriptedProvider>) {
    let provider = Arc::new(provider);
    let planner = TripPlanner::new(&Config::default(), provider.clone(), Arc::new(StubLodgingSource::new()));
    (planner, provider)
}

// =============================================================================
// Full session
// =============================================================================

#[tokio::test]
async fn test_full_session_to_summary() {
    let (planner, _) = planner(ScriptedProvider::new(standard_routes(), vec![]));
    let id = planner.start_session().await.unwrap();

    planner.intake_form(&id, "Europe", "4", "5").await.unwrap();
    let itineraries = planner
        .submit_preferences(&id, vec!["art".into(), "food".into()])
        .await
        .unwrap();
    assert_eq!(itineraries.len(), 3);

    let selected = planner.select_itinerary(&id, 0).await.unwrap();
    assert_eq!(selected.cities, vec!["Paris", "Rome"]);

    let attractions = planner.list_attractions(&id, "Paris", None).await.unwrap();
    assert_eq!(attractions.len(), 2);
    planner.save_attraction(&id, attractions[0].clone()).await.unwrap();

    let bundles = planner.discover_hotels(&id).await.unwrap();
    assert_eq!(bundles.len(), 2);
    assert_eq!(bundles[0].city_name, "Paris");
    assert_eq!(bundles[0].optimal_location, "Saint-Germain");
    assert_eq!(bundles[1].optimal_location, "Centro Storico");
    assert_eq!(bundles[0].hotels.len(), 3);

    let mut choices = BTreeMap::new();
    choices.insert("Paris".to_string(), 1);
    let hotels = planner.select_hotels(&id, choices).await.unwrap();
    assert_eq!(hotels["Paris"].name, "Saint-Germain Hotel 2");

    let legs = planner.load_transport_options(&id).await.unwrap();
    assert_eq!(legs.len(), 1);
    assert_eq!(legs[0].modes(), vec!["flight", "train"]);

    planner.select_transport(&id, vec!["flight".into()]).await.unwrap();

    let summary = planner.summary(&id).await.unwrap();
    assert_eq!(summary.transport.total_cost, 200.0);
    assert_eq!(summary.transport.total_emissions, 180.0);
    assert!(summary.transport.mismatches.is_empty());
    // $120 per night for three nights in Paris
    assert_eq!(summary.lodging_cost, 360.0);
    assert_eq!(summary.grand_total, 560.0);
    assert_eq!(summary.attractions_in("Paris")[0].name, "Louvre");
}

// =============================================================================
// Edge behavior
// =============================================================================

#[tokio::test]
async fn test_unparseable_set_until_retry() {
    let (planner, provider) = planner(ScriptedProvider::new(vec![], vec!["Sorry, I cannot help.", ITINERARIES]));
    let id = planner.start_session().await.unwrap();
    planner.intake(&id, "Europe", 2, 5).await.unwrap();

    let itineraries = planner.submit_preferences(&id, vec!["art".into()]).await.unwrap();
    assert!(itineraries.is_empty());
    assert!(matches!(
        planner.select_itinerary(&id, 0).await,
        Err(PlannerError::InvalidIndex { index: 0, len: 0 })
    ));

    let itineraries = planner.generate_itineraries(&id).await.unwrap();
    assert_eq!(itineraries.len(), 3);
    assert_eq!(provider.calls(), 2);
    assert_eq!(planner.select_itinerary(&id, 2).await.unwrap().name, "South");
}

#[tokio::test]
async fn test_saving_same_attraction_twice() {
    let (planner, _) = planner(ScriptedProvider::new(standard_routes(), vec![]));
    let id = planner.start_session().await.unwrap();
    planner.intake(&id, "Europe", 2, 5).await.unwrap();
    planner.submit_preferences(&id, vec!["art".into()]).await.unwrap();
    planner.select_itinerary(&id, 0).await.unwrap();

    let louvre = Attraction {
        name: "Louvre".into(),
        description: "Art museum".into(),
        category: "museum".into(),
        city: "Paris".into(),
    };
    planner.save_attraction(&id, louvre.clone()).await.unwrap();
    planner.save_attraction(&id, louvre).await.unwrap();

    let saved = planner.saved_attractions(&id).await.unwrap();
    assert_eq!(saved.count_for("Paris"), 1);
}

#[tokio::test]
async fn test_hotels_without_selection_redirect() {
    let (planner, provider) = planner(ScriptedProvider::new(standard_routes(), vec![]));
    let id = planner.start_session().await.unwrap();
    planner.intake(&id, "Europe", 2, 5).await.unwrap();
    planner.submit_preferences(&id, vec!["art".into()]).await.unwrap();

    assert_eq!(
        planner.enter_stage(&id, Stage::HotelSelection).await.unwrap(),
        StageDecision::Redirect(Stage::Intake)
    );
    let err = planner.discover_hotels(&id).await.unwrap_err();
    assert_eq!(err.redirect(), Some(Stage::Intake));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_rediscovering_hotels_requires_new_choices() {
    let (planner, _) = planner(ScriptedProvider::new(standard_routes(), vec![]));
    let id = planner.start_session().await.unwrap();
    planner.intake(&id, "Europe", 2, 5).await.unwrap();
    planner.submit_preferences(&id, vec!["art".into()]).await.unwrap();
    planner.select_itinerary(&id, 0).await.unwrap();
    planner.discover_hotels(&id).await.unwrap();
    planner
        .select_hotels(&id, BTreeMap::from([("Paris".to_string(), 0)]))
        .await
        .unwrap();
    planner.load_transport_options(&id).await.unwrap();
    planner.select_transport(&id, vec!["flight".into()]).await.unwrap();
    assert_eq!(planner.summary(&id).await.unwrap().lodging_cost, 450.0);

    planner.discover_hotels(&id).await.unwrap();
    assert_eq!(
        planner.enter_stage(&id, Stage::Summary).await.unwrap(),
        StageDecision::Redirect(Stage::Intake)
    );
    let err = planner.summary(&id).await.unwrap_err();
    assert!(matches!(err, PlannerError::PrerequisiteMissing { stage: Stage::Summary, .. }));
}

#[tokio::test]
async fn test_provider_outage_keeps_other_cities() {
    let mut routes = standard_routes();
    routes.insert(0, ("In the city of Rome", None));
    let (planner, _) = planner(ScriptedProvider::new(routes, vec![]));
    let id = planner.start_session().await.unwrap();
    planner.intake(&id, "Europe", 2, 5).await.unwrap();
    planner.submit_preferences(&id, vec!["art".into()]).await.unwrap();
    planner.select_itinerary(&id, 0).await.unwrap();

    let bundles = planner.discover_hotels(&id).await.unwrap();
    assert_eq!(bundles[0].optimal_location, "Saint-Germain");
    assert_eq!(bundles[1].optimal_location, "Rome");
}

#[tokio::test]
async fn test_concurrent_sessions_are_isolated() {
    let (planner, _) = planner(ScriptedProvider::new(standard_routes(), vec![]));
    let planner = Arc::new(planner);

    let mut handles = Vec::new();
    for n in 0..4u32 {
        let planner = planner.clone();
        handles.push(tokio::spawn(async move {
            let id = planner.start_session().await.unwrap();
            planner.intake(&id, "Europe", n + 1, 5).await.unwrap();
            planner.submit_preferences(&id, vec!["art".into()]).await.unwrap();
            planner.select_itinerary(&id, (n % 3) as usize).await.unwrap();
            (id, n)
        }));
    }

    for handle in handles {
        let (id, n) = handle.await.unwrap();
        let state = planner.session(&id).await.unwrap();
        assert_eq!(state.trip().unwrap().party_size, n + 1);
        assert_eq!(state.selected_index(), Some((n % 3) as usize));
    }
}
