//! Lodging discovery
//!
//! Infers the best area to stay in each city from the saved attractions, then
//! asks a lodging source for candidates anchored to that area.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::domain::{Attraction, CityHotelBundle, HotelOption, Itinerary, SavedAttractions};
use crate::error::PlannerError;
use crate::llm::LlmClient;
use crate::parse;
use crate::prompts::PromptBuilder;

/// Source of hotel candidates for an area of a city
#[async_trait]
pub trait LodgingSource: Send + Sync {
    async fn list_hotels(&self, city: &str, area: &str) -> Result<Vec<HotelOption>, PlannerError>;
}

/// Fixed three-candidate lodging source used until a real listing service exists
#[derive(Debug, Clone, Copy, Default)]
pub struct StubLodgingSource;

impl StubLodgingSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LodgingSource for StubLodgingSource {
    async fn list_hotels(&self, city: &str, area: &str) -> Result<Vec<HotelOption>, PlannerError> {
        debug!(%city, %area, "list_hotels: called");
        let hotel = |n: u32, number: u32, street: &str, rating: &str, stars: u32, cost: u32| HotelOption {
            name: format!("{} Hotel {}", area, n),
            address: format!("{} {} {}, {}", number, area, street, city),
            rating: rating.to_string(),
            stars,
            cost: format!("${} per night", cost),
        };
        Ok(vec![
            hotel(1, 123, "Street", "4.5/5", 4, 150),
            hotel(2, 456, "Avenue", "4.0/5", 3, 120),
            hotel(3, 789, "Boulevard", "4.7/5", 5, 200),
        ])
    }
}

/// Runs location inference and hotel lookup for every city of an itinerary
pub struct HotelDiscovery {
    llm: Arc<dyn LlmClient>,
    lodging: Arc<dyn LodgingSource>,
    prompts: Arc<PromptBuilder>,
    max_tokens: u32,
}

impl HotelDiscovery {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        lodging: Arc<dyn LodgingSource>,
        prompts: Arc<PromptBuilder>,
        max_tokens: u32,
    ) -> Self {
        Self {
            llm,
            lodging,
            prompts,
            max_tokens,
        }
    }

    /// One bundle per distinct city, in itinerary order
    ///
    /// Cities run concurrently and independently. Only prompt rendering
    /// failures abort the whole discovery.
    pub async fn discover_all(
        &self,
        itinerary: &Itinerary,
        saved: &SavedAttractions,
    ) -> Result<Vec<CityHotelBundle>, PlannerError> {
        debug!(itinerary = %itinerary.name, "discover_all: called");
        let mut cities: Vec<&str> = Vec::new();
        for city in &itinerary.cities {
            if !cities.contains(&city.as_str()) {
                cities.push(city);
            }
        }

        let mut jobs = Vec::with_capacity(cities.len());
        for city in cities {
            let prompt = self.prompts.optimal_location(city, &saved.for_city(city))?;
            jobs.push(self.discover_with_prompt(city, prompt));
        }

        let bundles = join_all(jobs).await;
        info!(count = bundles.len(), "Discovered hotels");
        Ok(bundles)
    }

    /// Hotels for one city given the attractions saved there
    pub async fn discover(&self, city: &str, attractions: &[Attraction]) -> Result<CityHotelBundle, PlannerError> {
        let prompt = self.prompts.optimal_location(city, attractions)?;
        Ok(self.discover_with_prompt(city, prompt).await)
    }

    async fn discover_with_prompt(&self, city: &str, prompt: String) -> CityHotelBundle {
        debug!(%city, "discover_with_prompt: called");
        let area = self.infer_area(city, &prompt).await;
        let hotels = match self.lodging.list_hotels(city, &area).await {
            Ok(hotels) => hotels,
            Err(e) => {
                warn!(%city, %area, error = %e, "Lodging lookup failed");
                Vec::new()
            }
        };
        CityHotelBundle {
            city_name: city.to_string(),
            optimal_location: area,
            hotels,
        }
    }

    /// Best area to stay, falling back to the city itself
    async fn infer_area(&self, city: &str, prompt: &str) -> String {
        match self.llm.generate(prompt, self.max_tokens).await {
            Ok(raw) => parse::parse_optimal_location(&raw).unwrap_or_else(|| {
                warn!(%city, "Empty optimal location, using city name");
                city.to_string()
            }),
            Err(e) => {
                warn!(%city, error = %e, "Optimal location inference failed, using city name");
                city.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::{MockLlmClient, MockReply};

    fn discovery(llm: MockLlmClient) -> HotelDiscovery {
        HotelDiscovery::new(
            Arc::new(llm),
            Arc::new(StubLodgingSource::new()),
            Arc::new(PromptBuilder::embedded_only()),
            256,
        )
    }

    fn attraction(name: &str, city: &str) -> Attraction {
        Attraction {
            name: name.into(),
            description: "d".into(),
            category: "museum".into(),
            city: city.into(),
        }
    }

    #[tokio::test]
    async fn test_stub_returns_three_fixed_candidates() {
        let hotels = StubLodgingSource::new().list_hotels("Paris", "Le Marais").await.unwrap();
        assert_eq!(hotels.len(), 3);
        assert_eq!(hotels[0].name, "Le Marais Hotel 1");
        assert_eq!(hotels[0].address, "123 Le Marais Street, Paris");
        assert_eq!(hotels[1].cost, "$120 per night");
        assert_eq!(hotels[2].rating, "4.7/5");
        assert_eq!(hotels[2].stars, 5);
    }

    #[tokio::test]
    async fn test_discover_uses_inferred_area() {
        let llm = MockLlmClient::texts(["  Le Marais\n"]);
        let bundle = discovery(llm)
            .discover("Paris", &[attraction("Louvre", "Paris")])
            .await
            .unwrap();
        assert_eq!(bundle.optimal_location, "Le Marais");
        assert_eq!(bundle.hotels[0].name, "Le Marais Hotel 1");
    }

    #[tokio::test]
    async fn test_failed_inference_falls_back_to_city() {
        let bundle = discovery(MockLlmClient::new(vec![MockReply::Status(503)]))
            .discover("Rome", &[])
            .await
            .unwrap();
        assert_eq!(bundle.optimal_location, "Rome");
        assert_eq!(bundle.hotels.len(), 3);

        let bundle = discovery(MockLlmClient::texts(["   "])).discover("Rome", &[]).await.unwrap();
        assert_eq!(bundle.optimal_location, "Rome");
    }

    #[tokio::test]
    async fn test_one_city_failure_does_not_block_others() {
        let llm = MockLlmClient::new(vec![])
            .route("city of Paris", MockReply::Text("Saint-Germain".into()))
            .route("city of Rome", MockReply::Status(500))
            .route("city of Venice", MockReply::Text("San Marco".into()));
        let itinerary = Itinerary::new(
            "Grand",
            vec!["Paris".into(), "Rome".into(), "Venice".into(), "Paris".into()],
            vec![2, 2, 2, 1],
            vec![],
        );
        let mut saved = SavedAttractions::new();
        saved.save(attraction("Louvre", "Paris"));

        let d = discovery(llm);
        let bundles = d.discover_all(&itinerary, &saved).await.unwrap();

        let names: Vec<_> = bundles.iter().map(|b| b.city_name.as_str()).collect();
        assert_eq!(names, vec!["Paris", "Rome", "Venice"]);
        assert_eq!(bundles[0].optimal_location, "Saint-Germain");
        assert_eq!(bundles[1].optimal_location, "Rome");
        assert_eq!(bundles[2].optimal_location, "San Marco");
    }
}
