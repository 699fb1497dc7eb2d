//! Provider reply parsing
//!
//! Every raw provider reply passes through here before anything else sees it.
//! Parsers never fail: malformed output degrades to the canonical empty value
//! (an empty list, or `None` for single objects) and is logged with the raw
//! text.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{Attraction, Itinerary, TransportOption};

/// What a reply was expected to contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    ItinerarySet,
    Itinerary,
    Attractions,
    OptimalLocation,
    TransportOptions,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ArtifactKind::ItinerarySet => "itinerary-set",
            ArtifactKind::Itinerary => "itinerary",
            ArtifactKind::Attractions => "attractions",
            ArtifactKind::OptimalLocation => "optimal-location",
            ArtifactKind::TransportOptions => "transport-options",
        };
        write!(f, "{}", name)
    }
}

/// Remove one Markdown code fence wrapping the whole reply
///
/// ```` ```json\n[...]\n``` ```` becomes `[...]`. Text that is not entirely
/// fenced is returned trimmed and otherwise untouched.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```").and_then(|s| s.strip_suffix("```")) else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line
    match inner.split_once('\n') {
        Some((info, body)) if is_info_string(info) => body.trim(),
        _ => inner.trim(),
    }
}

fn is_info_string(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn decode_value(kind: ArtifactKind, raw: &str) -> Option<Value> {
    match serde_json::from_str(strip_code_fence(raw)) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(%kind, error = %e, raw = %raw, "Failed to parse provider reply");
            None
        }
    }
}

/// Decode a JSON list, keeping each element that has the right shape
fn parse_list<T: DeserializeOwned>(kind: ArtifactKind, raw: &str) -> Vec<T> {
    let Some(value) = decode_value(kind, raw) else {
        return Vec::new();
    };
    let Value::Array(items) = value else {
        warn!(%kind, raw = %raw, "Provider reply is not a list");
        return Vec::new();
    };

    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(%kind, %index, error = %e, raw = %raw, "Dropping malformed list element");
                None
            }
        })
        .collect();
    debug!(%kind, total, kept = parsed.len(), "parse_list: done");
    parsed
}

/// Itinerary as the provider writes it
///
/// Any other field, a provider-chosen `id` included, is ignored.
#[derive(Debug, Deserialize)]
struct WireItinerary {
    name: String,
    cities: Vec<String>,
    days: Vec<u32>,
    notes: Vec<String>,
}

/// Build the stored itinerary with a fresh id and warn when it breaks the trip contract
fn accept_itinerary(wire: WireItinerary, duration_days: u32) -> Itinerary {
    let itinerary = Itinerary::new(wire.name, wire.cities, wire.days, wire.notes);
    let conformance = itinerary.conformance(duration_days);
    if !conformance.is_conformant() {
        warn!(
            name = %itinerary.name,
            aligned = conformance.aligned,
            total_days = conformance.total_days,
            duration_days,
            "Itinerary does not match the requested trip"
        );
    }
    itinerary
}

/// Parse a generated itinerary set; each itinerary gets a fresh id
pub fn parse_itinerary_set(raw: &str, duration_days: u32) -> Vec<Itinerary> {
    parse_list::<WireItinerary>(ArtifactKind::ItinerarySet, raw)
        .into_iter()
        .map(|itinerary| accept_itinerary(itinerary, duration_days))
        .collect()
}

/// Parse a single regenerated itinerary
pub fn parse_itinerary(raw: &str, duration_days: u32) -> Option<Itinerary> {
    let kind = ArtifactKind::Itinerary;
    let value = decode_value(kind, raw)?;
    match serde_json::from_value::<WireItinerary>(value) {
        Ok(itinerary) => Some(accept_itinerary(itinerary, duration_days)),
        Err(e) => {
            warn!(%kind, error = %e, raw = %raw, "Provider reply has the wrong shape");
            None
        }
    }
}

/// Parse attractions and attach the city they were requested for
pub fn parse_attractions(raw: &str, city: &str) -> Vec<Attraction> {
    parse_list::<Attraction>(ArtifactKind::Attractions, raw)
        .into_iter()
        .map(|mut attraction| {
            attraction.city = city.to_string();
            attraction
        })
        .collect()
}

/// First non-empty line of the reply, trimmed
pub fn parse_optimal_location(raw: &str) -> Option<String> {
    let location = strip_code_fence(raw)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string);
    if location.is_none() {
        warn!(kind = %ArtifactKind::OptimalLocation, raw = %raw, "Provider returned no location");
    }
    location
}

pub fn parse_transport_options(raw: &str) -> Vec<TransportOption> {
    parse_list(ArtifactKind::TransportOptions, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TWO_ITINERARIES: &str = r#"[
        {"name": "Coast", "cities": ["Lisbon", "Porto"], "days": [3, 2], "notes": ["Alfama", "Ribeira"]},
        {"name": "Inland", "cities": ["Evora"], "days": [5], "notes": ["Temple"]}
    ]"#;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("  ```\n{}\n```  "), "{}");
        assert_eq!(strip_code_fence("[1]"), "[1]");
        assert_eq!(strip_code_fence("Here you go: ```json\n[]\n```"), "Here you go: ```json\n[]\n```");
    }

    #[test]
    fn test_itinerary_set_preserves_alignment() {
        let set = parse_itinerary_set(TWO_ITINERARIES, 5);
        assert_eq!(set.len(), 2);
        assert_eq!(set[0].cities, vec!["Lisbon", "Porto"]);
        assert_eq!(set[0].days_per_city, vec![3, 2]);
        assert_eq!(set[0].notes, vec!["Alfama", "Ribeira"]);
        assert_ne!(set[0].id, set[1].id);
    }

    #[test]
    fn test_fenced_reply_parses() {
        let fenced = format!("```json\n{}\n```", TWO_ITINERARIES);
        assert_eq!(parse_itinerary_set(&fenced, 5).len(), 2);
    }

    #[test]
    fn test_malformed_replies_yield_empty() {
        assert!(parse_itinerary_set("Sure! Here are three itineraries:", 5).is_empty());
        assert!(parse_itinerary_set(&TWO_ITINERARIES[..40], 5).is_empty());
        assert!(parse_itinerary_set(r#"{"name": "Coast"}"#, 5).is_empty());
        assert!(parse_itinerary_set(r#"[{"title": "x", "stops": []}]"#, 5).is_empty());
        assert!(parse_transport_options("").is_empty());
    }

    #[test]
    fn test_wrong_shape_elements_are_dropped() {
        let raw = r#"[
            {"name": "Good", "cities": ["Rome"], "days": [2], "notes": ["x"]},
            {"name": "Bad", "cities": "Rome"},
            42
        ]"#;
        let set = parse_itinerary_set(raw, 2);
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].name, "Good");
    }

    #[test]
    fn test_nonconformant_itinerary_is_kept() {
        let raw = r#"[{"name": "Long", "cities": ["A", "B"], "days": [9], "notes": []}]"#;
        let set = parse_itinerary_set(raw, 3);
        assert_eq!(set.len(), 1);
        assert!(!set[0].conformance(3).is_conformant());
    }

    #[test]
    fn test_provider_ids_are_ignored() {
        let raw = r#"[
            {"id": "same", "name": "A", "cities": ["X"], "days": [1], "notes": ["n"]},
            {"id": "same", "name": "B", "cities": ["Y"], "days": [1], "notes": ["n"]}
        ]"#;
        let set = parse_itinerary_set(raw, 1);
        assert_ne!(set[0].id.as_str(), "same");
        assert_ne!(set[0].id, set[1].id);
    }

    #[test]
    fn test_numeric_provider_ids_do_not_drop_itineraries() {
        let raw = r#"[
            {"id": 1, "name": "A", "cities": ["X"], "days": [1], "notes": ["n"]},
            {"id": 2, "name": "B", "cities": ["Y"], "days": [1], "notes": ["n"]}
        ]"#;
        let set = parse_itinerary_set(raw, 1);
        assert_eq!(set.len(), 2);
        assert_eq!(set[1].name, "B");

        let single = r#"{"id": 7, "name": "Solo", "cities": ["Oslo"], "days": [1], "notes": ["fjords"]}"#;
        assert_eq!(parse_itinerary(single, 1).unwrap().name, "Solo");
    }

    #[test]
    fn test_single_itinerary() {
        let raw = r#"{"name": "Solo", "cities": ["Oslo"], "days": [2], "notes": ["fjords"]}"#;
        assert_eq!(parse_itinerary(raw, 2).unwrap().name, "Solo");
        assert!(parse_itinerary("[]", 2).is_none());
        assert!(parse_itinerary("not json", 2).is_none());
    }

    #[test]
    fn test_attractions_get_city() {
        let raw = r#"[{"name": "Louvre", "description": "Art", "category": "museum"}]"#;
        let attractions = parse_attractions(raw, "Paris");
        assert_eq!(attractions.len(), 1);
        assert_eq!(attractions[0].city, "Paris");
    }

    #[test]
    fn test_transport_numbers_become_text() {
        let raw = r#"[{"mode": "flight", "time": 2, "cost": 200, "emissions": "180"}]"#;
        let options = parse_transport_options(raw);
        assert_eq!(options[0].cost, "200");
        assert_eq!(options[0].emissions, "180");
        assert_eq!(options[0].time, "2");
    }

    #[test]
    fn test_optimal_location() {
        assert_eq!(parse_optimal_location("  Le Marais \n"), Some("Le Marais".to_string()));
        assert_eq!(parse_optimal_location("\n\nTrastevere\nbecause..."), Some("Trastevere".to_string()));
        assert_eq!(parse_optimal_location("   \n "), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            failure_persistence: None,
            .. ProptestConfig::default()
        })]
        #[test]
        fn prop_parsers_never_panic(raw in ".*") {
            let _ = parse_itinerary_set(&raw, 3);
            let _ = parse_itinerary(&raw, 3);
            let _ = parse_attractions(&raw, "X");
            let _ = parse_optimal_location(&raw);
            let _ = parse_transport_options(&raw);
        }

        #[test]
        fn prop_well_formed_itinerary_keeps_alignment(
            stops in proptest::collection::vec(("[A-Z][a-z]{1,10}", 1u32..10, "[a-z ]{0,20}"), 0..6)
        ) {
            let cities: Vec<String> = stops.iter().map(|s| s.0.clone()).collect();
            let days: Vec<u32> = stops.iter().map(|s| s.1).collect();
            let notes: Vec<String> = stops.iter().map(|s| s.2.clone()).collect();
            let raw = serde_json::json!([{"name": "Gen", "cities": cities, "days": days, "notes": notes}]).to_string();

            let set = parse_itinerary_set(&raw, days.iter().sum());
            prop_assert_eq!(set.len(), 1);
            prop_assert_eq!(&set[0].cities, &cities);
            prop_assert_eq!(&set[0].days_per_city, &days);
            prop_assert_eq!(&set[0].notes, &notes);
        }
    }
}
