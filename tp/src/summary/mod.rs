//! Cost and emissions aggregation over the chosen travel path

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{Attraction, Itinerary, SavedAttractions, SelectedHotels, TransportLeg};
use crate::error::PlannerError;

static EMBEDDED_NUMBER: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?"));

/// Numeric value of provider text
///
/// Plain numbers parse directly. Otherwise the first number embedded in the
/// text is used, ignoring thousands separators (`"$1,200 per night"` is 1200).
/// Anything else is 0.
pub fn coerce_number(text: &str) -> f64 {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => return value,
        _ => {}
    }
    let cleaned = trimmed.replace(',', "");
    EMBEDDED_NUMBER
        .as_ref()
        .ok()
        .and_then(|re| re.find(&cleaned))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// One matched leg of the chosen path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegDetail {
    pub origin: String,
    pub destination: String,
    pub mode: String,
    pub cost: f64,
    pub emissions: f64,
}

/// A chosen mode with no generated option behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionMismatch {
    pub origin: String,
    pub destination: String,
    pub mode: String,
}

impl From<SelectionMismatch> for PlannerError {
    fn from(m: SelectionMismatch) -> Self {
        PlannerError::SelectionMismatch {
            origin: m.origin,
            destination: m.destination,
            mode: m.mode,
        }
    }
}

/// Transport totals; unmatched legs contribute nothing and are listed in `mismatches`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateReport {
    pub total_cost: f64,
    pub total_emissions: f64,
    pub legs: Vec<LegDetail>,
    pub mismatches: Vec<SelectionMismatch>,
}

/// Sum cost and emissions over the selected mode of each consecutive city pair
///
/// Legs are matched on the exact ordered (origin, destination) pair and
/// options on the exact mode string.
pub fn aggregate(
    cities: &[String],
    selected_modes: &[String],
    transport_legs: &[TransportLeg],
) -> Result<AggregateReport, PlannerError> {
    debug!(cities = cities.len(), modes = selected_modes.len(), "aggregate: called");
    let expected = cities.len().saturating_sub(1);
    if selected_modes.len() != expected {
        return Err(PlannerError::validation(format!(
            "expected {} transport modes for {} cities, got {}",
            expected,
            cities.len(),
            selected_modes.len()
        )));
    }

    let mut report = AggregateReport::default();
    for (pair, mode) in cities.windows(2).zip(selected_modes) {
        let (origin, destination) = (&pair[0], &pair[1]);
        let option = transport_legs
            .iter()
            .find(|leg| leg.connects(origin, destination))
            .and_then(|leg| leg.option(mode));

        match option {
            Some(option) => {
                let cost = coerce_number(&option.cost);
                let emissions = coerce_number(&option.emissions);
                report.total_cost += cost;
                report.total_emissions += emissions;
                report.legs.push(LegDetail {
                    origin: origin.clone(),
                    destination: destination.clone(),
                    mode: mode.clone(),
                    cost,
                    emissions,
                });
            }
            None => {
                warn!(%origin, %destination, %mode, "No transport option matches the selected mode");
                report.mismatches.push(SelectionMismatch {
                    origin: origin.clone(),
                    destination: destination.clone(),
                    mode: mode.clone(),
                });
            }
        }
    }
    Ok(report)
}

/// Lodging cost for one city
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LodgingDetail {
    pub city: String,
    pub hotel: String,
    pub nightly_cost: f64,
    pub nights: u32,
    pub cost: f64,
}

/// Nightly cost times the days planned in each city
pub fn lodging_costs(itinerary: &Itinerary, hotels: &SelectedHotels) -> Vec<LodgingDetail> {
    hotels
        .iter()
        .map(|(city, hotel)| {
            let nightly_cost = coerce_number(&hotel.cost);
            let nights = itinerary.days_in(city);
            LodgingDetail {
                city: city.clone(),
                hotel: hotel.name.clone(),
                nightly_cost,
                nights,
                cost: nightly_cost * f64::from(nights),
            }
        })
        .collect()
}

/// Everything the final stage shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripSummary {
    pub itinerary: Itinerary,
    pub hotels: SelectedHotels,
    pub attractions: SavedAttractions,
    pub transport: AggregateReport,
    pub lodging: Vec<LodgingDetail>,
    pub lodging_cost: f64,
    pub grand_total: f64,
}

impl TripSummary {
    /// Fold the chosen path into a summary
    ///
    /// With `strict` set, any mode without a matching option is an error.
    pub fn build(
        itinerary: &Itinerary,
        hotels: &SelectedHotels,
        attractions: &SavedAttractions,
        selected_modes: &[String],
        transport_legs: &[TransportLeg],
        strict: bool,
    ) -> Result<Self, PlannerError> {
        debug!(itinerary = %itinerary.name, %strict, "TripSummary::build: called");
        let transport = aggregate(&itinerary.cities, selected_modes, transport_legs)?;
        if strict {
            if let Some(mismatch) = transport.mismatches.first() {
                return Err(mismatch.clone().into());
            }
        }

        let lodging = lodging_costs(itinerary, hotels);
        let lodging_cost = lodging.iter().fold(0.0, |acc, l| acc + l.cost);
        Ok(Self {
            itinerary: itinerary.clone(),
            hotels: hotels.clone(),
            attractions: attractions.clone(),
            grand_total: transport.total_cost + lodging_cost,
            transport,
            lodging,
            lodging_cost,
        })
    }

    /// Saved attractions for a city of the itinerary
    pub fn attractions_in(&self, city: &str) -> Vec<Attraction> {
        self.attractions.for_city(city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HotelOption, TransportOption};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn leg(origin: &str, destination: &str, options: &[(&str, &str, &str)]) -> TransportLeg {
        TransportLeg {
            origin: origin.into(),
            destination: destination.into(),
            options: options
                .iter()
                .map(|(mode, cost, emissions)| TransportOption {
                    mode: mode.to_string(),
                    time: String::new(),
                    cost: cost.to_string(),
                    emissions: emissions.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number("200"), 200.0);
        assert_eq!(coerce_number(" 12.5 "), 12.5);
        assert_eq!(coerce_number("$150 per night"), 150.0);
        assert_eq!(coerce_number("1,200 USD"), 1200.0);
        assert_eq!(coerce_number("about 3.5 hours"), 3.5);
        assert_eq!(coerce_number("free"), 0.0);
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("NaN"), 0.0);
    }

    #[test]
    fn test_single_leg_example() {
        let report = aggregate(
            &strings(&["Paris", "Rome"]),
            &strings(&["flight"]),
            &[leg("Paris", "Rome", &[("flight", "200", "180"), ("train", "90", "20")])],
        )
        .unwrap();

        assert_eq!(report.total_cost, 200.0);
        assert_eq!(report.total_emissions, 180.0);
        assert_eq!(report.legs.len(), 1);
        assert!(report.mismatches.is_empty());
    }

    #[test]
    fn test_mode_count_must_match_pairs() {
        let cities = strings(&["Paris", "Rome", "Venice"]);
        assert!(matches!(
            aggregate(&cities, &strings(&["flight"]), &[]),
            Err(PlannerError::Validation(_))
        ));
        assert!(aggregate(&strings(&["Paris"]), &[], &[]).unwrap().legs.is_empty());
    }

    #[test]
    fn test_unmatched_legs_are_reported_not_summed() {
        let cities = strings(&["Paris", "Rome", "Venice"]);
        let legs = [
            leg("Paris", "Rome", &[("train", "90", "20")]),
            leg("Venice", "Rome", &[("train", "50", "10")]),
        ];
        let report = aggregate(&cities, &strings(&["train", "train"]), &legs).unwrap();

        assert_eq!(report.total_cost, 90.0);
        assert_eq!(report.legs.len(), 1);
        assert_eq!(
            report.mismatches,
            vec![SelectionMismatch {
                origin: "Rome".into(),
                destination: "Venice".into(),
                mode: "train".into(),
            }]
        );
    }

    #[test]
    fn test_non_numeric_fields_count_as_zero() {
        let report = aggregate(
            &strings(&["A", "B"]),
            &strings(&["car"]),
            &[leg("A", "B", &[("car", "varies", "n/a")])],
        )
        .unwrap();
        assert_eq!(report.total_cost, 0.0);
        assert_eq!(report.legs.len(), 1);
    }

    fn summary_inputs() -> (Itinerary, SelectedHotels) {
        let itinerary = Itinerary::new("Duo", strings(&["Paris", "Rome"]), vec![3, 2], strings(&["a", "b"]));
        let mut hotels = SelectedHotels::new();
        hotels.insert(
            "Paris".into(),
            HotelOption {
                name: "Marais Hotel 1".into(),
                address: "123 Marais Street, Paris".into(),
                rating: "4.5/5".into(),
                stars: 4,
                cost: "$150 per night".into(),
            },
        );
        (itinerary, hotels)
    }

    #[test]
    fn test_summary_totals_include_lodging() {
        let (itinerary, hotels) = summary_inputs();
        let legs = [leg("Paris", "Rome", &[("flight", "200", "180")])];
        let summary = TripSummary::build(
            &itinerary,
            &hotels,
            &SavedAttractions::new(),
            &strings(&["flight"]),
            &legs,
            false,
        )
        .unwrap();

        assert_eq!(summary.lodging_cost, 450.0);
        assert_eq!(summary.lodging[0].nights, 3);
        assert_eq!(summary.grand_total, 650.0);
    }

    #[test]
    fn test_no_hotels_costs_positive_zero() {
        let (itinerary, _) = summary_inputs();
        let legs = [leg("Paris", "Rome", &[("flight", "200", "180")])];
        let summary = TripSummary::build(
            &itinerary,
            &SelectedHotels::new(),
            &SavedAttractions::new(),
            &strings(&["flight"]),
            &legs,
            false,
        )
        .unwrap();

        assert!(summary.lodging.is_empty());
        assert!(summary.lodging_cost.is_sign_positive());
        assert_eq!(serde_json::to_string(&summary.lodging_cost).unwrap(), "0.0");
        assert_eq!(summary.grand_total, 200.0);
    }

    #[test]
    fn test_strict_summary_rejects_mismatch() {
        let (itinerary, hotels) = summary_inputs();
        let legs = [leg("Paris", "Rome", &[("train", "90", "20")])];
        let modes = strings(&["flight"]);

        let lenient = TripSummary::build(&itinerary, &hotels, &SavedAttractions::new(), &modes, &legs, false);
        assert_eq!(lenient.unwrap().transport.mismatches.len(), 1);

        let strict = TripSummary::build(&itinerary, &hotels, &SavedAttractions::new(), &modes, &legs, true);
        assert!(matches!(strict, Err(PlannerError::SelectionMismatch { ref mode, .. }) if mode == "flight"));
    }
}
