//! Embedded prompt templates
//!
//! These are compiled into the binary and used when no override file is found.

pub const ITINERARY_SET: &str = "itinerary-set";
pub const ITINERARY_REGENERATE: &str = "itinerary-regenerate";
pub const ATTRACTIONS: &str = "attractions";
pub const OPTIMAL_LOCATION: &str = "optimal-location";
pub const TRANSPORT_OPTIONS: &str = "transport-options";

/// Every template name the builder knows
pub const TEMPLATE_NAMES: [&str; 5] = [
    ITINERARY_SET,
    ITINERARY_REGENERATE,
    ATTRACTIONS,
    OPTIMAL_LOCATION,
    TRANSPORT_OPTIONS,
];

/// Three candidate itineraries for the whole trip
const ITINERARY_SET_TEMPLATE: &str = r#"Generate three distinctly different travel itineraries for a group of {{party_size}} travelling to {{location}} for {{duration_days}} days.
The group has the following preferences: {{preferences}}.

Each itinerary must include:
- The itinerary name.
- The cities to visit, in travel order.
- The number of days to spend in each city. The days must add up to exactly {{duration_days}}.
- For each city, a short paragraph of what to do and places to see.

Provide ONLY the itineraries in JSON format as a list of objects with keys: "name", "cities", "days", and "notes".
"cities" is a list of strings, "days" is a list of integers with one entry per city, and "notes" is a list of strings with one entry per city.
Do not include any additional text or explanation.
"#;

/// One itinerary revised from user suggestions
const ITINERARY_REGENERATE_TEMPLATE: &str = r#"Based on the following original itinerary and the user's suggestions, generate a new itinerary.

Original itinerary:
{{original}}

User's suggestions:
{{suggestions}}

Generate an updated itinerary that incorporates the user's suggestions. It must remain coherent and suitable for a group of {{party_size}} travelling to {{location}} for {{duration_days}} days with preferences: {{preferences}}.
The days must add up to exactly {{duration_days}}.

Provide ONLY the updated itinerary as a single JSON object with keys: "name", "cities", "days", and "notes".
Do not include any additional text, explanation, or code fences.
"#;

/// Attractions for one city
const ATTRACTIONS_TEMPLATE: &str = r#"For the city of {{city}}, list popular attractions that align with the following preferences: {{preferences}}.
{{#if user_request}}
User's specific request: {{user_request}}
{{/if}}
Provide the attractions as a list of objects, each having:
- "name": name of the attraction.
- "description": a brief description.
- "category": the category or type of attraction (e.g. museum, park, restaurant).

Provide ONLY the attractions in JSON format as a list of objects with keys: "name", "description", and "category". Do not include any additional text or explanation.
"#;

/// Best area to stay given the saved attractions
const OPTIMAL_LOCATION_TEMPLATE: &str = r#"In the city of {{city}}, given the following attractions: {{attractions}},
determine the optimal location (e.g. neighborhood or area) that is most centrally located to these attractions.
Provide only the name of the location.
"#;

/// Ways to travel one leg
const TRANSPORT_OPTIONS_TEMPLATE: &str = r#"Provide possible transportation modes between {{origin}} and {{destination}}, such as "flight", "car", "train".
For each mode, estimate:
- Time in hours
- Cost in USD
- Carbon emissions in kg CO2

Provide ONLY the transportation options in JSON format as a list of objects with keys: "mode", "time", "cost", and "emissions". Do not include any additional text or explanation.
"#;

/// Get an embedded template by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    match name {
        ITINERARY_SET => Some(ITINERARY_SET_TEMPLATE),
        ITINERARY_REGENERATE => Some(ITINERARY_REGENERATE_TEMPLATE),
        ATTRACTIONS => Some(ATTRACTIONS_TEMPLATE),
        OPTIMAL_LOCATION => Some(OPTIMAL_LOCATION_TEMPLATE),
        TRANSPORT_OPTIONS => Some(TRANSPORT_OPTIONS_TEMPLATE),
        _ => None,
    }
}
