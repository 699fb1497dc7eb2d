//! Trip constraints collected at intake

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PlannerError;

/// Destination, party, and length of the trip, plus the group's preferences
///
/// Preferences stay `None` until they are submitted; after that the request is
/// immutable for the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequest {
    pub location: String,
    pub party_size: u32,
    pub duration_days: u32,
    pub preferences: Option<BTreeSet<String>>,
}

impl TripRequest {
    /// Validate intake fields
    pub fn new(location: &str, party_size: u32, duration_days: u32) -> Result<Self, PlannerError> {
        debug!(%location, %party_size, %duration_days, "TripRequest::new: called");
        let location = location.trim();
        if location.is_empty() {
            return Err(PlannerError::validation("location must not be empty"));
        }
        if party_size == 0 {
            return Err(PlannerError::validation("party size must be at least 1"));
        }
        if duration_days == 0 {
            return Err(PlannerError::validation("duration must be at least 1 day"));
        }
        Ok(Self {
            location: location.to_string(),
            party_size,
            duration_days,
            preferences: None,
        })
    }

    /// Validate intake fields as they arrive from a form
    ///
    /// Non-numeric or non-positive counts are rejected, never coerced.
    pub fn from_form(location: &str, party_size: &str, duration_days: &str) -> Result<Self, PlannerError> {
        let party_size = parse_positive("party size", party_size)?;
        let duration_days = parse_positive("duration", duration_days)?;
        Self::new(location, party_size, duration_days)
    }

    /// Record preferences; a request accepts them once
    pub fn submit_preferences<I, S>(&mut self, preferences: I) -> Result<(), PlannerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.preferences.is_some() {
            return Err(PlannerError::validation(
                "preferences were already submitted; start a new intake to change them",
            ));
        }
        let set: BTreeSet<String> = preferences
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        debug!(count = set.len(), "submit_preferences: recorded");
        self.preferences = Some(set);
        Ok(())
    }

    pub fn has_preferences(&self) -> bool {
        self.preferences.is_some()
    }

    /// Preferences joined for prompt text ("none" when the set is empty)
    pub fn preference_list(&self) -> String {
        match &self.preferences {
            Some(set) if !set.is_empty() => set.iter().cloned().collect::<Vec<_>>().join(", "),
            _ => "none in particular".to_string(),
        }
    }
}

fn parse_positive(field: &str, raw: &str) -> Result<u32, PlannerError> {
    let value: u32 = raw
        .trim()
        .parse()
        .map_err(|_| PlannerError::validation(format!("{} must be a positive whole number, got '{}'", field, raw)))?;
    if value == 0 {
        return Err(PlannerError::validation(format!("{} must be at least 1", field)));
    }
    Ok(value)
}
