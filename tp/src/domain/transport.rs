//! Transport options between consecutive cities

use serde::{Deserialize, Serialize};

use super::{optional_text_or_number, text_or_number};

/// One way to travel a leg
///
/// Numeric fields stay text until aggregation coerces them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportOption {
    pub mode: String,
    /// Hours, as the provider wrote it
    #[serde(default, deserialize_with = "optional_text_or_number")]
    pub time: String,
    /// USD
    #[serde(deserialize_with = "text_or_number")]
    pub cost: String,
    /// kg CO2
    #[serde(deserialize_with = "text_or_number")]
    pub emissions: String,
}

/// Options for travelling from `origin` to `destination`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportLeg {
    pub origin: String,
    pub destination: String,
    pub options: Vec<TransportOption>,
}

impl TransportLeg {
    /// Exact, ordered match; Paris -> Rome is not Rome -> Paris
    pub fn connects(&self, origin: &str, destination: &str) -> bool {
        self.origin == origin && self.destination == destination
    }

    pub fn option(&self, mode: &str) -> Option<&TransportOption> {
        self.options.iter().find(|o| o.mode == mode)
    }

    pub fn modes(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.mode.as_str()).collect()
    }
}
