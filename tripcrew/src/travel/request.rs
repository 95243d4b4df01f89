//! The four trip fields a run is planned from.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Input key for the departure location.
pub const ORIGIN: &str = "origin";
/// Input key for the candidate destination cities.
pub const CITIES: &str = "cities";
/// Input key for the travel date range.
pub const TRAVEL_DATES: &str = "travel_dates";
/// Input key for the traveler's interests.
pub const INTERESTS: &str = "interests";

/// What the traveler asked for. Free text, not validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripRequest {
    /// Where the traveler departs from.
    pub origin: String,
    /// Cities the traveler is choosing between.
    pub cities: String,
    /// When the traveler is going.
    pub travel_dates: String,
    /// Hobbies and interests of the traveler.
    pub interests: String,
}

impl TripRequest {
    /// Create a request from its four fields.
    #[must_use]
    pub fn new(
        origin: impl Into<String>,
        cities: impl Into<String>,
        travel_dates: impl Into<String>,
        interests: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            cities: cities.into(),
            travel_dates: travel_dates.into(),
            interests: interests.into(),
        }
    }

    /// The kickoff inputs filling the task templates.
    #[must_use]
    pub fn to_inputs(&self) -> HashMap<String, String> {
        HashMap::from([
            (ORIGIN.to_owned(), self.origin.trim().to_owned()),
            (CITIES.to_owned(), self.cities.trim().to_owned()),
            (TRAVEL_DATES.to_owned(), self.travel_dates.trim().to_owned()),
            (INTERESTS.to_owned(), self.interests.trim().to_owned()),
        ])
    }

    /// Names of the fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            (ORIGIN, &self.origin),
            (CITIES, &self.cities),
            (TRAVEL_DATES, &self.travel_dates),
            (INTERESTS, &self.interests),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Fill blank fields from `defaults`.
    #[must_use]
    pub fn with_defaults(mut self, defaults: &Self) -> Self {
        for (field, default) in [
            (&mut self.origin, &defaults.origin),
            (&mut self.cities, &defaults.cities),
            (&mut self.travel_dates, &defaults.travel_dates),
            (&mut self.interests, &defaults.interests),
        ] {
            if field.trim().is_empty() {
                field.clone_from(default);
            }
        }
        self
    }
}

impl fmt::Display for TripRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "from {} to one of [{}] on {} (interests: {})",
            self.origin, self.cities, self.travel_dates, self.interests
        )
    }
}
