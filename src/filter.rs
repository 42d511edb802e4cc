//! Plausibility filter over price and registration year.

use crate::config::AnalysisConfig;
use crate::listing::Listing;
use std::ops::RangeInclusive;
use tracing::debug;

/// Closed admissible ranges; listings outside either are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlausibilityBounds {
    pub price: RangeInclusive<u64>,
    pub registration_year: RangeInclusive<i32>,
}

impl Default for PlausibilityBounds {
    fn default() -> Self {
        Self {
            price: 1..=300_000,
            registration_year: 1980..=2016,
        }
    }
}

impl From<&AnalysisConfig> for PlausibilityBounds {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            price: config.price_range(),
            registration_year: config.year_range(),
        }
    }
}

impl PlausibilityBounds {
    pub fn admits(&self, listing: &Listing) -> bool {
        self.price.contains(&listing.price)
            && self.registration_year.contains(&listing.registration_year)
    }

    /// Returns the admissible listings as a new set, leaving `listings` untouched,
    /// along with how many were dropped.
    pub fn apply(&self, listings: &[Listing]) -> (Vec<Listing>, usize) {
        let retained: Vec<Listing> = listings
            .iter()
            .filter(|l| self.admits(l))
            .cloned()
            .collect();
        let dropped = listings.len() - retained.len();
        debug!(retained = retained.len(), dropped, "Plausibility filter applied");
        (retained, dropped)
    }
}
