use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Tunables for a single analysis run.
///
/// Stored as a JSON object on disk; every key is optional:
/// ```json
/// {
///   "encoding": "latin1",
///   "price_min": 1,
///   "price_max": 300000,
///   "year_min": 1980,
///   "year_max": 2016,
///   "min_share": 0.01
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// WHATWG label of the source encoding.
    pub encoding: String,
    /// Joins brand and model into `full_name`.
    pub separator: String,
    pub price_min: u64,
    pub price_max: u64,
    pub year_min: i32,
    pub year_max: i32,
    /// Groups at or below this share of the filtered set are left out.
    pub min_share: f64,
    pub histogram_bins: usize,
    /// How many malformed-record reasons to keep in the report.
    pub malformed_sample: usize,
    /// Fail the run on the first malformed record instead of skipping it.
    pub strict: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            encoding: "latin1".to_string(),
            separator: "-".to_string(),
            price_min: 1,
            price_max: 300_000,
            year_min: 1980,
            year_max: 2016,
            min_share: 0.01,
            histogram_bins: 10,
            malformed_sample: 20,
            strict: false,
        }
    }
}

impl AnalysisConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        let config: AnalysisConfig =
            serde_json::from_str(&content).with_context(|| format!("parsing config {path}"))?;
        Ok(config)
    }

    /// Loads `path` if given, falling back to `CAR_LISTINGS_CONFIG`, then defaults.
    pub fn resolve(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => match std::env::var("CAR_LISTINGS_CONFIG") {
                Ok(p) if !p.is_empty() => Self::load(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn price_range(&self) -> RangeInclusive<u64> {
        self.price_min..=self.price_max
    }

    pub fn year_range(&self) -> RangeInclusive<i32> {
        self.year_min..=self.year_max
    }
}
