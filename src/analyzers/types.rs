//! Data types produced by the aggregation pipeline.

use crate::normalize::Rejected;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Mean price and mileage for one brand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandAggregate {
    pub brand: String,
    pub count: usize,
    pub share: f64,
    pub mean_price: i64,
    pub mean_mileage: i64,
}

/// Mean price and mileage for one brand/model combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelAggregate {
    pub full_name: String,
    pub count: usize,
    pub share: f64,
    pub mean_price: i64,
    pub mean_mileage: i64,
}

/// Which listings form the price baseline a damaged group is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Baseline {
    /// Every listing of the brand/model, damaged ones included.
    AllListings,
    /// Only listings explicitly marked as not damaged.
    UndamagedOnly,
}

/// Price of damaged listings relative to the baseline for one brand/model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageDelta {
    pub full_name: String,
    pub avg_price_broken: i64,
    pub avg_price_not_broken: i64,
    pub delta_pct: f64,
    pub broken_count: usize,
    pub baseline_count: usize,
}

/// `describe`-style summary of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

/// One row of a value-count table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share<K> {
    pub value: K,
    pub count: usize,
    pub share: f64,
}

/// Equal-width histogram bin; `upper` is exclusive except for the last bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Record counts through each pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageCounts {
    pub loaded: usize,
    pub malformed: usize,
    pub out_of_range: usize,
    pub retained: usize,
    /// Retained listings lacking a brand or model, so no `full_name`.
    pub missing_full_name: usize,
    /// Of those, how many were marked damaged and could not enter the damage table.
    pub damaged_missing_full_name: usize,
}

/// Column summaries and share tables over the retained listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Description {
    pub distinct_brands: usize,
    pub price: Option<Summary>,
    pub odometer_km: Option<Summary>,
    pub registration_year: Option<Summary>,
    pub registration_year_histogram: Vec<HistogramBin>,
    pub registration_year_shares: Vec<Share<i32>>,
    pub date_crawled_shares: Vec<Share<String>>,
    pub ad_created_shares: Vec<Share<String>>,
    pub last_seen_shares: Vec<Share<String>>,
}

/// Complete result of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub counts: StageCounts,
    pub malformed_sample: Vec<Rejected>,
    #[serde(flatten)]
    pub description: Description,
    pub brands: BTreeMap<String, BrandAggregate>,
    pub common_models: BTreeMap<String, ModelAggregate>,
    pub damage_deltas: BTreeMap<String, DamageDelta>,
    pub damage_outliers: BTreeMap<String, DamageDelta>,
    pub corrected_damage_deltas: BTreeMap<String, DamageDelta>,
}
