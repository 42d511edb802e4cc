use crate::analyzers::aggregate::{brand_aggregates, model_aggregates};
use crate::analyzers::damage::{damage_deltas, outliers};
use crate::analyzers::types::{Baseline, Report, StageCounts};
use crate::config::AnalysisConfig;
use crate::filter::PlausibilityBounds;
use crate::listing::Listing;
use crate::normalize::{Normalized, Rejected, normalize, normalize_strict};
use crate::parser::parse_bytes;
use crate::stats::describe_listings;
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Listings that survived loading, normalization and the plausibility filter.
#[derive(Debug)]
pub struct Prepared {
    pub listings: Vec<Listing>,
    pub rejected: Vec<Rejected>,
    pub counts: StageCounts,
}

/// Runs the load, normalize, filter and aggregate stages with one config.
pub struct Pipeline {
    config: AnalysisConfig,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Parses, normalizes and filters raw table bytes.
    #[tracing::instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn prepare(&self, bytes: &[u8]) -> Result<Prepared> {
        let rows = parse_bytes(bytes, &self.config.encoding).context("loading listing table")?;
        let loaded = rows.len();

        let normalized = if self.config.strict {
            Normalized {
                listings: normalize_strict(&rows, &self.config.separator)?,
                rejected: Vec::new(),
            }
        } else {
            normalize(&rows, &self.config.separator)
        };
        if !normalized.rejected.is_empty() {
            warn!(
                malformed = normalized.rejected.len(),
                "Skipped malformed records"
            );
        }

        let bounds = PlausibilityBounds::from(&self.config);
        let (listings, out_of_range) = bounds.apply(&normalized.listings);

        let unnamed: Vec<&Listing> = listings.iter().filter(|l| l.full_name().is_none()).collect();
        let damaged_missing_full_name = unnamed.iter().filter(|l| l.is_damaged()).count();
        if damaged_missing_full_name > 0 {
            warn!(
                damaged_missing_full_name,
                "Damaged listings without brand and model left out of damage deltas"
            );
        }

        let counts = StageCounts {
            loaded,
            malformed: normalized.rejected.len(),
            out_of_range,
            retained: listings.len(),
            missing_full_name: unnamed.len(),
            damaged_missing_full_name,
        };
        info!(
            loaded,
            malformed = counts.malformed,
            out_of_range,
            retained = counts.retained,
            missing_full_name = counts.missing_full_name,
            "Listings prepared"
        );

        Ok(Prepared {
            listings,
            rejected: normalized.rejected,
            counts,
        })
    }

    /// Builds the full [`Report`] from prepared listings.
    pub fn report(&self, prepared: Prepared) -> Result<Report> {
        let listings = &prepared.listings;

        let damage = damage_deltas(listings, Baseline::AllListings)?;
        let damage_outliers = outliers(&damage);
        let corrected = damage_deltas(listings, Baseline::UndamagedOnly)?;

        let report = Report {
            generated_at: chrono::Utc::now(),
            malformed_sample: prepared
                .rejected
                .iter()
                .take(self.config.malformed_sample)
                .cloned()
                .collect(),
            description: describe_listings(listings, self.config.histogram_bins),
            brands: brand_aggregates(listings, self.config.min_share)?,
            common_models: model_aggregates(listings, self.config.min_share)?,
            damage_deltas: damage,
            damage_outliers,
            corrected_damage_deltas: corrected,
            counts: prepared.counts,
        };

        info!(
            brands = report.brands.len(),
            common_models = report.common_models.len(),
            damage_deltas = report.damage_deltas.len(),
            outliers = report.damage_outliers.len(),
            "Report built"
        );
        Ok(report)
    }

    /// Runs every stage over raw table bytes.
    pub fn run(&self, bytes: &[u8]) -> Result<Report> {
        let prepared = self.prepare(bytes)?;
        self.report(prepared)
    }
}
