//! Output formatting and persistence for analysis reports.
//!
//! Supports plain-text tables, JSON serialization, and CSV table export.

use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Write};
use tracing::debug;

use crate::analyzers::types::{
    BrandAggregate, DamageDelta, Description, ModelAggregate, Report, Share, Summary,
};
use csv::WriterBuilder;

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &Report) {
    debug!("{:#?}", report);
}

/// Writes `value` as pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn write_json(value: &impl Serialize, path: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            debug!(path, "Writing JSON report");
            std::fs::write(path, json + "\n")?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}

/// Writes `rows` to a CSV file at `path` with a header row, replacing any existing file.
pub fn write_table<T: Serialize>(path: &str, rows: impl IntoIterator<Item = T>) -> Result<()> {
    debug!(path, "Writing CSV table");
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn render_summary(label: &str, summary: Option<&Summary>) -> String {
    match summary {
        None => format!("{label}: no data\n"),
        Some(s) => format!(
            "{label}: count={} mean={:.2} std={} min={} 25%={} 50%={} 75%={} max={}\n",
            s.count,
            s.mean,
            s.std.map_or_else(|| "-".to_string(), |v| format!("{v:.2}")),
            s.min,
            s.p25,
            s.p50,
            s.p75,
            s.max
        ),
    }
}

pub fn render_brands<'a>(rows: impl IntoIterator<Item = &'a BrandAggregate>) -> String {
    let mut out = format!(
        "{:<20} {:>8} {:>8} {:>12} {:>16}\n",
        "brand", "count", "share", "mean_price", "mean_mileage_km"
    );
    for b in rows {
        let _ = writeln!(
            out,
            "{:<20} {:>8} {:>7.2}% {:>12} {:>16}",
            b.brand,
            b.count,
            b.share * 100.0,
            b.mean_price,
            b.mean_mileage
        );
    }
    out
}

pub fn render_models<'a>(rows: impl IntoIterator<Item = &'a ModelAggregate>) -> String {
    let mut out = format!(
        "{:<32} {:>8} {:>8} {:>12} {:>16}\n",
        "full_name", "count", "share", "mean_price", "mean_mileage_km"
    );
    for m in rows {
        let _ = writeln!(
            out,
            "{:<32} {:>8} {:>7.2}% {:>12} {:>16}",
            m.full_name,
            m.count,
            m.share * 100.0,
            m.mean_price,
            m.mean_mileage
        );
    }
    out
}

pub fn render_damage<'a>(rows: impl IntoIterator<Item = &'a DamageDelta>) -> String {
    let mut out = format!(
        "{:<32} {:>22} {:>26} {:>10} {:>7} {:>9}\n",
        "full_name",
        "average_price_broken",
        "average_price_not_broken",
        "delta",
        "broken",
        "baseline"
    );
    for d in rows {
        let _ = writeln!(
            out,
            "{:<32} {:>22} {:>26} {:>9.2}% {:>7} {:>9}",
            d.full_name,
            d.avg_price_broken,
            d.avg_price_not_broken,
            d.delta_pct,
            d.broken_count,
            d.baseline_count
        );
    }
    out
}

pub fn render_shares<K: std::fmt::Display>(label: &str, rows: &[Share<K>]) -> String {
    let mut out = format!("{label}\n");
    for row in rows {
        let _ = writeln!(
            out,
            "  {:<12} {:>8} {:>9.4}",
            row.value.to_string(),
            row.count,
            row.share
        );
    }
    out
}

/// Renders column summaries, the year histogram and the share tables.
pub fn render_description(description: &Description) -> String {
    let mut out = format!("distinct brands: {}\n\n", description.distinct_brands);

    out.push_str(&render_summary("price", description.price.as_ref()));
    out.push_str(&render_summary(
        "odometer_km",
        description.odometer_km.as_ref(),
    ));
    out.push_str(&render_summary(
        "registration_year",
        description.registration_year.as_ref(),
    ));

    out.push_str("\nregistration_year histogram\n");
    for bin in &description.registration_year_histogram {
        let _ = writeln!(
            out,
            "  {:>7.1} - {:>7.1} {:>8}",
            bin.lower, bin.upper, bin.count
        );
    }

    out.push('\n');
    out.push_str(&render_shares(
        "registration_year",
        &description.registration_year_shares,
    ));
    out.push_str(&render_shares(
        "date_crawled",
        &description.date_crawled_shares,
    ));
    out.push_str(&render_shares("ad_created", &description.ad_created_shares));
    out.push_str(&render_shares("last_seen", &description.last_seen_shares));
    out
}

/// Renders the whole report as plain-text tables.
pub fn render_text(report: &Report) -> String {
    let c = &report.counts;
    let mut out = format!(
        "listings: loaded={} malformed={} out_of_range={} retained={}\n",
        c.loaded, c.malformed, c.out_of_range, c.retained
    );
    for rejected in &report.malformed_sample {
        let _ = writeln!(out, "  line {}: {}", rejected.line, rejected.reason);
    }
    let _ = writeln!(
        out,
        "without full_name: {} ({} damaged, left out of damage deltas)",
        c.missing_full_name, c.damaged_missing_full_name
    );
    out.push_str(&render_description(&report.description));

    out.push_str("\nbrands\n");
    out.push_str(&render_brands(report.brands.values()));
    out.push_str("\ncommon models\n");
    out.push_str(&render_models(report.common_models.values()));
    out.push_str("\ndamage deltas (baseline: all listings)\n");
    out.push_str(&render_damage(report.damage_deltas.values()));
    out.push_str("\ndamage outliers (delta > 0)\n");
    out.push_str(&render_damage(report.damage_outliers.values()));
    out.push_str("\ndamage deltas (baseline: undamaged only)\n");
    out.push_str(&render_damage(report.corrected_damage_deltas.values()));
    out
}
