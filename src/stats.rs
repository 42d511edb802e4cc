//! Descriptive statistics over listing columns: summaries, value shares and
//! the registration-year histogram.

use crate::analyzers::types::{Description, HistogramBin, Share, Summary};
use crate::analyzers::utility::{mean, quantile, sample_stddev, share};
use crate::listing::Listing;
use std::collections::{BTreeMap, BTreeSet};

/// Which date column to tabulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    DateCrawled,
    AdCreated,
    LastSeen,
}

impl DateField {
    fn of(self, listing: &Listing) -> Option<&str> {
        match self {
            DateField::DateCrawled => listing.date_crawled.as_deref(),
            DateField::AdCreated => listing.ad_created.as_deref(),
            DateField::LastSeen => listing.last_seen.as_deref(),
        }
    }
}

/// Summaries, histogram and share tables for a set of listings.
pub fn describe_listings(listings: &[Listing], bins: usize) -> Description {
    let prices: Vec<f64> = listings.iter().map(|l| l.price as f64).collect();
    let odometers: Vec<f64> = listings.iter().map(|l| l.odometer_km as f64).collect();
    let years: Vec<f64> = listings
        .iter()
        .map(|l| f64::from(l.registration_year))
        .collect();

    Description {
        distinct_brands: distinct_brands(listings),
        price: describe(&prices),
        odometer_km: describe(&odometers),
        registration_year: describe(&years),
        registration_year_histogram: histogram(&years, bins),
        registration_year_shares: year_shares(listings),
        date_crawled_shares: date_shares(listings, DateField::DateCrawled),
        ad_created_shares: date_shares(listings, DateField::AdCreated),
        last_seen_shares: date_shares(listings, DateField::LastSeen),
    }
}

/// Count, mean, sample standard deviation, min, quartiles and max.
pub fn describe(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let avg = mean(&sorted);

    Some(Summary {
        count: sorted.len(),
        mean: avg,
        std: sample_stddev(&sorted, avg),
        min: sorted[0],
        p25: quantile(&sorted, 0.25)?,
        p50: quantile(&sorted, 0.5)?,
        p75: quantile(&sorted, 0.75)?,
        max: sorted[sorted.len() - 1],
    })
}

/// Counts each distinct value; rows sorted by descending count, ties by value.
pub fn value_shares<K, I>(values: I) -> Vec<Share<K>>
where
    K: Ord + Clone,
    I: IntoIterator<Item = K>,
{
    let mut counts: BTreeMap<K, usize> = BTreeMap::new();
    let mut total = 0;
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
        total += 1;
    }

    let mut rows: Vec<Share<K>> = counts
        .into_iter()
        .map(|(value, count)| Share {
            value,
            count,
            share: share(count, total),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    rows
}

/// Shares of each calendar day (the leading `YYYY-MM-DD`) in a date column,
/// ascending by day. Listings without the date are counted under `""`.
pub fn date_shares(listings: &[Listing], field: DateField) -> Vec<Share<String>> {
    let days = listings.iter().map(|l| {
        field
            .of(l)
            .map(|d| d.chars().take(10).collect::<String>())
            .unwrap_or_default()
    });
    let mut rows = value_shares(days);
    rows.sort_by(|a, b| a.value.cmp(&b.value));
    rows
}

/// Registration-year shares, newest year first.
pub fn year_shares(listings: &[Listing]) -> Vec<Share<i32>> {
    let mut rows = value_shares(listings.iter().map(|l| l.registration_year));
    rows.sort_by(|a, b| b.value.cmp(&a.value));
    rows
}

pub fn distinct_brands(listings: &[Listing]) -> usize {
    listings
        .iter()
        .filter_map(Listing::brand)
        .collect::<BTreeSet<_>>()
        .len()
}

/// Splits `[min, max]` of `values` into `bins` equal-width bins.
///
/// Every bin is half-open except the last, which also takes `max`. A single
/// distinct value yields one bin holding everything.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}
