use crate::analyzers::types::{BrandAggregate, ModelAggregate};
use crate::analyzers::utility::share;
use crate::error::{Error, Result};
use crate::listing::Listing;
use std::collections::BTreeMap;
use tracing::debug;

/// Groups listings by the key `key_of` extracts; listings without a key are skipped.
pub fn partition<'a, F>(listings: &'a [Listing], key_of: F) -> BTreeMap<String, Vec<&'a Listing>>
where
    F: Fn(&'a Listing) -> Option<&'a str>,
{
    let mut groups: BTreeMap<String, Vec<&Listing>> = BTreeMap::new();
    for listing in listings {
        if let Some(key) = key_of(listing) {
            groups.entry(key.to_string()).or_default().push(listing);
        }
    }
    groups
}

/// Mean of `value` over a group, truncated toward zero.
///
/// # Errors
///
/// Returns [`Error::EmptyGroup`] for an empty group; groups are keyed from
/// observed listings, so this indicates a bug upstream.
pub fn truncated_mean<F>(key: &str, group: &[&Listing], value: F) -> Result<i64>
where
    F: Fn(&Listing) -> u64,
{
    if group.is_empty() {
        return Err(Error::EmptyGroup {
            key: key.to_string(),
        });
    }
    let total: f64 = group.iter().map(|l| value(*l) as f64).sum();
    Ok((total / group.len() as f64) as i64)
}

/// Mean price and mileage per brand, for brands holding more than `min_share`
/// of `listings`.
///
/// Listings with no brand count toward the total but never form a group.
#[tracing::instrument(skip(listings), fields(listings = listings.len()))]
pub fn brand_aggregates(
    listings: &[Listing],
    min_share: f64,
) -> Result<BTreeMap<String, BrandAggregate>> {
    let total = listings.len();
    let mut out = BTreeMap::new();

    for (brand, group) in partition(listings, Listing::brand) {
        let brand_share = share(group.len(), total);
        if brand_share <= min_share {
            debug!(brand = %brand, share = brand_share, "Brand below share threshold");
            continue;
        }
        let aggregate = BrandAggregate {
            mean_price: truncated_mean(&brand, &group, |l| l.price)?,
            mean_mileage: truncated_mean(&brand, &group, |l| l.odometer_km)?,
            count: group.len(),
            share: brand_share,
            brand: brand.clone(),
        };
        out.insert(brand, aggregate);
    }

    Ok(out)
}

/// Mean price and mileage for the most common brand/model combinations.
///
/// The share is taken over listings whose `full_name` is defined.
#[tracing::instrument(skip(listings), fields(listings = listings.len()))]
pub fn model_aggregates(
    listings: &[Listing],
    min_share: f64,
) -> Result<BTreeMap<String, ModelAggregate>> {
    let named = listings.iter().filter(|l| l.full_name().is_some()).count();
    let mut out = BTreeMap::new();

    for (full_name, group) in partition(listings, Listing::full_name) {
        let model_share = share(group.len(), named);
        if model_share <= min_share {
            continue;
        }
        let aggregate = ModelAggregate {
            mean_price: truncated_mean(&full_name, &group, |l| l.price)?,
            mean_mileage: truncated_mean(&full_name, &group, |l| l.odometer_km)?,
            count: group.len(),
            share: model_share,
            full_name: full_name.clone(),
        };
        out.insert(full_name, aggregate);
    }

    Ok(out)
}
