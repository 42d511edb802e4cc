//! Price deltas between damaged listings and their brand/model baseline.

use crate::analyzers::aggregate::{partition, truncated_mean};
use crate::analyzers::types::{Baseline, DamageDelta};
use crate::error::Result;
use crate::listing::{DamageState, Listing};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Relative difference of `broken` to `baseline` in percent.
///
/// Undefined for a zero baseline, which only occurs when the price bounds
/// admit `0`; returns `None` then.
pub fn delta_pct(broken: i64, baseline: i64) -> Option<f64> {
    if baseline == 0 {
        return None;
    }
    Some((broken as f64 / baseline as f64) * 100.0 - 100.0)
}

/// Computes a [`DamageDelta`] for every `full_name` with at least one damaged listing.
///
/// Both averages are truncated to integers before the delta is taken. With
/// [`Baseline::AllListings`] the damaged listings are part of their own
/// baseline; with [`Baseline::UndamagedOnly`] they are not, and names that
/// have no undamaged listing are left out. Names whose baseline averages
/// to `0` are skipped with a warning.
#[tracing::instrument(skip(listings), fields(listings = listings.len()))]
pub fn damage_deltas(
    listings: &[Listing],
    baseline: Baseline,
) -> Result<BTreeMap<String, DamageDelta>> {
    let mut out = BTreeMap::new();

    for (full_name, group) in partition(listings, Listing::full_name) {
        let broken: Vec<&Listing> = group.iter().copied().filter(|l| l.is_damaged()).collect();
        if broken.is_empty() {
            continue;
        }

        let base: Vec<&Listing> = match baseline {
            Baseline::AllListings => group,
            Baseline::UndamagedOnly => group
                .into_iter()
                .filter(|l| l.unrepaired_damage == DamageState::NotDamaged)
                .collect(),
        };
        if base.is_empty() {
            debug!(full_name = %full_name, "No undamaged listings to compare against");
            continue;
        }

        let avg_price_broken = truncated_mean(&full_name, &broken, |l| l.price)?;
        let avg_price_not_broken = truncated_mean(&full_name, &base, |l| l.price)?;
        let Some(pct) = delta_pct(avg_price_broken, avg_price_not_broken) else {
            warn!(full_name = %full_name, "Baseline price averages to zero, no delta");
            continue;
        };

        let delta = DamageDelta {
            avg_price_broken,
            avg_price_not_broken,
            delta_pct: pct,
            broken_count: broken.len(),
            baseline_count: base.len(),
            full_name: full_name.clone(),
        };
        out.insert(full_name, delta);
    }

    Ok(out)
}

/// Rows where damaged listings average a higher price than the baseline.
pub fn outliers(deltas: &BTreeMap<String, DamageDelta>) -> BTreeMap<String, DamageDelta> {
    deltas
        .iter()
        .filter(|(_, d)| d.delta_pct > 0.0)
        .map(|(k, d)| (k.clone(), d.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(full: (&str, &str), price: u64, damage: DamageState) -> Listing {
        Listing::new(
            Some(full.0),
            Some(full.1),
            price,
            2005,
            150_000,
            damage,
            "-",
        )
    }

    fn xy_group() -> Vec<Listing> {
        vec![
            listing(("x", "y"), 100, DamageState::NotDamaged),
            listing(("x", "y"), 200, DamageState::NotDamaged),
            listing(("x", "y"), 300, DamageState::Damaged),
        ]
    }

    #[test]
    fn test_delta_with_mixed_baseline() {
        let deltas = damage_deltas(&xy_group(), Baseline::AllListings).unwrap();
        let xy = &deltas["x-y"];
        assert_eq!(xy.avg_price_not_broken, 200);
        assert_eq!(xy.avg_price_broken, 300);
        assert_eq!(xy.delta_pct, 50.0);
        assert_eq!(xy.broken_count, 1);
        assert_eq!(xy.baseline_count, 3);
    }

    #[test]
    fn test_delta_with_undamaged_baseline() {
        let deltas = damage_deltas(&xy_group(), Baseline::UndamagedOnly).unwrap();
        let xy = &deltas["x-y"];
        assert_eq!(xy.avg_price_not_broken, 150);
        assert_eq!(xy.avg_price_broken, 300);
        assert_eq!(xy.delta_pct, 100.0);
        assert_eq!(xy.baseline_count, 2);
    }

    #[test]
    fn test_names_without_damage_are_absent() {
        let mut listings = xy_group();
        listings.push(listing(("audi", "a4"), 5_000, DamageState::NotDamaged));
        listings.push(listing(("audi", "a4"), 6_000, DamageState::Unknown));

        let deltas = damage_deltas(&listings, Baseline::AllListings).unwrap();
        assert_eq!(deltas.len(), 1);
        assert!(!deltas.contains_key("audi-a4"));
    }

    #[test]
    fn test_unnamed_damaged_listings_are_ignored() {
        let listings = vec![Listing::new(
            Some("audi"),
            None,
            1_000,
            2005,
            150_000,
            DamageState::Damaged,
            "-",
        )];
        assert!(damage_deltas(&listings, Baseline::AllListings)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_only_damaged_has_no_corrected_baseline() {
        let listings = vec![
            listing(("lancia", "andere"), 8_750, DamageState::Damaged),
            listing(("lancia", "andere"), 1_000, DamageState::Unknown),
        ];
        let compat = damage_deltas(&listings, Baseline::AllListings).unwrap();
        assert_eq!(compat["lancia-andere"].avg_price_not_broken, 4_875);

        let corrected = damage_deltas(&listings, Baseline::UndamagedOnly).unwrap();
        assert!(corrected.is_empty());
    }

    #[test]
    fn test_averages_truncate_before_delta() {
        let listings = vec![
            listing(("kia", "carnival"), 1_001, DamageState::Damaged),
            listing(("kia", "carnival"), 1_000, DamageState::Damaged),
            listing(("kia", "carnival"), 1_000, DamageState::NotDamaged),
        ];
        let deltas = damage_deltas(&listings, Baseline::AllListings).unwrap();
        let kia = &deltas["kia-carnival"];
        assert_eq!(kia.avg_price_broken, 1_000);
        assert_eq!(kia.avg_price_not_broken, 1_000);
        assert_eq!(kia.delta_pct, 0.0);
    }

    #[test]
    fn test_outliers_keep_positive_deltas_only() {
        let mut listings = xy_group();
        listings.push(listing(("skoda", "octavia"), 1_000, DamageState::Damaged));
        listings.push(listing(("skoda", "octavia"), 5_000, DamageState::NotDamaged));

        let deltas = damage_deltas(&listings, Baseline::AllListings).unwrap();
        assert_eq!(deltas.len(), 2);
        assert!(deltas["skoda-octavia"].delta_pct < 0.0);

        let high = outliers(&deltas);
        assert_eq!(high.len(), 1);
        assert!(high.contains_key("x-y"));
    }

    #[test]
    fn test_delta_pct_zero_baseline() {
        assert_eq!(delta_pct(300, 200), Some(50.0));
        assert_eq!(delta_pct(300, 0), None);
    }

    #[test]
    fn test_zero_priced_baseline_is_skipped() {
        let listings = vec![
            listing(("fiat", "panda"), 0, DamageState::NotDamaged),
            listing(("fiat", "panda"), 0, DamageState::Damaged),
            listing(("x", "y"), 100, DamageState::NotDamaged),
            listing(("x", "y"), 0, DamageState::Damaged),
        ];
        let deltas = damage_deltas(&listings, Baseline::AllListings).unwrap();
        assert!(!deltas.contains_key("fiat-panda"));
        assert_eq!(deltas["x-y"].avg_price_not_broken, 50);
        assert_eq!(deltas["x-y"].delta_pct, -100.0);
        assert!(deltas.values().all(|d| d.delta_pct.is_finite()));
    }
}
