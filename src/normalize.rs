//! Coerces raw table rows into typed [`Listing`]s.

use crate::error::{Error, MalformedReason, Result};
use crate::listing::{Column, DamageState, Listing, RawListing};
use serde::Serialize;
use tracing::debug;

const CURRENCY_MARKS: &[&str] = &["$", "€", "eur"];
const UNIT_SUFFIXES: &[&str] = &["km"];

/// A record the normalizer had to skip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejected {
    pub line: u64,
    pub reason: MalformedReason,
}

impl From<Rejected> for Error {
    fn from(r: Rejected) -> Self {
        Error::MalformedRecord {
            line: r.line,
            reason: r.reason,
        }
    }
}

/// Output of a normalization pass: the usable listings plus every skipped record.
#[derive(Debug, Default)]
pub struct Normalized {
    pub listings: Vec<Listing>,
    pub rejected: Vec<Rejected>,
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

fn strip_suffix_ci<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    let tail = s.get(split..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &s[..split])
}

/// Removes currency marks and unit suffixes around a number, in any order.
fn strip_marks(raw: &str) -> &str {
    let mut s = raw.trim();
    loop {
        let before = s.len();
        for mark in CURRENCY_MARKS.iter().chain(UNIT_SUFFIXES) {
            if let Some(rest) = strip_prefix_ci(s, mark) {
                s = rest.trim();
            }
            if let Some(rest) = strip_suffix_ci(s, mark) {
                s = rest.trim();
            }
        }
        if s.len() == before {
            return s;
        }
    }
}

/// Parses a formatted non-negative integer such as `"150,000km"` or `"$5.000"`.
///
/// `,` and `.` are accepted as thousands separators only when every group
/// after the first has exactly three digits. Returns `None` for anything else.
pub fn parse_amount(raw: &str) -> Option<u64> {
    let s = strip_marks(raw);
    if s.is_empty() {
        return None;
    }

    let mut groups = s.split([',', '.']);
    let first = groups.next()?;
    if first.is_empty() || !first.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut digits = String::from(first);
    let mut grouped = false;
    for group in groups {
        if group.len() != 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.push_str(group);
        grouped = true;
    }
    if grouped && first.len() > 3 {
        return None;
    }

    digits.parse().ok()
}

fn required<'a>(raw: &'a RawListing, column: Column) -> std::result::Result<&'a str, Rejected> {
    raw.get(column).ok_or(Rejected {
        line: raw.line,
        reason: MalformedReason::MissingField {
            field: column.as_str(),
        },
    })
}

fn invalid(raw: &RawListing, column: Column, value: &str) -> Rejected {
    Rejected {
        line: raw.line,
        reason: MalformedReason::InvalidNumber {
            field: column.as_str(),
            value: value.to_string(),
        },
    }
}

fn required_amount(raw: &RawListing, column: Column) -> std::result::Result<u64, Rejected> {
    let value = required(raw, column)?;
    parse_amount(value).ok_or_else(|| invalid(raw, column, value))
}

fn text(raw: &RawListing, column: Column) -> Option<String> {
    raw.get(column).map(str::to_string)
}

/// Normalizes one raw row.
///
/// Price, odometer and registration year are required; registration month
/// and power are optional and dropped if they do not parse.
pub fn normalize_record(
    raw: &RawListing,
    separator: &str,
) -> std::result::Result<Listing, Rejected> {
    let price = required_amount(raw, Column::Price)?;
    let odometer_km = required_amount(raw, Column::Odometer)?;
    let year_raw = required(raw, Column::RegistrationYear)?;
    let registration_year: i32 = year_raw
        .parse()
        .map_err(|_| invalid(raw, Column::RegistrationYear, year_raw))?;

    let mut listing = Listing::new(
        raw.get(Column::Brand),
        raw.get(Column::Model),
        price,
        registration_year,
        odometer_km,
        DamageState::from_token(raw.get(Column::UnrepairedDamage)),
        separator,
    );

    listing.line = raw.line;
    listing.date_crawled = text(raw, Column::DateCrawled);
    listing.name = text(raw, Column::Name);
    listing.vehicle_type = text(raw, Column::VehicleType);
    listing.abtest = text(raw, Column::Abtest);
    listing.registration_month = raw
        .get(Column::RegistrationMonth)
        .and_then(|m| m.parse().ok());
    listing.gearbox = text(raw, Column::Gearbox);
    listing.power_ps = raw
        .get(Column::PowerPs)
        .and_then(parse_amount)
        .and_then(|p| u32::try_from(p).ok());
    listing.fuel_type = text(raw, Column::FuelType);
    listing.seller = text(raw, Column::Seller);
    listing.offer_type = text(raw, Column::OfferType);
    listing.ad_created = text(raw, Column::AdCreated);
    listing.postal_code = text(raw, Column::PostalCode);
    listing.last_seen = text(raw, Column::LastSeen);

    Ok(listing)
}

/// Normalizes every row, collecting the ones that could not be used.
#[tracing::instrument(skip(rows), fields(rows = rows.len()))]
pub fn normalize(rows: &[RawListing], separator: &str) -> Normalized {
    let mut out = Normalized::default();
    for raw in rows {
        match normalize_record(raw, separator) {
            Ok(listing) => out.listings.push(listing),
            Err(rejected) => {
                debug!(line = rejected.line, reason = %rejected.reason, "Skipping malformed record");
                out.rejected.push(rejected);
            }
        }
    }
    out
}

/// Normalizes every row, failing on the first one that cannot be used.
///
/// # Errors
///
/// Returns [`Error::MalformedRecord`] for the first malformed row.
#[tracing::instrument(skip(rows), fields(rows = rows.len()))]
pub fn normalize_strict(rows: &[RawListing], separator: &str) -> Result<Vec<Listing>> {
    rows.iter()
        .map(|raw| normalize_record(raw, separator).map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row() -> RawListing {
        RawListing::new(2)
            .with(Column::Price, "$5,000")
            .with(Column::Odometer, "150,000km")
            .with(Column::RegistrationYear, "2004")
            .with(Column::Brand, "volkswagen")
            .with(Column::Model, "golf")
            .with(Column::UnrepairedDamage, "nein")
            .with(Column::PostalCode, "01069")
            .with(Column::PowerPs, "75")
    }

    #[test]
    fn test_parse_amount_formats() {
        assert_eq!(parse_amount("150,000km"), Some(150_000));
        assert_eq!(parse_amount("$5,000"), Some(5_000));
        assert_eq!(parse_amount("5.000 €"), Some(5_000));
        assert_eq!(parse_amount("1,234,567"), Some(1_234_567));
        assert_eq!(parse_amount("0"), Some(0));
        assert_eq!(parse_amount(" 42 KM "), Some(42));
        assert_eq!(parse_amount("$99,999,999"), Some(99_999_999));
    }

    #[test]
    fn test_parse_amount_marks_in_any_order() {
        assert_eq!(parse_amount("5 € km"), Some(5));
        assert_eq!(parse_amount("5 km €"), Some(5));
        assert_eq!(parse_amount("$ 1,500 EUR km"), Some(1_500));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("km"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("-5"), None);
        assert_eq!(parse_amount("1,23"), None);
        assert_eq!(parse_amount("12.5"), None);
        assert_eq!(parse_amount("1234,567"), None);
        assert_eq!(parse_amount(",000"), None);
    }

    #[test]
    fn test_normalize_record_typed_fields() {
        let listing = normalize_record(&raw_row(), "-").unwrap();
        assert_eq!(listing.price, 5_000);
        assert_eq!(listing.odometer_km, 150_000);
        assert_eq!(listing.registration_year, 2004);
        assert_eq!(listing.full_name(), Some("volkswagen-golf"));
        assert_eq!(listing.unrepaired_damage, DamageState::NotDamaged);
        assert_eq!(listing.postal_code.as_deref(), Some("01069"));
        assert_eq!(listing.power_ps, Some(75));
        assert_eq!(listing.line, 2);
    }

    #[test]
    fn test_missing_model_leaves_full_name_undefined() {
        let mut raw = raw_row();
        raw.fields.remove(&Column::Model);
        let listing = normalize_record(&raw, "-").unwrap();
        assert_eq!(listing.brand(), Some("volkswagen"));
        assert_eq!(listing.full_name(), None);
    }

    #[test]
    fn test_missing_price_is_malformed() {
        let mut raw = raw_row();
        raw.fields.remove(&Column::Price);
        let rejected = normalize_record(&raw, "-").unwrap_err();
        assert_eq!(
            rejected.reason,
            MalformedReason::MissingField { field: "price" }
        );
    }

    #[test]
    fn test_unparseable_year_is_malformed() {
        let raw = raw_row().with(Column::RegistrationYear, "19x5");
        let rejected = normalize_record(&raw, "-").unwrap_err();
        assert_eq!(
            rejected.reason,
            MalformedReason::InvalidNumber {
                field: "registration_year",
                value: "19x5".into()
            }
        );
    }

    #[test]
    fn test_bad_optional_fields_are_dropped() {
        let raw = raw_row()
            .with(Column::PowerPs, "lots")
            .with(Column::RegistrationMonth, "march");
        let listing = normalize_record(&raw, "-").unwrap();
        assert_eq!(listing.power_ps, None);
        assert_eq!(listing.registration_month, None);
    }

    #[test]
    fn test_normalize_counts_rejections() {
        let rows = vec![
            raw_row(),
            RawListing::new(3).with(Column::Price, "100"),
            raw_row().with(Column::Odometer, "far"),
        ];
        let out = normalize(&rows, "-");
        assert_eq!(out.listings.len(), 1);
        assert_eq!(out.rejected.len(), 2);
        assert_eq!(out.rejected[0].line, 3);
    }

    #[test]
    fn test_rejected_converts_to_error() {
        let rejected = Rejected {
            line: 7,
            reason: MalformedReason::MissingField { field: "odometer" },
        };
        let err: Error = rejected.into();
        assert!(matches!(err, Error::MalformedRecord { line: 7, .. }));
    }

    #[test]
    fn test_normalize_strict_stops_at_first_bad_row() {
        let rows = vec![
            raw_row(),
            RawListing::new(3).with(Column::Price, "100"),
            raw_row().with(Column::Odometer, "far"),
        ];
        let err = normalize_strict(&rows, "-").unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedRecord {
                line: 3,
                reason: MalformedReason::MissingField { field: "odometer" }
            }
        ));

        let listings = normalize_strict(&[raw_row()], "-").unwrap();
        assert_eq!(listings.len(), 1);
    }
}
