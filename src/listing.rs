//! Listing record types: raw rows straight off the table and normalized listings.

use serde::Serialize;
use std::collections::HashMap;

/// The twenty columns of the source table, in their canonical snake_case naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    DateCrawled,
    Name,
    Seller,
    OfferType,
    Price,
    Abtest,
    VehicleType,
    RegistrationYear,
    Gearbox,
    PowerPs,
    Model,
    Odometer,
    RegistrationMonth,
    FuelType,
    Brand,
    UnrepairedDamage,
    AdCreated,
    NrOfPictures,
    PostalCode,
    LastSeen,
}

/// Header spellings accepted for each column, compared after [`fold_header`].
static HEADER_ALIASES: &[(Column, &[&str])] = &[
    (Column::DateCrawled, &["datecrawled"]),
    (Column::Name, &["name"]),
    (Column::Seller, &["seller"]),
    (Column::OfferType, &["offertype"]),
    (Column::Price, &["price"]),
    (Column::Abtest, &["abtest"]),
    (Column::VehicleType, &["vehicletype"]),
    (
        Column::RegistrationYear,
        &["registrationyear", "yearofregistration"],
    ),
    (Column::Gearbox, &["gearbox"]),
    (Column::PowerPs, &["powerps"]),
    (Column::Model, &["model"]),
    (Column::Odometer, &["odometer", "odometerkm", "kilometer"]),
    (
        Column::RegistrationMonth,
        &["registrationmonth", "monthofregistration"],
    ),
    (Column::FuelType, &["fueltype"]),
    (Column::Brand, &["brand"]),
    (
        Column::UnrepairedDamage,
        &["unrepaireddamage", "notrepaireddamage"],
    ),
    (Column::AdCreated, &["adcreated", "datecreated"]),
    (Column::NrOfPictures, &["nrofpictures"]),
    (Column::PostalCode, &["postalcode"]),
    (Column::LastSeen, &["lastseen", "lastseenonline"]),
];

fn fold_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

impl Column {
    /// Resolves a header cell (camelCase source name or snake_case canonical
    /// name, any casing) to its column.
    pub fn from_header(header: &str) -> Option<Column> {
        let folded = fold_header(header.trim());
        HEADER_ALIASES
            .iter()
            .find(|(_, aliases)| aliases.contains(&folded.as_str()))
            .map(|(column, _)| *column)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::DateCrawled => "date_crawled",
            Column::Name => "name",
            Column::Seller => "seller",
            Column::OfferType => "offer_type",
            Column::Price => "price",
            Column::Abtest => "abtest",
            Column::VehicleType => "vehicle_type",
            Column::RegistrationYear => "registration_year",
            Column::Gearbox => "gearbox",
            Column::PowerPs => "power_PS",
            Column::Model => "model",
            Column::Odometer => "odometer",
            Column::RegistrationMonth => "registration_month",
            Column::FuelType => "fuel_type",
            Column::Brand => "brand",
            Column::UnrepairedDamage => "unrepaired_damage",
            Column::AdCreated => "ad_created",
            Column::NrOfPictures => "nr_of_pictures",
            Column::PostalCode => "postal_code",
            Column::LastSeen => "last_seen",
        }
    }
}

/// One table row before normalization. Empty cells are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawListing {
    pub line: u64,
    pub fields: HashMap<Column, String>,
}

impl RawListing {
    pub fn new(line: u64) -> Self {
        Self {
            line,
            fields: HashMap::new(),
        }
    }

    pub fn with(mut self, column: Column, value: &str) -> Self {
        self.set(column, value);
        self
    }

    /// Stores `value` unless it is blank.
    pub fn set(&mut self, column: Column, value: &str) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            self.fields.insert(column, trimmed.to_string());
        }
    }

    pub fn get(&self, column: Column) -> Option<&str> {
        self.fields.get(&column).map(String::as_str)
    }
}

/// Whether the car has damage that has not been repaired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageState {
    Damaged,
    NotDamaged,
    #[default]
    Unknown,
}

impl DamageState {
    /// Maps the German source tokens (`ja`/`nein`) and their English
    /// equivalents; anything else is unknown.
    pub fn from_token(token: Option<&str>) -> Self {
        match token.map(|t| t.trim().to_lowercase()).as_deref() {
            Some("ja" | "yes" | "true") => DamageState::Damaged,
            Some("nein" | "no" | "false") => DamageState::NotDamaged,
            _ => DamageState::Unknown,
        }
    }
}

/// A normalized used-car listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub line: u64,
    pub date_crawled: Option<String>,
    pub name: Option<String>,
    brand: Option<String>,
    model: Option<String>,
    pub vehicle_type: Option<String>,
    pub abtest: Option<String>,
    pub registration_year: i32,
    pub registration_month: Option<u8>,
    pub gearbox: Option<String>,
    pub power_ps: Option<u32>,
    pub odometer_km: u64,
    pub fuel_type: Option<String>,
    pub unrepaired_damage: DamageState,
    pub seller: Option<String>,
    pub offer_type: Option<String>,
    pub price: u64,
    pub ad_created: Option<String>,
    pub postal_code: Option<String>,
    pub last_seen: Option<String>,
    full_name: Option<String>,
}

/// Joins brand and model with `separator`; undefined unless both are present.
pub fn full_name(brand: Option<&str>, model: Option<&str>, separator: &str) -> Option<String> {
    match (brand, model) {
        (Some(b), Some(m)) => Some(format!("{b}{separator}{m}")),
        _ => None,
    }
}

impl Listing {
    /// Builds a listing with only the fields the aggregations need.
    pub fn new(
        brand: Option<&str>,
        model: Option<&str>,
        price: u64,
        registration_year: i32,
        odometer_km: u64,
        unrepaired_damage: DamageState,
        separator: &str,
    ) -> Self {
        Listing {
            line: 0,
            date_crawled: None,
            name: None,
            brand: brand.map(str::to_string),
            model: model.map(str::to_string),
            vehicle_type: None,
            abtest: None,
            registration_year,
            registration_month: None,
            gearbox: None,
            power_ps: None,
            odometer_km,
            fuel_type: None,
            unrepaired_damage,
            seller: None,
            offer_type: None,
            price,
            ad_created: None,
            postal_code: None,
            last_seen: None,
            full_name: full_name(brand, model, separator),
        }
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// `brand` and `model` joined by the separator, fixed at construction.
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    pub fn is_damaged(&self) -> bool {
        self.unrepaired_damage == DamageState::Damaged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_resolve_from_source_and_canonical_names() {
        assert_eq!(
            Column::from_header("yearOfRegistration"),
            Some(Column::RegistrationYear)
        );
        assert_eq!(
            Column::from_header("registration_year"),
            Some(Column::RegistrationYear)
        );
        assert_eq!(Column::from_header("kilometer"), Some(Column::Odometer));
        assert_eq!(Column::from_header("powerPS"), Some(Column::PowerPs));
        assert_eq!(Column::from_header("power_PS"), Some(Column::PowerPs));
        assert_eq!(
            Column::from_header("notRepairedDamage"),
            Some(Column::UnrepairedDamage)
        );
        assert_eq!(Column::from_header(" Brand "), Some(Column::Brand));
        assert_eq!(Column::from_header("colour"), None);
    }

    #[test]
    fn test_blank_cells_are_absent() {
        let raw = RawListing::new(2)
            .with(Column::Brand, "  ")
            .with(Column::Model, " golf ");
        assert_eq!(raw.get(Column::Brand), None);
        assert_eq!(raw.get(Column::Model), Some("golf"));
    }

    #[test]
    fn test_damage_tokens() {
        assert_eq!(DamageState::from_token(Some("ja")), DamageState::Damaged);
        assert_eq!(DamageState::from_token(Some("Nein")), DamageState::NotDamaged);
        assert_eq!(DamageState::from_token(Some("vielleicht")), DamageState::Unknown);
        assert_eq!(DamageState::from_token(None), DamageState::Unknown);
    }

    #[test]
    fn test_full_name_defined_iff_brand_and_model() {
        let both = Listing::new(
            Some("volkswagen"),
            Some("golf"),
            1000,
            2005,
            150_000,
            DamageState::Unknown,
            "-",
        );
        assert_eq!(both.full_name(), Some("volkswagen-golf"));

        let no_model = Listing::new(
            Some("volkswagen"),
            None,
            1000,
            2005,
            150_000,
            DamageState::Unknown,
            "-",
        );
        assert_eq!(no_model.full_name(), None);

        assert_eq!(full_name(None, Some("golf"), "-"), None);
    }
}
