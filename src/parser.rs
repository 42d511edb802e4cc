//! CSV parser for the listing table.

use crate::error::{Error, Result};
use crate::listing::{Column, RawListing};
use csv::ReaderBuilder;
use encoding_rs::Encoding;
use tracing::{debug, warn};

/// Labels decoded as ISO-8859-1 proper. WHATWG maps all of them to
/// windows-1252, which differs in 0x80..=0x9F.
const LATIN1_LABELS: &[&str] = &[
    "latin1",
    "l1",
    "iso-8859-1",
    "iso8859-1",
    "iso88591",
    "iso_8859-1",
    "iso_8859-1:1987",
    "iso-ir-100",
    "csisolatin1",
    "cp819",
    "ibm819",
];

/// Decodes `bytes` from the encoding named by `label` (a WHATWG label such
/// as `latin1` or `utf-8`).
///
/// The ISO-8859-1 labels map every byte to the code point of the same value,
/// so 0x80..=0x9F become C1 controls. Ask for `windows-1252` to get `€` and
/// the other typographic characters in that range.
///
/// # Errors
///
/// Returns [`Error::UnknownEncoding`] if the label is not recognised.
pub fn decode(bytes: &[u8], label: &str) -> Result<String> {
    let label = label.trim();
    if LATIN1_LABELS.iter().any(|l| l.eq_ignore_ascii_case(label)) {
        return Ok(encoding_rs::mem::decode_latin1(bytes).into_owned());
    }

    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| Error::UnknownEncoding(label.to_string()))?;
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(encoding = used.name(), "Source contained undecodable bytes");
    }
    Ok(text.into_owned())
}

/// Parses a decoded CSV table into raw listings keyed by canonical column.
///
/// Unknown header cells are dropped. Rows may be shorter than the header;
/// the missing cells are simply absent.
///
/// # Errors
///
/// Returns an error if the CSV is syntactically broken.
pub fn parse_table(text: &str) -> Result<Vec<RawListing>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    let columns: Vec<Option<Column>> = headers.iter().map(Column::from_header).collect();

    for (header, column) in headers.iter().zip(&columns) {
        if column.is_none() {
            debug!(header, "Dropping unknown column");
        }
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let mut raw = RawListing::new(line);
        for (value, column) in record.iter().zip(&columns) {
            if let Some(column) = column {
                raw.set(*column, value);
            }
        }
        rows.push(raw);
    }

    debug!(rows = rows.len(), "Table parsed");
    Ok(rows)
}

/// Decodes and parses raw table bytes in one step.
pub fn parse_bytes(bytes: &[u8], encoding: &str) -> Result<Vec<RawListing>> {
    let text = decode(bytes, encoding)?;
    parse_table(&text)
}
