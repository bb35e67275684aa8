//! Canonical filenames for classified documents.
//!
//! The base name is the durable identity of a filed document: the primary
//! identifier (plate, name, timestamp) followed by at most one kind suffix.

use crate::extract::clean_name;
use crate::extract::patterns::{ILLEGAL_FILENAME_CHARS, WHITESPACE};
use crate::models::DocumentRecord;

/// Plate values that mark a plate field as present but not a real plate.
pub const SENTINEL_PLATES: [&str; 3] = ["NONLIC", "STORAGE", "DEALER"];

/// Plate sentinel for unlicensed vehicles; names these as registrations.
pub const NONLIC: &str = "NONLIC";

/// Base name of a record with no identifier at all.
pub const UNKNOWN: &str = "UNKNOWN";

/// Which workflow a name is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingMode {
    /// Batch filing: every suffix applies.
    Filing,
    /// E-stamping: cancellation and change suffixes are suppressed.
    Stamp,
}

pub fn is_sentinel_plate(plate: &str) -> bool {
    SENTINEL_PLATES.contains(&plate)
}

/// Strip characters illegal in filenames, collapse whitespace and trim.
pub fn sanitize_filename(name: &str) -> String {
    let stripped = ILLEGAL_FILENAME_CHARS.replace_all(name, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// The identifier portion of a base name: everything before the first space.
pub fn leading_token(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or("")
}

/// Base name used for batch filing.
pub fn compute_base_name(record: &DocumentRecord, composite: bool) -> String {
    compose(record, composite, NamingMode::Filing)
}

/// Base name used for stamped copies.
pub fn compute_stamp_name(record: &DocumentRecord, composite: bool) -> String {
    compose(record, composite, NamingMode::Stamp)
}

/// Filename, extension included, for a filed copy of `record`.
pub fn filing_file_name(record: &DocumentRecord, composite: bool) -> String {
    format!("{}{}", compute_base_name(record, composite), record.extension())
}

fn compose(record: &DocumentRecord, composite: bool, mode: NamingMode) -> String {
    let mut name = primary_identifier(record, composite);
    if let Some(suffix) = kind_suffix(record, mode) {
        name.push(' ');
        name.push_str(suffix);
    }
    sanitize_filename(&name)
}

/// Plate, name, "{name} - {plate}", timestamp or `UNKNOWN`, in priority order.
fn primary_identifier(record: &DocumentRecord, composite: bool) -> String {
    let plate = record
        .license_plate
        .as_deref()
        .map(|p| p.trim().to_uppercase())
        .filter(|p| !p.is_empty() && !is_sentinel_plate(p));
    let name = record
        .insured_name
        .as_deref()
        .map(clean_name)
        .filter(|n| !n.is_empty());

    match (plate, name) {
        (Some(plate), Some(name)) if composite => format!("{} - {}", name, plate),
        (Some(plate), _) => plate,
        (None, Some(name)) => name,
        (None, None) if !record.transaction_timestamp.trim().is_empty() => {
            record.transaction_timestamp.trim().to_string()
        }
        (None, None) => UNKNOWN.to_string(),
    }
}

/// The single kind suffix that wins the fixed precedence.
pub fn kind_suffix(record: &DocumentRecord, mode: NamingMode) -> Option<&'static str> {
    let flags = &record.kind_flags;
    let filing = mode == NamingMode::Filing;

    let is_change = record
        .transaction_type
        .as_deref()
        .is_some_and(|t| t.trim().eq_ignore_ascii_case("change"));
    let is_unlicensed = record
        .license_plate
        .as_deref()
        .is_some_and(|p| p.trim().eq_ignore_ascii_case(NONLIC));

    let precedence = [
        (flags.top, "TOP"),
        (flags.storage, "Storage Policy"),
        (flags.cancellation && filing, "Cancel"),
        (flags.rental, "Rental Policy"),
        (flags.special_risk, "Special Own Risk Damage"),
        (flags.garage, "Garage Policy"),
        (flags.manuscript, "Manuscript"),
        (flags.binder, "Binder"),
        (is_change && filing, "Change"),
        (is_unlicensed, "Registration"),
    ];

    precedence
        .into_iter()
        .find(|(applies, _)| *applies)
        .map(|(_, suffix)| suffix)
}
