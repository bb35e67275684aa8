//! Field extraction and name normalization for ICBC transaction forms.

pub mod fields;
pub mod names;
pub mod patterns;

pub use fields::{
    extract_agency_number, extract_fields, extract_kind_flags, extract_timestamp, is_payment_plan,
    ExtractedFields, FieldExtractor, LicencePlateExtractor, PageText, ProducerExtractor,
    TransactionTypeExtractor,
};
pub use names::{clean_name, format_name, search_insured_name, title_case, LicenceMarker};
