//! Field extraction from the first page of a transaction form.

use std::path::Path;

use tracing::trace;

use super::names::{search_insured_name, title_case};
use super::patterns::*;
use crate::models::{DocumentRecord, KindFlags, PageRegions};
use crate::pdf::PageLayout;

/// Full page text plus the clip-region texts the extractor reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageText {
    pub full: String,
    pub timestamp: String,
    pub payment_plan: String,
    pub payment_plan_receipt: String,
    pub producer: String,
}

impl PageText {
    /// Cut the configured regions out of a page layout.
    pub fn from_layout(layout: &PageLayout, regions: &PageRegions) -> Self {
        Self {
            full: layout.text(),
            timestamp: layout.clip_text(&regions.timestamp),
            payment_plan: layout.clip_text(&regions.payment_plan),
            payment_plan_receipt: layout.clip_text(&regions.payment_plan_receipt),
            producer: layout.clip_text(&regions.producer),
        }
    }
}

/// Scalar fields and flags read from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub transaction_timestamp: Option<String>,
    pub license_plate: Option<String>,
    pub insured_name: Option<String>,
    pub producer_code: Option<String>,
    pub transaction_type: Option<String>,
    pub kind_flags: KindFlags,
    pub payment_plan: bool,
}

impl ExtractedFields {
    /// Turn the fields into a record; `None` when there is no timestamp.
    pub fn into_record(self, source_path: &Path) -> Option<DocumentRecord> {
        let timestamp = self.transaction_timestamp?;
        Some(DocumentRecord {
            license_plate: self.license_plate,
            insured_name: self.insured_name,
            producer_code: self.producer_code,
            transaction_type: self.transaction_type,
            kind_flags: self.kind_flags,
            ..DocumentRecord::new(source_path, timestamp)
        })
    }
}

/// Trait for single-field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;
}

/// Extracts the current licence plate, skipping "Previous Licence Plate Number".
pub struct LicencePlateExtractor;

impl FieldExtractor for LicencePlateExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<String> {
        let mut start = 0;
        while let Some(caps) = LICENCE_PLATE.captures_at(text, start) {
            let label = caps.get(1)?;
            if !PREVIOUS_PLATE_PREFIX.is_match(&text[..label.start()]) {
                return Some(caps[2].to_uppercase());
            }
            // A blank previous plate field may be followed by the current label
            start = label.end();
        }
        None
    }
}

/// Extracts the dashed producer code from the footer region.
pub struct ProducerExtractor;

impl FieldExtractor for ProducerExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<String> {
        PRODUCER.captures(text).map(|caps| caps[1].to_uppercase())
    }
}

/// Extracts the title-cased transaction type.
pub struct TransactionTypeExtractor;

impl FieldExtractor for TransactionTypeExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<String> {
        TRANSACTION_TYPE
            .captures(text)
            .map(|caps| title_case(caps[1].trim()))
    }
}

/// Read the transaction timestamp, preferring the header region over the full text.
pub fn extract_timestamp(clip: &str, full: &str) -> Option<String> {
    TIMESTAMP
        .captures(clip)
        .or_else(|| TIMESTAMP.captures(full))
        .map(|caps| caps[1].to_string())
}

/// Agency number printed on the form.
pub fn extract_agency_number(text: &str) -> Option<String> {
    AGENCY_NUMBER.captures(text).map(|caps| caps[1].to_uppercase())
}

/// Raw document-kind flags; several may be set.
pub fn extract_kind_flags(text: &str) -> KindFlags {
    KindFlags {
        top: TEMPORARY_PERMIT.is_match(text),
        storage: STORAGE_POLICY.is_match(text),
        cancellation: CANCELLATION.is_match(text),
        rental: RENTAL_POLICY.is_match(text),
        special_risk: SPECIAL_RISK.is_match(text),
        garage: GARAGE_CERTIFICATE.is_match(text),
        manuscript: MANUSCRIPT.is_match(text),
        binder: BINDER.is_match(text),
    }
}

/// True when either payment plan title appears in its region.
pub fn is_payment_plan(page: &PageText) -> bool {
    PAYMENT_PLAN.is_match(&page.payment_plan) || PAYMENT_PLAN_RECEIPT.is_match(&page.payment_plan_receipt)
}

/// Apply every pattern to a page.
pub fn extract_fields(page: &PageText) -> ExtractedFields {
    let fields = ExtractedFields {
        transaction_timestamp: extract_timestamp(&page.timestamp, &page.full),
        license_plate: LicencePlateExtractor.extract(&page.full),
        insured_name: search_insured_name(&page.full),
        producer_code: ProducerExtractor.extract(&page.producer),
        transaction_type: TransactionTypeExtractor.extract(&page.full),
        kind_flags: extract_kind_flags(&page.full),
        payment_plan: is_payment_plan(page),
    };
    trace!("Extracted fields: {:?}", fields);
    fields
}
