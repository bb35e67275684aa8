//! Regex patterns for ICBC transaction forms.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Header fields
    pub static ref TIMESTAMP: Regex = Regex::new(
        r"Transaction Timestamp\s*(\d+)"
    ).unwrap();

    pub static ref TRANSACTION_TYPE: Regex = Regex::new(
        r"(?i)Transaction Type\s+([A-Z]+)"
    ).unwrap();

    /// Plate label and the plate token after it, on the same line or the next.
    pub static ref LICENCE_PLATE: Regex = Regex::new(
        r"(?i)(Licence Plate Number)[ \t]*(?:\r?\n[ \t]*)?([A-Z0-9\-]+)"
    ).unwrap();

    /// Label preceding a plate that belongs to a previous registration.
    pub static ref PREVIOUS_PLATE_PREFIX: Regex = Regex::new(
        r"(?i)Previous\s+$"
    ).unwrap();

    pub static ref AGENCY_NUMBER: Regex = Regex::new(
        r"(?i)Agency Number\s*[:#]?\s*([A-Z0-9]+)"
    ).unwrap();

    // Footer fields
    pub static ref PRODUCER: Regex = Regex::new(
        r"-\s*([A-Za-z]+)\s*-"
    ).unwrap();

    pub static ref CUSTOMER_COPY: Regex = Regex::new(
        r"(?i)customer copy"
    ).unwrap();

    // Payment plans, never filed
    pub static ref PAYMENT_PLAN: Regex = Regex::new(
        r"(?i)Payment Plan Agreement"
    ).unwrap();

    pub static ref PAYMENT_PLAN_RECEIPT: Regex = Regex::new(
        r"Payment Plan Receipt"
    ).unwrap();

    // Document kinds
    pub static ref TEMPORARY_PERMIT: Regex = Regex::new(
        r"Temporary Operation Permit and Owner[’']s Certificate of Insurance"
    ).unwrap();

    pub static ref STORAGE_POLICY: Regex = Regex::new(
        r"Storage Policy"
    ).unwrap();

    pub static ref CANCELLATION: Regex = Regex::new(
        r"Application for Cancellation"
    ).unwrap();

    pub static ref RENTAL_POLICY: Regex = Regex::new(
        r"Rental Vehicle Policy"
    ).unwrap();

    pub static ref SPECIAL_RISK: Regex = Regex::new(
        r"Special Risk Own Damage Policy"
    ).unwrap();

    pub static ref GARAGE_CERTIFICATE: Regex = Regex::new(
        r"Garage Vehicle Certificate"
    ).unwrap();

    pub static ref MANUSCRIPT: Regex = Regex::new(
        r"(?i)\bManuscript\b"
    ).unwrap();

    pub static ref BINDER: Regex = Regex::new(
        r"\bBinder\b"
    ).unwrap();

    // Names
    pub static ref LESSOR_NAME: Regex = Regex::new(
        r"(?is)\((?:LESSOR|LSR)\)\s*(.*?)\s*\((?:LESSEE|LSE)\)"
    ).unwrap();

    pub static ref INSURED_NAME: Regex = Regex::new(
        r"(?i)(?:Owner|Applicant|Name of Insured \(surname followed by given name\(s\)\))[ \t]*\n([^\n]+)"
    ).unwrap();

    pub static ref BCDL_MARKER: Regex = Regex::new(
        r"(?i)\bBCDL\b"
    ).unwrap();

    /// A BCDL marker followed on the same line by a masked licence number.
    pub static ref BCDL_MASKED_NUMBER: Regex = Regex::new(
        r"(?i)\bBCDL\b[^\n]*?[X*]{3,}\s*\d{2,}"
    ).unwrap();

    pub static ref COMPANY_SUFFIX: Regex = Regex::new(
        r"(?i)\b(?:Inc|Ltd|Corp)\.?$"
    ).unwrap();

    // Stamp markers
    pub static ref VALIDATION_MARKER: Regex = Regex::new(
        r"NOT VALID UNLESS STAMPED BY"
    ).unwrap();

    pub static ref TIME_MARKER: Regex = Regex::new(
        r"TIME OF VALIDATION"
    ).unwrap();

    // Filenames
    pub static ref ILLEGAL_NAME_CHARS: Regex = Regex::new(
        r#"[.:/\\*?"<>|]"#
    ).unwrap();

    pub static ref ILLEGAL_FILENAME_CHARS: Regex = Regex::new(
        r#"[\\/:*?"<>|]"#
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(
        r"\s+"
    ).unwrap();

    /// Trailing " (n)" duplicate suffix on a file stem.
    pub static ref DUPLICATE_SUFFIX: Regex = Regex::new(
        r"^(.*) \((\d+)\)$"
    ).unwrap();

    pub static ref YEAR_FOLDER: Regex = Regex::new(
        r"^\d{4}$"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_pattern() {
        let caps = TIMESTAMP.captures("Transaction Timestamp 20240115093000").unwrap();
        assert_eq!(&caps[1], "20240115093000");
        assert!(TIMESTAMP.captures("transaction timestamp 2024").is_none());
    }

    #[test]
    fn test_producer_pattern() {
        let caps = PRODUCER.captures("123 - jd - 456").unwrap();
        assert_eq!(&caps[1], "jd");
    }

    #[test]
    fn test_temporary_permit_accepts_both_apostrophes() {
        assert!(TEMPORARY_PERMIT.is_match("Temporary Operation Permit and Owner’s Certificate of Insurance"));
        assert!(TEMPORARY_PERMIT.is_match("Temporary Operation Permit and Owner's Certificate of Insurance"));
    }

    #[test]
    fn test_company_suffix() {
        assert!(COMPANY_SUFFIX.is_match("Acme Holdings Inc"));
        assert!(COMPANY_SUFFIX.is_match("Acme Holdings LTD."));
        assert!(COMPANY_SUFFIX.is_match("Acme Corp"));
        assert!(!COMPANY_SUFFIX.is_match("John Vincent"));
    }

    #[test]
    fn test_bcdl_masked_number() {
        assert!(BCDL_MASKED_NUMBER.is_match("BCDL XXXX1234"));
        assert!(BCDL_MASKED_NUMBER.is_match("Driver BCDL # ****567"));
        assert!(!BCDL_MASKED_NUMBER.is_match("BCDL\nXXXX1234"));
        assert!(BCDL_MARKER.is_match("bcdl"));
    }

    #[test]
    fn test_duplicate_suffix() {
        let caps = DUPLICATE_SUFFIX.captures("ABC123 (12)").unwrap();
        assert_eq!(&caps[1], "ABC123");
        assert_eq!(&caps[2], "12");
        assert!(DUPLICATE_SUFFIX.captures("ABC123").is_none());
    }
}
