//! Insured, owner and lessor name normalization.

use super::patterns::{
    BCDL_MARKER, BCDL_MASKED_NUMBER, COMPANY_SUFFIX, ILLEGAL_NAME_CHARS, INSURED_NAME, LESSOR_NAME,
    WHITESPACE,
};

/// Names of exactly this length with at least four words are printed
/// pre-formatted (truncated company or joint-owner names).
const PREFORMATTED_LENGTH: usize = 27;

/// Lessor names longer than this many words are truncated.
const LESSOR_MAX_WORDS: usize = 3;

/// Masked driver's licence marker found on a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LicenceMarker {
    /// "BCDL" appears anywhere in the text.
    pub present: bool,
    /// A masked licence number follows the marker.
    pub masked_number: bool,
}

impl LicenceMarker {
    pub fn detect(text: &str) -> Self {
        Self {
            present: BCDL_MARKER.is_match(text),
            masked_number: BCDL_MASKED_NUMBER.is_match(text),
        }
    }

    /// A marker without a number marks a name that is already in display order.
    pub fn keeps_name_order(&self) -> bool {
        self.present && !self.masked_number
    }
}

/// Title-case each alphabetic run: first letter upper, the rest lower.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

/// Strip characters illegal in names, collapse whitespace and title-case.
pub fn clean_name(raw: &str) -> String {
    let stripped = ILLEGAL_NAME_CHARS.replace_all(raw, "");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    title_case(collapsed.trim())
}

/// True for names that must not be reordered.
fn is_company_shaped(name: &str, word_count: usize) -> bool {
    (name.chars().count() == PREFORMATTED_LENGTH && word_count >= 4) || COMPANY_SUFFIX.is_match(name)
}

/// Reorder a surname-first name for display.
///
/// Company-shaped names are returned as-is. Lessor names are reversed when
/// short and truncated to their first three words otherwise; other names move
/// the leading surname to the end.
pub fn format_name(raw: &str, lessor: bool) -> String {
    let name = clean_name(raw);
    let parts: Vec<&str> = name.split(' ').filter(|p| !p.is_empty()).collect();

    if parts.is_empty() || is_company_shaped(&name, parts.len()) {
        return name;
    }

    if lessor {
        if parts.len() < 4 && name.chars().count() < PREFORMATTED_LENGTH {
            return parts.iter().rev().copied().collect::<Vec<_>>().join(" ");
        }
        return parts[..parts.len().min(LESSOR_MAX_WORDS)].join(" ");
    }

    if parts.len() == 1 {
        return name;
    }
    let mut reordered: Vec<&str> = parts[1..].to_vec();
    reordered.push(parts[0]);
    reordered.join(" ")
}

/// Find the insured, owner or lessor name on a page and normalize it.
pub fn search_insured_name(text: &str) -> Option<String> {
    let marker = LicenceMarker::detect(text);

    let (raw, lessor) = match LESSOR_NAME.captures(text).map(|c| c[1].to_string()) {
        Some(name) if !clean_name(&name).is_empty() => (name, true),
        _ => (INSURED_NAME.captures(text)?[1].to_string(), false),
    };

    if marker.keeps_name_order() {
        let cleaned = clean_name(&raw);
        return (!cleaned.is_empty()).then_some(cleaned);
    }

    let formatted = format_name(&raw, lessor);
    (!formatted.is_empty()).then_some(formatted)
}
