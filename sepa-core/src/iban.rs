//! IBAN country formats
//!
//! Table of ISO 13616 registry countries and their fixed IBAN lengths, plus
//! the full structural check used by `check_iban`.

use crate::checksum;

/// (country code, IBAN length)
#[rustfmt::skip]
const IBAN_LENGTHS: &[(&str, usize)] = &[
    ("AD", 24), ("AE", 23), ("AL", 28), ("AT", 20), ("AZ", 28), ("BA", 20),
    ("BE", 16), ("BG", 22), ("BH", 22), ("BR", 29), ("BY", 28), ("CH", 21),
    ("CR", 22), ("CY", 28), ("CZ", 24), ("DE", 22), ("DK", 18), ("DO", 28),
    ("EE", 20), ("EG", 29), ("ES", 24), ("FI", 18), ("FO", 18), ("FR", 27),
    ("GB", 22), ("GE", 22), ("GI", 23), ("GL", 18), ("GR", 27), ("GT", 28),
    ("HR", 21), ("HU", 28), ("IE", 22), ("IL", 23), ("IQ", 23), ("IS", 26),
    ("IT", 27), ("JO", 30), ("KW", 30), ("KZ", 20), ("LB", 28), ("LC", 32),
    ("LI", 21), ("LT", 20), ("LU", 20), ("LV", 21), ("MC", 27), ("MD", 24),
    ("ME", 22), ("MK", 19), ("MR", 27), ("MT", 31), ("MU", 30), ("NL", 18),
    ("NO", 15), ("PK", 24), ("PL", 28), ("PS", 29), ("PT", 25), ("QA", 29),
    ("RO", 24), ("RS", 22), ("SA", 24), ("SC", 31), ("SE", 24), ("SI", 19),
    ("SK", 24), ("SM", 27), ("ST", 25), ("SV", 28), ("TL", 23), ("TN", 24),
    ("TR", 26), ("UA", 29), ("VA", 22), ("VG", 24), ("XK", 20),
];

/// IBAN length registered for a country, if the country issues IBANs
pub fn country_length(country_code: &str) -> Option<usize> {
    IBAN_LENGTHS
        .iter()
        .find(|(code, _)| *code == country_code)
        .map(|(_, len)| *len)
}

/// Full IBAN check: registered country, exact country length, MOD 97-10
pub fn is_valid(iban: &str) -> bool {
    let Some(country) = iban.get(..2) else {
        return false;
    };
    match country_length(country) {
        Some(len) if len == iban.len() => checksum::validate(iban),
        _ => false,
    }
}

/// Convert paper format ("DE89 3704 ...") to electronic format
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Reason an IBAN fails `is_valid`, for error messages
pub(crate) fn rejection_reason(iban: &str) -> String {
    if iban.is_empty() {
        return "must not be empty".to_string();
    }
    if iban.chars().count() > checksum::IBAN_MAX_LENGTH {
        return format!(
            "length {} exceeds maximum of {}",
            iban.chars().count(),
            checksum::IBAN_MAX_LENGTH
        );
    }
    let country = iban.get(..2).unwrap_or(iban);
    match country_length(country) {
        None => format!("unknown IBAN country '{}'", country),
        Some(len) if len != iban.len() => {
            format!("{} IBANs have {} characters, got {}", country, len, iban.len())
        }
        Some(_) => "checksum or character set invalid".to_string(),
    }
}
