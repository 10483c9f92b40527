//! ISO 7064 MOD 97-10 checksum for IBANs
//!
//! The IBAN is rearranged (first four characters moved to the end), letters
//! are expanded to two digits (A=10 .. Z=35) and the resulting decimal number
//! is reduced modulo 97. A valid IBAN leaves residue 1.
//!
//! The residue is accumulated digit by digit, so no big-integer arithmetic
//! is needed for 34-character inputs.

use crate::{Error, Result};

/// Shortest IBAN in the ISO 13616 registry (Norway)
pub const IBAN_MIN_LENGTH: usize = 15;

/// Longest IBAN allowed by ISO 13616
pub const IBAN_MAX_LENGTH: usize = 34;

/// Validate the structure and MOD 97-10 residue of an IBAN
///
/// Never fails: input that is not IBAN-shaped is simply not valid.
pub fn validate(iban: &str) -> bool {
    if !is_well_formed(iban) {
        return false;
    }

    let (head, tail) = iban.split_at(4);
    residue(tail.chars().chain(head.chars())) == Some(1)
}

/// Compute the two IBAN check digits for a country code and BBAN
pub fn compute_check_digits(country_code: &str, bban: &str) -> Result<String> {
    if country_code.len() != 2 || !country_code.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(Error::InvalidArgument(format!(
            "country code must be two uppercase letters, got '{}'",
            country_code
        )));
    }
    if bban.is_empty() || bban.len() > IBAN_MAX_LENGTH - 4 {
        return Err(Error::InvalidArgument(format!(
            "BBAN length {} outside 1..={}",
            bban.len(),
            IBAN_MAX_LENGTH - 4
        )));
    }

    let rearranged = bban.chars().chain(country_code.chars()).chain("00".chars());
    let residue = residue(rearranged).ok_or_else(|| {
        Error::InvalidArgument(format!("BBAN '{}' contains non-alphanumeric characters", bban))
    })?;

    Ok(format!("{:02}", 98 - residue))
}

/// Generic IBAN shape: country letters, check digits, uppercase alphanumerics
fn is_well_formed(iban: &str) -> bool {
    let bytes = iban.as_bytes();
    (IBAN_MIN_LENGTH..=IBAN_MAX_LENGTH).contains(&bytes.len())
        && bytes[..2].iter().all(u8::is_ascii_uppercase)
        && bytes[2..4].iter().all(u8::is_ascii_digit)
        && bytes[4..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// MOD 97 residue of the numeric expansion, `None` on an illegal character
fn residue(chars: impl Iterator<Item = char>) -> Option<u32> {
    let mut acc: u32 = 0;
    for c in chars {
        acc = match c {
            '0'..='9' => (acc * 10 + c.to_digit(10)?) % 97,
            'A'..='Z' => (acc * 100 + (c as u32 - 'A' as u32 + 10)) % 97,
            _ => return None,
        };
    }
    Some(acc)
}
