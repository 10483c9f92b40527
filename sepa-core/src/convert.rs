//! IBAN derivation from national account data
//!
//! Builds the BBAN for a country from a bank identifier and an account
//! identifier, computes the IBAN check digits and reports which composition
//! path was taken:
//!
//! - `Direct`: both identifiers already had the layout length
//! - `Padded`: numeric identifiers were left-padded with zeros
//! - `NationalCheck`: national check digits were computed (BE, ES, FR, MC)

use crate::{checksum, iban, ConversionStatus, Error, Result};
use serde::{Deserialize, Serialize};

/// Character class of a BBAN component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Numeric,
    Alpha,
    Alphanumeric,
}

impl CharClass {
    fn accepts(self, c: char) -> bool {
        match self {
            CharClass::Numeric => c.is_ascii_digit(),
            CharClass::Alpha => c.is_ascii_uppercase(),
            CharClass::Alphanumeric => c.is_ascii_uppercase() || c.is_ascii_digit(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            CharClass::Numeric => "digits",
            CharClass::Alpha => "letters",
            CharClass::Alphanumeric => "letters and digits",
        }
    }
}

/// National check digit scheme embedded in the BBAN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NationalRule {
    None,
    /// bank ‖ account ‖ (bank ‖ account mod 97)
    Belgium,
    /// bank ‖ branch ‖ account ‖ RIB key
    France,
    /// bank ‖ branch ‖ DC ‖ account
    Spain,
}

/// BBAN composition rule for one country
#[derive(Debug, Clone, Copy)]
struct Layout {
    country: &'static str,
    bank_len: usize,
    bank_class: CharClass,
    account_len: usize,
    account_class: CharClass,
    national: NationalRule,
}

impl Layout {
    const fn new(
        country: &'static str,
        bank_len: usize,
        bank_class: CharClass,
        account_len: usize,
        account_class: CharClass,
    ) -> Self {
        Self {
            country,
            bank_len,
            bank_class,
            account_len,
            account_class,
            national: NationalRule::None,
        }
    }

    const fn with_rule(mut self, national: NationalRule) -> Self {
        self.national = national;
        self
    }

    fn national_len(&self) -> usize {
        match self.national {
            NationalRule::None => 0,
            NationalRule::Belgium | NationalRule::France | NationalRule::Spain => 2,
        }
    }

    fn iban_len(&self) -> usize {
        4 + self.bank_len + self.account_len + self.national_len()
    }
}

use CharClass::{Alpha, Alphanumeric, Numeric};

const LAYOUTS: &[Layout] = &[
    Layout::new("AT", 5, Numeric, 11, Numeric),
    Layout::new("BE", 3, Numeric, 7, Numeric).with_rule(NationalRule::Belgium),
    Layout::new("BG", 8, Alphanumeric, 10, Alphanumeric),
    Layout::new("CH", 5, Numeric, 12, Alphanumeric),
    Layout::new("CY", 8, Numeric, 16, Alphanumeric),
    Layout::new("CZ", 4, Numeric, 16, Numeric),
    Layout::new("DE", 8, Numeric, 10, Numeric),
    Layout::new("DK", 4, Numeric, 10, Numeric),
    Layout::new("EE", 2, Numeric, 14, Numeric),
    Layout::new("ES", 8, Numeric, 10, Numeric).with_rule(NationalRule::Spain),
    Layout::new("FI", 6, Numeric, 8, Numeric),
    Layout::new("FR", 10, Numeric, 11, Alphanumeric).with_rule(NationalRule::France),
    Layout::new("GB", 10, Alphanumeric, 8, Numeric),
    Layout::new("GR", 7, Numeric, 16, Alphanumeric),
    Layout::new("HR", 7, Numeric, 10, Numeric),
    Layout::new("HU", 8, Numeric, 16, Numeric),
    Layout::new("IE", 10, Alphanumeric, 8, Numeric),
    Layout::new("IS", 4, Numeric, 18, Numeric),
    Layout::new("LI", 5, Numeric, 12, Alphanumeric),
    Layout::new("LT", 5, Numeric, 11, Numeric),
    Layout::new("LU", 3, Numeric, 13, Alphanumeric),
    Layout::new("LV", 4, Alpha, 13, Alphanumeric),
    Layout::new("MC", 10, Numeric, 11, Alphanumeric).with_rule(NationalRule::France),
    Layout::new("MT", 9, Alphanumeric, 18, Alphanumeric),
    Layout::new("NL", 4, Alpha, 10, Numeric),
    Layout::new("NO", 4, Numeric, 7, Numeric),
    Layout::new("PL", 8, Numeric, 16, Numeric),
    Layout::new("PT", 8, Numeric, 13, Numeric),
    Layout::new("RO", 4, Alpha, 16, Alphanumeric),
    Layout::new("SE", 3, Numeric, 17, Numeric),
    Layout::new("SI", 5, Numeric, 10, Numeric),
    Layout::new("SK", 4, Numeric, 16, Numeric),
];

/// Result of a successful conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbanConversion {
    /// Assembled IBAN in electronic format
    pub iban: String,
    /// Composition path taken
    pub status: ConversionStatus,
}

/// Countries the converter has a BBAN layout for
pub fn supported_countries() -> impl Iterator<Item = &'static str> {
    LAYOUTS.iter().map(|layout| layout.country)
}

/// Derive an IBAN from country code, account identifier and bank identifier
pub fn convert(country_code: &str, account_id: &str, bank_id: &str) -> Result<IbanConversion> {
    let country = iban::normalize(country_code);
    let layout = LAYOUTS
        .iter()
        .find(|layout| layout.country == country)
        .ok_or_else(|| Error::NotFound(format!("no IBAN layout for country '{}'", country)))?;

    let (bank, bank_padded) = fit(
        "bank_id",
        &iban::normalize(bank_id),
        layout.bank_len,
        layout.bank_class,
    )?;
    let (account, account_padded) = fit(
        "account_id",
        &iban::normalize(account_id),
        layout.account_len,
        layout.account_class,
    )?;

    let bban = match layout.national {
        NationalRule::None => format!("{}{}", bank, account),
        NationalRule::Belgium => format!("{}{}{}", bank, account, belgian_check(&bank, &account)?),
        NationalRule::France => format!("{}{}{}", bank, account, rib_key(&bank, &account)?),
        NationalRule::Spain => format!("{}{}{}", bank, spanish_dc(&bank, &account)?, account),
    };

    let check_digits = checksum::compute_check_digits(&country, &bban)?;
    let iban = format!("{}{}{}", country, check_digits, bban);
    debug_assert_eq!(iban.len(), layout.iban_len());

    let status = if layout.national != NationalRule::None {
        ConversionStatus::NationalCheck
    } else if bank_padded || account_padded {
        ConversionStatus::Padded
    } else {
        ConversionStatus::Direct
    };

    tracing::debug!(country = %country, status = %status, "Derived IBAN");
    Ok(IbanConversion { iban, status })
}

/// Check a component against its layout slot, zero-padding numeric input
fn fit(field: &str, value: &str, len: usize, class: CharClass) -> Result<(String, bool)> {
    if value.is_empty() {
        return Err(Error::invalid_field(field, "must not be empty"));
    }
    if let Some(bad) = value.chars().find(|c| !class.accepts(*c)) {
        return Err(Error::invalid_field(
            field,
            format!("unexpected character '{}', expected {}", bad, class.describe()),
        ));
    }
    if value.len() > len {
        return Err(Error::invalid_field(
            field,
            format!("length {} exceeds {} allowed for this country", value.len(), len),
        ));
    }
    if value.len() == len {
        return Ok((value.to_string(), false));
    }
    if class != CharClass::Numeric {
        return Err(Error::invalid_field(
            field,
            format!("must be exactly {} characters, got {}", len, value.len()),
        ));
    }
    Ok((format!("{:0>width$}", value, width = len), true))
}

fn parse_digits(field: &str, digits: &str) -> Result<u64> {
    digits
        .parse::<u64>()
        .map_err(|e| Error::invalid_field(field, format!("not a number: {}", e)))
}

/// Belgian national check: (bank ‖ account) mod 97, where 0 becomes 97
fn belgian_check(bank: &str, account: &str) -> Result<String> {
    let value = parse_digits("account_id", &format!("{}{}", bank, account))?;
    let check = match value % 97 {
        0 => 97,
        r => r,
    };
    Ok(format!("{:02}", check))
}

/// French RIB key over bank code, branch code and account number
fn rib_key(bank_and_branch: &str, account: &str) -> Result<String> {
    let (bank, branch) = bank_and_branch.split_at(5);
    let account_digits: String = account.chars().map(rib_digit).collect();

    let bank = parse_digits("bank_id", bank)?;
    let branch = parse_digits("bank_id", branch)?;
    let account = parse_digits("account_id", &account_digits)?;

    let sum = (89 * bank + 15 * branch + 3 * account) % 97;
    Ok(format!("{:02}", 97 - sum))
}

/// Letter substitution of the RIB key (A/J=1, B/K/S=2, ... I/R/Z=9)
fn rib_digit(c: char) -> char {
    match c {
        'A' | 'J' => '1',
        'B' | 'K' | 'S' => '2',
        'C' | 'L' | 'T' => '3',
        'D' | 'M' | 'U' => '4',
        'E' | 'N' | 'V' => '5',
        'F' | 'O' | 'W' => '6',
        'G' | 'P' | 'X' => '7',
        'H' | 'Q' | 'Y' => '8',
        'I' | 'R' | 'Z' => '9',
        digit => digit,
    }
}

/// Spanish "dígitos de control": one over 00 ‖ bank ‖ branch, one over account
fn spanish_dc(bank_and_branch: &str, account: &str) -> Result<String> {
    let first = mod11_digit(&format!("00{}", bank_and_branch))?;
    let second = mod11_digit(account)?;
    Ok(format!("{}{}", first, second))
}

fn mod11_digit(ten_digits: &str) -> Result<u32> {
    const WEIGHTS: [u32; 10] = [1, 2, 4, 8, 5, 10, 9, 7, 3, 6];
    let mut sum = 0;
    for (c, weight) in ten_digits.chars().zip(WEIGHTS) {
        let digit = c
            .to_digit(10)
            .ok_or_else(|| Error::invalid_field("account_id", "must be numeric"))?;
        sum += digit * weight;
    }
    Ok(match 11 - sum % 11 {
        11 => 0,
        10 => 1,
        d => d,
    })
}
