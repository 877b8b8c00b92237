//! Money in integer minor units with a closed currency set.
//!
//! CRITICAL: amounts are never floating point. Arithmetic happens on `i64`
//! minor units (paisa, cents, ...). `Decimal` only appears when rendering
//! an amount in major units for humans.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ISO 4217 currencies accepted by the platform.
///
/// Every currency string entering the system goes through
/// [`Currency::from_str`](std::str::FromStr), including serde input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    /// Pakistani Rupee
    Pkr,
    /// US Dollar
    Usd,
    /// Euro
    Eur,
    /// Pound Sterling
    Gbp,
    /// UAE Dirham
    Aed,
    /// Saudi Riyal
    Sar,
    /// Indian Rupee
    Inr,
    /// Japanese Yen
    Jpy,
}

/// Rejected currency input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurrencyError {
    /// Not a three-letter code.
    #[error("Malformed currency code: {0:?}")]
    Malformed(String),
    /// Well-formed but not supported.
    #[error("Unsupported currency: {0}")]
    Unsupported(String),
}

impl Currency {
    /// All supported currencies.
    pub const ALL: [Self; 8] = [
        Self::Pkr,
        Self::Usd,
        Self::Eur,
        Self::Gbp,
        Self::Aed,
        Self::Sar,
        Self::Inr,
        Self::Jpy,
    ];

    /// Returns the ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Pkr => "PKR",
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Aed => "AED",
            Self::Sar => "SAR",
            Self::Inr => "INR",
            Self::Jpy => "JPY",
        }
    }

    /// Number of decimal places between minor and major units.
    #[must_use]
    pub const fn minor_unit_exponent(self) -> u32 {
        match self {
            Self::Jpy => 0,
            _ => 2,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CurrencyError::Malformed(s.to_string()));
        }
        let code = code.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or(CurrencyError::Unsupported(code))
    }
}

impl TryFrom<String> for Currency {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

/// A monetary amount in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the smallest currency unit.
    pub amount_minor: i64,
    /// Currency of the amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a new amount.
    #[must_use]
    pub const fn new(amount_minor: i64, currency: Currency) -> Self {
        Self {
            amount_minor,
            currency,
        }
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.amount_minor > 0
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.amount_minor < 0
    }

    /// Adds two amounts of the same currency.
    ///
    /// Returns `None` on currency mismatch or overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        if self.currency != other.currency {
            return None;
        }
        self.amount_minor
            .checked_add(other.amount_minor)
            .map(|amount| Self::new(amount, self.currency))
    }

    /// Subtracts an amount of the same currency.
    ///
    /// Returns `None` on currency mismatch or overflow.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        if self.currency != other.currency {
            return None;
        }
        self.amount_minor
            .checked_sub(other.amount_minor)
            .map(|amount| Self::new(amount, self.currency))
    }

    /// The amount in major units, e.g. `250000 PKR` becomes `2500.00`.
    #[must_use]
    pub fn to_major(&self) -> Decimal {
        Decimal::new(self.amount_minor, self.currency.minor_unit_exponent())
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.currency, self.to_major())
    }
}
