//! Human-readable invoice numbers: `INV-<YYYYMMDD>-<XXXXX>`.
//!
//! The suffix draws from a 32-symbol alphabet without look-alikes
//! (no `0/O`, `1/I`). Uniqueness is enforced by the store; callers retry
//! issuance with a fresh number on conflict.

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::InvoiceError;

/// Number prefix.
pub const NUMBER_PREFIX: &str = "INV";

/// Length of the random suffix.
pub const SUFFIX_LEN: usize = 5;

const SUFFIX_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// A validated invoice number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    /// Generates a number for the given issue date using the thread RNG.
    #[must_use]
    pub fn generate(date: NaiveDate) -> Self {
        Self::generate_with(date, &mut rand::rng())
    }

    /// Generates a number with a caller-supplied RNG.
    pub fn generate_with<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> Self {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from(SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())]))
            .collect();
        Self(format!("{NUMBER_PREFIX}-{}-{suffix}", date.format("%Y%m%d")))
    }

    /// Parses and validates a stored number.
    pub fn parse(s: &str) -> Result<Self, InvoiceError> {
        let invalid = || InvoiceError::InvalidNumber(s.to_string());

        let mut parts = s.split('-');
        let (Some(prefix), Some(date), Some(suffix), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        if prefix != NUMBER_PREFIX
            || date.len() != 8
            || NaiveDate::parse_from_str(date, "%Y%m%d").is_err()
            || suffix.len() != SUFFIX_LEN
            || !suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b))
        {
            return Err(invalid());
        }

        Ok(Self(s.to_string()))
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the number.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
