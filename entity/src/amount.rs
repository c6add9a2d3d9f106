use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Monetary amount held as integer cents.
///
/// The backend stores amounts as JSON numbers but older records carry them as
/// numeric strings, so both are accepted. Serialises back as a decimal number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAmount", into = "f64")]
pub struct Amount(i64);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("`{0}` is not a number")]
    NotNumeric(String),
    #[error("amount is out of range")]
    OutOfRange,
    #[error("amount must be greater than zero")]
    NotPositive,
}

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn from_major(value: f64) -> Result<Self, AmountError> {
        let cents = (value * 100.0).round();
        if !cents.is_finite() || cents.abs() > i64::MAX as f64 {
            return Err(AmountError::OutOfRange);
        }
        Ok(Self(cents as i64))
    }

    pub fn as_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Parse user input that must describe a strictly positive amount.
    pub fn parse_positive(input: &str) -> Result<Self, AmountError> {
        let amount: Amount = input.parse()?;
        if amount.is_positive() {
            Ok(amount)
        } else {
            Err(AmountError::NotPositive)
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = trimmed
            .parse::<f64>()
            .map_err(|_| AmountError::NotNumeric(trimmed.to_string()))?;
        if value.is_nan() {
            return Err(AmountError::NotNumeric(trimmed.to_string()));
        }
        Self::from_major(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.copied().sum()
    }
}

impl From<Amount> for f64 {
    fn from(value: Amount) -> Self {
        value.as_major()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
    Null(()),
}

impl TryFrom<RawAmount> for Amount {
    type Error = AmountError;

    fn try_from(value: RawAmount) -> Result<Self, Self::Error> {
        match value {
            RawAmount::Number(n) => Amount::from_major(n),
            RawAmount::Text(s) if s.trim().is_empty() => Ok(Amount::ZERO),
            RawAmount::Text(s) => s.parse(),
            RawAmount::Null(()) => Ok(Amount::ZERO),
        }
    }
}
