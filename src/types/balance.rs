use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed monetary value in currency minor units.
///
/// Used both for stored account balances and for movement amounts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(i64);

impl Balance {
    pub const fn from_i64(value: i64) -> Self {
        Balance(value)
    }

    pub fn to_i64(&self) -> i64 {
        self.0
    }

    pub const fn zero() -> Self {
        Balance(0)
    }

    pub fn abs(&self) -> Self {
        Balance(self.0.abs())
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Balance) -> Option<Balance> {
        self.0.checked_add(other.0).map(Balance)
    }

    pub fn checked_sub(self, other: Balance) -> Option<Balance> {
        self.0.checked_sub(other.0).map(Balance)
    }
}

impl From<i64> for Balance {
    fn from(value: i64) -> Self {
        Balance(value)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
