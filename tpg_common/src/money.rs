use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Neg, Sub, SubAssign},
};

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CURRENCY_CODE: &str = "UZS";
pub const TIYIN_PER_SUM: i64 = 100;

//--------------------------------------       Tiyin         ---------------------------------------------------------
/// An amount in the minor currency unit. Payme reports and expects all amounts in tiyin.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Tiyin(i64);

op!(binary Tiyin, Add, add);
op!(binary Tiyin, Sub, sub);
op!(inplace Tiyin, SubAssign, sub_assign);
op!(unary Tiyin, Neg, neg);

impl Sum for Tiyin {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in tiyin: {0}")]
pub struct TiyinConversionError(String);

impl From<i64> for Tiyin {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Tiyin {
    type Error = TiyinConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| TiyinConversionError(format!("Value {value} is too large to convert to Tiyin")))
    }
}

impl TryFrom<Decimal> for Tiyin {
    type Error = TiyinConversionError;

    /// Converts an amount in sum into tiyin. Fractions of a tiyin are truncated.
    fn try_from(sum: Decimal) -> Result<Self, Self::Error> {
        sum_to_tiyin(sum)
    }
}

impl Display for Tiyin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {CURRENCY_CODE}", self.to_sum())
    }
}

impl Tiyin {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_sum(sum: i64) -> Self {
        Self(sum * TIYIN_PER_SUM)
    }

    /// The same amount in the major unit.
    pub fn to_sum(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

/// Converts an amount in sum (the major unit that orders are priced in) to tiyin.
/// Fractions of a tiyin are truncated.
pub fn sum_to_tiyin(sum: Decimal) -> Result<Tiyin, TiyinConversionError> {
    sum.checked_mul(Decimal::from(TIYIN_PER_SUM))
        .and_then(|t| t.trunc().to_i64())
        .map(Tiyin)
        .ok_or_else(|| TiyinConversionError(format!("{sum} sum is out of range")))
}
