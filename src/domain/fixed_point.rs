use crate::domain::types::{SwapError, SwapResult};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw representation of 1.0 (18 implied fractional digits).
pub const SCALE: u128 = 1_000_000_000_000_000_000;

/// Rounding direction for multiplication and division.
///
/// Every call site states its direction explicitly so that value always
/// rounds against the caller and in favor of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Truncate toward zero
    Down,
    /// Round away from zero
    Up,
}

/// Scaled-integer amount with 18 implied fractional digits.
///
/// All pool balances, shares, fees, and governance values use this type.
/// Arithmetic is checked: any overflow of the 128-bit raw value surfaces as
/// [`SwapError::Overflow`] instead of wrapping or saturating. Products and
/// quotients widen to 256 bits internally, so intermediate overflow cannot
/// occur for any pair of representable operands.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Fixed(pub u128);

impl Fixed {
    /// The value 1.0.
    pub const ONE: Fixed = Fixed(SCALE);

    /// Creates a zero amount
    pub fn zero() -> Self {
        Fixed(0)
    }

    /// The value 1.0
    pub fn one() -> Self {
        Self::ONE
    }

    /// Converts a whole number of units
    pub fn from_int(value: u64) -> Self {
        Fixed(value as u128 * SCALE)
    }

    /// Wraps a raw 18-decimal value
    pub fn from_raw(raw: u128) -> Self {
        Fixed(raw)
    }

    /// Returns the raw 18-decimal value
    pub fn raw(self) -> u128 {
        self.0
    }

    /// Returns true if the amount is zero
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, rhs: Fixed) -> SwapResult<Fixed> {
        self.0
            .checked_add(rhs.0)
            .map(Fixed)
            .ok_or(SwapError::Overflow)
    }

    /// Checked subtraction; underflow is an overflow error
    pub fn checked_sub(self, rhs: Fixed) -> SwapResult<Fixed> {
        self.0
            .checked_sub(rhs.0)
            .map(Fixed)
            .ok_or(SwapError::Overflow)
    }

    /// Multiplies two scaled values with the given rounding direction.
    pub fn mul(self, rhs: Fixed, rounding: Rounding) -> SwapResult<Fixed> {
        let product = U256::from(self.0) * U256::from(rhs.0);
        let scale = U256::from(SCALE);
        let quotient = match rounding {
            Rounding::Down => product / scale,
            Rounding::Up => {
                if product.is_zero() {
                    U256::zero()
                } else {
                    (product + scale - U256::one()) / scale
                }
            }
        };
        narrow(quotient)
    }

    /// Divides two scaled values with the given rounding direction.
    pub fn div(self, rhs: Fixed, rounding: Rounding) -> SwapResult<Fixed> {
        if rhs.is_zero() {
            return Err(SwapError::Overflow);
        }
        let numerator = U256::from(self.0) * U256::from(SCALE);
        let divisor = U256::from(rhs.0);
        let quotient = match rounding {
            Rounding::Down => numerator / divisor,
            Rounding::Up => {
                if numerator.is_zero() {
                    U256::zero()
                } else {
                    (numerator + divisor - U256::one()) / divisor
                }
            }
        };
        narrow(quotient)
    }

    /// Computes `self * numerator / denominator` without intermediate
    /// precision loss.
    ///
    /// This is the primitive behind decay interpolation and proportional
    /// share accounting, where the ratio itself is not representable.
    pub fn mul_div(self, numerator: Fixed, denominator: Fixed, rounding: Rounding) -> SwapResult<Fixed> {
        if denominator.is_zero() {
            return Err(SwapError::Overflow);
        }
        let product = U256::from(self.0) * U256::from(numerator.0);
        let divisor = U256::from(denominator.0);
        let quotient = match rounding {
            Rounding::Down => product / divisor,
            Rounding::Up => {
                if product.is_zero() {
                    U256::zero()
                } else {
                    (product + divisor - U256::one()) / divisor
                }
            }
        };
        narrow(quotient)
    }

    /// Square root in scaled space: `sqrt(2.25) == 1.5`.
    pub fn sqrt(self) -> Fixed {
        // sqrt(raw / 1e18) * 1e18 == isqrt(raw * 1e18); the widened product
        // always fits 256 bits, and the root always fits 128.
        let widened = U256::from(self.0) * U256::from(SCALE);
        Fixed(isqrt(widened).low_u128())
    }

    /// Returns `1 - self` for values in the unit interval.
    pub fn complement(self) -> SwapResult<Fixed> {
        Self::ONE.checked_sub(self)
    }

    /// Whole-unit part, truncated
    pub fn to_int(self) -> u128 {
        self.0 / SCALE
    }
}

fn narrow(value: U256) -> SwapResult<Fixed> {
    if value.bits() > 128 {
        return Err(SwapError::Overflow);
    }
    Ok(Fixed(value.low_u128()))
}

/// Babylonian integer square root over 256 bits.
pub(crate) fn isqrt(value: U256) -> U256 {
    if value.is_zero() {
        return U256::zero();
    }
    let mut x = value;
    let mut y = (value >> 1) + U256::one();
    while y < x {
        x = y;
        y = (y + value / y) >> 1;
    }
    x
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE;
        let frac = self.0 % SCALE;
        if frac == 0 {
            write!(f, "{whole}")
        } else {
            let digits = format!("{frac:018}");
            write!(f, "{whole}.{}", digits.trim_end_matches('0'))
        }
    }
}

impl FromStr for Fixed {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SwapError::Parse(format!("invalid amount: {s:?}"));
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if frac.len() > 18 {
            return Err(invalid());
        }
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac_raw: u128 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<18}");
            padded.parse().map_err(|_| invalid())?
        };
        whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(frac_raw))
            .map(Fixed)
            .ok_or(SwapError::Overflow)
    }
}
