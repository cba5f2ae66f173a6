//! Conversions between machine units and human-readable amounts.
//!
//! Amounts live in the pools as integers scaled by the token's `decimals`.
//! Floats only show up at the edges: reporting, prices and slippage
//! tolerances expressed in decimal places.

use crate::error::MathError;
use crate::math::checked::low_u128;
use crate::Q96;
use alloy_primitives::U256;

const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// `10^exp` as a `U256`. Saturates for exponents past 77.
pub fn pow10(exp: u8) -> U256 {
    U256::from(10u64).saturating_pow(U256::from(exp))
}

/// Lossy conversion to `f64`. Exact rounding up to 128 bits, limb-wise above.
pub fn u256_to_f64(x: U256) -> f64 {
    if x.bit_len() <= 128 {
        return low_u128(x) as f64;
    }
    x.as_limbs()
        .iter()
        .rev()
        .fold(0.0, |acc, &limb| acc * TWO_POW_64 + limb as f64)
}

/// A Q64.96 fixed point value as `f64`.
pub fn x96_to_f64(x: U256) -> f64 {
    u256_to_f64(x) / u256_to_f64(Q96)
}

pub fn to_human(amount: U256, decimals: u8) -> f64 {
    u256_to_f64(amount) / 10f64.powi(decimals as i32)
}

/// Scales a human amount to machine units, rounding to the nearest unit.
pub fn to_machine(value: f64, decimals: u8) -> Result<U256, MathError> {
    if !value.is_finite() {
        return Err(MathError::Overflow);
    }
    if value < 0.0 {
        return Err(MathError::Underflow);
    }
    let scaled = (value * 10f64.powi(decimals as i32)).round();
    U256::try_from(scaled).map_err(|_| MathError::Overflow)
}

/// Rounds a machine amount half-up to `places` decimal places of its human
/// value, keeping the result in machine units.
///
/// With 18 decimals, `places = 5` keeps the first five fractional digits,
/// which is what tolerance checks such as `round(x, 5) >= round(y, 5)` need.
pub fn round_to_places(amount: U256, decimals: u8, places: u8) -> U256 {
    if places >= decimals {
        return amount;
    }
    let unit = pow10(decimals - places);
    let quotient = amount / unit;
    let remainder = amount % unit;
    let rounded = if remainder >= unit - remainder {
        quotient.saturating_add(U256::from(1))
    } else {
        quotient
    };
    rounded.saturating_mul(unit)
}
