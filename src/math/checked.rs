//! Overflow-checked integer arithmetic.
//!
//! Pool bookkeeping never wraps silently: every add/sub/mul/div on amounts
//! and reserves goes through these helpers and fails with a `MathError`
//! instead.

use crate::error::MathError;
use alloy_primitives::{I256, U256};

#[inline]
pub fn add(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_add(b).ok_or(MathError::ArithmeticOverflow)
}

#[inline]
pub fn sub(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_sub(b).ok_or(MathError::ArithmeticUnderflow)
}

#[inline]
pub fn mul(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_mul(b).ok_or(MathError::ArithmeticOverflow)
}

#[inline]
pub fn div(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_div(b).ok_or(MathError::DivisionByZero)
}

/// Signed addition; the error kind follows the direction of `b`.
#[inline]
pub fn add_ints(a: I256, b: I256) -> Result<I256, MathError> {
    a.checked_add(b).ok_or(if b.is_negative() {
        MathError::ArithmeticUnderflow
    } else {
        MathError::ArithmeticOverflow
    })
}

#[inline]
pub fn sub_ints(a: I256, b: I256) -> Result<I256, MathError> {
    a.checked_sub(b).ok_or(if b.is_negative() {
        MathError::ArithmeticOverflow
    } else {
        MathError::ArithmeticUnderflow
    })
}

/// Reinterprets an unsigned amount as signed, failing above `I256::MAX`.
#[inline]
pub fn to_int256(x: U256) -> Result<I256, MathError> {
    if x > I256::MAX.into_raw() {
        return Err(MathError::ArithmeticOverflow);
    }
    Ok(I256::from_raw(x))
}

/// Narrows to `u128`, failing if any of the upper 128 bits are set.
#[inline]
pub fn to_uint128(x: U256) -> Result<u128, MathError> {
    if x.bit_len() > 128 {
        return Err(MathError::ArithmeticOverflow);
    }
    Ok(low_u128(x))
}

/// Lower 128 bits of `x` (Solidity's `uint128(x)` truncation).
#[inline]
pub fn low_u128(x: U256) -> u128 {
    let limbs = x.as_limbs();
    (limbs[0] as u128) | ((limbs[1] as u128) << 64)
}
