use crate::error::MathError;

/// Applies a signed liquidity delta to an unsigned liquidity amount.
pub fn add_delta(x: u128, y: i128) -> Result<u128, MathError> {
    if y < 0 {
        x.checked_sub(y.unsigned_abs())
            .ok_or(MathError::LiquidityUnderflow)
    } else {
        x.checked_add(y as u128).ok_or(MathError::LiquidityOverflow)
    }
}

/// Signed view of a liquidity amount, for callers that carry deltas as `i128`.
pub fn to_delta(liquidity: u128) -> Result<i128, MathError> {
    i128::try_from(liquidity).map_err(|_| MathError::LiquidityOverflow)
}
