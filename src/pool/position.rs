//! Liquidity positions of the V3 pool, keyed by owner and tick range.

use crate::error::{Error, PoolError};
use crate::math::checked::low_u128;
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::mul_div;
use crate::Q128;
use alloy_primitives::{Address, U256};

/// `(owner, tick_lower, tick_upper)`.
pub type PositionKey = (Address, i32, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    /// Fee growth inside the range as of the last update.
    pub fee_growth_inside0_last_x128: U256,
    pub fee_growth_inside1_last_x128: U256,
    /// Fees and burned principal waiting to be collected.
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

impl Position {
    pub fn new(owner: Address, tick_lower: i32, tick_upper: i32) -> Self {
        Self {
            owner,
            tick_lower,
            tick_upper,
            liquidity: 0,
            fee_growth_inside0_last_x128: U256::ZERO,
            fee_growth_inside1_last_x128: U256::ZERO,
            tokens_owed0: 0,
            tokens_owed1: 0,
        }
    }

    pub fn key(&self) -> PositionKey {
        (self.owner, self.tick_lower, self.tick_upper)
    }

    /// Credits the fees earned since the last update and applies
    /// `liquidity_delta`.
    ///
    /// A zero delta ("poke") on an empty position fails, there is nothing
    /// to accrue fees on.
    pub fn update(
        &mut self,
        liquidity_delta: i128,
        fee_growth_inside0_x128: U256,
        fee_growth_inside1_x128: U256,
    ) -> Result<(), Error> {
        let liquidity_next = if liquidity_delta == 0 {
            if self.liquidity == 0 {
                return Err(PoolError::NoPositionLiquidity.into());
            }
            self.liquidity
        } else {
            add_delta(self.liquidity, liquidity_delta)?
        };

        let liquidity = U256::from(self.liquidity);
        // owed amounts are truncated to 128 bits, overflow is on the owner
        let owed0 = low_u128(mul_div(
            fee_growth_inside0_x128.wrapping_sub(self.fee_growth_inside0_last_x128),
            liquidity,
            Q128,
        )?);
        let owed1 = low_u128(mul_div(
            fee_growth_inside1_x128.wrapping_sub(self.fee_growth_inside1_last_x128),
            liquidity,
            Q128,
        )?);

        if liquidity_delta != 0 {
            self.liquidity = liquidity_next;
        }
        self.fee_growth_inside0_last_x128 = fee_growth_inside0_x128;
        self.fee_growth_inside1_last_x128 = fee_growth_inside1_x128;
        if owed0 > 0 || owed1 > 0 {
            self.tokens_owed0 = self.tokens_owed0.wrapping_add(owed0);
            self.tokens_owed1 = self.tokens_owed1.wrapping_add(owed1);
        }
        Ok(())
    }
}
