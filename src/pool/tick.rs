//! Per-tick liquidity and fee-growth bookkeeping for the V3 pool.
//!
//! Ticks live in an ordered map keyed by tick index and only while some
//! position references them (`liquidity_gross > 0`). All updates here return
//! new values instead of mutating in place, so the pool can stage a whole
//! operation and commit it at the end.

use crate::error::{Error, MathError};
use crate::math::liquidity_math::add_delta;
use crate::math::tick_math::{max_usable_tick, min_usable_tick, MAX_TICK, MIN_TICK};
use alloy_primitives::U256;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInfo {
    /// Total position liquidity referencing this tick.
    pub liquidity_gross: u128,
    /// Liquidity added when the tick is crossed left to right.
    pub liquidity_net: i128,
    /// Fee growth per unit of liquidity on the other side of the tick,
    /// relative to the current tick.
    pub fee_growth_outside0_x128: U256,
    pub fee_growth_outside1_x128: U256,
}

impl TickInfo {
    /// Applies `liquidity_delta` to the tick. Returns the updated tick and
    /// whether it flipped between initialized and uninitialized.
    ///
    /// A tick initialized at or below the current tick assumes all fee
    /// growth so far happened below it.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &self,
        tick: i32,
        tick_current: i32,
        liquidity_delta: i128,
        fee_growth_global0_x128: U256,
        fee_growth_global1_x128: U256,
        upper: bool,
        max_liquidity: u128,
    ) -> Result<(TickInfo, bool), Error> {
        let gross_before = self.liquidity_gross;
        let gross_after = add_delta(gross_before, liquidity_delta)?;
        if gross_after > max_liquidity {
            return Err(MathError::LiquidityOverflow.into());
        }

        let flipped = (gross_after == 0) != (gross_before == 0);

        let mut info = *self;
        if gross_before == 0 && tick <= tick_current {
            info.fee_growth_outside0_x128 = fee_growth_global0_x128;
            info.fee_growth_outside1_x128 = fee_growth_global1_x128;
        }
        info.liquidity_gross = gross_after;
        info.liquidity_net = if upper {
            self.liquidity_net.checked_sub(liquidity_delta)
        } else {
            self.liquidity_net.checked_add(liquidity_delta)
        }
        .ok_or(MathError::ArithmeticOverflow)?;

        Ok((info, flipped))
    }

    /// Flips the fee-growth frame of reference when the price moves across
    /// the tick. Returns the crossed tick and its `liquidity_net`.
    pub fn cross(
        &self,
        fee_growth_global0_x128: U256,
        fee_growth_global1_x128: U256,
    ) -> (TickInfo, i128) {
        let info = TickInfo {
            fee_growth_outside0_x128: fee_growth_global0_x128
                .wrapping_sub(self.fee_growth_outside0_x128),
            fee_growth_outside1_x128: fee_growth_global1_x128
                .wrapping_sub(self.fee_growth_outside1_x128),
            ..*self
        };
        (info, self.liquidity_net)
    }
}

/// Largest gross liquidity a single tick may carry so that the sum over
/// every usable tick still fits in a `u128`.
pub fn tick_spacing_to_max_liquidity_per_tick(tick_spacing: i32) -> u128 {
    let num_ticks = ((max_usable_tick(tick_spacing) - min_usable_tick(tick_spacing))
        / tick_spacing) as u128
        + 1;
    u128::MAX / num_ticks
}

/// Fee growth per unit of liquidity inside `[tick_lower, tick_upper]`.
///
/// Wrapping arithmetic is intentional: only differences between two
/// snapshots of this value are meaningful.
#[allow(clippy::too_many_arguments)]
pub fn get_fee_growth_inside(
    lower: &TickInfo,
    upper: &TickInfo,
    tick_lower: i32,
    tick_upper: i32,
    tick_current: i32,
    fee_growth_global0_x128: U256,
    fee_growth_global1_x128: U256,
) -> (U256, U256) {
    let (below0, below1) = if tick_current >= tick_lower {
        (lower.fee_growth_outside0_x128, lower.fee_growth_outside1_x128)
    } else {
        (
            fee_growth_global0_x128.wrapping_sub(lower.fee_growth_outside0_x128),
            fee_growth_global1_x128.wrapping_sub(lower.fee_growth_outside1_x128),
        )
    };

    let (above0, above1) = if tick_current < tick_upper {
        (upper.fee_growth_outside0_x128, upper.fee_growth_outside1_x128)
    } else {
        (
            fee_growth_global0_x128.wrapping_sub(upper.fee_growth_outside0_x128),
            fee_growth_global1_x128.wrapping_sub(upper.fee_growth_outside1_x128),
        )
    };

    (
        fee_growth_global0_x128
            .wrapping_sub(below0)
            .wrapping_sub(above0),
        fee_growth_global1_x128
            .wrapping_sub(below1)
            .wrapping_sub(above1),
    )
}

/// Nearest initialized tick from `tick` in one direction.
///
/// With `lte` the search includes `tick` itself and moves left, otherwise it
/// starts strictly right of `tick`. When nothing is initialized in that
/// direction the domain boundary comes back with `initialized = false`.
pub fn next_tick(ticks: &BTreeMap<i32, TickInfo>, tick: i32, lte: bool) -> (i32, bool) {
    if lte {
        match ticks.range(..=tick).next_back() {
            Some((&next, _)) => (next, true),
            None => (MIN_TICK, false),
        }
    } else {
        match tick.checked_add(1).and_then(|start| ticks.range(start..).next()) {
            Some((&next, _)) => (next, true),
            None => (MAX_TICK, false),
        }
    }
}
