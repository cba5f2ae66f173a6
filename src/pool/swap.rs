use crate::error::{Error, MathError, PoolError};
use crate::math::checked::{self, add_ints, low_u128, sub_ints, to_int256};
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::{mul_div, unlikely};
use crate::math::swap_math::compute_swap_step;
use crate::math::tick_math::{
    get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio, MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO,
    MIN_TICK,
};
use crate::pool::tick::{next_tick, TickInfo};
use crate::pool::v3_pool::V3Pool;
use crate::Q128;
use alloy_primitives::{Address, I256, U256};
use tracing::{debug, warn};

/// Price cursor of a V3 pool.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    /// Protocol fee denominators, token0 in the low nibble and token1 in the
    /// high nibble. 0 disables the fee for that token.
    pub fee_protocol: u8,
}

#[derive(Copy, Clone, Debug)]
pub struct SwapParams {
    /// Swap direction: `true` for token0 → token1, `false` for token1 → token0.
    pub zero_for_one: bool,
    /// Signed amount being swapped. Positive means “exact in”, negative means “exact out”.
    pub amount_specified: I256,
    /// Sqrt‑price limit in Q96 that bounds how far the price is allowed to move.
    pub sqrt_price_limit_x96: U256,
}

impl SwapParams {
    #[inline]
    pub fn new(zero_for_one: bool, amount_specified: I256, sqrt_price_limit_x96: U256) -> Self {
        Self {
            zero_for_one,
            amount_specified,
            sqrt_price_limit_x96,
        }
    }

    /// Uses the loosest valid limit for the direction.
    #[inline]
    pub fn unbounded(zero_for_one: bool, amount_specified: I256) -> Self {
        let limit = if zero_for_one {
            MIN_SQRT_RATIO + U256::from(1)
        } else {
            MAX_SQRT_RATIO - U256::from(1)
        };
        Self::new(zero_for_one, amount_specified, limit)
    }
}

/// Pool-side view of a swap: positive amounts are paid into the pool,
/// negative amounts paid out to the recipient.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapResult {
    pub recipient: Address,
    pub amount0: I256,
    pub amount1: I256,
    pub sqrt_price_x96: U256,
    pub liquidity: u128,
    pub tick: i32,
    /// Total fee charged on the input token, protocol share included.
    pub fees_paid: U256,
}

// the top level state of the swap, the results of which are recorded in storage at the end
#[derive(Default)]
struct SwapState {
    // the amount remaining to be swapped in/out of the input/output asset
    amount_specified_remaining: I256,
    // the amount already swapped out/in of the output/input asset
    amount_calculated: I256,
    // current sqrt(price)
    sqrt_price_x96: U256,
    // the tick associated with the current price
    tick: i32,
    // the global fee growth of the input token
    fee_growth_global_x128: U256,
    // amount of input token paid as protocol fee
    protocol_fee: u128,
    // the current liquidity in range
    liquidity: u128,
    // accumulated swap fees
    swap_fee: U256,
}

#[derive(Default)]
struct StepComputations {
    // the price at the beginning of the step
    sqrt_price_start_x96: U256,
    // the next tick to swap to from the current tick in the swap direction
    tick_next: i32,
    // whether tickNext is initialized or not
    initialized: bool,
    // sqrt(price) for the next tick (1/0)
    sqrt_price_next_x96: U256,
    // how much is being swapped in this step
    amount_in: U256,
    // how much is being swapped out
    amount_out: U256,
    // how much fee is being paid in
    fee_amount: U256,
}

/// Everything a swap would write, computed against unchanged pool state.
struct SwapOutcome {
    result: SwapResult,
    fee_growth_global_x128: U256,
    protocol_fee: u128,
    crossed: Vec<(i32, TickInfo)>,
}

impl V3Pool {
    /// Simulates a swap against the current state without committing it.
    pub fn quote(&self, params: SwapParams) -> Result<SwapResult, Error> {
        Ok(self.compute_swap(Address::ZERO, params)?.result)
    }

    /// Executes a swap, moving the input into and the output out of the
    /// pool's ledger.
    ///
    /// Nothing is committed unless the price walk and the ledger movement
    /// both succeed.
    pub fn swap(&mut self, recipient: Address, params: SwapParams) -> Result<SwapResult, Error> {
        let outcome = self.compute_swap(recipient, params)?;
        let result = outcome.result;

        let (amount_in, amount_out) = if params.zero_for_one {
            (result.amount0.unsigned_abs(), result.amount1.unsigned_abs())
        } else {
            (result.amount1.unsigned_abs(), result.amount0.unsigned_abs())
        };
        let reserve_out = if params.zero_for_one {
            self.reserve1
        } else {
            self.reserve0
        };

        if amount_out.is_zero() {
            return Err(PoolError::InsufficientOutputAmount.into());
        }
        if amount_out >= reserve_out {
            warn!(pool = %self.name, %amount_out, %reserve_out, "swap output exceeds reserves");
            return Err(PoolError::InsufficientLiquidity.into());
        }
        if self.registry().token_pair(&self.name)?.holds_address(recipient) {
            return Err(PoolError::InvalidToAddress.into());
        }
        if amount_in.is_zero() {
            return Err(PoolError::InsufficientInputAmount.into());
        }

        let (fee_growth0, fee_growth1) = if params.zero_for_one {
            (outcome.fee_growth_global_x128, self.fee_growth_global1_x128)
        } else {
            (self.fee_growth_global0_x128, outcome.fee_growth_global_x128)
        };
        let liquidity = U256::from(result.liquidity);
        let collected_fee0 = mul_div(liquidity, fee_growth0, Q128)?;
        let collected_fee1 = mul_div(liquidity, fee_growth1, Q128)?;

        let (deposits, withdrawals) = if params.zero_for_one {
            ((amount_in, U256::ZERO), (U256::ZERO, amount_out))
        } else {
            ((U256::ZERO, amount_in), (amount_out, U256::ZERO))
        };
        let (balance0, balance1) = self.registry().settle(&self.name, deposits, withdrawals)?;

        self.slot0.sqrt_price_x96 = result.sqrt_price_x96;
        self.slot0.tick = result.tick;
        self.liquidity = result.liquidity;
        self.fee_growth_global0_x128 = fee_growth0;
        self.fee_growth_global1_x128 = fee_growth1;
        if outcome.protocol_fee > 0 {
            if params.zero_for_one {
                self.protocol_fees.token0 =
                    self.protocol_fees.token0.wrapping_add(outcome.protocol_fee);
            } else {
                self.protocol_fees.token1 =
                    self.protocol_fees.token1.wrapping_add(outcome.protocol_fee);
            }
        }
        self.ticks.extend(outcome.crossed);
        self.collected_fee0 = collected_fee0;
        self.collected_fee1 = collected_fee1;
        self.fee_history.push(if params.zero_for_one {
            (result.fees_paid, U256::ZERO)
        } else {
            (U256::ZERO, result.fees_paid)
        });
        self.sync_reserves(balance0, balance1);

        debug!(
            pool = %self.name,
            %recipient,
            amount0 = %result.amount0,
            amount1 = %result.amount1,
            sqrt_price_x96 = %result.sqrt_price_x96,
            tick = result.tick,
            liquidity = result.liquidity,
            "swap"
        );
        Ok(result)
    }

    fn compute_swap(&self, recipient: Address, params: SwapParams) -> Result<SwapOutcome, Error> {
        let amount_specified = params.amount_specified;
        if unlikely(amount_specified.is_zero()) {
            return Err(PoolError::ZeroAmountSpecified.into());
        }
        if unlikely(self.slot0.sqrt_price_x96.is_zero()) {
            return Err(PoolError::NotInitialized.into());
        }

        let zero_for_one = params.zero_for_one;
        let sqrt_price_limit_x96 = params.sqrt_price_limit_x96;
        if zero_for_one {
            if unlikely(
                (sqrt_price_limit_x96 >= self.slot0.sqrt_price_x96)
                    || (sqrt_price_limit_x96 <= MIN_SQRT_RATIO),
            ) {
                return Err(PoolError::InvalidPriceLimit.into());
            }
        } else if unlikely(
            (sqrt_price_limit_x96 <= self.slot0.sqrt_price_x96)
                || (sqrt_price_limit_x96 >= MAX_SQRT_RATIO),
        ) {
            return Err(PoolError::InvalidPriceLimit.into());
        }

        let fee_protocol = if zero_for_one {
            self.slot0.fee_protocol % 16
        } else {
            self.slot0.fee_protocol >> 4
        };
        let exact_input = amount_specified.is_positive();

        let mut state = SwapState {
            amount_specified_remaining: amount_specified,
            amount_calculated: I256::ZERO,
            sqrt_price_x96: self.slot0.sqrt_price_x96,
            tick: self.slot0.tick,
            fee_growth_global_x128: if zero_for_one {
                self.fee_growth_global0_x128
            } else {
                self.fee_growth_global1_x128
            },
            protocol_fee: 0,
            liquidity: self.liquidity,
            swap_fee: U256::ZERO,
        };
        let mut crossed = Vec::new();

        while (state.amount_specified_remaining != I256::ZERO)
            && (state.sqrt_price_x96 != sqrt_price_limit_x96)
        {
            let mut step = StepComputations {
                sqrt_price_start_x96: state.sqrt_price_x96,
                ..StepComputations::default()
            };

            (step.tick_next, step.initialized) = next_tick(&self.ticks, state.tick, zero_for_one);

            step.tick_next = step.tick_next.clamp(MIN_TICK, MAX_TICK);

            step.sqrt_price_next_x96 = get_sqrt_ratio_at_tick(step.tick_next)?;

            (
                state.sqrt_price_x96,
                step.amount_in,
                step.amount_out,
                step.fee_amount,
            ) = compute_swap_step(
                state.sqrt_price_x96,
                if zero_for_one {
                    if step.sqrt_price_next_x96 < sqrt_price_limit_x96 {
                        sqrt_price_limit_x96
                    } else {
                        step.sqrt_price_next_x96
                    }
                } else if step.sqrt_price_next_x96 > sqrt_price_limit_x96 {
                    sqrt_price_limit_x96
                } else {
                    step.sqrt_price_next_x96
                },
                state.liquidity,
                state.amount_specified_remaining,
                self.fee,
            )?;

            let amount_in_with_fee = to_int256(checked::add(step.amount_in, step.fee_amount)?)?;
            let amount_out = to_int256(step.amount_out)?;
            if exact_input {
                state.amount_specified_remaining =
                    sub_ints(state.amount_specified_remaining, amount_in_with_fee)?;
                state.amount_calculated = sub_ints(state.amount_calculated, amount_out)?;
            } else {
                state.amount_specified_remaining =
                    add_ints(state.amount_specified_remaining, amount_out)?;
                state.amount_calculated = add_ints(state.amount_calculated, amount_in_with_fee)?;
            }
            state.swap_fee = checked::add(state.swap_fee, step.fee_amount)?;

            // the protocol cut comes off the top of the step fee
            if fee_protocol > 0 {
                let delta = step.fee_amount / U256::from(fee_protocol);
                step.fee_amount -= delta;
                state.protocol_fee = state.protocol_fee.wrapping_add(low_u128(delta));
            }

            if state.liquidity > 0 {
                state.fee_growth_global_x128 = state.fee_growth_global_x128.wrapping_add(mul_div(
                    step.fee_amount,
                    Q128,
                    U256::from(state.liquidity),
                )?);
            }

            if state.sqrt_price_x96 == step.sqrt_price_next_x96 {
                if step.initialized {
                    if let Some(info) = self.ticks.get(&step.tick_next) {
                        let (info, mut liquidity_net) = if zero_for_one {
                            info.cross(state.fee_growth_global_x128, self.fee_growth_global1_x128)
                        } else {
                            info.cross(self.fee_growth_global0_x128, state.fee_growth_global_x128)
                        };
                        crossed.push((step.tick_next, info));
                        if zero_for_one {
                            liquidity_net = liquidity_net
                                .checked_neg()
                                .ok_or(MathError::LiquidityOverflow)?;
                        }
                        state.liquidity = add_delta(state.liquidity, liquidity_net)?;
                    }
                }
                state.tick = if zero_for_one {
                    step.tick_next - 1
                } else {
                    step.tick_next
                };
            } else if state.sqrt_price_x96 != step.sqrt_price_start_x96 {
                state.tick = get_tick_at_sqrt_ratio(state.sqrt_price_x96)?;
            }
        }

        let specified_used = sub_ints(amount_specified, state.amount_specified_remaining)?;
        let (amount0, amount1) = if zero_for_one == exact_input {
            (specified_used, state.amount_calculated)
        } else {
            (state.amount_calculated, specified_used)
        };

        Ok(SwapOutcome {
            result: SwapResult {
                recipient,
                amount0,
                amount1,
                sqrt_price_x96: state.sqrt_price_x96,
                liquidity: state.liquidity,
                tick: state.tick,
                fees_paid: state.swap_fee,
            },
            fee_growth_global_x128: state.fee_growth_global_x128,
            protocol_fee: state.protocol_fee,
            crossed,
        })
    }

    /// Sells exactly `amount_in` of token0.
    pub fn swap_exact_0_for_1(
        &mut self,
        recipient: Address,
        amount_in: U256,
        sqrt_price_limit_x96: Option<U256>,
    ) -> Result<SwapResult, Error> {
        self.swap_with_limit(recipient, true, to_int256(amount_in)?, sqrt_price_limit_x96)
    }

    /// Buys exactly `amount_out` of token1.
    pub fn swap_0_for_exact_1(
        &mut self,
        recipient: Address,
        amount_out: U256,
        sqrt_price_limit_x96: Option<U256>,
    ) -> Result<SwapResult, Error> {
        self.swap_with_limit(recipient, true, -to_int256(amount_out)?, sqrt_price_limit_x96)
    }

    /// Sells exactly `amount_in` of token1.
    pub fn swap_exact_1_for_0(
        &mut self,
        recipient: Address,
        amount_in: U256,
        sqrt_price_limit_x96: Option<U256>,
    ) -> Result<SwapResult, Error> {
        self.swap_with_limit(recipient, false, to_int256(amount_in)?, sqrt_price_limit_x96)
    }

    /// Buys exactly `amount_out` of token0.
    pub fn swap_1_for_exact_0(
        &mut self,
        recipient: Address,
        amount_out: U256,
        sqrt_price_limit_x96: Option<U256>,
    ) -> Result<SwapResult, Error> {
        self.swap_with_limit(recipient, false, -to_int256(amount_out)?, sqrt_price_limit_x96)
    }

    fn swap_with_limit(
        &mut self,
        recipient: Address,
        zero_for_one: bool,
        amount_specified: I256,
        sqrt_price_limit_x96: Option<U256>,
    ) -> Result<SwapResult, Error> {
        let params = match sqrt_price_limit_x96 {
            Some(limit) => SwapParams::new(zero_for_one, amount_specified, limit),
            None => SwapParams::unbounded(zero_for_one, amount_specified),
        };
        self.swap(recipient, params)
    }
}
