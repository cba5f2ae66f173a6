//! Concentrated-liquidity pool with Uniswap V3 tick and fee accounting.
//!
//! Liquidity is provided over tick ranges. The pool keeps the price cursor
//! in [`Slot0`], the initialized ticks in an ordered map and one
//! [`Position`] per `(owner, tick_lower, tick_upper)`. Real token balances
//! live in the registry ledger and are mirrored in `reserve0`/`reserve1`.

use crate::config::ExchangeData;
use crate::error::{Error, PoolError};
use crate::math::checked::to_uint128;
use crate::math::liquidity_math::{add_delta, to_delta};
use crate::math::math_helpers::{mul_div, sqrt};
use crate::math::precision::{to_human, x96_to_f64};
use crate::math::sqrt_price_math::{get_amount_0_delta, get_amount_1_delta};
use crate::math::tick_math::{get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio, MAX_TICK, MIN_TICK};
use crate::pool::position::{Position, PositionKey};
use crate::pool::registry::RegistryHandle;
use crate::pool::swap::Slot0;
use crate::pool::tick::{
    get_fee_growth_inside, next_tick, tick_spacing_to_max_liquidity_per_tick, TickInfo,
};
use crate::pool::Exchange;
use crate::FastMap;
use alloy_primitives::{Address, I256, U256};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

const Q192: U256 = U256::from_limbs([0, 0, 0, 1]);

/// Protocol fees accrued per token, in token units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolFees {
    pub token0: u128,
    pub token1: u128,
}

#[derive(Debug, Clone)]
pub struct V3Pool {
    pub name: String,
    pub symbol: String,
    pub address: Address,
    pub token0: String,
    pub token1: String,
    pub decimals: u8,
    /// Swap fee in hundredths of a bip.
    pub fee: u32,
    pub tick_spacing: i32,
    pub max_liquidity_per_tick: u128,
    pub slot0: Slot0,
    /// Liquidity in range at the current tick.
    pub liquidity: u128,
    pub fee_growth_global0_x128: U256,
    pub fee_growth_global1_x128: U256,
    pub protocol_fees: ProtocolFees,
    pub ticks: BTreeMap<i32, TickInfo>,
    pub positions: FastMap<PositionKey, Position>,
    pub reserve0: U256,
    pub reserve1: U256,
    /// In-range liquidity times global fee growth, refreshed after each swap.
    pub collected_fee0: U256,
    pub collected_fee1: U256,
    /// `(token0, token1)` swap fee paid by each committed swap, protocol
    /// share included.
    pub fee_history: Vec<(U256, U256)>,
    pub last_liquidity_deposit: u128,
    registry: RegistryHandle,
}

/// Staged effect of a position change, applied only once every check
/// passed.
struct PositionChange {
    position: Position,
    lower: (i32, Option<TickInfo>),
    upper: (i32, Option<TickInfo>),
    liquidity: u128,
    amount0: I256,
    amount1: I256,
}

impl V3Pool {
    pub fn new(registry: RegistryHandle, data: &ExchangeData) -> Self {
        Self {
            name: data.pool_name(),
            symbol: data.symbol.clone(),
            address: data.address,
            token0: data.token0.name.clone(),
            token1: data.token1.name.clone(),
            decimals: data.decimals,
            fee: data.fee,
            tick_spacing: data.tick_spacing,
            max_liquidity_per_tick: tick_spacing_to_max_liquidity_per_tick(data.tick_spacing),
            slot0: Slot0::default(),
            liquidity: 0,
            fee_growth_global0_x128: U256::ZERO,
            fee_growth_global1_x128: U256::ZERO,
            protocol_fees: ProtocolFees::default(),
            ticks: BTreeMap::new(),
            positions: FastMap::default(),
            reserve0: U256::ZERO,
            reserve1: U256::ZERO,
            collected_fee0: U256::ZERO,
            collected_fee1: U256::ZERO,
            fee_history: Vec::new(),
            last_liquidity_deposit: 0,
            registry,
        }
    }

    pub fn registry(&self) -> &RegistryHandle {
        &self.registry
    }

    pub fn position(&self, owner: Address, tick_lower: i32, tick_upper: i32) -> Option<&Position> {
        self.positions.get(&(owner, tick_lower, tick_upper))
    }

    fn is_token0(&self, token: &str) -> Result<bool, PoolError> {
        if token == self.token0 {
            Ok(true)
        } else if token == self.token1 {
            Ok(false)
        } else {
            Err(PoolError::InvalidToken(token.to_string()))
        }
    }

    /// Sets the starting price. Allowed once.
    pub fn initialize(&mut self, sqrt_price_x96: U256) -> Result<(), Error> {
        if !self.slot0.sqrt_price_x96.is_zero() {
            return Err(PoolError::AlreadyInitialized.into());
        }
        let tick = get_tick_at_sqrt_ratio(sqrt_price_x96)?;
        self.slot0 = Slot0 {
            sqrt_price_x96,
            tick,
            fee_protocol: 0,
        };
        info!(pool = %self.name, %sqrt_price_x96, tick, "initialized pool");
        Ok(())
    }

    /// `tick_lower < tick_upper`, both inside `[MIN_TICK, MAX_TICK]`.
    pub fn check_ticks(tick_lower: i32, tick_upper: i32) -> Result<(), PoolError> {
        if tick_lower >= tick_upper || tick_lower < MIN_TICK || tick_upper > MAX_TICK {
            return Err(PoolError::InvalidTickRange(tick_lower, tick_upper));
        }
        Ok(())
    }

    /// Nearest initialized tick left of (or at) `tick` when `lte`, right of
    /// it otherwise. See [`next_tick`].
    pub fn next_tick(&self, tick: i32, lte: bool) -> (i32, bool) {
        next_tick(&self.ticks, tick, lte)
    }

    /// Sets the protocol's share of swap fees as `1/fee` per token, 0 to
    /// disable. Returns `(old0, old1, new0, new1)`.
    pub fn set_fee_protocol(&mut self, fee0: u8, fee1: u8) -> Result<(u8, u8, u8, u8), Error> {
        let valid = |fee: u8| fee == 0 || (4..=10).contains(&fee);
        if !valid(fee0) || !valid(fee1) {
            return Err(PoolError::InvalidFeeProtocol(fee0, fee1).into());
        }
        let old = self.slot0.fee_protocol;
        self.slot0.fee_protocol = fee0 + (fee1 << 4);
        info!(pool = %self.name, fee0, fee1, "protocol fee set");
        Ok((old % 16, old >> 4, fee0, fee1))
    }

    fn tick_or_default(&self, tick: i32) -> TickInfo {
        self.ticks.get(&tick).copied().unwrap_or_default()
    }

    fn modify_position(
        &self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
    ) -> Result<PositionChange, Error> {
        Self::check_ticks(tick_lower, tick_upper)?;
        if self.slot0.sqrt_price_x96.is_zero() {
            return Err(PoolError::NotInitialized.into());
        }
        let tick = self.slot0.tick;

        let mut lower = self.tick_or_default(tick_lower);
        let mut upper = self.tick_or_default(tick_upper);
        let mut flipped_lower = false;
        let mut flipped_upper = false;
        if liquidity_delta != 0 {
            (lower, flipped_lower) = lower.update(
                tick_lower,
                tick,
                liquidity_delta,
                self.fee_growth_global0_x128,
                self.fee_growth_global1_x128,
                false,
                self.max_liquidity_per_tick,
            )?;
            (upper, flipped_upper) = upper.update(
                tick_upper,
                tick,
                liquidity_delta,
                self.fee_growth_global0_x128,
                self.fee_growth_global1_x128,
                true,
                self.max_liquidity_per_tick,
            )?;
            for (index, flipped) in [(tick_lower, flipped_lower), (tick_upper, flipped_upper)] {
                if flipped && index % self.tick_spacing != 0 {
                    return Err(PoolError::TickNotSpaced(index).into());
                }
            }
        }

        let (fee_growth_inside0, fee_growth_inside1) = get_fee_growth_inside(
            &lower,
            &upper,
            tick_lower,
            tick_upper,
            tick,
            self.fee_growth_global0_x128,
            self.fee_growth_global1_x128,
        );

        let mut position = self
            .position(owner, tick_lower, tick_upper)
            .copied()
            .unwrap_or_else(|| Position::new(owner, tick_lower, tick_upper));
        position.update(liquidity_delta, fee_growth_inside0, fee_growth_inside1)?;

        // a burn that empties a tick removes it from the map
        let clear = liquidity_delta < 0;
        let lower_entry = (!(clear && flipped_lower)).then_some(lower);
        let upper_entry = (!(clear && flipped_upper)).then_some(upper);

        let mut liquidity = self.liquidity;
        let (mut amount0, mut amount1) = (I256::ZERO, I256::ZERO);
        if liquidity_delta != 0 {
            let sqrt_lower = get_sqrt_ratio_at_tick(tick_lower)?;
            let sqrt_upper = get_sqrt_ratio_at_tick(tick_upper)?;
            if tick < tick_lower {
                amount0 = get_amount_0_delta(sqrt_lower, sqrt_upper, liquidity_delta)?;
            } else if tick < tick_upper {
                amount0 =
                    get_amount_0_delta(self.slot0.sqrt_price_x96, sqrt_upper, liquidity_delta)?;
                amount1 =
                    get_amount_1_delta(sqrt_lower, self.slot0.sqrt_price_x96, liquidity_delta)?;
                liquidity = add_delta(liquidity, liquidity_delta)?;
            } else {
                amount1 = get_amount_1_delta(sqrt_lower, sqrt_upper, liquidity_delta)?;
            }
        }

        Ok(PositionChange {
            position,
            lower: (tick_lower, lower_entry),
            upper: (tick_upper, upper_entry),
            liquidity,
            amount0,
            amount1,
        })
    }

    fn apply(&mut self, change: PositionChange) {
        for (index, entry) in [change.lower, change.upper] {
            match entry {
                Some(info) => {
                    self.ticks.insert(index, info);
                }
                None => {
                    self.ticks.remove(&index);
                }
            }
        }
        self.positions.insert(change.position.key(), change.position);
        self.liquidity = change.liquidity;
    }

    /// Adds `amount` of liquidity to `owner`'s position over
    /// `[tick_lower, tick_upper]` and deposits the tokens it requires.
    pub fn mint(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(U256, U256), Error> {
        if amount == 0 {
            return Err(PoolError::ZeroLiquidity.into());
        }
        let change = self.modify_position(owner, tick_lower, tick_upper, to_delta(amount)?)?;
        let amount0 = change.amount0.unsigned_abs();
        let amount1 = change.amount1.unsigned_abs();

        let (balance0, balance1) =
            self.registry
                .settle(&self.name, (amount0, amount1), (U256::ZERO, U256::ZERO))?;
        self.apply(change);
        self.last_liquidity_deposit = amount;
        self.sync_reserves(balance0, balance1);

        debug!(pool = %self.name, %owner, tick_lower, tick_upper, amount, %amount0, %amount1, "mint");
        Ok((amount0, amount1))
    }

    /// Removes `amount` of liquidity from `owner`'s position. The freed
    /// tokens and any accrued fees become collectable; nothing leaves the
    /// pool until [`V3Pool::collect`].
    ///
    /// A zero `amount` only realizes accrued fees into `tokens_owed`.
    pub fn burn(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(U256, U256), Error> {
        if self.position(owner, tick_lower, tick_upper).is_none() {
            return Err(PoolError::PositionNotFound.into());
        }
        let delta = to_delta(amount)?
            .checked_neg()
            .ok_or(PoolError::InsufficientLiquidityBurned)?;
        let mut change = self.modify_position(owner, tick_lower, tick_upper, delta)?;
        let amount0 = change.amount0.unsigned_abs();
        let amount1 = change.amount1.unsigned_abs();

        if !amount0.is_zero() || !amount1.is_zero() {
            let position = &mut change.position;
            position.tokens_owed0 = position.tokens_owed0.wrapping_add(to_uint128(amount0)?);
            position.tokens_owed1 = position.tokens_owed1.wrapping_add(to_uint128(amount1)?);
        }
        self.apply(change);

        debug!(pool = %self.name, %owner, tick_lower, tick_upper, amount, %amount0, %amount1, "burn");
        Ok((amount0, amount1))
    }

    /// Pays out up to the requested amounts of what the position is owed.
    /// Returns `(recipient, tick_lower, tick_upper, amount0, amount1)`.
    ///
    /// Fees accrued since the position was last touched are not included;
    /// poke the position with a zero [`V3Pool::burn`] first.
    pub fn collect(
        &mut self,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(Address, i32, i32, u128, u128), Error> {
        let key = (recipient, tick_lower, tick_upper);
        let mut position = self
            .positions
            .get(&key)
            .copied()
            .ok_or(PoolError::PositionNotFound)?;

        let amount0 = amount0_requested.min(position.tokens_owed0);
        let amount1 = amount1_requested.min(position.tokens_owed1);
        position.tokens_owed0 -= amount0;
        position.tokens_owed1 -= amount1;

        let (balance0, balance1) = self.registry.settle(
            &self.name,
            (U256::ZERO, U256::ZERO),
            (U256::from(amount0), U256::from(amount1)),
        )?;
        self.positions.insert(key, position);
        self.sync_reserves(balance0, balance1);

        debug!(pool = %self.name, %recipient, tick_lower, tick_upper, amount0, amount1, "collect");
        Ok((recipient, tick_lower, tick_upper, amount0, amount1))
    }

    pub(crate) fn sync_reserves(&mut self, balance0: U256, balance1: U256) {
        self.reserve0 = balance0;
        self.reserve1 = balance1;
        debug!(pool = %self.name, reserve0 = %balance0, reserve1 = %balance1, "reserves updated");
    }

    /// Curve-implied reserve of `token` at the current price, in human
    /// units: `L / sqrtP` for token0 and `L * sqrtP` for token1.
    pub fn get_virtual_reserve(&self, token: &str) -> Result<f64, Error> {
        let is_token0 = self.is_token0(token)?;
        if self.slot0.sqrt_price_x96.is_zero() {
            return Err(PoolError::NotInitialized.into());
        }
        let liquidity = to_human(U256::from(self.liquidity), self.decimals);
        let sqrt_price = x96_to_f64(self.slot0.sqrt_price_x96);
        Ok(if is_token0 {
            liquidity / sqrt_price
        } else {
            liquidity * sqrt_price
        })
    }

    /// `sqrt(reserve1 / reserve0)` as Q64.96, floored.
    pub fn encode_price_sqrt(reserve1: U256, reserve0: U256) -> Result<U256, Error> {
        Ok(sqrt(mul_div(reserve1, Q192, reserve0)?))
    }
}

impl Exchange for V3Pool {
    fn name(&self) -> &str {
        &self.name
    }

    fn token0(&self) -> &str {
        &self.token0
    }

    fn token1(&self) -> &str {
        &self.token1
    }

    fn get_price(&self, token: &str) -> Result<Option<f64>, Error> {
        let is_token0 = self.is_token0(token)?;
        let reserve = if is_token0 { self.reserve0 } else { self.reserve1 };
        if reserve.is_zero() || self.slot0.sqrt_price_x96.is_zero() {
            return Ok(None);
        }
        let sqrt_price = x96_to_f64(self.slot0.sqrt_price_x96);
        let price = sqrt_price * sqrt_price;
        Ok(Some(if is_token0 { price } else { 1.0 / price }))
    }

    fn get_reserve(&self, token: &str) -> Result<U256, Error> {
        Ok(if self.is_token0(token)? {
            self.reserve0
        } else {
            self.reserve1
        })
    }

    fn get_liquidity(&self) -> U256 {
        U256::from(self.liquidity)
    }

    fn collected_fees(&self) -> (U256, U256) {
        (self.collected_fee0, self.collected_fee1)
    }

    fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for V3Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Exchange {} ({})", self.name, self.symbol)?;
        writeln!(
            f,
            "Real Reserves:   {} = {}, {} = {}",
            self.token0,
            to_human(self.reserve0, self.decimals),
            self.token1,
            to_human(self.reserve1, self.decimals)
        )?;
        writeln!(
            f,
            "Gross Liquidity: {}",
            to_human(U256::from(self.liquidity), self.decimals)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeeAmount;
    use crate::error::{MathError, StateError};
    use crate::math::tick_math::{max_usable_tick, min_usable_tick, MIN_SQRT_RATIO};
    use crate::pool::ledger::Token;
    use crate::pool::registry::Registry;

    fn owner() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn deploy(fee: FeeAmount) -> (Registry, V3Pool) {
        let registry = Registry::new("factory", Address::repeat_byte(0xfa));
        let pool = registry
            .deploy(ExchangeData::v3(
                Token::new("USDC", Address::repeat_byte(0x09)),
                Token::new("DAI", Address::repeat_byte(0x11)),
                "LP",
                Address::repeat_byte(0x01),
                fee,
            ))
            .unwrap()
            .into_v3()
            .unwrap();
        (registry, pool)
    }

    fn one_to_ten() -> (Registry, V3Pool) {
        let (registry, mut pool) = deploy(FeeAmount::Medium);
        let price = V3Pool::encode_price_sqrt(U256::from(1), U256::from(10)).unwrap();
        pool.initialize(price).unwrap();
        (registry, pool)
    }

    #[test]
    fn encodes_price_sqrt() {
        assert_eq!(
            V3Pool::encode_price_sqrt(U256::from(1), U256::from(1)).unwrap(),
            crate::Q96
        );
        assert_eq!(
            V3Pool::encode_price_sqrt(U256::from(1), U256::from(10)).unwrap(),
            U256::from(25054144837504793118641380156u128)
        );
        assert!(V3Pool::encode_price_sqrt(U256::from(1), U256::ZERO).is_err());
    }

    #[test]
    fn initialize_once() {
        let (_, mut pool) = deploy(FeeAmount::Medium);
        assert_eq!(pool.max_liquidity_per_tick, 11505743598341114571880798222544994);

        let price = V3Pool::encode_price_sqrt(U256::from(1), U256::from(10)).unwrap();
        pool.initialize(price).unwrap();
        assert_eq!(pool.slot0.tick, -23028);
        assert_eq!(
            pool.initialize(price),
            Err(Error::PoolError(PoolError::AlreadyInitialized))
        );
    }

    #[test]
    fn initialize_rejects_out_of_range_price() {
        let (_, mut pool) = deploy(FeeAmount::Medium);
        assert_eq!(
            pool.initialize(MIN_SQRT_RATIO - U256::from(1)),
            Err(Error::StateError(StateError::SqrtPriceOutOfBounds))
        );
        assert_eq!(pool.slot0, Slot0::default());
    }

    #[test]
    fn mint_requires_initialize() {
        let (_, mut pool) = deploy(FeeAmount::Medium);
        assert_eq!(
            pool.mint(owner(), -60, 60, 100),
            Err(Error::PoolError(PoolError::NotInitialized))
        );
    }

    #[test]
    fn check_ticks_bounds() {
        assert!(V3Pool::check_ticks(-60, 60).is_ok());
        assert_eq!(
            V3Pool::check_ticks(60, 60),
            Err(PoolError::InvalidTickRange(60, 60))
        );
        assert_eq!(
            V3Pool::check_ticks(MIN_TICK - 1, 0),
            Err(PoolError::InvalidTickRange(MIN_TICK - 1, 0))
        );
        assert_eq!(
            V3Pool::check_ticks(0, MAX_TICK + 1),
            Err(PoolError::InvalidTickRange(0, MAX_TICK + 1))
        );
    }

    #[test]
    fn mint_full_range_at_one_to_ten() {
        let (registry, mut pool) = one_to_ten();
        let (min, max) = (min_usable_tick(60), max_usable_tick(60));

        let (amount0, amount1) = pool.mint(owner(), min, max, 3161).unwrap();
        assert_eq!((amount0, amount1), (U256::from(9996), U256::from(1000)));
        assert_eq!(pool.liquidity, 3161);
        assert_eq!(pool.last_liquidity_deposit, 3161);
        assert_eq!((pool.reserve0, pool.reserve1), (U256::from(9996), U256::from(1000)));
        assert_eq!(
            registry.handle().balances("USDC-DAI").unwrap(),
            (pool.reserve0, pool.reserve1)
        );
        assert_eq!(pool.ticks.len(), 2);
        assert_eq!(pool.position(owner(), min, max).unwrap().liquidity, 3161);
    }

    #[test]
    fn mint_guards_leave_state_untouched() {
        let (registry, mut pool) = one_to_ten();

        assert_eq!(
            pool.mint(owner(), -60, 60, 0),
            Err(Error::PoolError(PoolError::ZeroLiquidity))
        );
        assert_eq!(
            pool.mint(owner(), -59, 60, 100),
            Err(Error::PoolError(PoolError::TickNotSpaced(-59)))
        );
        assert_eq!(
            pool.mint(owner(), 60, -60, 100),
            Err(Error::PoolError(PoolError::InvalidTickRange(60, -60)))
        );
        assert_eq!(
            pool.mint(owner(), -60, 60, pool.max_liquidity_per_tick + 1),
            Err(Error::MathError(MathError::LiquidityOverflow))
        );

        assert!(pool.ticks.is_empty());
        assert!(pool.positions.is_empty());
        assert_eq!(
            registry.handle().balances("USDC-DAI").unwrap(),
            (U256::ZERO, U256::ZERO)
        );
    }

    #[test]
    fn burn_clears_ticks_and_owes_tokens() {
        let (registry, mut pool) = one_to_ten();
        // the range sits above the current tick, so only token0 is needed
        let (amount0, amount1) = pool.mint(owner(), -240, 0, 10000).unwrap();
        assert_eq!((amount0, amount1), (U256::from(121), U256::ZERO));
        assert_eq!(pool.liquidity, 0);

        let (burned0, burned1) = pool.burn(owner(), -240, 0, 10000).unwrap();
        // burns round down
        assert_eq!((burned0, burned1), (U256::from(120), U256::ZERO));
        assert!(pool.ticks.is_empty());

        let position = *pool.position(owner(), -240, 0).unwrap();
        assert_eq!(position.liquidity, 0);
        assert_eq!((position.tokens_owed0, position.tokens_owed1), (120, 0));
        // the ledger is untouched until collect
        assert_eq!(
            registry.handle().balances("USDC-DAI").unwrap(),
            (U256::from(121), U256::ZERO)
        );
    }

    #[test]
    fn burn_guards() {
        let (_, mut pool) = one_to_ten();
        assert_eq!(
            pool.burn(owner(), -240, 0, 0),
            Err(Error::PoolError(PoolError::PositionNotFound))
        );

        pool.mint(owner(), -240, 0, 100).unwrap();
        assert_eq!(
            pool.burn(owner(), -240, 0, 101),
            Err(Error::MathError(MathError::LiquidityUnderflow))
        );
        pool.burn(owner(), -240, 0, 100).unwrap();
        assert_eq!(
            pool.burn(owner(), -240, 0, 0),
            Err(Error::PoolError(PoolError::NoPositionLiquidity))
        );
    }

    #[test]
    fn collect_pays_owed_up_to_request() {
        let (registry, mut pool) = one_to_ten();
        pool.mint(owner(), -240, 0, 10000).unwrap();
        pool.burn(owner(), -240, 0, 10000).unwrap();

        assert_eq!(
            pool.collect(owner(), -240, 0, 1, 0).unwrap(),
            (owner(), -240, 0, 1, 0)
        );
        assert_eq!(
            pool.collect(owner(), -240, 0, u128::MAX, u128::MAX).unwrap(),
            (owner(), -240, 0, 119, 0)
        );
        assert_eq!(pool.position(owner(), -240, 0).unwrap().tokens_owed0, 0);
        // the round-up dust stays in the pool
        assert_eq!(
            registry.handle().balances("USDC-DAI").unwrap(),
            (U256::from(1), U256::ZERO)
        );
        assert_eq!(pool.reserve0, U256::from(1));

        assert_eq!(
            pool.collect(Address::repeat_byte(0xbb), -240, 0, 1, 1),
            Err(Error::PoolError(PoolError::PositionNotFound))
        );
    }

    #[test]
    fn next_tick_through_pool() {
        let (_, mut pool) = one_to_ten();
        pool.mint(owner(), -46080, -23040, 10000).unwrap();
        assert_eq!(pool.next_tick(-23028, true), (-23040, true));
        assert_eq!(pool.next_tick(-23040, false), (MAX_TICK, false));
        assert_eq!(pool.next_tick(-46081, true), (MIN_TICK, false));
    }

    #[test]
    fn fee_protocol_values() {
        let (_, mut pool) = one_to_ten();
        assert_eq!(pool.set_fee_protocol(4, 10).unwrap(), (0, 0, 4, 10));
        assert_eq!(pool.slot0.fee_protocol, 4 + (10 << 4));
        assert_eq!(pool.set_fee_protocol(0, 6).unwrap(), (4, 10, 0, 6));
        assert_eq!(
            pool.set_fee_protocol(3, 0),
            Err(Error::PoolError(PoolError::InvalidFeeProtocol(3, 0)))
        );
        assert_eq!(
            pool.set_fee_protocol(4, 11),
            Err(Error::PoolError(PoolError::InvalidFeeProtocol(4, 11)))
        );
        assert_eq!(pool.slot0.fee_protocol, 6 << 4);
    }

    #[test]
    fn price_getters() {
        let (_, mut pool) = one_to_ten();
        assert_eq!(pool.get_price("USDC").unwrap(), None);
        assert!(pool.get_price("WETH").is_err());

        let (min, max) = (min_usable_tick(60), max_usable_tick(60));
        pool.mint(owner(), min, max, 3161).unwrap();

        let price = pool.get_price("USDC").unwrap().unwrap();
        assert!((price - 0.1).abs() < 1e-12);
        let inverse = pool.get_price("DAI").unwrap().unwrap();
        assert!((inverse - 10.0).abs() < 1e-9);

        let virtual0 = pool.get_virtual_reserve("USDC").unwrap();
        let virtual1 = pool.get_virtual_reserve("DAI").unwrap();
        // L^2 = x * y on the curve
        let l = to_human(U256::from(3161), 18);
        assert!((virtual0 * virtual1 - l * l).abs() / (l * l) < 1e-9);
        assert_eq!(pool.get_virtual_reserve("USDC").unwrap(), virtual0);

        assert_eq!(pool.get_liquidity(), U256::from(3161));
        assert_eq!(pool.get_reserve("DAI").unwrap(), U256::from(1000));

        let summary = pool.summary();
        assert!(summary.starts_with("Exchange USDC-DAI (LP)"));
        assert!(summary.contains("Real Reserves:"));
        assert!(summary.contains("Gross Liquidity:"));
    }

    #[test]
    fn virtual_reserve_needs_price() {
        let (_, pool) = deploy(FeeAmount::Low);
        assert_eq!(
            pool.get_virtual_reserve("USDC"),
            Err(Error::PoolError(PoolError::NotInitialized))
        );
    }
}
