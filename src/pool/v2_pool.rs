//! Constant-product pool with Uniswap V2 fee arithmetic.
//!
//! Reserves mirror the pool's ledger balances and are re-read after every
//! mutation. Every operation computes its full effect first and only then
//! settles the ledger, so a failed call leaves both untouched.

use crate::config::ExchangeData;
use crate::error::{Error, PoolError};
use crate::math::checked;
use crate::math::math_helpers::{mul_div, sqrt};
use crate::math::precision::{round_to_places, to_human, u256_to_f64};
use crate::pool::registry::RegistryHandle;
use crate::pool::Exchange;
use crate::{FastMap, U256_E3};
use alloy_primitives::{Address, U256, U512};
use std::fmt;
use tracing::{debug, warn};

/// Share amount locked forever on the first deposit.
pub const MINIMUM_LIQUIDITY: U256 = U256::from_limbs([1000, 0, 0, 0]);
/// Holder of the locked minimum liquidity.
pub const BURN_ADDRESS: Address = Address::ZERO;

const FEE_NUMERATOR: U256 = U256::from_limbs([997, 0, 0, 0]);
const FEE_TAKEN: U256 = U256::from_limbs([3, 0, 0, 0]);

/// Decimal places compared by slippage minimums.
const SLIPPAGE_PLACES: u8 = 5;
/// Decimal places compared when reconciling a mint against the ledger.
const MINT_PLACES: u8 = 3;

#[derive(Debug, Clone)]
pub struct V2Pool {
    pub name: String,
    pub symbol: String,
    pub address: Address,
    pub token0: String,
    pub token1: String,
    pub decimals: u8,
    pub reserve0: U256,
    pub reserve1: U256,
    pub total_supply: U256,
    pub liquidity_providers: FastMap<Address, U256>,
    pub last_liquidity_deposit: U256,
    pub collected_fee0: U256,
    pub collected_fee1: U256,
    /// `(token0, token1)` fee taken by each committed swap, oldest first.
    pub fee_history: Vec<(U256, U256)>,
    registry: RegistryHandle,
}

impl V2Pool {
    pub fn new(registry: RegistryHandle, data: &ExchangeData) -> Self {
        Self {
            name: data.pool_name(),
            symbol: data.symbol.clone(),
            address: data.address,
            token0: data.token0.name.clone(),
            token1: data.token1.name.clone(),
            decimals: data.decimals,
            reserve0: U256::ZERO,
            reserve1: U256::ZERO,
            total_supply: U256::ZERO,
            liquidity_providers: FastMap::default(),
            last_liquidity_deposit: U256::ZERO,
            collected_fee0: U256::ZERO,
            collected_fee1: U256::ZERO,
            fee_history: Vec::new(),
            registry,
        }
    }

    pub fn registry(&self) -> &RegistryHandle {
        &self.registry
    }

    /// Share balance of `provider`.
    pub fn liquidity_of(&self, provider: &Address) -> U256 {
        self.liquidity_providers
            .get(provider)
            .copied()
            .unwrap_or_default()
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

    fn rounded(&self, amount: U256, places: u8) -> U256 {
        round_to_places(amount, self.decimals, places)
    }

    /// `amount_a * reserve_b / reserve_a`, the amount of B worth `amount_a`.
    pub fn quote(amount_a: U256, reserve_a: U256, reserve_b: U256) -> Result<U256, Error> {
        if amount_a.is_zero() {
            return Err(PoolError::InsufficientAmount.into());
        }
        if reserve_a.is_zero() || reserve_b.is_zero() {
            return Err(PoolError::InsufficientLiquidity.into());
        }
        Ok(checked::mul(amount_a, reserve_b)? / reserve_a)
    }

    /// Output of token1 for `amount_in` of token0, after the 0.3% fee.
    pub fn get_amount_out0(&self, amount_in: U256) -> Result<U256, Error> {
        Self::amount_out(amount_in, self.reserve0, self.reserve1)
    }

    /// Output of token0 for `amount_in` of token1, after the 0.3% fee.
    pub fn get_amount_out1(&self, amount_in: U256) -> Result<U256, Error> {
        Self::amount_out(amount_in, self.reserve1, self.reserve0)
    }

    pub fn get_amount_out(&self, amount_in: U256, token_in: &str) -> Result<U256, Error> {
        if self.is_token0(token_in)? {
            self.get_amount_out0(amount_in)
        } else {
            self.get_amount_out1(amount_in)
        }
    }

    fn amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> Result<U256, Error> {
        if amount_in.is_zero() {
            return Err(PoolError::InsufficientInputAmount.into());
        }
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(PoolError::InsufficientLiquidity.into());
        }
        let amount_in_with_fee = checked::mul(amount_in, FEE_NUMERATOR)?;
        let numerator = checked::mul(amount_in_with_fee, reserve_out)?;
        let denominator = checked::add(checked::mul(reserve_in, U256_E3)?, amount_in_with_fee)?;
        Ok(numerator / denominator)
    }

    /// Amounts actually deposited for the desired pair, honoring the
    /// current price and the caller's minimums.
    fn optimal_amounts(
        &self,
        amount_a_desired: U256,
        amount_b_desired: U256,
        amount_a_min: U256,
        amount_b_min: U256,
    ) -> Result<(U256, U256), Error> {
        if self.reserve0.is_zero() && self.reserve1.is_zero() {
            return Ok((amount_a_desired, amount_b_desired));
        }

        let amount_b_optimal = Self::quote(amount_a_desired, self.reserve0, self.reserve1)?;
        if amount_b_optimal <= amount_b_desired {
            if self.rounded(amount_b_optimal, SLIPPAGE_PLACES)
                < self.rounded(amount_b_min, SLIPPAGE_PLACES)
            {
                return Err(PoolError::InsufficientBAmount.into());
            }
            return Ok((amount_a_desired, amount_b_optimal));
        }

        let amount_a_optimal = Self::quote(amount_b_desired, self.reserve1, self.reserve0)?;
        if self.rounded(amount_a_optimal, SLIPPAGE_PLACES)
            > self.rounded(amount_a_desired, SLIPPAGE_PLACES)
            || self.rounded(amount_a_optimal, SLIPPAGE_PLACES)
                < self.rounded(amount_a_min, SLIPPAGE_PLACES)
        {
            return Err(PoolError::InsufficientAAmount.into());
        }
        Ok((amount_a_optimal, amount_b_desired))
    }

    /// Deposits a price-matched pair from `provider` and mints shares for it.
    ///
    /// On an empty pool the desired amounts are taken as-is and set the
    /// initial price.
    pub fn add_liquidity(
        &mut self,
        provider: Address,
        amount_a_desired: U256,
        amount_b_desired: U256,
        amount_a_min: U256,
        amount_b_min: U256,
    ) -> Result<(U256, U256), Error> {
        let (amount_a, amount_b) = self.optimal_amounts(
            amount_a_desired,
            amount_b_desired,
            amount_a_min,
            amount_b_min,
        )?;
        self.mint_with_deposit(provider, amount_a, amount_b, (amount_a, amount_b))?;
        Ok((amount_a, amount_b))
    }

    /// Mints shares to `to` for tokens already credited to the pool's ledger.
    ///
    /// The ledger surplus over the reserves must match `amount_a`/`amount_b`
    /// to three decimal places.
    pub fn mint(&mut self, to: Address, amount_a: U256, amount_b: U256) -> Result<U256, Error> {
        self.mint_with_deposit(to, amount_a, amount_b, (U256::ZERO, U256::ZERO))
    }

    fn mint_with_deposit(
        &mut self,
        to: Address,
        amount_a: U256,
        amount_b: U256,
        deposit: (U256, U256),
    ) -> Result<U256, Error> {
        let (ledger0, ledger1) = self.registry.balances(&self.name)?;
        let balance0 = checked::add(ledger0, deposit.0)?;
        let balance1 = checked::add(ledger1, deposit.1)?;

        let (amount0, amount1) = match (
            balance0.checked_sub(self.reserve0),
            balance1.checked_sub(self.reserve1),
        ) {
            (Some(amount0), Some(amount1)) => (amount0, amount1),
            _ => return Err(PoolError::MintAmountMismatch.into()),
        };
        if self.rounded(amount0, MINT_PLACES) != self.rounded(amount_a, MINT_PLACES)
            || self.rounded(amount1, MINT_PLACES) != self.rounded(amount_b, MINT_PLACES)
        {
            warn!(pool = %self.name, %amount0, %amount1, %amount_a, %amount_b, "mint does not match ledger deposit");
            return Err(PoolError::MintAmountMismatch.into());
        }

        let first_mint = self.total_supply.is_zero();
        let liquidity = if first_mint {
            sqrt(checked::mul(amount0, amount1)?)
                .checked_sub(MINIMUM_LIQUIDITY)
                .ok_or(PoolError::InsufficientLiquidityMinted)?
        } else {
            std::cmp::min(
                checked::div(checked::mul(amount0, self.total_supply)?, self.reserve0)?,
                checked::div(checked::mul(amount1, self.total_supply)?, self.reserve1)?,
            )
        };
        if liquidity.is_zero() {
            return Err(PoolError::InsufficientLiquidityMinted.into());
        }

        let locked = if first_mint { MINIMUM_LIQUIDITY } else { U256::ZERO };
        // every share is bounded by the supply, so the share updates below cannot overflow
        let total_supply = checked::add(checked::add(self.total_supply, locked)?, liquidity)?;

        let (balance0, balance1) =
            self.registry
                .settle(&self.name, deposit, (U256::ZERO, U256::ZERO))?;
        if first_mint {
            *self.liquidity_providers.entry(BURN_ADDRESS).or_default() += locked;
        }
        *self.liquidity_providers.entry(to).or_default() += liquidity;
        self.total_supply = total_supply;
        self.last_liquidity_deposit = liquidity;
        self.update(balance0, balance1);

        debug!(pool = %self.name, %to, %liquidity, %amount0, %amount1, "mint");
        Ok(liquidity)
    }

    /// Payout of burning `liquidity` of `provider`'s shares, capped at the
    /// provider's balance, as `(liquidity, amount_a, amount_b)`.
    fn burn_amounts(&self, provider: &Address, liquidity: U256) -> Result<(U256, U256, U256), Error> {
        if *provider == BURN_ADDRESS {
            return Err(PoolError::LockedLiquidity.into());
        }
        let held = self
            .liquidity_providers
            .get(provider)
            .copied()
            .ok_or(PoolError::InsufficientLiquidityBurned)?;
        let liquidity = liquidity.min(held);
        if self.total_supply.is_zero() {
            return Err(PoolError::InsufficientLiquidityBurned.into());
        }

        let (balance0, balance1) = self.registry.balances(&self.name)?;
        let amount_a = mul_div(liquidity, balance0, self.total_supply)?;
        let amount_b = mul_div(liquidity, balance1, self.total_supply)?;
        Ok((liquidity, amount_a, amount_b))
    }

    /// Preview of [`V2Pool::remove_liquidity`] without minimum checks.
    pub fn get_amounts(&self, provider: Address, liquidity: U256) -> Result<(U256, U256), Error> {
        let (_, amount_a, amount_b) = self.burn_amounts(&provider, liquidity)?;
        Ok((amount_a, amount_b))
    }

    /// Burns up to `liquidity` of `to`'s shares and pays out the pro-rata
    /// part of the ledger balances.
    pub fn remove_liquidity(
        &mut self,
        to: Address,
        liquidity: U256,
        amount_a_min: U256,
        amount_b_min: U256,
    ) -> Result<(U256, U256), Error> {
        let (liquidity, amount_a, amount_b) = self.burn_amounts(&to, liquidity)?;

        if amount_a.is_zero() || amount_b.is_zero() {
            return Err(PoolError::InsufficientLiquidityBurned.into());
        }
        if self.rounded(amount_a, SLIPPAGE_PLACES) < self.rounded(amount_a_min, SLIPPAGE_PLACES) {
            return Err(PoolError::InsufficientAAmount.into());
        }
        if self.rounded(amount_b, SLIPPAGE_PLACES) < self.rounded(amount_b_min, SLIPPAGE_PLACES) {
            return Err(PoolError::InsufficientBAmount.into());
        }

        let share = checked::sub(self.liquidity_of(&to), liquidity)?;
        let total_supply = checked::sub(self.total_supply, liquidity)?;

        let (balance0, balance1) =
            self.registry
                .settle(&self.name, (U256::ZERO, U256::ZERO), (amount_a, amount_b))?;
        self.liquidity_providers.insert(to, share);
        self.total_supply = total_supply;
        self.update(balance0, balance1);

        debug!(pool = %self.name, %to, %liquidity, %amount_a, %amount_b, "burn");
        Ok((amount_a, amount_b))
    }

    /// Sells exactly `amount_in` of `token_in` for at least
    /// `amount_out_min` of the other token.
    pub fn swap_exact_tokens_for_tokens(
        &mut self,
        amount_in: U256,
        amount_out_min: U256,
        token_in: &str,
        to: Address,
    ) -> Result<U256, Error> {
        let amount_out = self.get_amount_out(amount_in, token_in)?;
        if amount_out < amount_out_min {
            return Err(PoolError::InsufficientOutputAmount.into());
        }

        if self.is_token0(token_in)? {
            self.swap_with_input(U256::ZERO, amount_out, to, (amount_in, U256::ZERO))?;
        } else {
            self.swap_with_input(amount_out, U256::ZERO, to, (U256::ZERO, amount_in))?;
        }
        Ok(amount_out)
    }

    /// Sends the requested outputs to `to`, taking as input whatever the
    /// ledger holds above the reserves. Returns the detected inputs.
    pub fn swap(
        &mut self,
        amount_a_out: U256,
        amount_b_out: U256,
        to: Address,
    ) -> Result<(U256, U256), Error> {
        self.swap_with_input(amount_a_out, amount_b_out, to, (U256::ZERO, U256::ZERO))
    }

    fn swap_with_input(
        &mut self,
        amount_a_out: U256,
        amount_b_out: U256,
        to: Address,
        deposit: (U256, U256),
    ) -> Result<(U256, U256), Error> {
        if amount_a_out.is_zero() && amount_b_out.is_zero() {
            return Err(PoolError::InsufficientOutputAmount.into());
        }
        if amount_a_out >= self.reserve0 || amount_b_out >= self.reserve1 {
            return Err(PoolError::InsufficientLiquidity.into());
        }

        let pair = self.registry.token_pair(&self.name)?;
        if pair.holds_address(to) {
            return Err(PoolError::InvalidToAddress.into());
        }

        let (ledger0, ledger1) = pair.balances();
        let balance0 = checked::add(ledger0, deposit.0)?
            .checked_sub(amount_a_out)
            .ok_or_else(|| PoolError::InsufficientBalance(self.token0.clone()))?;
        let balance1 = checked::add(ledger1, deposit.1)?
            .checked_sub(amount_b_out)
            .ok_or_else(|| PoolError::InsufficientBalance(self.token1.clone()))?;

        // both outs are below their reserves here
        let amount_a_in = balance0.saturating_sub(self.reserve0 - amount_a_out);
        let amount_b_in = balance1.saturating_sub(self.reserve1 - amount_b_out);
        if amount_a_in.is_zero() && amount_b_in.is_zero() {
            return Err(PoolError::InsufficientInputAmount.into());
        }

        self.check_invariant(balance0, balance1, amount_a_in, amount_b_in)?;

        let fee0 = amount_a_in * FEE_TAKEN / U256_E3;
        let fee1 = amount_b_in * FEE_TAKEN / U256_E3;
        let collected_fee0 = checked::add(self.collected_fee0, fee0)?;
        let collected_fee1 = checked::add(self.collected_fee1, fee1)?;

        let (balance0, balance1) =
            self.registry
                .settle(&self.name, deposit, (amount_a_out, amount_b_out))?;
        self.update(balance0, balance1);
        self.collected_fee0 = collected_fee0;
        self.collected_fee1 = collected_fee1;
        self.fee_history.push((fee0, fee1));

        debug!(
            pool = %self.name,
            %to,
            %amount_a_in,
            %amount_b_in,
            %amount_a_out,
            %amount_b_out,
            "swap"
        );
        Ok((amount_a_in, amount_b_in))
    }

    /// `(b0*1000 - 3*in0) * (b1*1000 - 3*in1) >= r0 * r1 * 1000^2`, in
    /// 512-bit arithmetic.
    fn check_invariant(
        &self,
        balance0: U256,
        balance1: U256,
        amount0_in: U256,
        amount1_in: U256,
    ) -> Result<(), Error> {
        let e3 = U512::from(1000u64);
        let three = U512::from(3u64);
        let adjusted0 = U512::from(balance0) * e3 - U512::from(amount0_in) * three;
        let adjusted1 = U512::from(balance1) * e3 - U512::from(amount1_in) * three;

        let lhs = adjusted0.checked_mul(adjusted1);
        let rhs = (U512::from(self.reserve0) * U512::from(self.reserve1)).checked_mul(e3 * e3);
        match (lhs, rhs) {
            (Some(lhs), Some(rhs)) if lhs >= rhs => Ok(()),
            (None, Some(_)) => Ok(()),
            _ => {
                warn!(pool = %self.name, %balance0, %balance1, %amount0_in, %amount1_in, "constant product check failed");
                Err(PoolError::InvariantViolation.into())
            }
        }
    }

    fn update(&mut self, balance0: U256, balance1: U256) {
        self.reserve0 = balance0;
        self.reserve1 = balance1;
        debug!(pool = %self.name, reserve0 = %balance0, reserve1 = %balance1, "reserves updated");
    }
}

impl Exchange for V2Pool {
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
        let (reserve_self, reserve_other) = if self.is_token0(token)? {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        };
        if reserve_self.is_zero() {
            return Ok(None);
        }
        Ok(Some(u256_to_f64(reserve_other) / u256_to_f64(reserve_self)))
    }

    fn get_reserve(&self, token: &str) -> Result<U256, Error> {
        Ok(if self.is_token0(token)? {
            self.reserve0
        } else {
            self.reserve1
        })
    }

    fn get_liquidity(&self) -> U256 {
        self.total_supply
    }

    fn collected_fees(&self) -> (U256, U256) {
        (self.collected_fee0, self.collected_fee1)
    }

    fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for V2Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Exchange {} ({})", self.name, self.symbol)?;
        writeln!(
            f,
            "Reserves: {} = {}, {} = {}",
            self.token0,
            to_human(self.reserve0, self.decimals),
            self.token1,
            to_human(self.reserve1, self.decimals)
        )?;
        writeln!(
            f,
            "Liquidity: {}",
            to_human(self.total_supply, self.decimals)
        )
    }
}
