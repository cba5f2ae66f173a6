//! Uniswap V2 / V3–style exchange pools in pure Rust.
//!
//! This crate exposes:
//! - Low‑level math primitives (`math::*`) for ticks, prices, swap steps and
//!   overflow‑checked integer arithmetic.
//! - A constant‑product `V2Pool` and a concentrated‑liquidity `V3Pool` that
//!   reproduce the on‑chain contracts' fee arithmetic and rounding.
//! - A `Registry` that deploys pools and owns the per‑pool token ledger.
//!
//! Every pool is an in‑process object mutated by sequential calls. An
//! operation either commits all of its state changes or returns an error
//! having changed nothing.
//!
//! # Examples
//!
//! ## Pure math
//! ```no_run
//! use amm_engine::{math::tick_math, RESOLUTION, U256};
//!
//! let sqrt_price = tick_math::get_sqrt_ratio_at_tick(0).unwrap();
//! assert!(sqrt_price > U256::ZERO);
//! assert_eq!(RESOLUTION, 96);
//! ```
//!
//! ## A constant‑product pool
//! ```no_run
//! use amm_engine::{config::ExchangeData, Address, Registry, Token, U256};
//!
//! let registry = Registry::new("factory", Address::repeat_byte(0xfa));
//! let eth = Token::new("ETH", Address::repeat_byte(0x09));
//! let tkn = Token::new("TKN", Address::repeat_byte(0x11));
//! let mut pool = registry
//!     .deploy(ExchangeData::v2(eth, tkn, "LP", Address::repeat_byte(0x01)))
//!     .unwrap()
//!     .into_v2()
//!     .unwrap();
//!
//! let user = Address::repeat_byte(0xaa);
//! let (a, b) = (U256::from(1_000u64), U256::from(100_000u64));
//! pool.add_liquidity(user, a, b, a, b).unwrap();
//! let out = pool.swap_exact_tokens_for_tokens(U256::from(10u64), U256::ZERO, "ETH", user).unwrap();
//! println!("received {out} TKN");
//! ```
//!
//! ## A concentrated‑liquidity pool
//! ```no_run
//! use amm_engine::{config::{ExchangeData, FeeAmount}, Address, Registry, Token};
//! use amm_engine::math::tick_math::get_sqrt_ratio_at_tick;
//!
//! let registry = Registry::new("factory", Address::repeat_byte(0xfa));
//! let usdc = Token::new("USDC", Address::repeat_byte(0x09));
//! let dai = Token::new("DAI", Address::repeat_byte(0x11));
//! let data = ExchangeData::v3(usdc, dai, "LP", Address::repeat_byte(0x01), FeeAmount::Medium);
//! let mut pool = registry.deploy(data).unwrap().into_v3().unwrap();
//!
//! pool.initialize(get_sqrt_ratio_at_tick(0).unwrap()).unwrap();
//! let owner = Address::repeat_byte(0xaa);
//! let (amount0, amount1) = pool.mint(owner, -600, 600, 1_000_000).unwrap();
//! println!("paid {amount0} / {amount1}");
//! ```

pub use alloy_primitives::{Address, I256, U256};

pub mod config;
pub mod error;
mod hash;
pub mod math;
pub mod pool;

pub use error::Error;
pub use hash::FastMap;
pub use pool::ledger::{Token, TokenKind, TokenPair};
pub use pool::registry::{Registry, RegistryHandle};
pub use pool::v2_pool::V2Pool;
pub use pool::v3_pool::V3Pool;
pub use pool::{Exchange, Pool};

const U160_MAX: U256 = U256::from_limbs([u64::MAX, u64::MAX, u32::MAX as u64, 0]);
const U256_E3: U256 = U256::from_limbs([1000, 0, 0, 0]);
const U256_E6: U256 = U256::from_limbs([1000000, 0, 0, 0]);

pub const RESOLUTION: u8 = 96;
pub const Q96: U256 = U256::from_limbs([0, 4294967296, 0, 0]);
pub const Q128: U256 = U256::from_limbs([0, 0, 1, 0]);
