pub mod ledger;
pub mod position;
pub mod registry;
pub mod swap;
pub mod tick;
pub mod v2_pool;
pub mod v3_pool;

use crate::error::Error;
use alloy_primitives::U256;
use std::fmt;

pub use v2_pool::V2Pool;
pub use v3_pool::V3Pool;

/// Read surface shared by both pool variants.
pub trait Exchange {
    /// Registry key, `"{token0}-{token1}"`.
    fn name(&self) -> &str;
    fn token0(&self) -> &str;
    fn token1(&self) -> &str;
    /// Price of `token` in units of the other token, `None` while undefined.
    fn get_price(&self, token: &str) -> Result<Option<f64>, Error>;
    /// Real ledger balance of `token` held by the pool.
    fn get_reserve(&self, token: &str) -> Result<U256, Error>;
    fn get_liquidity(&self) -> U256;
    /// Running `(token0, token1)` fee totals.
    fn collected_fees(&self) -> (U256, U256);
    /// Human-readable dump of reserves and liquidity.
    fn summary(&self) -> String;
}

/// A deployed pool of either version.
#[derive(Debug, Clone)]
pub enum Pool {
    V2(V2Pool),
    V3(V3Pool),
}

impl Pool {
    pub fn as_v2(&self) -> Option<&V2Pool> {
        match self {
            Pool::V2(pool) => Some(pool),
            Pool::V3(_) => None,
        }
    }

    pub fn as_v3(&self) -> Option<&V3Pool> {
        match self {
            Pool::V3(pool) => Some(pool),
            Pool::V2(_) => None,
        }
    }

    pub fn as_v2_mut(&mut self) -> Option<&mut V2Pool> {
        match self {
            Pool::V2(pool) => Some(pool),
            Pool::V3(_) => None,
        }
    }

    pub fn as_v3_mut(&mut self) -> Option<&mut V3Pool> {
        match self {
            Pool::V3(pool) => Some(pool),
            Pool::V2(_) => None,
        }
    }

    pub fn into_v2(self) -> Option<V2Pool> {
        match self {
            Pool::V2(pool) => Some(pool),
            Pool::V3(_) => None,
        }
    }

    pub fn into_v3(self) -> Option<V3Pool> {
        match self {
            Pool::V3(pool) => Some(pool),
            Pool::V2(_) => None,
        }
    }

    fn inner(&self) -> &dyn Exchange {
        match self {
            Pool::V2(pool) => pool,
            Pool::V3(pool) => pool,
        }
    }
}

impl Exchange for Pool {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn token0(&self) -> &str {
        self.inner().token0()
    }

    fn token1(&self) -> &str {
        self.inner().token1()
    }

    fn get_price(&self, token: &str) -> Result<Option<f64>, Error> {
        self.inner().get_price(token)
    }

    fn get_reserve(&self, token: &str) -> Result<U256, Error> {
        self.inner().get_reserve(token)
    }

    fn get_liquidity(&self) -> U256 {
        self.inner().get_liquidity()
    }

    fn collected_fees(&self) -> (U256, U256) {
        self.inner().collected_fees()
    }

    fn summary(&self) -> String {
        self.inner().summary()
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}
