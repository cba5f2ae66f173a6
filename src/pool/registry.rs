//! Pool factory and shared token ledger.

use crate::config::{EngineConfig, ExchangeData, Version};
use crate::error::{Error, PoolError, RegistryError};
use crate::pool::ledger::TokenPair;
use crate::pool::v2_pool::V2Pool;
use crate::pool::v3_pool::V3Pool;
use crate::pool::{Exchange, Pool};
use crate::FastMap;
use alloy_primitives::{Address, U256};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default)]
struct RegistryState {
    /// pool name -> ledger entries of its two tokens
    ledgers: FastMap<String, TokenPair>,
    /// token0 name -> pool name
    exchange_from_token: FastMap<String, String>,
    parent_pool: Option<String>,
}

impl RegistryState {
    /// Records the ledger and lookups of an already validated pool.
    fn register(&mut self, data: &ExchangeData) {
        let name = data.pool_name();
        for token in [&data.token0, &data.token1] {
            if let Some(parent) = token.parent_pool() {
                self.parent_pool = Some(parent.to_string());
            }
        }
        self.exchange_from_token
            .insert(data.token0.name.clone(), name.clone());
        self.ledgers.insert(
            name,
            TokenPair::new(data.token0.clone(), data.token1.clone()),
        );
    }
}

/// Shared, cloneable access to the registry's ledgers.
///
/// Every pool holds one of these. Each call takes the lock once, so a
/// multi-token movement through [`RegistryHandle::settle`] is never observed
/// half-applied.
#[derive(Debug, Clone, Default)]
pub struct RegistryHandle {
    inner: Arc<RwLock<RegistryState>>,
}

impl RegistryHandle {
    fn read_ledger<R>(&self, pool: &str, f: impl FnOnce(&TokenPair) -> R) -> Result<R, Error> {
        let state = self.inner.read();
        let pair = state
            .ledgers
            .get(pool)
            .ok_or_else(|| RegistryError::UnknownPool(pool.to_string()))?;
        Ok(f(pair))
    }

    fn write_ledger<R>(
        &self,
        pool: &str,
        f: impl FnOnce(&mut TokenPair) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let mut state = self.inner.write();
        let pair = state
            .ledgers
            .get_mut(pool)
            .ok_or_else(|| RegistryError::UnknownPool(pool.to_string()))?;
        f(pair)
    }

    pub fn token_pair(&self, pool: &str) -> Result<TokenPair, Error> {
        self.read_ledger(pool, TokenPair::clone)
    }

    /// Ledger balances of `(token0, token1)` held by `pool`.
    pub fn balances(&self, pool: &str) -> Result<(U256, U256), Error> {
        self.read_ledger(pool, TokenPair::balances)
    }

    pub fn balance(&self, pool: &str, token: &str) -> Result<U256, Error> {
        self.read_ledger(pool, |pair| pair.get(token).map(|t| t.total))?
            .ok_or_else(|| PoolError::InvalidToken(token.to_string()).into())
    }

    pub fn token_address(&self, pool: &str, token: &str) -> Result<Address, Error> {
        self.read_ledger(pool, |pair| pair.get(token).map(|t| t.address))?
            .ok_or_else(|| PoolError::InvalidToken(token.to_string()).into())
    }

    /// Credits `amount` of `token` to `pool`. Returns the new balance.
    pub fn deposit(
        &self,
        pool: &str,
        token: &str,
        from: Address,
        amount: U256,
    ) -> Result<U256, Error> {
        self.write_ledger(pool, |pair| {
            let entry = pair
                .get_mut(token)
                .ok_or_else(|| PoolError::InvalidToken(token.to_string()))?;
            entry.deposit(from, amount)?;
            Ok(entry.total)
        })
    }

    /// Debits `amount` of `token` from `pool`. Returns the new balance.
    pub fn transfer(
        &self,
        pool: &str,
        token: &str,
        to: Address,
        amount: U256,
    ) -> Result<U256, Error> {
        self.write_ledger(pool, |pair| {
            let entry = pair
                .get_mut(token)
                .ok_or_else(|| PoolError::InvalidToken(token.to_string()))?;
            entry.transfer(to, amount)?;
            Ok(entry.total)
        })
    }

    /// Applies deposits and withdrawals to both of `pool`'s tokens under one
    /// write lock. See [`TokenPair::settle`].
    pub fn settle(
        &self,
        pool: &str,
        deposits: (U256, U256),
        withdrawals: (U256, U256),
    ) -> Result<(U256, U256), Error> {
        self.write_ledger(pool, |pair| pair.settle(deposits, withdrawals))
    }
}

/// Deploys pools and answers token/pool lookups.
#[derive(Debug, Clone)]
pub struct Registry {
    name: String,
    address: Address,
    handle: RegistryHandle,
}

impl Registry {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
            handle: RegistryHandle::default(),
        }
    }

    /// Builds a registry from config and deploys every configured pool.
    pub fn from_config(config: &EngineConfig) -> Result<(Self, Vec<Pool>), Error> {
        let registry = Self::new(config.registry.name.clone(), config.registry.address);
        let pools = registry.deploy_all(config)?;
        Ok((registry, pools))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn handle(&self) -> RegistryHandle {
        self.handle.clone()
    }

    /// Creates a pool for `data` and registers its ledger under
    /// `"{token0}-{token1}"`.
    pub fn deploy(&self, data: ExchangeData) -> Result<Pool, Error> {
        data.validate()?;
        {
            let mut state = self.handle.inner.write();
            let name = data.pool_name();
            if state.ledgers.contains_key(&name) {
                return Err(RegistryError::PoolAlreadyExists(name).into());
            }
            state.register(&data);
        }
        Ok(self.build(&data))
    }

    /// Deploys every pool listed in `config`.
    ///
    /// All entries are validated against each other and the registered pools
    /// first, so a failure deploys nothing.
    pub fn deploy_all(&self, config: &EngineConfig) -> Result<Vec<Pool>, Error> {
        {
            let mut state = self.handle.inner.write();
            let mut names: Vec<String> = Vec::with_capacity(config.pools.len());
            for data in &config.pools {
                data.validate()?;
                let name = data.pool_name();
                if state.ledgers.contains_key(&name) || names.contains(&name) {
                    return Err(RegistryError::PoolAlreadyExists(name).into());
                }
                names.push(name);
            }
            for data in &config.pools {
                state.register(data);
            }
        }
        Ok(config.pools.iter().map(|data| self.build(data)).collect())
    }

    fn build(&self, data: &ExchangeData) -> Pool {
        let pool = match data.version {
            Version::V2 => Pool::V2(V2Pool::new(self.handle(), data)),
            Version::V3 => Pool::V3(V3Pool::new(self.handle(), data)),
        };
        info!(
            registry = %self.name,
            pool = %pool.name(),
            symbol = %data.symbol,
            version = ?data.version,
            "deployed pool"
        );
        pool
    }

    /// Name of the pool whose token0 is `token`.
    pub fn get_exchange(&self, token: &str) -> Option<String> {
        self.handle.inner.read().exchange_from_token.get(token).cloned()
    }

    /// Snapshot of a pool's token ledger.
    pub fn get_token(&self, pool: &str) -> Option<TokenPair> {
        self.handle.inner.read().ledgers.get(pool).cloned()
    }

    /// Parent pool recorded from the most recent index-derived deployment.
    pub fn parent_pool(&self) -> Option<String> {
        self.handle.inner.read().parent_pool.clone()
    }

    pub fn pool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handle.inner.read().ledgers.keys().cloned().collect();
        names.sort();
        names
    }
}
