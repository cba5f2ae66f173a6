//! Token balance bookkeeping.
//!
//! A [`Token`] entry is the running total a single pool holds of one asset.
//! Pools never keep their own copy of these numbers: reserves are re-read
//! from here after every mutation.

use crate::error::{Error, MathError, PoolError};
use crate::math::checked;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenKind {
    #[default]
    Standard,
    /// Share token minted by a pool to its liquidity providers.
    LiquidityShare,
    /// Token whose value tracks one side of another pool.
    IndexDerived {
        parent_pool: String,
        parent_token: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub name: String,
    pub address: Address,
    #[serde(default)]
    pub kind: TokenKind,
    #[serde(default)]
    pub total: U256,
}

impl Token {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
            kind: TokenKind::Standard,
            total: U256::ZERO,
        }
    }

    pub fn with_kind(mut self, kind: TokenKind) -> Self {
        self.kind = kind;
        self
    }

    /// Parent pool of an index-derived token.
    pub fn parent_pool(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::IndexDerived { parent_pool, .. } => Some(parent_pool),
            _ => None,
        }
    }

    /// Increases the running total. `_from` identifies the payer and is not
    /// tracked.
    pub fn deposit(&mut self, _from: Address, amount: U256) -> Result<(), Error> {
        self.total = checked::add(self.total, amount)?;
        Ok(())
    }

    /// Decreases the running total, refusing to go below zero.
    pub fn transfer(&mut self, _to: Address, amount: U256) -> Result<(), Error> {
        self.total = self
            .total
            .checked_sub(amount)
            .ok_or_else(|| PoolError::InsufficientBalance(self.name.clone()))?;
        Ok(())
    }
}

/// The ordered pair of ledger entries owned by one pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub token0: Token,
    pub token1: Token,
}

impl TokenPair {
    pub fn new(token0: Token, token1: Token) -> Self {
        Self { token0, token1 }
    }

    pub fn get(&self, name: &str) -> Option<&Token> {
        if self.token0.name == name {
            Some(&self.token0)
        } else if self.token1.name == name {
            Some(&self.token1)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Token> {
        if self.token0.name == name {
            Some(&mut self.token0)
        } else if self.token1.name == name {
            Some(&mut self.token1)
        } else {
            None
        }
    }

    /// `true` when `name` is token0, `false` for token1.
    pub fn is_token0(&self, name: &str) -> Result<bool, PoolError> {
        if self.token0.name == name {
            Ok(true)
        } else if self.token1.name == name {
            Ok(false)
        } else {
            Err(PoolError::InvalidToken(name.to_string()))
        }
    }

    /// The token paired with `name`.
    pub fn other(&self, name: &str) -> Result<&Token, PoolError> {
        Ok(if self.is_token0(name)? {
            &self.token1
        } else {
            &self.token0
        })
    }

    pub fn balances(&self) -> (U256, U256) {
        (self.token0.total, self.token1.total)
    }

    pub fn holds_address(&self, address: Address) -> bool {
        self.token0.address == address || self.token1.address == address
    }

    /// Applies deposits and withdrawals to both sides at once.
    ///
    /// Nothing is written unless every resulting total is representable and
    /// non-negative. Returns the new balances.
    pub fn settle(
        &mut self,
        deposits: (U256, U256),
        withdrawals: (U256, U256),
    ) -> Result<(U256, U256), Error> {
        let balance0 = settle_one(&self.token0, deposits.0, withdrawals.0)?;
        let balance1 = settle_one(&self.token1, deposits.1, withdrawals.1)?;
        self.token0.total = balance0;
        self.token1.total = balance1;
        Ok((balance0, balance1))
    }
}

fn settle_one(token: &Token, deposit: U256, withdrawal: U256) -> Result<U256, Error> {
    let credited = token
        .total
        .checked_add(deposit)
        .ok_or(MathError::ArithmeticOverflow)?;
    credited
        .checked_sub(withdrawal)
        .ok_or_else(|| PoolError::InsufficientBalance(token.name.clone()).into())
}
