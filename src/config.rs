//! Pool deployment data and TOML engine configuration.

use crate::error::{Error, RegistryError};
use crate::pool::ledger::Token;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Version {
    #[default]
    V2,
    V3,
}

/// Standard V3 fee tiers and their tick spacings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeAmount {
    Low,
    #[default]
    Medium,
    High,
}

impl FeeAmount {
    /// Swap fee in hundredths of a bip.
    pub const fn fee(self) -> u32 {
        match self {
            FeeAmount::Low => 500,
            FeeAmount::Medium => 3000,
            FeeAmount::High => 10000,
        }
    }

    pub const fn tick_spacing(self) -> i32 {
        match self {
            FeeAmount::Low => 10,
            FeeAmount::Medium => 60,
            FeeAmount::High => 200,
        }
    }
}

fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}
fn default_fee() -> u32 {
    FeeAmount::Medium.fee()
}
fn default_tick_spacing() -> i32 {
    FeeAmount::Medium.tick_spacing()
}

/// Everything the registry needs to deploy one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeData {
    pub token0: Token,
    pub token1: Token,
    pub symbol: String,
    pub address: Address,
    #[serde(default)]
    pub version: Version,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// V3 only.
    #[serde(default = "default_fee")]
    pub fee: u32,
    /// V3 only.
    #[serde(default = "default_tick_spacing")]
    pub tick_spacing: i32,
}

impl ExchangeData {
    pub fn v2(token0: Token, token1: Token, symbol: impl Into<String>, address: Address) -> Self {
        Self {
            token0,
            token1,
            symbol: symbol.into(),
            address,
            version: Version::V2,
            decimals: DEFAULT_DECIMALS,
            fee: default_fee(),
            tick_spacing: default_tick_spacing(),
        }
    }

    pub fn v3(
        token0: Token,
        token1: Token,
        symbol: impl Into<String>,
        address: Address,
        fee_amount: FeeAmount,
    ) -> Self {
        Self {
            version: Version::V3,
            fee: fee_amount.fee(),
            tick_spacing: fee_amount.tick_spacing(),
            ..Self::v2(token0, token1, symbol, address)
        }
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    /// Overrides the fee tier with an arbitrary fee and spacing.
    pub fn with_fee(mut self, fee: u32, tick_spacing: i32) -> Self {
        self.fee = fee;
        self.tick_spacing = tick_spacing;
        self
    }

    /// Registry key of the pool: `"{token0}-{token1}"`.
    pub fn pool_name(&self) -> String {
        format!("{}-{}", self.token0.name, self.token1.name)
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.token0.name == self.token1.name {
            return Err(RegistryError::InvalidPoolConfig(format!(
                "identical tokens {}",
                self.token0.name
            )));
        }
        if self.version == Version::V3 {
            if self.tick_spacing <= 0 {
                return Err(RegistryError::InvalidPoolConfig(format!(
                    "tick spacing {} must be positive",
                    self.tick_spacing
                )));
            }
            if self.fee >= 1_000_000 {
                return Err(RegistryError::InvalidPoolConfig(format!(
                    "fee {} must be below 1000000",
                    self.fee
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub name: String,
    #[serde(default)]
    pub address: Address,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: "factory".to_string(),
            address: Address::ZERO,
        }
    }
}

/// A registry and the pools to deploy into it.
///
/// ```toml
/// [registry]
/// name = "factory"
///
/// [[pool]]
/// symbol = "LP"
/// address = "0x0101010101010101010101010101010101010101"
/// version = "v3"
/// fee = 500
/// tick_spacing = 10
/// token0 = { name = "USDC", address = "0x0909090909090909090909090909090909090909" }
/// token1 = { name = "DAI", address = "0x1111111111111111111111111111111111111111" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default, rename = "pool")]
    pub pools: Vec<ExchangeData>,
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|e| RegistryError::Config(e.to_string()).into())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RegistryError::Config(format!(
                "failed to read {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [registry]
        name = "uniswap"
        address = "0xfafafafafafafafafafafafafafafafafafafafa"

        [[pool]]
        symbol = "LP"
        address = "0x0101010101010101010101010101010101010101"
        token0 = { name = "ETH", address = "0x0909090909090909090909090909090909090909" }
        token1 = { name = "TKN", address = "0x1111111111111111111111111111111111111111" }

        [[pool]]
        symbol = "LP3"
        address = "0x0202020202020202020202020202020202020202"
        version = "v3"
        decimals = 6
        fee = 500
        tick_spacing = 10
        token0 = { name = "USDC", address = "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a" }
        token1 = { name = "DAI", address = "0x1212121212121212121212121212121212121212", kind = { type = "standard" } }
    "#;

    #[test]
    fn parses_pools_with_defaults() {
        let config = EngineConfig::from_toml_str(CONFIG).unwrap();
        assert_eq!(config.registry.name, "uniswap");
        assert_eq!(config.pools.len(), 2);

        let v2 = &config.pools[0];
        assert_eq!(v2.version, Version::V2);
        assert_eq!(v2.decimals, 18);
        assert_eq!(v2.pool_name(), "ETH-TKN");
        assert_eq!(v2.token0.address, Address::repeat_byte(0x09));

        let v3 = &config.pools[1];
        assert_eq!(v3.version, Version::V3);
        assert_eq!(v3.decimals, 6);
        assert_eq!((v3.fee, v3.tick_spacing), (500, 10));
        assert!(v3.validate().is_ok());
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = EngineConfig::from_toml_str("[[pool]]\nsymbol = 3").unwrap_err();
        assert!(matches!(err, Error::RegistryError(RegistryError::Config(_))));
    }

    #[test]
    fn fee_tiers() {
        let data = ExchangeData::v3(
            Token::new("A", Address::repeat_byte(1)),
            Token::new("B", Address::repeat_byte(2)),
            "LP",
            Address::repeat_byte(3),
            FeeAmount::High,
        );
        assert_eq!((data.fee, data.tick_spacing), (10000, 200));
        assert!(data.clone().with_fee(1_000_000, 1).validate().is_err());
        assert!(data.with_fee(3000, 0).validate().is_err());
    }
}
