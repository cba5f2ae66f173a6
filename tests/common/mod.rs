#![allow(dead_code)]

use amm_engine::config::{ExchangeData, FeeAmount};
use amm_engine::{Address, Registry, Token, V2Pool, V3Pool, U256};
use std::str::FromStr;
use std::sync::Once;

pub const E18: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

static TRACING: Once = Once::new();

/// Routes library logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn alice() -> Address {
    Address::repeat_byte(0xaa)
}

pub fn bob() -> Address {
    Address::repeat_byte(0xbb)
}

pub fn u(s: &str) -> U256 {
    U256::from_str(s).unwrap()
}

pub fn e18(n: u64) -> U256 {
    U256::from(n) * E18
}

pub fn registry() -> Registry {
    init_tracing();
    Registry::new("factory", Address::repeat_byte(0xfa))
}

pub fn deploy_v2(registry: &Registry) -> V2Pool {
    registry
        .deploy(ExchangeData::v2(
            Token::new("ETH", Address::repeat_byte(0x09)),
            Token::new("TKN", Address::repeat_byte(0x11)),
            "LP",
            Address::repeat_byte(0x01),
        ))
        .unwrap()
        .into_v2()
        .unwrap()
}

pub fn deploy_v3(registry: &Registry, fee: FeeAmount) -> V3Pool {
    registry
        .deploy(ExchangeData::v3(
            Token::new("USDC", Address::repeat_byte(0x0a)),
            Token::new("DAI", Address::repeat_byte(0x12)),
            "LP3",
            Address::repeat_byte(0x02),
            fee,
        ))
        .unwrap()
        .into_v3()
        .unwrap()
}

/// V2 pool seeded with 1000 ETH / 100000 TKN by alice.
pub fn seeded_v2() -> (Registry, V2Pool) {
    let registry = registry();
    let mut pool = deploy_v2(&registry);
    let (a, b) = (e18(1000), e18(100_000));
    pool.add_liquidity(alice(), a, b, a, b).unwrap();
    (registry, pool)
}

/// V3 pool initialized at `reserve1 / reserve0`.
pub fn v3_at(fee: FeeAmount, reserve1: u64, reserve0: u64) -> (Registry, V3Pool) {
    let registry = registry();
    let mut pool = deploy_v3(&registry, fee);
    let price = V3Pool::encode_price_sqrt(U256::from(reserve1), U256::from(reserve0)).unwrap();
    pool.initialize(price).unwrap();
    (registry, pool)
}
