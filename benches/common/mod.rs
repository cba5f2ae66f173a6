use amm_engine::config::{ExchangeData, FeeAmount};
use amm_engine::math::math_helpers::mul_div;
use amm_engine::math::swap_math::compute_swap_step;
use amm_engine::math::tick_math::{
    get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio, max_usable_tick, min_usable_tick,
};
use amm_engine::pool::swap::SwapParams;
use amm_engine::pool::tick::next_tick;
use amm_engine::{Address, Registry, Token, V2Pool, V3Pool, I256, Q128, Q96, U256};
use criterion::{black_box, BatchSize, Criterion};

const E18: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

fn v2_pool() -> V2Pool {
    let registry = Registry::new("bench", Address::ZERO);
    let mut pool = registry
        .deploy(ExchangeData::v2(
            Token::new("ETH", Address::repeat_byte(0x09)),
            Token::new("TKN", Address::repeat_byte(0x11)),
            "LP",
            Address::repeat_byte(0x01),
        ))
        .unwrap()
        .into_v2()
        .unwrap();
    let (a, b) = (U256::from(1000) * E18, U256::from(100_000) * E18);
    pool.add_liquidity(Address::repeat_byte(0xaa), a, b, a, b)
        .unwrap();
    pool
}

/// V3 pool at 1:1 with full-range liquidity plus a stack of narrow
/// positions for swaps to cross.
fn v3_pool() -> V3Pool {
    let registry = Registry::new("bench", Address::ZERO);
    let mut pool = registry
        .deploy(ExchangeData::v3(
            Token::new("USDC", Address::repeat_byte(0x0a)),
            Token::new("DAI", Address::repeat_byte(0x12)),
            "LP3",
            Address::repeat_byte(0x02),
            FeeAmount::Medium,
        ))
        .unwrap()
        .into_v3()
        .unwrap();
    pool.initialize(Q96).unwrap();

    let owner = Address::repeat_byte(0xaa);
    let liquidity = 1_000_000_000_000_000_000u128;
    pool.mint(owner, min_usable_tick(60), max_usable_tick(60), liquidity)
        .unwrap();
    for i in 1..=20 {
        pool.mint(owner, -60 * i, 60 * i, liquidity).unwrap();
    }
    pool
}

pub fn bench_v2_pool(c: &mut Criterion) {
    let pool = v2_pool();
    let user = Address::repeat_byte(0xbb);

    c.bench_function("v2_get_amount_out", |b| {
        b.iter(|| black_box(pool.get_amount_out(black_box(E18), "ETH").unwrap()))
    });

    // clones share a ledger, so every batch gets its own registry
    c.bench_function("v2_swap_exact_tokens_for_tokens", |b| {
        b.iter_batched(
            v2_pool,
            |mut pool| {
                black_box(
                    pool.swap_exact_tokens_for_tokens(E18, U256::ZERO, "ETH", user)
                        .unwrap(),
                )
            },
            BatchSize::SmallInput,
        )
    });
}

pub fn bench_v3_pool(c: &mut Criterion) {
    let pool = v3_pool();
    let owner = Address::repeat_byte(0xaa);

    c.bench_function("v3_quote_within_tick", |b| {
        let params = SwapParams::unbounded(true, I256::from_raw(E18 / U256::from(1000)));
        b.iter(|| black_box(pool.quote(black_box(params)).unwrap()))
    });

    c.bench_function("v3_quote_crossing_ticks", |b| {
        let params = SwapParams::unbounded(false, I256::from_raw(U256::from(5) * E18));
        b.iter(|| black_box(pool.quote(black_box(params)).unwrap()))
    });

    c.bench_function("v3_mint_burn", |b| {
        b.iter_batched(
            || pool.clone(),
            |mut pool| {
                pool.mint(owner, -120, 120, 1_000_000).unwrap();
                black_box(pool.burn(owner, -120, 120, 1_000_000).unwrap())
            },
            BatchSize::SmallInput,
        )
    });
}

/// One iteration of the swap loop against live pool state: find the next
/// initialized tick, step toward it, book the fee and re-derive the tick.
pub fn bench_swap_step(c: &mut Criterion) {
    let pool = v3_pool();
    let sqrt_price = pool.slot0.sqrt_price_x96;
    let fee = pool.fee;
    let liquidity = pool.liquidity;

    for (name, zero_for_one) in [("swap_step_0_for_1", true), ("swap_step_1_for_0", false)] {
        let amount = I256::from_raw(U256::from(5) * E18);
        c.bench_function(name, |b| {
            b.iter(|| {
                let (tick_next, _) = next_tick(&pool.ticks, black_box(pool.slot0.tick), zero_for_one);
                let target = get_sqrt_ratio_at_tick(tick_next).unwrap();
                let (sqrt_next, _, _, fee_amount) =
                    compute_swap_step(sqrt_price, target, liquidity, black_box(amount), fee)
                        .unwrap();
                black_box(mul_div(fee_amount, Q128, U256::from(liquidity)).unwrap());
                black_box(get_tick_at_sqrt_ratio(sqrt_next).unwrap())
            })
        });
    }
}
