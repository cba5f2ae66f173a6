use crate::error::StateError;
use crate::Q128;
use alloy_primitives::{I256, U256};

pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = -MIN_TICK;

pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4295128739, 0, 0, 0]);
pub const MAX_SQRT_RATIO: U256 =
    U256::from_limbs([6743328256752651558, 17280870778742802505, 4294805859, 0]);

const SHIFT_32: usize = 32;
const SHIFT_64: usize = 64;
const SHIFT_128: usize = 128;

pub const SQRT_10001: I256 = I256::from_raw(U256::from_limbs([11745905768312294533, 13863, 0, 0]));
pub const TICK_LOW: I256 = I256::from_raw(U256::from_limbs([
    6552757943157144234,
    184476617836266586,
    0,
    0,
]));
pub const TICK_HIGH: I256 = I256::from_raw(U256::from_limbs([
    4998474450511881007,
    15793544031827761793,
    0,
    0,
]));

/// Lowest tick a position can use under the given spacing.
#[inline]
pub fn min_usable_tick(tick_spacing: i32) -> i32 {
    (MIN_TICK / tick_spacing) * tick_spacing
}

/// Highest tick a position can use under the given spacing.
#[inline]
pub fn max_usable_tick(tick_spacing: i32) -> i32 {
    (MAX_TICK / tick_spacing) * tick_spacing
}

/// Returns `sqrt(1.0001^tick) * 2^96`, rounded up, or
/// `StateError::TickOutOfRange` outside `[MIN_TICK, MAX_TICK]`.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256, StateError> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK as u32 {
        return Err(StateError::TickOutOfRange);
    }

    let mut ratio = if abs_tick & 1 != 0 {
        U256::from_limbs([12262481743371124737, 18445821805675392311, 0, 0])
    } else {
        Q128
    };
    for (bit, [lo, hi]) in RATIO_FACTORS {
        if abs_tick & bit != 0 {
            ratio = ratio.wrapping_mul(U256::from_limbs([lo, hi, 0, 0])) >> SHIFT_128;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up
    let round_up = ratio.as_limbs()[0] & 0xFFFF_FFFF != 0;
    Ok((ratio >> SHIFT_32) + U256::from(round_up as u64))
}

/// `2^128 / sqrt(1.0001)^bit` for every tick bit above the lowest, as
/// `[low limb, high limb]`.
const RATIO_FACTORS: [(u32, [u64; 2]); 19] = [
    (0x2, [6459403834229662010, 18444899583751176498]),
    (0x4, [17226890335427755468, 18443055278223354162]),
    (0x8, [2032852871939366096, 18439367220385604838]),
    (0x10, [14545316742740207172, 18431993317065449817]),
    (0x20, [5129152022828963008, 18417254355718160513]),
    (0x40, [4894419605888772193, 18387811781193591352]),
    (0x80, [1280255884321894483, 18329067761203520168]),
    (0x100, [15924666964335305636, 18212142134806087854]),
    (0x200, [8010504389359918676, 17980523815641551639]),
    (0x400, [10668036004952895731, 17526086738831147013]),
    (0x800, [4878133418470705625, 16651378430235024244]),
    (0x1000, [9537173718739605541, 15030750278693429944]),
    (0x2000, [9972618978014552549, 12247334978882834399]),
    (0x4000, [10428997489610666743, 8131365268884726200]),
    (0x8000, [9305304367709015974, 3584323654723342297]),
    (0x10000, [14301143598189091785, 696457651847595233]),
    (0x20000, [7393154844743099908, 26294789957452057]),
    (0x40000, [2209338891292245656, 37481735321082]),
    (0x80000, [10518117631919034274, 76158723]),
];

/// Greatest tick `t` with `get_sqrt_ratio_at_tick(t) <= sqrt_price_x_96`.
///
/// The price must lie in `[MIN_SQRT_RATIO, MAX_SQRT_RATIO)`.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x_96: U256) -> Result<i32, StateError> {
    if sqrt_price_x_96 < MIN_SQRT_RATIO || sqrt_price_x_96 >= MAX_SQRT_RATIO {
        return Err(StateError::SqrtPriceOutOfBounds);
    }

    // Q128.128; the ratio is at least 2^32 so bit_len is never zero
    let ratio: U256 = sqrt_price_x_96 << SHIFT_32;
    let msb = ratio.bit_len() - 1;
    let mut r = if msb >= 127 {
        ratio >> (msb - 127)
    } else {
        ratio << (127 - msb)
    };

    // integer part of log2(ratio) in Q64, then 14 fractional bits
    let mut log_2: I256 =
        (I256::from_raw(U256::from(msb)) - I256::from_raw(U256::from(SHIFT_128))) << SHIFT_64;
    for shift in (50..=63usize).rev() {
        r = r.wrapping_mul(r) >> 127usize;
        let f: U256 = r >> SHIFT_128;
        log_2 |= I256::from_raw(f << shift);
        r >>= f;
    }

    let log_sqrt10001 = log_2.wrapping_mul(SQRT_10001);
    let tick_low = (log_sqrt10001 - TICK_LOW).asr(SHIFT_128).low_i32();
    let tick_high = (log_sqrt10001 + TICK_HIGH).asr(SHIFT_128).low_i32();

    Ok(if tick_low == tick_high {
        tick_low
    } else if get_sqrt_ratio_at_tick(tick_high)? <= sqrt_price_x_96 {
        tick_high
    } else {
        tick_low
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Q96;

    use std::{ops::Sub, str::FromStr};

    #[test]
    fn test_get_sqrt_ratio_at_tick_bounds() {
        // the function should return an error if the tick is out of bounds
        if let Err(err) = get_sqrt_ratio_at_tick(MIN_TICK - 1) {
            assert!(matches!(err, StateError::TickOutOfRange));
        } else {
            panic!("get_qrt_ratio_at_tick did not respect lower tick bound")
        }
        if let Err(err) = get_sqrt_ratio_at_tick(MAX_TICK + 1) {
            assert!(matches!(err, StateError::TickOutOfRange));
        } else {
            panic!("get_qrt_ratio_at_tick did not respect upper tick bound")
        }
    }

    #[test]
    fn test_get_sqrt_ratio_at_tick_values() {
        // test individual values for correct results
        assert_eq!(
            get_sqrt_ratio_at_tick(MIN_TICK).unwrap(),
            U256::from(4295128739u64),
            "sqrt ratio at min incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(MIN_TICK + 1).unwrap(),
            U256::from(4295343490u64),
            "sqrt ratio at min + 1 incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(MAX_TICK - 1).unwrap(),
            U256::from_str("1461373636630004318706518188784493106690254656249").unwrap(),
            "sqrt ratio at max - 1 incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(MAX_TICK).unwrap(),
            U256::from_str("1461446703485210103287273052203988822378723970342").unwrap(),
            "sqrt ratio at max incorrect"
        );
        // checking hard coded values against solidity results
        assert_eq!(
            get_sqrt_ratio_at_tick(50).unwrap(),
            U256::from(79426470787362580746886972461u128),
            "sqrt ratio at 50 incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(100).unwrap(),
            U256::from(79625275426524748796330556128u128),
            "sqrt ratio at 100 incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(250).unwrap(),
            U256::from(80224679980005306637834519095u128),
            "sqrt ratio at 250 incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(500).unwrap(),
            U256::from(81233731461783161732293370115u128),
            "sqrt ratio at 500 incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(1000).unwrap(),
            U256::from(83290069058676223003182343270u128),
            "sqrt ratio at 1000 incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(2500).unwrap(),
            U256::from(89776708723587163891445672585u128),
            "sqrt ratio at 2500 incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(3000).unwrap(),
            U256::from(92049301871182272007977902845u128),
            "sqrt ratio at 3000 incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(4000).unwrap(),
            U256::from(96768528593268422080558758223u128),
            "sqrt ratio at 4000 incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(5000).unwrap(),
            U256::from(101729702841318637793976746270u128),
            "sqrt ratio at 5000 incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(50000).unwrap(),
            U256::from(965075977353221155028623082916u128),
            "sqrt ratio at 50000 incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(150000).unwrap(),
            U256::from(143194173941309278083010301478497u128),
            "sqrt ratio at 150000 incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(250000).unwrap(),
            U256::from(21246587762933397357449903968194344u128),
            "sqrt ratio at 250000 incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(500000).unwrap(),
            U256::from_str("5697689776495288729098254600827762987878").unwrap(),
            "sqrt ratio at 500000 incorrect"
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(738203).unwrap(),
            U256::from_str("847134979253254120489401328389043031315994541").unwrap(),
            "sqrt ratio at 738203 incorrect"
        );
    }

    #[test]
    pub fn test_get_tick_at_sqrt_ratio() {
        //throws for too low
        let result = get_tick_at_sqrt_ratio(MIN_SQRT_RATIO.sub(U256::ONE));
        assert!(matches!(result, Err(StateError::SqrtPriceOutOfBounds)));

        //throws for too high
        let result = get_tick_at_sqrt_ratio(MAX_SQRT_RATIO);
        assert!(matches!(result, Err(StateError::SqrtPriceOutOfBounds)));

        //ratio of min tick
        let result = get_tick_at_sqrt_ratio(MIN_SQRT_RATIO).unwrap();
        assert_eq!(result, MIN_TICK);

        //ratio of min tick + 1
        let result = get_tick_at_sqrt_ratio(U256::from_str("4295343490").unwrap()).unwrap();
        assert_eq!(result, MIN_TICK + 1);

        //ratio closest to max tick
        let result = get_tick_at_sqrt_ratio(MAX_SQRT_RATIO - U256::ONE).unwrap();
        assert_eq!(result, MAX_TICK - 1);
    }

    #[test]
    fn negative_log_rounds_toward_lower_tick() {
        // prices below 1 give a negative log2, which must shift arithmetically
        assert_eq!(get_tick_at_sqrt_ratio(Q96).unwrap(), 0);
        assert_eq!(get_tick_at_sqrt_ratio(Q96 - U256::ONE).unwrap(), -1);
        let ratio = get_sqrt_ratio_at_tick(-200_000).unwrap();
        assert_eq!(get_tick_at_sqrt_ratio(ratio + U256::ONE).unwrap(), -200_000);
    }

    #[test]
    fn usable_ticks_are_spaced() {
        assert_eq!(min_usable_tick(60), -887220);
        assert_eq!(max_usable_tick(60), 887220);
        assert_eq!(min_usable_tick(10), -887270);
        assert_eq!(max_usable_tick(200), 887200);
        assert_eq!(max_usable_tick(1), MAX_TICK);
    }

    #[test]
    fn tick_at_ratio_is_floor_of_inverse() {
        for tick in [-887271, -23028, -60, -1, 0, 1, 59, 23027, 500_000, 887271] {
            let ratio = get_sqrt_ratio_at_tick(tick).unwrap();
            assert_eq!(get_tick_at_sqrt_ratio(ratio).unwrap(), tick);
            // one below the boundary still belongs to the previous tick
            assert_eq!(get_tick_at_sqrt_ratio(ratio - U256::ONE).unwrap(), tick - 1);
        }
    }

    #[test]
    fn tick_of_one_tenth_price() {
        // sqrt(1/10) * 2^96
        let sqrt_price = U256::from_str("25054144837504793118641380156").unwrap();
        assert_eq!(get_tick_at_sqrt_ratio(sqrt_price).unwrap(), -23028);
    }
}
