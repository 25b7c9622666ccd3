//! Tick <-> Q64.64 sqrt price conversion
//!
//! Bit-exact with the on-chain concentrated-liquidity program: the sqrt price
//! for a tick is built from precomputed `sqrt(1.0001)^(-2^i)` factors, and the
//! inverse uses a 16-bit log2 approximation refined against the forward map.

use crate::error::{ComputeError, ComputeResult};

pub const MIN_TICK: i32 = -443636;
pub const MAX_TICK: i32 = -MIN_TICK;

/// `get_sqrt_price_at_tick(MIN_TICK)`
pub const MIN_SQRT_PRICE_X64: u128 = 4295048016;
/// `get_sqrt_price_at_tick(MAX_TICK)`
pub const MAX_SQRT_PRICE_X64: u128 = 79226673521066979257578248091;

/// 1.0 in Q64.64
pub const Q64: u128 = 1u128 << 64;

const BIT_PRECISION: u32 = 16;

/// `sqrt(1.0001)^(-2^i)` in Q64.64 for bits 1..=18 of |tick|
const RATIO_FACTORS: [u128; 18] = [
    0xfff97272373d4000,
    0xfff2e50f5f657000,
    0xffe5caca7e10f000,
    0xffcb9843d60f7000,
    0xff973b41fa98e800,
    0xff2ea16466c9b000,
    0xfe5dee046a9a3800,
    0xfcbe86c7900bb000,
    0xf987a7253ac65800,
    0xf3392b0822bb6000,
    0xe7159475a2caf000,
    0xd097f3bdfd2f2000,
    0xa9f746462d9f8000,
    0x70d869a156f31c00,
    0x31be135f97ed3200,
    0x9aa508b5b85a500,
    0x5d6af8dedc582c,
    0x2216e584f5fa,
];

/// Sqrt price (Q64.64) at the given tick
pub fn get_sqrt_price_at_tick(tick: i32) -> ComputeResult<u128> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK as u32 {
        return Err(ComputeError::TickOutOfRange(tick));
    }

    let mut ratio: u128 = if abs_tick & 0x1 != 0 {
        0xfffcb933bd6fb800
    } else {
        Q64
    };
    for (bit, factor) in RATIO_FACTORS.iter().enumerate() {
        if abs_tick & (0x2 << bit) != 0 {
            // Both operands are below 2^64 so the product fits in u128.
            ratio = (ratio * factor) >> 64;
        }
    }

    if tick > 0 {
        ratio = u128::MAX / ratio;
    }
    Ok(ratio)
}

/// Greatest tick whose sqrt price is at or below `sqrt_price_x64`
pub fn get_tick_at_sqrt_price(sqrt_price_x64: u128) -> ComputeResult<i32> {
    if !(MIN_SQRT_PRICE_X64..MAX_SQRT_PRICE_X64).contains(&sqrt_price_x64) {
        return Err(ComputeError::SqrtPriceOutOfRange(sqrt_price_x64));
    }

    let msb = 127 - sqrt_price_x64.leading_zeros();
    let log2p_integer_x32 = (i128::from(msb) - 64) << 32;

    // Fractional part of log2, one bit per squaring, starting at 0.5.
    let mut bit: i128 = 0x8000_0000_0000_0000;
    let mut precision = 0;
    let mut log2p_fraction_x64: i128 = 0;
    let mut r = if msb >= 64 {
        sqrt_price_x64 >> (msb - 63)
    } else {
        sqrt_price_x64 << (63 - msb)
    };
    while bit > 0 && precision < BIT_PRECISION {
        r *= r;
        let is_r_more_than_two = (r >> 127) as u32;
        r >>= 63 + is_r_more_than_two;
        log2p_fraction_x64 += bit * i128::from(is_r_more_than_two);
        bit >>= 1;
        precision += 1;
    }
    let log2p_x32 = log2p_integer_x32 + (log2p_fraction_x64 >> 32);

    // Change of base to log_sqrt(1.0001), 2^16 / log2(sqrt(1.0001)) scaled.
    let log_sqrt_10001_x64 = log2p_x32 * 59543866431248i128;
    let tick_low = ((log_sqrt_10001_x64 - 184467440737095516i128) >> 64) as i32;
    let tick_high = ((log_sqrt_10001_x64 + 15793534762490258745i128) >> 64) as i32;

    Ok(if tick_low == tick_high {
        tick_low
    } else if get_sqrt_price_at_tick(tick_high)? <= sqrt_price_x64 {
        tick_high
    } else {
        tick_low
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_match_the_extreme_ticks() {
        assert_eq!(get_sqrt_price_at_tick(MIN_TICK).unwrap(), MIN_SQRT_PRICE_X64);
        assert_eq!(get_sqrt_price_at_tick(MAX_TICK).unwrap(), MAX_SQRT_PRICE_X64);
        assert_eq!(get_sqrt_price_at_tick(0).unwrap(), Q64);
    }

    #[test]
    fn rejects_out_of_range_input() {
        assert_eq!(
            get_sqrt_price_at_tick(MAX_TICK + 1),
            Err(ComputeError::TickOutOfRange(MAX_TICK + 1))
        );
        assert!(get_tick_at_sqrt_price(MIN_SQRT_PRICE_X64 - 1).is_err());
        assert!(get_tick_at_sqrt_price(MAX_SQRT_PRICE_X64).is_err());
    }

    #[test]
    fn sqrt_price_is_monotonic() {
        let mut previous = get_sqrt_price_at_tick(-1000).unwrap();
        for tick in -999..1000 {
            let current = get_sqrt_price_at_tick(tick).unwrap();
            assert!(current > previous, "tick {tick}");
            previous = current;
        }
    }

    #[test]
    fn tick_round_trip_at_landmarks() {
        for tick in [MIN_TICK, -100_000, -60, -1, 0, 1, 60, 12_345, MAX_TICK - 1] {
            let price = get_sqrt_price_at_tick(tick).unwrap();
            assert_eq!(get_tick_at_sqrt_price(price).unwrap(), tick);
            if tick < MAX_TICK - 1 {
                let next = get_sqrt_price_at_tick(tick + 1).unwrap();
                assert_eq!(get_tick_at_sqrt_price(next - 1).unwrap(), tick);
            }
        }
    }
}
