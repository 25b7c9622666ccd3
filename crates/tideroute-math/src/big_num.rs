//! Wide integer helpers
//!
//! `ethnum::U256` covers the 256-bit range the pricing formulas live in, but
//! `a * b / c` with both factors near 2^192 needs a 512-bit intermediate. The
//! product is kept as a `(hi, lo)` pair and reduced with a shift-subtract
//! division, which is plenty fast off-chain.

use ethnum::U256;

use crate::error::{ComputeError, ComputeResult};

/// Rounding mode for division operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round towards zero
    Down,
    /// Round away from zero
    Up,
}

const LOW_128: U256 = U256::from_words(0, u128::MAX);

/// Full 256x256 multiplication, returning the `(hi, lo)` halves of the 512-bit product.
pub fn full_mul(a: U256, b: U256) -> (U256, U256) {
    let (a_hi, a_lo) = (a >> 128u32, a & LOW_128);
    let (b_hi, b_lo) = (b >> 128u32, b & LOW_128);

    // Each partial product of two 128-bit halves fits in 256 bits.
    let lo_lo = a_lo * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_lo = a_hi * b_lo;
    let hi_hi = a_hi * b_hi;

    let (mid, carry_a) = lo_hi.overflowing_add(hi_lo);
    let (mid, carry_b) = mid.overflowing_add(lo_lo >> 128u32);
    let carry = U256::from(u8::from(carry_a) + u8::from(carry_b)) << 128u32;

    let lo = (mid << 128u32) | (lo_lo & LOW_128);
    let hi = hi_hi + (mid >> 128u32) + carry;
    (hi, lo)
}

/// Divide the 512-bit value `(hi, lo)` by `divisor`.
///
/// Returns `None` when the quotient does not fit in 256 bits.
fn div_rem_wide(hi: U256, lo: U256, divisor: U256) -> Option<(U256, U256)> {
    if hi >= divisor {
        return None;
    }
    if hi == U256::ZERO {
        return Some((lo / divisor, lo % divisor));
    }

    let mut remainder = hi;
    let mut quotient = U256::ZERO;
    for bit in (0..256u32).rev() {
        let overflow = (remainder >> 255u32) == U256::ONE;
        remainder = (remainder << 1u32) | ((lo >> bit) & U256::ONE);
        if overflow || remainder >= divisor {
            remainder = remainder.wrapping_sub(divisor);
            quotient |= U256::ONE << bit;
        }
    }
    Some((quotient, remainder))
}

/// `a * b / denominator` with a 512-bit intermediate product
pub fn mul_div(a: U256, b: U256, denominator: U256, rounding: Rounding) -> ComputeResult<U256> {
    if denominator == U256::ZERO {
        return Err(ComputeError::DivisionByZero);
    }
    let (hi, lo) = full_mul(a, b);
    let (quotient, remainder) = div_rem_wide(hi, lo, denominator).ok_or(ComputeError::Overflow)?;

    if rounding == Rounding::Up && remainder != U256::ZERO {
        quotient.checked_add(U256::ONE).ok_or(ComputeError::Overflow)
    } else {
        Ok(quotient)
    }
}

pub fn mul_div_floor(a: U256, b: U256, denominator: U256) -> ComputeResult<U256> {
    mul_div(a, b, denominator, Rounding::Down)
}

pub fn mul_div_ceil(a: U256, b: U256, denominator: U256) -> ComputeResult<U256> {
    mul_div(a, b, denominator, Rounding::Up)
}

/// Ceiling division
pub fn div_rounding_up(numerator: U256, denominator: U256) -> ComputeResult<U256> {
    if denominator == U256::ZERO {
        return Err(ComputeError::DivisionByZero);
    }
    let quotient = numerator / denominator;
    if numerator % denominator == U256::ZERO {
        Ok(quotient)
    } else {
        quotient.checked_add(U256::ONE).ok_or(ComputeError::Overflow)
    }
}

/// Multiply two u64 values and divide by a third with the given rounding
pub fn mul_div_u64(a: u64, b: u64, denominator: u64, rounding: Rounding) -> ComputeResult<u64> {
    if denominator == 0 {
        return Err(ComputeError::DivisionByZero);
    }
    let product = u128::from(a) * u128::from(b);
    let mut result = product / u128::from(denominator);
    if rounding == Rounding::Up && product % u128::from(denominator) != 0 {
        result += 1;
    }
    u64::try_from(result).map_err(|_| ComputeError::Overflow)
}

pub fn to_u64(value: U256) -> ComputeResult<u64> {
    if value > U256::from(u64::MAX) {
        return Err(ComputeError::Overflow);
    }
    Ok(value.as_u64())
}

pub fn to_u128(value: U256) -> ComputeResult<u128> {
    if value.high() != &0 {
        return Err(ComputeError::Overflow);
    }
    Ok(*value.low())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mul_matches_native_for_small_values() {
        let (hi, lo) = full_mul(U256::from(u128::MAX), U256::from(u128::MAX));
        assert_eq!(hi, U256::ZERO);
        assert_eq!(lo, U256::from(u128::MAX) * U256::from(u128::MAX));
    }

    #[test]
    fn full_mul_carries_into_high_half() {
        let (hi, lo) = full_mul(U256::MAX, U256::from(2u8));
        assert_eq!(hi, U256::ONE);
        assert_eq!(lo, U256::MAX - U256::ONE);
    }

    #[test]
    fn mul_div_uses_wide_intermediate() {
        // (2^200 * 2^100) / 2^150 = 2^150, the product itself needs 300 bits
        let a = U256::ONE << 200u32;
        let b = U256::ONE << 100u32;
        let c = U256::ONE << 150u32;
        assert_eq!(mul_div_floor(a, b, c).unwrap(), U256::ONE << 150u32);
    }

    #[test]
    fn mul_div_rounding() {
        let seven = U256::from(7u8);
        let two = U256::from(2u8);
        assert_eq!(mul_div_floor(seven, U256::ONE, two).unwrap(), U256::from(3u8));
        assert_eq!(mul_div_ceil(seven, U256::ONE, two).unwrap(), U256::from(4u8));
        assert_eq!(mul_div_ceil(U256::from(8u8), U256::ONE, two).unwrap(), U256::from(4u8));
    }

    #[test]
    fn mul_div_rejects_zero_and_overflow() {
        assert_eq!(
            mul_div_floor(U256::ONE, U256::ONE, U256::ZERO),
            Err(ComputeError::DivisionByZero)
        );
        assert_eq!(
            mul_div_floor(U256::MAX, U256::MAX, U256::ONE),
            Err(ComputeError::Overflow)
        );
    }

    #[test]
    fn narrow_mul_div() {
        assert_eq!(mul_div_u64(10, 3, 4, Rounding::Down).unwrap(), 7);
        assert_eq!(mul_div_u64(10, 3, 4, Rounding::Up).unwrap(), 8);
        assert!(mul_div_u64(u64::MAX, u64::MAX, 1, Rounding::Down).is_err());
    }
}
