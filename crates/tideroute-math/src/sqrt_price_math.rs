//! Next sqrt price after adding an exact input amount

use ethnum::U256;

use crate::big_num::{div_rounding_up, mul_div_ceil, to_u128};
use crate::error::{ComputeError, ComputeResult};

/// Price after adding `amount` of token 0, rounded up so the pool never
/// gives away more than the input pays for:
/// `L * sqrt_p / (L + amount * sqrt_p)`
pub fn get_next_sqrt_price_from_amount_0_rounding_up(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount: u64,
) -> ComputeResult<u128> {
    if amount == 0 {
        return Ok(sqrt_price_x64);
    }
    let numerator_1 = U256::from(liquidity) << 64u32;
    let product = U256::from(amount) * U256::from(sqrt_price_x64);

    if let Some(denominator) = numerator_1.checked_add(product) {
        return to_u128(mul_div_ceil(numerator_1, U256::from(sqrt_price_x64), denominator)?);
    }

    // Fallback form: L / (L / sqrt_p + amount)
    let quotient = (numerator_1 / U256::from(sqrt_price_x64))
        .checked_add(U256::from(amount))
        .ok_or(ComputeError::Overflow)?;
    to_u128(div_rounding_up(numerator_1, quotient)?)
}

/// Price after adding `amount` of token 1, rounded down: `sqrt_p + amount / L`
pub fn get_next_sqrt_price_from_amount_1_rounding_down(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount: u64,
) -> ComputeResult<u128> {
    if liquidity == 0 {
        return Err(ComputeError::DivisionByZero);
    }
    let quotient = (u128::from(amount) << 64) / liquidity;
    sqrt_price_x64
        .checked_add(quotient)
        .ok_or(ComputeError::Overflow)
}

pub fn get_next_sqrt_price_from_input(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount_in: u64,
    zero_for_one: bool,
) -> ComputeResult<u128> {
    if sqrt_price_x64 == 0 || liquidity == 0 {
        return Err(ComputeError::DivisionByZero);
    }
    if zero_for_one {
        get_next_sqrt_price_from_amount_0_rounding_up(sqrt_price_x64, liquidity, amount_in)
    } else {
        get_next_sqrt_price_from_amount_1_rounding_down(sqrt_price_x64, liquidity, amount_in)
    }
}
