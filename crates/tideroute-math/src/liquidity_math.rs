//! Token deltas between two sqrt prices at constant liquidity

use ethnum::U256;

use crate::big_num::{div_rounding_up, mul_div_ceil, mul_div_floor, to_u64};
use crate::error::{ComputeError, ComputeResult};
use crate::tick_math::Q64;

/// Apply a signed liquidity delta
pub fn add_delta(liquidity: u128, delta: i128) -> ComputeResult<u128> {
    if delta < 0 {
        liquidity
            .checked_sub(delta.unsigned_abs())
            .ok_or(ComputeError::Overflow)
    } else {
        liquidity
            .checked_add(delta.unsigned_abs())
            .ok_or(ComputeError::Overflow)
    }
}

/// Amount of token 0 between two prices: `L * (sqrt_b - sqrt_a) / (sqrt_a * sqrt_b)`
pub fn get_delta_amount_0_unsigned(
    mut sqrt_ratio_a_x64: u128,
    mut sqrt_ratio_b_x64: u128,
    liquidity: u128,
    round_up: bool,
) -> ComputeResult<u64> {
    if sqrt_ratio_a_x64 > sqrt_ratio_b_x64 {
        std::mem::swap(&mut sqrt_ratio_a_x64, &mut sqrt_ratio_b_x64);
    }
    if sqrt_ratio_a_x64 == 0 {
        return Err(ComputeError::DivisionByZero);
    }

    let numerator_1 = U256::from(liquidity) << 64u32;
    let numerator_2 = U256::from(sqrt_ratio_b_x64 - sqrt_ratio_a_x64);
    let result = if round_up {
        div_rounding_up(
            mul_div_ceil(numerator_1, numerator_2, U256::from(sqrt_ratio_b_x64))?,
            U256::from(sqrt_ratio_a_x64),
        )?
    } else {
        mul_div_floor(numerator_1, numerator_2, U256::from(sqrt_ratio_b_x64))?
            / U256::from(sqrt_ratio_a_x64)
    };
    to_u64(result)
}

/// Amount of token 1 between two prices: `L * (sqrt_b - sqrt_a)`
pub fn get_delta_amount_1_unsigned(
    mut sqrt_ratio_a_x64: u128,
    mut sqrt_ratio_b_x64: u128,
    liquidity: u128,
    round_up: bool,
) -> ComputeResult<u64> {
    if sqrt_ratio_a_x64 > sqrt_ratio_b_x64 {
        std::mem::swap(&mut sqrt_ratio_a_x64, &mut sqrt_ratio_b_x64);
    }

    let diff = U256::from(sqrt_ratio_b_x64 - sqrt_ratio_a_x64);
    let result = if round_up {
        mul_div_ceil(U256::from(liquidity), diff, U256::from(Q64))?
    } else {
        mul_div_floor(U256::from(liquidity), diff, U256::from(Q64))?
    };
    to_u64(result)
}
