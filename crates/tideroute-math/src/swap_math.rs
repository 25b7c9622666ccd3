//! A single exact-input swap step inside one liquidity range

use crate::big_num::{mul_div_u64, Rounding};
use crate::error::{ComputeError, ComputeResult};
use crate::liquidity_math::{get_delta_amount_0_unsigned, get_delta_amount_1_unsigned};
use crate::sqrt_price_math::get_next_sqrt_price_from_input;

/// Fee rates are expressed in hundredths of a basis point.
pub const FEE_RATE_DENOMINATOR: u32 = 1_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapStep {
    /// Price reached at the end of the step
    pub sqrt_price_next_x64: u128,
    /// Input consumed, excluding fee
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee_amount: u64,
}

/// Move from `sqrt_price_current_x64` towards `sqrt_price_target_x64` spending at most
/// `amount_remaining` (fee included) at constant `liquidity`.
pub fn compute_swap_step(
    sqrt_price_current_x64: u128,
    sqrt_price_target_x64: u128,
    liquidity: u128,
    amount_remaining: u64,
    fee_rate: u32,
    zero_for_one: bool,
) -> ComputeResult<SwapStep> {
    if fee_rate >= FEE_RATE_DENOMINATOR {
        return Err(ComputeError::Overflow);
    }
    let mut step = SwapStep::default();

    let amount_remaining_less_fee = mul_div_u64(
        amount_remaining,
        u64::from(FEE_RATE_DENOMINATOR - fee_rate),
        u64::from(FEE_RATE_DENOMINATOR),
        Rounding::Down,
    )?;

    // Input needed to reach the target; `None` when it would not fit in a u64,
    // in which case the target is unreachable with any u64 input.
    let amount_in_to_target = match if zero_for_one {
        get_delta_amount_0_unsigned(sqrt_price_target_x64, sqrt_price_current_x64, liquidity, true)
    } else {
        get_delta_amount_1_unsigned(sqrt_price_current_x64, sqrt_price_target_x64, liquidity, true)
    } {
        Ok(amount) => Some(amount),
        Err(ComputeError::Overflow) => None,
        Err(err) => return Err(err),
    };

    if let Some(amount) = amount_in_to_target {
        step.amount_in = amount;
    }
    step.sqrt_price_next_x64 = match amount_in_to_target {
        Some(amount) if amount_remaining_less_fee >= amount => sqrt_price_target_x64,
        _ => get_next_sqrt_price_from_input(
            sqrt_price_current_x64,
            liquidity,
            amount_remaining_less_fee,
            zero_for_one,
        )?,
    };

    let reached_target = step.sqrt_price_next_x64 == sqrt_price_target_x64;
    if zero_for_one {
        if !reached_target {
            step.amount_in = get_delta_amount_0_unsigned(
                step.sqrt_price_next_x64,
                sqrt_price_current_x64,
                liquidity,
                true,
            )?;
        }
        step.amount_out = get_delta_amount_1_unsigned(
            step.sqrt_price_next_x64,
            sqrt_price_current_x64,
            liquidity,
            false,
        )?;
    } else {
        if !reached_target {
            step.amount_in = get_delta_amount_1_unsigned(
                sqrt_price_current_x64,
                step.sqrt_price_next_x64,
                liquidity,
                true,
            )?;
        }
        step.amount_out = get_delta_amount_0_unsigned(
            sqrt_price_current_x64,
            step.sqrt_price_next_x64,
            liquidity,
            false,
        )?;
    }

    step.fee_amount = if !reached_target {
        // Target not reached: whatever is left of the input is fee.
        amount_remaining
            .checked_sub(step.amount_in)
            .ok_or(ComputeError::Overflow)?
    } else {
        mul_div_u64(
            step.amount_in,
            u64::from(fee_rate),
            u64::from(FEE_RATE_DENOMINATOR - fee_rate),
            Rounding::Up,
        )?
    };

    Ok(step)
}
