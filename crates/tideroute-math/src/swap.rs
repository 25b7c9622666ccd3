//! Exact-input swap simulation across initialized ticks
//!
//! Walks the same path the on-chain program walks: start in the first
//! initialized tick array, step to each initialized tick in the swap direction,
//! cross it, and jump to the next initialized array through the bitmaps when
//! the current one runs out. The arrays visited are reported so the
//! instruction can carry them as remaining accounts.

use crate::error::{ComputeError, ComputeResult};
use crate::liquidity_math::add_delta;
use crate::swap_math::compute_swap_step;
use crate::tick_array::{TickArray, TickArraySource, TickState};
use crate::tick_array_bitmap::TickArrayBitmaps;
use crate::tick_math::{
    get_sqrt_price_at_tick, get_tick_at_sqrt_price, MAX_SQRT_PRICE_X64, MAX_TICK,
    MIN_SQRT_PRICE_X64, MIN_TICK,
};

/// Upper bound on swap steps before the walk is declared stuck
pub const MAX_SWAP_STEPS: usize = 100;

/// Price and liquidity of a concentrated-liquidity pool at simulation start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcentratedState {
    pub sqrt_price_x64: u128,
    pub liquidity: u128,
    pub tick_current: i32,
    pub tick_spacing: u16,
    /// Trade fee in hundredths of a basis point
    pub fee_rate: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapResult {
    /// Input consumed, fee included
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee_amount: u64,
    pub sqrt_price_x64: u128,
    pub tick: i32,
    pub liquidity: u128,
    /// Start indexes of every tick array the walk touched, in order
    pub tick_arrays: Vec<i32>,
}

fn load<S: TickArraySource + ?Sized>(source: &S, start_index: i32) -> ComputeResult<&TickArray> {
    source
        .tick_array(start_index)
        .ok_or(ComputeError::TickArrayNotLoaded(start_index))
}

/// Simulate swapping `amount_in` of token 0 (`zero_for_one`) or token 1 with no price limit.
///
/// Fails with [`ComputeError::TickArrayNotLoaded`] naming the first array the walk
/// needs but `source` does not have; callers load it and retry.
pub fn simulate_swap<S: TickArraySource + ?Sized>(
    state: &ConcentratedState,
    bitmaps: &TickArrayBitmaps<'_>,
    source: &S,
    amount_in: u64,
    zero_for_one: bool,
) -> ComputeResult<SwapResult> {
    if state.tick_spacing == 0 {
        return Err(ComputeError::InvalidTickSpacing);
    }
    if state.sqrt_price_x64 < MIN_SQRT_PRICE_X64 || state.sqrt_price_x64 >= MAX_SQRT_PRICE_X64 {
        return Err(ComputeError::SqrtPriceOutOfRange(state.sqrt_price_x64));
    }

    let mut result = SwapResult {
        sqrt_price_x64: state.sqrt_price_x64,
        tick: state.tick_current,
        liquidity: state.liquidity,
        ..SwapResult::default()
    };
    if amount_in == 0 {
        return Ok(result);
    }

    let sqrt_price_limit_x64 = if zero_for_one {
        MIN_SQRT_PRICE_X64 + 1
    } else {
        MAX_SQRT_PRICE_X64 - 1
    };

    let (mut in_current_array, first_start_index) =
        bitmaps.first_initialized_tick_array(state.tick_current, zero_for_one)?;
    let mut current_start_index = first_start_index;
    let mut tick_array = load(source, first_start_index)?;
    result.tick_arrays.push(first_start_index);

    let mut remaining = amount_in;
    let mut steps = 0;

    while remaining != 0
        && result.sqrt_price_x64 != sqrt_price_limit_x64
        && result.tick < MAX_TICK
        && result.tick > MIN_TICK
    {
        if steps == MAX_SWAP_STEPS {
            return Err(ComputeError::NoConvergence { iterations: steps });
        }
        steps += 1;

        let sqrt_price_start_x64 = result.sqrt_price_x64;

        let mut next_tick = match tick_array.next_initialized_tick(
            result.tick,
            state.tick_spacing,
            zero_for_one,
        ) {
            Some(tick) => *tick,
            None if !in_current_array => {
                in_current_array = true;
                *tick_array.first_initialized_tick(zero_for_one)?
            }
            None => TickState::default(),
        };

        if !next_tick.is_initialized() {
            let next_start_index = bitmaps
                .next_initialized_tick_array_start_index(current_start_index, zero_for_one)?
                .ok_or(ComputeError::InsufficientLiquidity)?;
            tick_array = load(source, next_start_index)?;
            current_start_index = next_start_index;
            result.tick_arrays.push(next_start_index);
            next_tick = *tick_array.first_initialized_tick(zero_for_one)?;
        }

        let tick_next = next_tick.tick.clamp(MIN_TICK, MAX_TICK);
        let sqrt_price_next_x64 = get_sqrt_price_at_tick(tick_next)?;

        let target_price = if (zero_for_one && sqrt_price_next_x64 < sqrt_price_limit_x64)
            || (!zero_for_one && sqrt_price_next_x64 > sqrt_price_limit_x64)
        {
            sqrt_price_limit_x64
        } else {
            sqrt_price_next_x64
        };

        let step = compute_swap_step(
            result.sqrt_price_x64,
            target_price,
            result.liquidity,
            remaining,
            state.fee_rate,
            zero_for_one,
        )?;
        result.sqrt_price_x64 = step.sqrt_price_next_x64;

        let consumed = step
            .amount_in
            .checked_add(step.fee_amount)
            .ok_or(ComputeError::Overflow)?;
        remaining = remaining.checked_sub(consumed).ok_or(ComputeError::Overflow)?;
        result.amount_out = result
            .amount_out
            .checked_add(step.amount_out)
            .ok_or(ComputeError::Overflow)?;
        result.fee_amount = result
            .fee_amount
            .checked_add(step.fee_amount)
            .ok_or(ComputeError::Overflow)?;

        if result.sqrt_price_x64 == sqrt_price_next_x64 {
            if next_tick.is_initialized() {
                let liquidity_net = if zero_for_one {
                    next_tick.liquidity_net.checked_neg().ok_or(ComputeError::Overflow)?
                } else {
                    next_tick.liquidity_net
                };
                result.liquidity = add_delta(result.liquidity, liquidity_net)?;
            }
            result.tick = if zero_for_one { tick_next - 1 } else { tick_next };
        } else if result.sqrt_price_x64 != sqrt_price_start_x64 {
            result.tick = get_tick_at_sqrt_price(result.sqrt_price_x64)?;
        }
    }

    result.amount_in = amount_in - remaining;
    Ok(result)
}

/// Tick arrays an instruction swapping `amount_in` must carry, in traversal order.
///
/// The walk's own arrays come first; when it stays in a single array the next
/// initialized one is appended so small price moves near an edge still succeed.
pub fn remaining_tick_arrays<S: TickArraySource + ?Sized>(
    state: &ConcentratedState,
    bitmaps: &TickArrayBitmaps<'_>,
    source: &S,
    amount_in: u64,
    zero_for_one: bool,
) -> ComputeResult<Vec<i32>> {
    let mut arrays = simulate_swap(state, bitmaps, source, amount_in, zero_for_one)?.tick_arrays;
    if arrays.is_empty() {
        let (_, first) = bitmaps.first_initialized_tick_array(state.tick_current, zero_for_one)?;
        arrays.push(first);
    }
    if arrays.len() == 1 {
        if let Some(next) =
            bitmaps.next_initialized_tick_array_start_index(arrays[0], zero_for_one)?
        {
            arrays.push(next);
        }
    }
    Ok(arrays)
}
