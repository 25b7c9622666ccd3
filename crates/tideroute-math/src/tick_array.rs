//! Tick arrays and the cache the simulator reads them from

use ahash::AHashMap;

use crate::error::{ComputeError, ComputeResult};
use crate::tick_math::{MAX_TICK, MIN_TICK};

/// Ticks stored per tick array account
pub const TICK_ARRAY_SIZE: i32 = 60;
pub const TICK_ARRAY_SIZE_USIZE: usize = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickState {
    pub tick: i32,
    /// Liquidity added when the price crosses this tick left to right
    pub liquidity_net: i128,
    pub liquidity_gross: u128,
}

impl TickState {
    pub fn is_initialized(&self) -> bool {
        self.liquidity_gross != 0
    }
}

/// Number of ticks covered by one array
pub fn tick_count(tick_spacing: u16) -> i32 {
    TICK_ARRAY_SIZE * i32::from(tick_spacing)
}

/// Start index of the array containing `tick_index`, rounding towards negative infinity
pub fn get_array_start_index(tick_index: i32, tick_spacing: u16) -> i32 {
    let ticks_in_array = tick_count(tick_spacing);
    tick_index.div_euclid(ticks_in_array) * ticks_in_array
}

pub fn check_is_valid_start_index(tick_index: i32, tick_spacing: u16) -> bool {
    if !(MIN_TICK..=MAX_TICK).contains(&tick_index) {
        if tick_index > MAX_TICK {
            return false;
        }
        return tick_index == get_array_start_index(MIN_TICK, tick_spacing);
    }
    tick_index % tick_count(tick_spacing) == 0
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickArray {
    pub start_tick_index: i32,
    pub ticks: [TickState; TICK_ARRAY_SIZE_USIZE],
}

impl TickArray {
    pub fn new(start_tick_index: i32) -> Self {
        Self {
            start_tick_index,
            ticks: [TickState::default(); TICK_ARRAY_SIZE_USIZE],
        }
    }

    /// First initialized tick when entering the array from its edge in the swap direction
    pub fn first_initialized_tick(&self, zero_for_one: bool) -> ComputeResult<&TickState> {
        let found = if zero_for_one {
            self.ticks.iter().rev().find(|tick| tick.is_initialized())
        } else {
            self.ticks.iter().find(|tick| tick.is_initialized())
        };
        found.ok_or_else(|| {
            ComputeError::InvalidTickArray(format!(
                "array {} has no initialized tick",
                self.start_tick_index
            ))
        })
    }

    /// Next initialized tick from `current_tick_index` inside this array.
    ///
    /// Searching down includes the current tick, searching up does not. Returns
    /// `None` when the current tick belongs to another array or nothing is left.
    pub fn next_initialized_tick(
        &self,
        current_tick_index: i32,
        tick_spacing: u16,
        zero_for_one: bool,
    ) -> Option<&TickState> {
        if get_array_start_index(current_tick_index, tick_spacing) != self.start_tick_index {
            return None;
        }
        let offset = ((current_tick_index - self.start_tick_index) / i32::from(tick_spacing)) as usize;

        if zero_for_one {
            self.ticks[..=offset]
                .iter()
                .rev()
                .find(|tick| tick.is_initialized())
        } else {
            self.ticks[offset + 1..].iter().find(|tick| tick.is_initialized())
        }
    }
}

/// Where the simulator gets tick arrays from
pub trait TickArraySource {
    fn tick_array(&self, start_index: i32) -> Option<&TickArray>;
}

/// Tick arrays loaded for one quote or one swap-plan build, keyed by start index.
#[derive(Debug, Clone, Default)]
pub struct TickArrayCache {
    arrays: AHashMap<i32, TickArray>,
}

impl TickArrayCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, array: TickArray) {
        self.arrays.insert(array.start_tick_index, array);
    }

    pub fn contains(&self, start_index: i32) -> bool {
        self.arrays.contains_key(&start_index)
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}

impl TickArraySource for TickArrayCache {
    fn tick_array(&self, start_index: i32) -> Option<&TickArray> {
        self.arrays.get(&start_index)
    }
}
