//! # Tideroute Math
//!
//! Integer pricing for the pool families the router trades against:
//!
//! - **Constant product**: `x * y = k` with the input fee taken before the
//!   curve, truncated the way the on-chain programs truncate.
//! - **Concentrated liquidity**: Q64.64 sqrt prices, tick arrays, the two-level
//!   tick-array bitmap and a step-by-step swap simulator.
//!
//! Everything here is pure. Account decoding and RPC live in the `tideroute` crate.

pub mod big_num;
pub mod constant_product;
pub mod error;
pub mod liquidity_math;
pub mod sqrt_price_math;
pub mod swap;
pub mod swap_math;
pub mod tick_array;
pub mod tick_array_bitmap;
pub mod tick_math;

pub use constant_product::{apply_slippage, ConstantProductCurve, FeeRate, BPS_DENOMINATOR};
pub use error::{ComputeError, ComputeResult};
pub use swap::{remaining_tick_arrays, simulate_swap, ConcentratedState, SwapResult, MAX_SWAP_STEPS};
pub use swap_math::FEE_RATE_DENOMINATOR;
pub use tick_array::{
    get_array_start_index, TickArray, TickArrayCache, TickArraySource, TickState, TICK_ARRAY_SIZE,
};
pub use tick_array_bitmap::{TickArrayBitmapExtension, TickArrayBitmaps};
pub use tick_math::{MAX_SQRT_PRICE_X64, MAX_TICK, MIN_SQRT_PRICE_X64, MIN_TICK, Q64};
