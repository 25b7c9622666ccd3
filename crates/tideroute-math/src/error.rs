//! # Pricing Errors
//!
//! Every failure a quote computation can hit. None of these are fatal to a
//! routing pass: the router drops the offending pool and keeps going.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    // ========================================================================
    // Arithmetic
    // ========================================================================
    #[error("Math overflow")]
    Overflow,

    #[error("Division by zero")]
    DivisionByZero,

    // ========================================================================
    // Range checks
    // ========================================================================
    #[error("Tick {0} is outside the supported range")]
    TickOutOfRange(i32),

    #[error("Sqrt price {0} is outside the supported range")]
    SqrtPriceOutOfRange(u128),

    #[error("Tick spacing must be non-zero")]
    InvalidTickSpacing,

    // ========================================================================
    // Simulation
    // ========================================================================
    #[error("Swap simulation did not converge within {iterations} steps")]
    NoConvergence { iterations: usize },

    #[error("No initialized liquidity in the swap direction")]
    InsufficientLiquidity,

    #[error("Tick array starting at {0} is not loaded")]
    TickArrayNotLoaded(i32),

    #[error("Tick array is inconsistent with the pool: {0}")]
    InvalidTickArray(String),

    #[error("Reserve is empty")]
    EmptyReserve,
}

pub type ComputeResult<T> = Result<T, ComputeError>;
