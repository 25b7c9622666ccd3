//! Constant-product pricing (`x * y = k`) in integer fixed point

use crate::error::{ComputeError, ComputeResult};

pub const BPS_DENOMINATOR: u64 = 10_000;

/// A fee expressed as `numerator / denominator` of the input amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRate {
    pub numerator: u64,
    pub denominator: u64,
}

impl FeeRate {
    pub const ZERO: FeeRate = FeeRate {
        numerator: 0,
        denominator: BPS_DENOMINATOR,
    };

    pub const fn from_bps(bps: u64) -> Self {
        Self {
            numerator: bps,
            denominator: BPS_DENOMINATOR,
        }
    }

    /// Input left over after the fee is taken, truncated like the on-chain programs do.
    pub fn amount_after_fee(&self, amount: u64) -> ComputeResult<u64> {
        if self.denominator == 0 {
            return Err(ComputeError::DivisionByZero);
        }
        let kept = self
            .denominator
            .checked_sub(self.numerator)
            .ok_or(ComputeError::Overflow)?;
        let scaled = u128::from(amount) * u128::from(kept) / u128::from(self.denominator);
        u64::try_from(scaled).map_err(|_| ComputeError::Overflow)
    }
}

/// Reserve snapshot of a constant-product pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantProductCurve {
    pub reserve_base: u64,
    pub reserve_quote: u64,
    pub fee: FeeRate,
}

impl ConstantProductCurve {
    pub fn new(reserve_base: u64, reserve_quote: u64, fee: FeeRate) -> Self {
        Self {
            reserve_base,
            reserve_quote,
            fee,
        }
    }

    /// Output for `amount_in`, base -> quote when `base_to_quote` is set.
    ///
    /// `out = reserve_out - k / (reserve_in + amount_in_after_fee)`
    pub fn quote(&self, base_to_quote: bool, amount_in: u64) -> ComputeResult<u64> {
        let (reserve_in, reserve_out) = self.oriented(base_to_quote);
        if reserve_in == 0 {
            return Err(ComputeError::EmptyReserve);
        }

        let amount_in_after_fee = self.fee.amount_after_fee(amount_in)?;
        let k = u128::from(reserve_in) * u128::from(reserve_out);
        let new_reserve_in = u128::from(reserve_in) + u128::from(amount_in_after_fee);
        let new_reserve_out = k / new_reserve_in;

        let out = u128::from(reserve_out)
            .checked_sub(new_reserve_out)
            .ok_or(ComputeError::Overflow)?;
        u64::try_from(out).map_err(|_| ComputeError::Overflow)
    }

    /// Reserves after a swap of `amount_in`: the full input (fee included) stays in the pool.
    pub fn after_swap(&self, base_to_quote: bool, amount_in: u64) -> ComputeResult<Self> {
        let amount_out = self.quote(base_to_quote, amount_in)?;
        let (reserve_in, reserve_out) = self.oriented(base_to_quote);
        let reserve_in = reserve_in
            .checked_add(amount_in)
            .ok_or(ComputeError::Overflow)?;
        let reserve_out = reserve_out - amount_out;

        Ok(if base_to_quote {
            Self::new(reserve_in, reserve_out, self.fee)
        } else {
            Self::new(reserve_out, reserve_in, self.fee)
        })
    }

    pub fn invariant(&self) -> u128 {
        u128::from(self.reserve_base) * u128::from(self.reserve_quote)
    }

    fn oriented(&self, base_to_quote: bool) -> (u64, u64) {
        if base_to_quote {
            (self.reserve_base, self.reserve_quote)
        } else {
            (self.reserve_quote, self.reserve_base)
        }
    }
}

/// Minimum acceptable output for a quote under a slippage tolerance in basis points
pub fn apply_slippage(amount_out: u64, slippage_bps: u64) -> u64 {
    let kept = BPS_DENOMINATOR.saturating_sub(slippage_bps);
    (u128::from(amount_out) * u128::from(kept) / u128::from(BPS_DENOMINATOR)) as u64
}
