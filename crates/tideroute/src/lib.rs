//! # Tideroute
//!
//! Best-price single-hop swap routing on Solana across:
//! - pump AMM constant-product pools
//! - Raydium CPMM (configurable constant product) pools
//! - Raydium CLMM (concentrated liquidity) pools
//!
//! The router discovers every pool for a mint pair, quotes each against live
//! reserves or tick arrays, picks the largest output and encodes the swap
//! instruction for the winner. Pricing math lives in `tideroute-math`.

pub mod config;
pub mod error;
pub mod instructions;
pub mod layout;
pub mod pda;
pub mod pool;
pub mod protocol;
pub mod router;
pub mod transport;

pub use config::{ProgramIds, RouterConfig};
pub use error::{DecodeError, RouterError, RouterResult, TransportError};
pub use instructions::{SwapPlan, SwapPlanBuilder};
pub use pool::{ClmmPool, CpmmPool, Pool, PoolKind, PumpAmmPool};
pub use protocol::{PumpAmmProtocol, Protocol, RaydiumClmmProtocol, RaydiumCpmmProtocol};
pub use router::{BestPool, Router};
pub use transport::{
    AccountTransport, KeyedAccount, MemoryTransport, RateLimitedTransport, RpcTransport,
    SearchFilter, SubmitOutcome,
};

// Re-export the math crate for callers computing slippage bounds
pub use tideroute_math as math;
pub use tideroute_math::{apply_slippage, ComputeError};
