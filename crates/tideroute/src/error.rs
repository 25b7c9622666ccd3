//! Router error types

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use tideroute_math::ComputeError;

/// Account bytes that do not match the expected layout
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Account data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Failures talking to the ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    #[error("Batch fetch returned {returned} accounts for {requested} requested")]
    IncompleteBatch { requested: usize, returned: usize },

    #[error("Routing deadline exceeded")]
    DeadlineExceeded,
}

impl From<solana_client::client_error::ClientError> for TransportError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        TransportError::Rpc(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Compute(#[from] ComputeError),

    /// No pool produced a usable quote
    #[error("No route found for {base} -> {quote}")]
    NoRoute { base: Pubkey, quote: Pubkey },

    #[error("Mint {mint} is not traded by pool {pool}")]
    MintNotInPool { mint: Pubkey, pool: Pubkey },

    #[error("Failed to build swap: {0}")]
    Build(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RouterError {
    /// Errors that only disqualify one pool from a routing pass
    pub fn is_pool_local(&self) -> bool {
        matches!(
            self,
            RouterError::Decode(_) | RouterError::Compute(_) | RouterError::MintNotInPool { .. }
        )
    }
}

pub type RouterResult<T> = Result<T, RouterError>;
