//! Ledger access
//!
//! Adapters and pools only see [`AccountTransport`]: fetch one account, fetch a
//! batch, and enumerate a program's accounts through exact-match filters.

pub mod memory;
pub mod rate_limit;
pub mod rpc;

use std::sync::Arc;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

use crate::error::TransportError;

pub use memory::MemoryTransport;
pub use rate_limit::RateLimitedTransport;
pub use rpc::{RpcTransport, SubmitOutcome};

/// Equality on `bytes` at `offset`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcmpFilter {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

/// Account search criteria; all conditions must hold
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub data_size: Option<usize>,
    pub memcmp: Vec<MemcmpFilter>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_size(mut self, data_size: usize) -> Self {
        self.data_size = Some(data_size);
        self
    }

    pub fn with_memcmp(mut self, offset: usize, bytes: Vec<u8>) -> Self {
        self.memcmp.push(MemcmpFilter { offset, bytes });
        self
    }

    pub fn with_pubkey(self, offset: usize, key: &Pubkey) -> Self {
        self.with_memcmp(offset, key.to_bytes().to_vec())
    }

    /// Whether `data` satisfies every condition
    pub fn matches(&self, data: &[u8]) -> bool {
        if let Some(size) = self.data_size {
            if data.len() != size {
                return false;
            }
        }
        self.memcmp.iter().all(|filter| {
            data.get(filter.offset..filter.offset + filter.bytes.len())
                .map_or(false, |window| window == filter.bytes.as_slice())
        })
    }
}

/// An account returned by a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedAccount {
    pub address: Pubkey,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait AccountTransport: Send + Sync {
    /// Raw data of one account; [`TransportError::AccountNotFound`] if it does not exist
    async fn get_account(&self, address: &Pubkey) -> Result<Vec<u8>, TransportError>;

    /// Raw data of several accounts, in request order, `None` for missing ones
    async fn get_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, TransportError>;

    /// Accounts owned by `program_id` that match `filter`
    async fn search_accounts(
        &self,
        program_id: &Pubkey,
        filter: &SearchFilter,
    ) -> Result<Vec<KeyedAccount>, TransportError>;
}

/// [`AccountTransport::get_multiple_accounts`], failing unless every address got a slot
pub(crate) async fn get_multiple_exact(
    transport: &dyn AccountTransport,
    addresses: &[Pubkey],
) -> Result<Vec<Option<Vec<u8>>>, TransportError> {
    let accounts = transport.get_multiple_accounts(addresses).await?;
    if accounts.len() != addresses.len() {
        return Err(TransportError::IncompleteBatch {
            requested: addresses.len(),
            returned: accounts.len(),
        });
    }
    Ok(accounts)
}

#[async_trait]
impl<T: AccountTransport + ?Sized> AccountTransport for Arc<T> {
    async fn get_account(&self, address: &Pubkey) -> Result<Vec<u8>, TransportError> {
        (**self).get_account(address).await
    }

    async fn get_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, TransportError> {
        (**self).get_multiple_accounts(addresses).await
    }

    async fn search_accounts(
        &self,
        program_id: &Pubkey,
        filter: &SearchFilter,
    ) -> Result<Vec<KeyedAccount>, TransportError> {
        (**self).search_accounts(program_id, filter).await
    }
}
