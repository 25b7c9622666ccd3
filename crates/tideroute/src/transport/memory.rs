//! In-memory transport over a fixed account set
//!
//! Serves account snapshots without a network. Counts calls so callers can
//! check how many round trips a routing pass costs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

use super::{AccountTransport, KeyedAccount, SearchFilter};
use crate::error::TransportError;

#[derive(Debug, Clone)]
struct StoredAccount {
    owner: Pubkey,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct MemoryTransport {
    accounts: RwLock<BTreeMap<Pubkey, StoredAccount>>,
    /// Programs whose searches fail, to exercise error paths
    failing_programs: RwLock<Vec<Pubkey>>,
    calls: AtomicUsize,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address, StoredAccount { owner, data });
    }

    pub fn remove(&self, address: &Pubkey) {
        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(address);
    }

    /// Make every search against `program_id` fail with an RPC error
    pub fn fail_searches_for(&self, program_id: Pubkey) {
        self.failing_programs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(program_id);
    }

    /// Transport calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    fn lookup(&self, address: &Pubkey) -> Option<Vec<u8>> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .map(|account| account.data.clone())
    }
}

#[async_trait]
impl AccountTransport for MemoryTransport {
    async fn get_account(&self, address: &Pubkey) -> Result<Vec<u8>, TransportError> {
        self.record_call();
        self.lookup(address)
            .ok_or(TransportError::AccountNotFound(*address))
    }

    async fn get_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, TransportError> {
        self.record_call();
        Ok(addresses.iter().map(|address| self.lookup(address)).collect())
    }

    async fn search_accounts(
        &self,
        program_id: &Pubkey,
        filter: &SearchFilter,
    ) -> Result<Vec<KeyedAccount>, TransportError> {
        self.record_call();
        let refused = self
            .failing_programs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(program_id);
        if refused {
            return Err(TransportError::Rpc(format!("search against {} refused", program_id)));
        }

        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        Ok(accounts
            .iter()
            .filter(|(_, account)| account.owner == *program_id && filter.matches(&account.data))
            .map(|(address, account)| KeyedAccount {
                address: *address,
                data: account.data.clone(),
            })
            .collect())
    }
}
