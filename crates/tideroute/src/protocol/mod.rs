//! Protocol adapters
//!
//! One adapter per program family. Each turns filtered account searches into
//! fully hydrated [`Pool`]s: decoded state plus the reserves or fee
//! parameters quoting needs.

pub mod clmm;
pub mod cpmm;
pub mod pump;

use ahash::{AHashMap, AHashSet};
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use crate::error::{RouterError, RouterResult, TransportError};
use crate::layout::token::TokenAccountBalance;
use crate::layout::AccountLayout;
use crate::pool::Pool;
use crate::transport::{get_multiple_exact, AccountTransport, KeyedAccount, SearchFilter};

pub use clmm::RaydiumClmmProtocol;
pub use cpmm::RaydiumCpmmProtocol;
pub use pump::PumpAmmProtocol;

#[async_trait]
pub trait Protocol: Send + Sync {
    fn name(&self) -> &'static str;

    /// Every pool trading `base_mint` against `quote_mint`, whichever order the
    /// pool stores them in. Accounts that fail to decode are skipped.
    async fn fetch_pools_by_pair(
        &self,
        base_mint: &Pubkey,
        quote_mint: &Pubkey,
    ) -> RouterResult<Vec<Pool>>;

    async fn fetch_pool_by_id(&self, pool_id: &Pubkey) -> RouterResult<Pool>;
}

/// Where a layout stores its two mints
#[derive(Debug, Clone, Copy)]
pub(crate) struct PairFilter {
    pub data_size: usize,
    pub first_mint_offset: usize,
    pub second_mint_offset: usize,
}

impl PairFilter {
    fn search(&self, first: &Pubkey, second: &Pubkey) -> SearchFilter {
        SearchFilter::new()
            .with_data_size(self.data_size)
            .with_pubkey(self.first_mint_offset, first)
            .with_pubkey(self.second_mint_offset, second)
    }
}

/// Search for `(mint_a, mint_b)` and `(mint_b, mint_a)`, keeping the first
/// occurrence of every address
pub(crate) async fn search_pair(
    transport: &dyn AccountTransport,
    program_id: &Pubkey,
    filter: PairFilter,
    mint_a: &Pubkey,
    mint_b: &Pubkey,
) -> Result<Vec<KeyedAccount>, TransportError> {
    let forward = filter.search(mint_a, mint_b);
    let reverse = filter.search(mint_b, mint_a);
    let (forward, reverse) = futures::try_join!(
        transport.search_accounts(program_id, &forward),
        transport.search_accounts(program_id, &reverse),
    )?;

    Ok(merge_unique(forward, reverse))
}

pub(crate) fn merge_unique(first: Vec<KeyedAccount>, second: Vec<KeyedAccount>) -> Vec<KeyedAccount> {
    let mut seen = AHashSet::with_capacity(first.len() + second.len());
    first
        .into_iter()
        .chain(second)
        .filter(|account| seen.insert(account.address))
        .collect()
}

/// Decode every candidate, logging and dropping the ones that do not fit `L`
pub(crate) fn decode_candidates<L: AccountLayout>(
    protocol: &'static str,
    accounts: Vec<KeyedAccount>,
) -> Vec<L> {
    accounts
        .into_iter()
        .filter_map(|account| match L::decode(account.address, &account.data) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(protocol, account = %account.address, error = %err, "skipping undecodable pool");
                None
            }
        })
        .collect()
}

/// Balances of `vaults` in one batched fetch; `None` for missing or malformed accounts
pub(crate) async fn token_balances(
    transport: &dyn AccountTransport,
    vaults: &[Pubkey],
) -> Result<Vec<Option<u64>>, TransportError> {
    if vaults.is_empty() {
        return Ok(Vec::new());
    }
    let accounts = get_multiple_exact(transport, vaults).await?;
    Ok(vaults
        .iter()
        .zip(accounts)
        .map(|(vault, data)| {
            let data = data?;
            match TokenAccountBalance::decode(*vault, &data) {
                Ok(balance) => Some(balance.amount),
                Err(err) => {
                    debug!(vault = %vault, error = %err, "malformed vault account");
                    None
                }
            }
        })
        .collect())
}

/// Decode each distinct account in `addresses` once, in one batched fetch
pub(crate) async fn fetch_distinct<L: AccountLayout>(
    transport: &dyn AccountTransport,
    addresses: impl IntoIterator<Item = Pubkey>,
) -> Result<AHashMap<Pubkey, L>, TransportError> {
    let mut distinct = Vec::new();
    let mut seen = AHashSet::new();
    for address in addresses {
        if seen.insert(address) {
            distinct.push(address);
        }
    }
    if distinct.is_empty() {
        return Ok(AHashMap::new());
    }

    let accounts = get_multiple_exact(transport, &distinct).await?;
    Ok(distinct
        .into_iter()
        .zip(accounts)
        .filter_map(|(address, data)| {
            let data = data?;
            match L::decode(address, &data) {
                Ok(decoded) => Some((address, decoded)),
                Err(err) => {
                    warn!(account = %address, error = %err, "skipping undecodable account");
                    None
                }
            }
        })
        .collect())
}

/// Keep the pools that hydrated, logging the rest
pub(crate) fn keep_hydrated(
    protocol: &'static str,
    results: Vec<(Pubkey, RouterResult<Pool>)>,
) -> Vec<Pool> {
    results
        .into_iter()
        .filter_map(|(address, result)| match result {
            Ok(pool) => Some(pool),
            Err(err) => {
                warn!(protocol, pool = %address, error = %err, "dropping pool");
                None
            }
        })
        .collect()
}

/// The single pool of a by-id lookup
pub(crate) fn single_hydrated(
    pool_id: &Pubkey,
    results: Vec<(Pubkey, RouterResult<Pool>)>,
) -> RouterResult<Pool> {
    results
        .into_iter()
        .next()
        .map(|(_, result)| result)
        .unwrap_or_else(|| Err(RouterError::Transport(TransportError::AccountNotFound(*pool_id))))
}
