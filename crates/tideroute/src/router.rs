//! Single-hop best-price router
//!
//! Discovery fans out to every adapter at once, quotes every candidate at
//! once, then picks the largest output. Ties go to the pool discovered first,
//! in adapter registration order.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use solana_sdk::pubkey::Pubkey;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{ProgramIds, RouterConfig};
use crate::error::{RouterError, RouterResult, TransportError};
use crate::instructions::SwapPlan;
use crate::pool::Pool;
use crate::protocol::{PumpAmmProtocol, Protocol, RaydiumClmmProtocol, RaydiumCpmmProtocol};
use crate::transport::AccountTransport;

/// The pool selected for a swap and what it pays out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestPool {
    pub pool: Pool,
    pub amount_out: u64,
}

pub struct Router {
    protocols: Vec<Box<dyn Protocol>>,
    transport: Arc<dyn AccountTransport>,
    timeout: Duration,
}

impl Router {
    pub fn new(transport: Arc<dyn AccountTransport>, timeout: Duration) -> Self {
        Self {
            protocols: Vec::new(),
            transport,
            timeout,
        }
    }

    /// Router over pump AMM, Raydium CPMM and Raydium CLMM, in that order
    pub fn from_config(config: &RouterConfig, transport: Arc<dyn AccountTransport>) -> Self {
        let programs = &config.programs;
        Self::new(transport.clone(), config.timeout())
            .with_protocol(Box::new(PumpAmmProtocol::new(transport.clone(), programs)))
            .with_protocol(Box::new(RaydiumCpmmProtocol::new(transport.clone(), programs)))
            .with_protocol(Box::new(RaydiumClmmProtocol::new(
                transport,
                programs,
                config.max_tick_array_fetches,
            )))
    }

    /// Register an adapter; earlier adapters win ties
    pub fn with_protocol(mut self, protocol: Box<dyn Protocol>) -> Self {
        self.protocols.push(protocol);
        self
    }

    pub fn protocol_names(&self) -> Vec<&'static str> {
        self.protocols.iter().map(|protocol| protocol.name()).collect()
    }

    pub fn transport(&self) -> &Arc<dyn AccountTransport> {
        &self.transport
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `operation` under this router's deadline
    async fn within_deadline<T>(
        &self,
        operation: impl Future<Output = RouterResult<T>>,
    ) -> RouterResult<T> {
        timeout_at(Instant::now() + self.timeout, operation)
            .await
            .map_err(|_| RouterError::Transport(TransportError::DeadlineExceeded))?
    }

    async fn discover(&self, base_mint: &Pubkey, quote_mint: &Pubkey) -> Vec<Pool> {
        let results = join_all(
            self.protocols
                .iter()
                .map(|protocol| protocol.fetch_pools_by_pair(base_mint, quote_mint)),
        )
        .await;

        let mut pools = Vec::new();
        for (protocol, result) in self.protocols.iter().zip(results) {
            match result {
                Ok(found) => {
                    debug!(protocol = protocol.name(), pools = found.len(), "discovered pools");
                    pools.extend(found);
                }
                Err(err) => {
                    warn!(protocol = protocol.name(), error = %err, "pool discovery failed");
                }
            }
        }
        pools
    }

    /// Every pool across all adapters trading the pair, in adapter order.
    /// A failing adapter contributes nothing; the others still count.
    pub async fn query_all_pools(
        &self,
        base_mint: &Pubkey,
        quote_mint: &Pubkey,
    ) -> RouterResult<Vec<Pool>> {
        self.within_deadline(async { Ok(self.discover(base_mint, quote_mint).await) })
            .await
    }

    /// The pool paying the most `output_mint` for `amount_in` of `input_mint`
    pub async fn get_best_pool(
        &self,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount_in: u64,
    ) -> RouterResult<BestPool> {
        self.within_deadline(async {
            let pools = self.discover(input_mint, output_mint).await;
            let transport = self.transport.as_ref();
            let quotes = join_all(
                pools
                    .iter()
                    .map(|pool| pool.quote(transport, input_mint, amount_in)),
            )
            .await;

            let best = select_best(pools.iter().zip(quotes).filter_map(|(pool, quote)| {
                match quote {
                    Ok(amount_out) => Some((pool, amount_out)),
                    Err(err) if err.is_pool_local() => {
                        debug!(pool = %pool.id(), kind = %pool.kind(), error = %err, "pool cannot be quoted");
                        None
                    }
                    Err(err) => {
                        error!(pool = %pool.id(), kind = %pool.kind(), error = %err, "quote failed");
                        None
                    }
                }
            }));

            match best {
                Some((pool, amount_out)) => {
                    info!(pool = %pool.id(), kind = %pool.kind(), amount_in, amount_out, "selected route");
                    Ok(BestPool {
                        pool: pool.clone(),
                        amount_out,
                    })
                }
                None => Err(RouterError::NoRoute {
                    base: *input_mint,
                    quote: *output_mint,
                }),
            }
        })
        .await
    }

    /// Swap plan for `pool`, under the same deadline as routing
    pub async fn build_swap_plan(
        &self,
        pool: &Pool,
        programs: &ProgramIds,
        user: &Pubkey,
        input_mint: &Pubkey,
        amount_in: u64,
        min_amount_out: u64,
    ) -> RouterResult<SwapPlan> {
        self.within_deadline(pool.build_swap_plan(
            self.transport.as_ref(),
            programs,
            user,
            input_mint,
            amount_in,
            min_amount_out,
        ))
        .await
    }
}

/// First strictly-largest candidate; a zero output is never a route
fn select_best<'a>(
    candidates: impl IntoIterator<Item = (&'a Pool, u64)>,
) -> Option<(&'a Pool, u64)> {
    let mut best: Option<(&'a Pool, u64)> = None;
    let mut best_out = 0u64;
    for (pool, amount_out) in candidates {
        if amount_out > best_out {
            best_out = amount_out;
            best = Some((pool, amount_out));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::pump::PumpPoolState;
    use crate::pool::PumpAmmPool;
    use proptest::prelude::*;

    fn pool() -> Pool {
        Pool::ConstantProduct(PumpAmmPool {
            state: PumpPoolState {
                address: Pubkey::new_unique(),
                pool_bump: 0,
                index: 0,
                creator: Pubkey::new_unique(),
                base_mint: Pubkey::new_unique(),
                quote_mint: Pubkey::new_unique(),
                lp_mint: Pubkey::new_unique(),
                pool_base_token_account: Pubkey::new_unique(),
                pool_quote_token_account: Pubkey::new_unique(),
                lp_supply: 0,
                coin_creator: Pubkey::default(),
            },
            base_reserve: 1,
            quote_reserve: 1,
        })
    }

    #[test]
    fn ties_keep_the_first_candidate() {
        let (a, b, c) = (pool(), pool(), pool());
        let best = select_best(vec![(&a, 10), (&b, 30), (&c, 30)]).unwrap();
        assert_eq!(best.0.id(), b.id());
        assert_eq!(best.1, 30);
    }

    #[test]
    fn zero_output_is_not_a_route() {
        let a = pool();
        assert!(select_best(vec![(&a, 0)]).is_none());
        assert!(select_best(Vec::new()).is_none());
    }

    proptest! {
        #[test]
        fn selects_the_first_maximum(outputs in proptest::collection::vec(0u64..50, 0..12)) {
            let pools: Vec<Pool> = outputs.iter().map(|_| pool()).collect();
            let best = select_best(pools.iter().zip(outputs.iter().copied()));

            let max = outputs.iter().copied().max().unwrap_or(0);
            if max == 0 {
                prop_assert!(best.is_none());
            } else {
                let first = outputs.iter().position(|out| *out == max).unwrap();
                let (pool, amount_out) = best.unwrap();
                prop_assert_eq!(pool.id(), pools[first].id());
                prop_assert_eq!(amount_out, max);
            }
        }
    }
}
