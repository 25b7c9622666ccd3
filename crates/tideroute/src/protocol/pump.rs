use std::sync::Arc;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use super::{
    decode_candidates, keep_hydrated, search_pair, single_hydrated, token_balances, PairFilter,
    Protocol,
};
use crate::config::ProgramIds;
use crate::error::{RouterResult, TransportError};
use crate::layout::pump::{PumpPoolState, BASE_MINT_OFFSET, QUOTE_MINT_OFFSET};
use crate::layout::AccountLayout;
use crate::pool::{Pool, PumpAmmPool};
use crate::transport::AccountTransport;

pub struct PumpAmmProtocol {
    transport: Arc<dyn AccountTransport>,
    program_id: Pubkey,
}

impl PumpAmmProtocol {
    pub const NAME: &'static str = "pump-amm";

    pub fn new(transport: Arc<dyn AccountTransport>, programs: &ProgramIds) -> Self {
        Self {
            transport,
            program_id: programs.pump_amm,
        }
    }

    fn pair_filter() -> PairFilter {
        PairFilter {
            data_size: PumpPoolState::fixed_span(),
            first_mint_offset: BASE_MINT_OFFSET,
            second_mint_offset: QUOTE_MINT_OFFSET,
        }
    }

    /// Attach vault balances as reserves
    async fn hydrate(
        &self,
        states: Vec<PumpPoolState>,
    ) -> Result<Vec<(Pubkey, RouterResult<Pool>)>, TransportError> {
        let vaults: Vec<Pubkey> = states
            .iter()
            .flat_map(|state| [state.pool_base_token_account, state.pool_quote_token_account])
            .collect();
        let balances = token_balances(self.transport.as_ref(), &vaults).await?;

        Ok(states
            .into_iter()
            .zip(balances.chunks_exact(2))
            .map(|(state, balances)| {
                let address = state.address;
                let pool: RouterResult<Pool> = match *balances {
                    [Some(base_reserve), Some(quote_reserve)] => {
                        Ok(Pool::ConstantProduct(PumpAmmPool {
                            state,
                            base_reserve,
                            quote_reserve,
                        }))
                    }
                    [None, _] => {
                        Err(TransportError::AccountNotFound(state.pool_base_token_account).into())
                    }
                    _ => Err(TransportError::AccountNotFound(state.pool_quote_token_account).into()),
                };
                (address, pool)
            })
            .collect())
    }
}

#[async_trait]
impl Protocol for PumpAmmProtocol {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn fetch_pools_by_pair(
        &self,
        base_mint: &Pubkey,
        quote_mint: &Pubkey,
    ) -> RouterResult<Vec<Pool>> {
        let accounts = search_pair(
            self.transport.as_ref(),
            &self.program_id,
            Self::pair_filter(),
            base_mint,
            quote_mint,
        )
        .await?;
        debug!(protocol = Self::NAME, candidates = accounts.len(), "pair search");

        let states = decode_candidates::<PumpPoolState>(Self::NAME, accounts);
        let hydrated = self.hydrate(states).await?;
        Ok(keep_hydrated(Self::NAME, hydrated))
    }

    async fn fetch_pool_by_id(&self, pool_id: &Pubkey) -> RouterResult<Pool> {
        let data = self.transport.get_account(pool_id).await?;
        let state = PumpPoolState::decode(*pool_id, &data)?;
        single_hydrated(pool_id, self.hydrate(vec![state]).await?)
    }
}
