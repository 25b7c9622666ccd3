use std::sync::Arc;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use super::{
    decode_candidates, fetch_distinct, keep_hydrated, search_pair, single_hydrated,
    token_balances, PairFilter, Protocol,
};
use crate::config::ProgramIds;
use crate::error::{RouterResult, TransportError};
use crate::layout::cpmm::{
    CpmmAmmConfig, CpmmPoolState, TOKEN_0_MINT_OFFSET, TOKEN_1_MINT_OFFSET,
};
use crate::layout::AccountLayout;
use crate::pool::{CpmmPool, Pool};
use crate::transport::AccountTransport;

pub struct RaydiumCpmmProtocol {
    transport: Arc<dyn AccountTransport>,
    program_id: Pubkey,
}

impl RaydiumCpmmProtocol {
    pub const NAME: &'static str = "raydium-cpmm";

    pub fn new(transport: Arc<dyn AccountTransport>, programs: &ProgramIds) -> Self {
        Self {
            transport,
            program_id: programs.raydium_cpmm,
        }
    }

    fn pair_filter() -> PairFilter {
        PairFilter {
            data_size: CpmmPoolState::fixed_span(),
            first_mint_offset: TOKEN_0_MINT_OFFSET,
            second_mint_offset: TOKEN_1_MINT_OFFSET,
        }
    }

    /// Attach AMM config fees and tradable reserves
    async fn hydrate(
        &self,
        states: Vec<CpmmPoolState>,
    ) -> Result<Vec<(Pubkey, RouterResult<Pool>)>, TransportError> {
        let transport = self.transport.as_ref();
        let configs = fetch_distinct::<CpmmAmmConfig>(
            transport,
            states.iter().map(|state| state.amm_config).collect::<Vec<_>>(),
        )
        .await?;
        let vaults: Vec<Pubkey> = states
            .iter()
            .flat_map(|state| [state.token_0_vault, state.token_1_vault])
            .collect();
        let balances = token_balances(transport, &vaults).await?;

        Ok(states
            .into_iter()
            .zip(balances.chunks_exact(2))
            .map(|(state, balances)| {
                let address = state.address;
                let config = configs.get(&state.amm_config);
                let pool: RouterResult<Pool> = match (config, balances) {
                    (Some(config), [Some(vault_0), Some(vault_1)]) => {
                        let (vault_0, vault_1) = (*vault_0, *vault_1);
                        let (fees_0, fees_1) = state.accrued_fees();
                        Ok(Pool::ConfigurableConstantProduct(CpmmPool {
                            reserve_0: vault_0.saturating_sub(fees_0),
                            reserve_1: vault_1.saturating_sub(fees_1),
                            trade_fee_rate: config.trade_fee_rate,
                            state,
                        }))
                    }
                    (None, _) => Err(TransportError::AccountNotFound(state.amm_config).into()),
                    (_, [None, _]) => Err(TransportError::AccountNotFound(state.token_0_vault).into()),
                    _ => Err(TransportError::AccountNotFound(state.token_1_vault).into()),
                };
                (address, pool)
            })
            .collect())
    }
}

#[async_trait]
impl Protocol for RaydiumCpmmProtocol {
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

        let states: Vec<CpmmPoolState> = decode_candidates::<CpmmPoolState>(Self::NAME, accounts)
            .into_iter()
            .filter(|state| {
                let enabled = state.swap_enabled();
                if !enabled {
                    debug!(protocol = Self::NAME, pool = %state.address, "swaps disabled");
                }
                enabled
            })
            .collect();
        let hydrated = self.hydrate(states).await?;
        Ok(keep_hydrated(Self::NAME, hydrated))
    }

    async fn fetch_pool_by_id(&self, pool_id: &Pubkey) -> RouterResult<Pool> {
        let data = self.transport.get_account(pool_id).await?;
        let state = CpmmPoolState::decode(*pool_id, &data)?;
        single_hydrated(pool_id, self.hydrate(vec![state]).await?)
    }
}
