use std::sync::Arc;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use super::{
    decode_candidates, fetch_distinct, keep_hydrated, search_pair, single_hydrated, PairFilter,
    Protocol,
};
use crate::config::ProgramIds;
use crate::error::{RouterResult, TransportError};
use crate::layout::clmm::{
    ClmmAmmConfig, ClmmBitmapExtension, ClmmPoolState, TOKEN_MINT_0_OFFSET, TOKEN_MINT_1_OFFSET,
};
use crate::layout::AccountLayout;
use crate::pda;
use crate::pool::{ClmmPool, Pool};
use crate::transport::{get_multiple_exact, AccountTransport};

pub struct RaydiumClmmProtocol {
    transport: Arc<dyn AccountTransport>,
    program_id: Pubkey,
    max_tick_array_fetches: usize,
}

impl RaydiumClmmProtocol {
    pub const NAME: &'static str = "raydium-clmm";

    pub fn new(
        transport: Arc<dyn AccountTransport>,
        programs: &ProgramIds,
        max_tick_array_fetches: usize,
    ) -> Self {
        Self {
            transport,
            program_id: programs.raydium_clmm,
            max_tick_array_fetches,
        }
    }

    fn pair_filter() -> PairFilter {
        PairFilter {
            data_size: ClmmPoolState::fixed_span(),
            first_mint_offset: TOKEN_MINT_0_OFFSET,
            second_mint_offset: TOKEN_MINT_1_OFFSET,
        }
    }

    /// Attach the AMM config fee and the bitmap extension, when one exists
    async fn hydrate(
        &self,
        states: Vec<ClmmPoolState>,
    ) -> Result<Vec<(Pubkey, RouterResult<Pool>)>, TransportError> {
        let transport = self.transport.as_ref();
        let configs = fetch_distinct::<ClmmAmmConfig>(
            transport,
            states.iter().map(|state| state.amm_config).collect::<Vec<_>>(),
        )
        .await?;

        let extension_addresses: Vec<Pubkey> = states
            .iter()
            .map(|state| pda::find_bitmap_extension_address(&self.program_id, &state.address).0)
            .collect();
        let extensions = if extension_addresses.is_empty() {
            Vec::new()
        } else {
            get_multiple_exact(transport, &extension_addresses).await?
        };

        Ok(states
            .into_iter()
            .zip(extension_addresses)
            .zip(extensions)
            .map(|((state, extension_address), extension_data)| {
                let address = state.address;
                let pool: RouterResult<Pool> = match configs.get(&state.amm_config) {
                    Some(config) => {
                        let trade_fee_rate = config.trade_fee_rate;
                        self.assemble(state, trade_fee_rate, extension_address, extension_data)
                    }
                    None => Err(TransportError::AccountNotFound(state.amm_config).into()),
                };
                (address, pool)
            })
            .collect())
    }

    fn assemble(
        &self,
        state: ClmmPoolState,
        trade_fee_rate: u32,
        extension_address: Pubkey,
        extension_data: Option<Vec<u8>>,
    ) -> RouterResult<Pool> {
        let bitmap_extension = extension_data
            .map(|data| ClmmBitmapExtension::decode(extension_address, &data))
            .transpose()?;
        if bitmap_extension.is_none() {
            debug!(protocol = Self::NAME, pool = %state.address, "no bitmap extension");
        }

        Ok(Pool::ConcentratedLiquidity(ClmmPool {
            program_id: self.program_id,
            state,
            trade_fee_rate,
            bitmap_extension,
            bitmap_extension_address: extension_address,
            max_tick_array_fetches: self.max_tick_array_fetches,
        }))
    }
}

#[async_trait]
impl Protocol for RaydiumClmmProtocol {
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

        let states: Vec<ClmmPoolState> = decode_candidates::<ClmmPoolState>(Self::NAME, accounts)
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
        let state = ClmmPoolState::decode(*pool_id, &data)?;
        single_hydrated(pool_id, self.hydrate(vec![state]).await?)
    }
}
