//! Pool variants and the four operations the router needs from each:
//! identity, token pair, quote and swap-plan construction.

use std::fmt;

use solana_sdk::pubkey::Pubkey;
use tideroute_math::{
    remaining_tick_arrays, simulate_swap, ComputeError, ConcentratedState, ConstantProductCurve,
    FeeRate, SwapResult, TickArrayBitmaps, TickArrayCache,
};
use tracing::debug;

use crate::config::ProgramIds;
use crate::error::{RouterError, RouterResult};
use crate::instructions::{self, SwapPlan};
use crate::layout::clmm::{ClmmBitmapExtension, ClmmPoolState, ClmmTickArray};
use crate::layout::cpmm::CpmmPoolState;
use crate::layout::pump::PumpPoolState;
use crate::layout::AccountLayout;
use crate::pda;
use crate::transport::{get_multiple_exact, AccountTransport};

/// Pump AMM charges 25 bps on the input
pub const PUMP_AMM_FEE: FeeRate = FeeRate::from_bps(25);

/// Denominator of Raydium `trade_fee_rate`
pub const RAYDIUM_FEE_DENOMINATOR: u64 = 1_000_000;

/// Tick arrays loaded in one batch before simulating a CLMM swap
pub const PREFETCH_TICK_ARRAYS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    PumpAmm,
    RaydiumCpmm,
    RaydiumClmm,
}

impl PoolKind {
    pub fn name(&self) -> &'static str {
        match self {
            PoolKind::PumpAmm => "pump-amm",
            PoolKind::RaydiumCpmm => "raydium-cpmm",
            PoolKind::RaydiumClmm => "raydium-clmm",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pump AMM pool with vault balances read at discovery time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpAmmPool {
    pub state: PumpPoolState,
    pub base_reserve: u64,
    pub quote_reserve: u64,
}

impl PumpAmmPool {
    pub fn curve(&self) -> ConstantProductCurve {
        ConstantProductCurve::new(self.base_reserve, self.quote_reserve, PUMP_AMM_FEE)
    }

    /// `true` when selling base
    fn is_base_input(&self, input_mint: &Pubkey) -> RouterResult<bool> {
        if *input_mint == self.state.base_mint {
            Ok(true)
        } else if *input_mint == self.state.quote_mint {
            Ok(false)
        } else {
            Err(RouterError::MintNotInPool {
                mint: *input_mint,
                pool: self.state.address,
            })
        }
    }

    pub fn quote(&self, input_mint: &Pubkey, amount_in: u64) -> RouterResult<u64> {
        let base_to_quote = self.is_base_input(input_mint)?;
        Ok(self.curve().quote(base_to_quote, amount_in)?)
    }

    /// Quote input issues `buy`, base input issues `sell`
    pub fn swap_plan(
        &self,
        programs: &ProgramIds,
        user: &Pubkey,
        input_mint: &Pubkey,
        amount_in: u64,
        min_amount_out: u64,
    ) -> RouterResult<SwapPlan> {
        let is_sell = self.is_base_input(input_mint)?;
        let state = &self.state;
        let token_program = programs.token_program;

        let coin_creator_vault = state.has_coin_creator().then(|| {
            let (authority, _) =
                pda::find_creator_vault_authority(&programs.pump_amm, &state.coin_creator);
            let vault = pda::creator_vault_token_account(
                &programs.pump_amm,
                &state.coin_creator,
                &state.quote_mint,
                &token_program,
            );
            (vault, authority)
        });

        let accounts = instructions::PumpSwapAccounts {
            program_id: programs.pump_amm,
            pool: state.address,
            user: *user,
            global_config: programs.pump_global_config,
            base_mint: state.base_mint,
            quote_mint: state.quote_mint,
            user_base_token_account: pda::user_token_account(user, &state.base_mint, &token_program),
            user_quote_token_account: pda::user_token_account(
                user,
                &state.quote_mint,
                &token_program,
            ),
            pool_base_token_account: state.pool_base_token_account,
            pool_quote_token_account: state.pool_quote_token_account,
            protocol_fee_recipient: programs.pump_fee_recipient,
            protocol_fee_recipient_token_account: programs.pump_fee_recipient_token_account,
            base_token_program: token_program,
            quote_token_program: token_program,
            system_program: programs.system_program,
            associated_token_program: programs.associated_token_program,
            event_authority: programs.pump_event_authority,
            coin_creator_vault,
        };

        if is_sell {
            instructions::pump::sell(
                &accounts,
                instructions::SellParams {
                    base_amount_in: amount_in,
                    min_quote_amount_out: min_amount_out,
                },
            )
        } else {
            instructions::pump::buy(
                &accounts,
                instructions::BuyParams {
                    base_amount_out: min_amount_out,
                    max_quote_amount_in: amount_in,
                },
            )
        }
    }
}

/// Raydium CPMM pool with tradable reserves (vault balances minus accrued fees)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpmmPool {
    pub state: CpmmPoolState,
    pub reserve_0: u64,
    pub reserve_1: u64,
    /// `trade_fee_rate` of the pool's AMM config
    pub trade_fee_rate: u64,
}

impl CpmmPool {
    pub fn curve(&self) -> ConstantProductCurve {
        ConstantProductCurve::new(
            self.reserve_0,
            self.reserve_1,
            FeeRate {
                numerator: self.trade_fee_rate,
                denominator: RAYDIUM_FEE_DENOMINATOR,
            },
        )
    }

    fn is_zero_for_one(&self, input_mint: &Pubkey) -> RouterResult<bool> {
        if *input_mint == self.state.token_0_mint {
            Ok(true)
        } else if *input_mint == self.state.token_1_mint {
            Ok(false)
        } else {
            Err(RouterError::MintNotInPool {
                mint: *input_mint,
                pool: self.state.address,
            })
        }
    }

    pub fn quote(&self, input_mint: &Pubkey, amount_in: u64) -> RouterResult<u64> {
        let zero_for_one = self.is_zero_for_one(input_mint)?;
        Ok(self.curve().quote(zero_for_one, amount_in)?)
    }

    pub fn swap_plan(
        &self,
        programs: &ProgramIds,
        user: &Pubkey,
        input_mint: &Pubkey,
        amount_in: u64,
        min_amount_out: u64,
    ) -> RouterResult<SwapPlan> {
        let state = &self.state;
        let side_0 = (state.token_0_mint, state.token_0_vault, state.token_0_program);
        let side_1 = (state.token_1_mint, state.token_1_vault, state.token_1_program);
        let ((input_mint, input_vault, input_program), (output_mint, output_vault, output_program)) =
            if self.is_zero_for_one(input_mint)? {
                (side_0, side_1)
            } else {
                (side_1, side_0)
            };

        let (authority, _) = pda::find_cpmm_authority_address(&programs.raydium_cpmm);
        let accounts = instructions::CpmmSwapAccounts {
            program_id: programs.raydium_cpmm,
            payer: *user,
            authority,
            amm_config: state.amm_config,
            pool_state: state.address,
            input_token_account: pda::user_token_account(user, &input_mint, &input_program),
            output_token_account: pda::user_token_account(user, &output_mint, &output_program),
            input_vault,
            output_vault,
            input_token_program: input_program,
            output_token_program: output_program,
            input_token_mint: input_mint,
            output_token_mint: output_mint,
            observation_state: state.observation_key,
        };

        instructions::cpmm::swap_base_input(
            &accounts,
            instructions::SwapBaseInputParams {
                amount_in,
                minimum_amount_out: min_amount_out,
            },
        )
    }
}

/// Raydium CLMM pool; tick arrays are fetched per quote, never kept here
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClmmPool {
    pub program_id: Pubkey,
    pub state: ClmmPoolState,
    /// `trade_fee_rate` of the pool's AMM config, in hundredths of a bip
    pub trade_fee_rate: u32,
    /// `None` when the pool has never needed an extension account
    pub bitmap_extension: Option<ClmmBitmapExtension>,
    pub bitmap_extension_address: Pubkey,
    /// On-demand tick array loads allowed per simulation
    pub max_tick_array_fetches: usize,
}

impl ClmmPool {
    fn is_zero_for_one(&self, input_mint: &Pubkey) -> RouterResult<bool> {
        if *input_mint == self.state.token_mint_0 {
            Ok(true)
        } else if *input_mint == self.state.token_mint_1 {
            Ok(false)
        } else {
            Err(RouterError::MintNotInPool {
                mint: *input_mint,
                pool: self.state.address,
            })
        }
    }

    pub fn concentrated_state(&self) -> ConcentratedState {
        ConcentratedState {
            sqrt_price_x64: self.state.sqrt_price_x64,
            liquidity: self.state.liquidity,
            tick_current: self.state.tick_current,
            tick_spacing: self.state.tick_spacing,
            fee_rate: self.trade_fee_rate,
        }
    }

    pub fn bitmaps(&self) -> TickArrayBitmaps<'_> {
        TickArrayBitmaps {
            tick_spacing: self.state.tick_spacing,
            default_bitmap: &self.state.tick_array_bitmap,
            extension: self.bitmap_extension.as_ref().map(|ext| &ext.bitmap),
        }
    }

    pub fn tick_array_address(&self, start_index: i32) -> Pubkey {
        pda::find_tick_array_address(&self.program_id, &self.state.address, start_index).0
    }

    /// Load the arrays at `starts` that exist on chain into `cache`
    async fn fetch_tick_arrays(
        &self,
        transport: &dyn AccountTransport,
        cache: &mut TickArrayCache,
        starts: &[i32],
    ) -> RouterResult<()> {
        let wanted: Vec<i32> = starts
            .iter()
            .copied()
            .filter(|start| !cache.contains(*start))
            .collect();
        if wanted.is_empty() {
            return Ok(());
        }

        let addresses: Vec<Pubkey> = wanted
            .iter()
            .map(|start| self.tick_array_address(*start))
            .collect();
        let accounts = get_multiple_exact(transport, &addresses).await?;

        for ((start, address), data) in wanted.iter().zip(addresses).zip(accounts) {
            let Some(data) = data else {
                debug!(pool = %self.state.address, start, "tick array account missing");
                continue;
            };
            let tick_array = ClmmTickArray::decode(address, &data)?;
            if tick_array.array.start_tick_index != *start || tick_array.pool_id != self.state.address {
                return Err(ComputeError::InvalidTickArray(format!(
                    "account {} does not hold array {} of pool {}",
                    address, start, self.state.address
                ))
                .into());
            }
            cache.insert(tick_array.array);
        }
        Ok(())
    }

    /// Run the simulator, loading the arrays it asks for until it completes
    async fn simulate(
        &self,
        transport: &dyn AccountTransport,
        amount_in: u64,
        zero_for_one: bool,
    ) -> RouterResult<(TickArrayCache, SwapResult)> {
        let state = self.concentrated_state();
        let bitmaps = self.bitmaps();
        let mut cache = TickArrayCache::new();

        let ahead =
            bitmaps.initialized_tick_arrays_ahead(state.tick_current, zero_for_one, PREFETCH_TICK_ARRAYS)?;
        self.fetch_tick_arrays(transport, &mut cache, &ahead).await?;

        let mut fetches = 0;
        loop {
            match simulate_swap(&state, &bitmaps, &cache, amount_in, zero_for_one) {
                Ok(result) => return Ok((cache, result)),
                Err(ComputeError::TickArrayNotLoaded(start))
                    if fetches < self.max_tick_array_fetches && !cache.contains(start) =>
                {
                    fetches += 1;
                    debug!(pool = %self.state.address, start, "loading tick array on demand");
                    self.fetch_tick_arrays(transport, &mut cache, &[start]).await?;
                    if !cache.contains(start) {
                        return Err(ComputeError::TickArrayNotLoaded(start).into());
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    pub async fn quote(
        &self,
        transport: &dyn AccountTransport,
        input_mint: &Pubkey,
        amount_in: u64,
    ) -> RouterResult<u64> {
        let zero_for_one = self.is_zero_for_one(input_mint)?;
        if amount_in == 0 {
            return Ok(0);
        }
        let (_, result) = self.simulate(transport, amount_in, zero_for_one).await?;
        Ok(result.amount_out)
    }

    /// Tick arrays the swap instruction must carry, as addresses in traversal order
    pub async fn remaining_accounts(
        &self,
        transport: &dyn AccountTransport,
        input_mint: &Pubkey,
        amount_in: u64,
    ) -> RouterResult<Vec<Pubkey>> {
        let zero_for_one = self.is_zero_for_one(input_mint)?;
        let (cache, _) = self.simulate(transport, amount_in, zero_for_one).await?;
        let starts = remaining_tick_arrays(
            &self.concentrated_state(),
            &self.bitmaps(),
            &cache,
            amount_in,
            zero_for_one,
        )?;
        Ok(starts
            .into_iter()
            .map(|start| self.tick_array_address(start))
            .collect())
    }

    pub async fn swap_plan(
        &self,
        transport: &dyn AccountTransport,
        programs: &ProgramIds,
        user: &Pubkey,
        input_mint: &Pubkey,
        amount_in: u64,
        min_amount_out: u64,
    ) -> RouterResult<SwapPlan> {
        let state = &self.state;
        let (input_vault_mint, output_vault_mint, input_vault, output_vault) =
            if self.is_zero_for_one(input_mint)? {
                (state.token_mint_0, state.token_mint_1, state.token_vault_0, state.token_vault_1)
            } else {
                (state.token_mint_1, state.token_mint_0, state.token_vault_1, state.token_vault_0)
            };

        let tick_arrays = self
            .remaining_accounts(transport, input_mint, amount_in)
            .await?;

        let accounts = instructions::ClmmSwapAccounts {
            program_id: self.program_id,
            payer: *user,
            amm_config: state.amm_config,
            pool_state: state.address,
            input_token_account: pda::user_token_account(
                user,
                &input_vault_mint,
                &programs.token_program,
            ),
            output_token_account: pda::user_token_account(
                user,
                &output_vault_mint,
                &programs.token_program,
            ),
            input_vault,
            output_vault,
            observation_state: state.observation_key,
            token_program: programs.token_program,
            token_program_2022: programs.token_2022_program,
            memo_program: programs.memo_program,
            input_vault_mint,
            output_vault_mint,
            bitmap_extension: self.bitmap_extension_address,
            tick_arrays,
        };

        instructions::clmm::swap_v2(
            &accounts,
            instructions::SwapV2Params {
                amount: amount_in,
                other_amount_threshold: min_amount_out,
                sqrt_price_limit_x64: 0,
                is_base_input: true,
            },
        )
    }
}

/// A pool from any supported program family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pool {
    ConstantProduct(PumpAmmPool),
    ConfigurableConstantProduct(CpmmPool),
    ConcentratedLiquidity(ClmmPool),
}

impl Pool {
    /// Account address the pool was decoded from
    pub fn id(&self) -> Pubkey {
        match self {
            Pool::ConstantProduct(pool) => pool.state.address,
            Pool::ConfigurableConstantProduct(pool) => pool.state.address,
            Pool::ConcentratedLiquidity(pool) => pool.state.address,
        }
    }

    /// Mints in the pool's own stored order
    pub fn tokens(&self) -> (Pubkey, Pubkey) {
        match self {
            Pool::ConstantProduct(pool) => (pool.state.base_mint, pool.state.quote_mint),
            Pool::ConfigurableConstantProduct(pool) => {
                (pool.state.token_0_mint, pool.state.token_1_mint)
            }
            Pool::ConcentratedLiquidity(pool) => {
                (pool.state.token_mint_0, pool.state.token_mint_1)
            }
        }
    }

    pub fn kind(&self) -> PoolKind {
        match self {
            Pool::ConstantProduct(_) => PoolKind::PumpAmm,
            Pool::ConfigurableConstantProduct(_) => PoolKind::RaydiumCpmm,
            Pool::ConcentratedLiquidity(_) => PoolKind::RaydiumClmm,
        }
    }

    /// Output for swapping `amount_in` of `input_mint` against the current snapshot.
    /// Only concentrated-liquidity pools touch the transport, to load tick arrays.
    pub async fn quote(
        &self,
        transport: &dyn AccountTransport,
        input_mint: &Pubkey,
        amount_in: u64,
    ) -> RouterResult<u64> {
        match self {
            Pool::ConstantProduct(pool) => pool.quote(input_mint, amount_in),
            Pool::ConfigurableConstantProduct(pool) => pool.quote(input_mint, amount_in),
            Pool::ConcentratedLiquidity(pool) => {
                pool.quote(transport, input_mint, amount_in).await
            }
        }
    }

    pub async fn build_swap_plan(
        &self,
        transport: &dyn AccountTransport,
        programs: &ProgramIds,
        user: &Pubkey,
        input_mint: &Pubkey,
        amount_in: u64,
        min_amount_out: u64,
    ) -> RouterResult<SwapPlan> {
        match self {
            Pool::ConstantProduct(pool) => {
                pool.swap_plan(programs, user, input_mint, amount_in, min_amount_out)
            }
            Pool::ConfigurableConstantProduct(pool) => {
                pool.swap_plan(programs, user, input_mint, amount_in, min_amount_out)
            }
            Pool::ConcentratedLiquidity(pool) => {
                pool.swap_plan(transport, programs, user, input_mint, amount_in, min_amount_out)
                    .await
            }
        }
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (token_a, token_b) = self.tokens();
        write!(f, "{} {} ({} / {})", self.kind(), self.id(), token_a, token_b)
    }
}
