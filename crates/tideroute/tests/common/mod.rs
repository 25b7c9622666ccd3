//! Shared fixtures: synthetic on-chain accounts served from a `MemoryTransport`

#![allow(dead_code)]

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use tideroute::layout::clmm::{ClmmAmmConfig, ClmmBitmapExtension, ClmmPoolState, ClmmTickArray};
use tideroute::layout::cpmm::{CpmmAmmConfig, CpmmPoolState};
use tideroute::layout::pump::PumpPoolState;
use tideroute::layout::token::TokenAccountBalance;
use tideroute::layout::AccountLayout;
use tideroute::math::tick_array::tick_count;
use tideroute::math::tick_array_bitmap::max_tick_in_tickarray_bitmap;
use tideroute::math::tick_math::get_sqrt_price_at_tick;
use tideroute::math::{get_array_start_index, TickArrayBitmapExtension};
use tideroute::{pda, AccountTransport, MemoryTransport, ProgramIds, Router, RouterConfig};

pub const CLMM_LIQUIDITY: u128 = 1_000_000_000;

/// Zeroed account buffer with fields written by name
pub struct AccountBytes(pub Vec<u8>);

impl AccountBytes {
    pub fn zeroed<L: AccountLayout>() -> Self {
        Self(vec![0; L::SPAN])
    }

    pub fn put<L: AccountLayout>(mut self, field: &str, bytes: &[u8]) -> Self {
        let offset = L::field_offset(field).unwrap_or_else(|| panic!("no field {}", field));
        self.0[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn put_at(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.0[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }
}

/// Shape of a synthetic CLMM pool
pub struct ClmmShape {
    pub tick_spacing: u16,
    pub tick_current: i32,
    pub liquidity: u128,
    /// Initialized ticks as `(tick, liquidity_net, liquidity_gross)`
    pub ticks: Vec<(i32, i128, u128)>,
}

pub struct TestMarket {
    pub transport: Arc<MemoryTransport>,
    pub programs: ProgramIds,
}

impl TestMarket {
    pub fn new() -> Self {
        Self {
            transport: Arc::new(MemoryTransport::new()),
            programs: ProgramIds::mainnet(),
        }
    }

    pub fn config(&self) -> RouterConfig {
        RouterConfig::localnet().with_programs(self.programs.clone())
    }

    pub fn router(&self) -> Router {
        let transport: Arc<dyn AccountTransport> = self.transport.clone();
        Router::from_config(&self.config(), transport)
    }

    pub fn token_account(&self, mint: &Pubkey, amount: u64) -> Pubkey {
        let address = Pubkey::new_unique();
        let data = AccountBytes::zeroed::<TokenAccountBalance>()
            .put::<TokenAccountBalance>("mint", mint.as_ref())
            .put::<TokenAccountBalance>("amount", &amount.to_le_bytes());
        self.transport
            .insert(address, self.programs.token_program, data.0);
        address
    }

    /// Pump pool holding `base_reserve` and `quote_reserve` in its vaults
    pub fn pump_pool(
        &self,
        base_mint: &Pubkey,
        quote_mint: &Pubkey,
        base_reserve: u64,
        quote_reserve: u64,
        coin_creator: Option<Pubkey>,
    ) -> Pubkey {
        self.pump_pool_sized(
            base_mint,
            quote_mint,
            base_reserve,
            quote_reserve,
            coin_creator,
            PumpPoolState::SPAN,
        )
    }

    /// Pump pool whose account data is cut to `len` bytes
    pub fn pump_pool_sized(
        &self,
        base_mint: &Pubkey,
        quote_mint: &Pubkey,
        base_reserve: u64,
        quote_reserve: u64,
        coin_creator: Option<Pubkey>,
        len: usize,
    ) -> Pubkey {
        let address = Pubkey::new_unique();
        let base_vault = self.token_account(base_mint, base_reserve);
        let quote_vault = self.token_account(quote_mint, quote_reserve);
        let data = AccountBytes::zeroed::<PumpPoolState>()
            .put::<PumpPoolState>("base_mint", base_mint.as_ref())
            .put::<PumpPoolState>("quote_mint", quote_mint.as_ref())
            .put::<PumpPoolState>("pool_base_token_account", base_vault.as_ref())
            .put::<PumpPoolState>("pool_quote_token_account", quote_vault.as_ref())
            .put::<PumpPoolState>(
                "coin_creator",
                coin_creator.unwrap_or_default().as_ref(),
            );
        let mut data = data.0;
        data.truncate(len);
        self.transport.insert(address, self.programs.pump_amm, data);
        address
    }

    pub fn cpmm_config(&self, trade_fee_rate: u64) -> Pubkey {
        let address = Pubkey::new_unique();
        let data = AccountBytes::zeroed::<CpmmAmmConfig>()
            .put::<CpmmAmmConfig>("trade_fee_rate", &trade_fee_rate.to_le_bytes());
        self.transport
            .insert(address, self.programs.raydium_cpmm, data.0);
        address
    }

    pub fn cpmm_pool(
        &self,
        amm_config: &Pubkey,
        mint_0: &Pubkey,
        mint_1: &Pubkey,
        reserve_0: u64,
        reserve_1: u64,
    ) -> Pubkey {
        self.insert_cpmm_pool(amm_config, mint_0, mint_1, (reserve_0, reserve_1), 0, (0, 0))
    }

    pub fn cpmm_pool_with_status(
        &self,
        amm_config: &Pubkey,
        mint_0: &Pubkey,
        mint_1: &Pubkey,
        reserve_0: u64,
        reserve_1: u64,
        status: u8,
    ) -> Pubkey {
        self.insert_cpmm_pool(amm_config, mint_0, mint_1, (reserve_0, reserve_1), status, (0, 0))
    }

    /// CPMM pool whose vaults also hold `protocol_fees` owed to the protocol
    pub fn cpmm_pool_with_fees(
        &self,
        amm_config: &Pubkey,
        mint_0: &Pubkey,
        mint_1: &Pubkey,
        vault_balances: (u64, u64),
        protocol_fees: (u64, u64),
    ) -> Pubkey {
        self.insert_cpmm_pool(amm_config, mint_0, mint_1, vault_balances, 0, protocol_fees)
    }

    fn insert_cpmm_pool(
        &self,
        amm_config: &Pubkey,
        mint_0: &Pubkey,
        mint_1: &Pubkey,
        vault_balances: (u64, u64),
        status: u8,
        protocol_fees: (u64, u64),
    ) -> Pubkey {
        let address = Pubkey::new_unique();
        let vault_0 = self.token_account(mint_0, vault_balances.0);
        let vault_1 = self.token_account(mint_1, vault_balances.1);
        let token_program = self.programs.token_program;
        let data = AccountBytes::zeroed::<CpmmPoolState>()
            .put::<CpmmPoolState>("amm_config", amm_config.as_ref())
            .put::<CpmmPoolState>("token_0_vault", vault_0.as_ref())
            .put::<CpmmPoolState>("token_1_vault", vault_1.as_ref())
            .put::<CpmmPoolState>("token_0_mint", mint_0.as_ref())
            .put::<CpmmPoolState>("token_1_mint", mint_1.as_ref())
            .put::<CpmmPoolState>("token_0_program", token_program.as_ref())
            .put::<CpmmPoolState>("token_1_program", token_program.as_ref())
            .put::<CpmmPoolState>("observation_key", Pubkey::new_unique().as_ref())
            .put::<CpmmPoolState>("status", &[status])
            .put::<CpmmPoolState>("protocol_fees_token_0", &protocol_fees.0.to_le_bytes())
            .put::<CpmmPoolState>("protocol_fees_token_1", &protocol_fees.1.to_le_bytes());
        self.transport
            .insert(address, self.programs.raydium_cpmm, data.0);
        address
    }

    pub fn clmm_config(&self, trade_fee_rate: u32) -> Pubkey {
        let address = Pubkey::new_unique();
        let data = AccountBytes::zeroed::<ClmmAmmConfig>()
            .put::<ClmmAmmConfig>("trade_fee_rate", &trade_fee_rate.to_le_bytes());
        self.transport
            .insert(address, self.programs.raydium_clmm, data.0);
        address
    }

    /// CLMM pool at price 1 (tick 0) with spacing 10.
    ///
    /// Liquidity is half active from tick -200, fully active from -100, and
    /// ends at tick 100, so arrays 0 and -600 are initialized.
    pub fn clmm_pool(&self, amm_config: &Pubkey, mint_0: &Pubkey, mint_1: &Pubkey) -> Pubkey {
        let half = (CLMM_LIQUIDITY / 2) as i128;
        self.clmm_pool_with(
            amm_config,
            mint_0,
            mint_1,
            &ClmmShape {
                tick_spacing: 10,
                tick_current: 0,
                liquidity: CLMM_LIQUIDITY,
                ticks: vec![
                    (-200, half, half as u128),
                    (-100, half, half as u128),
                    (100, -(CLMM_LIQUIDITY as i128), CLMM_LIQUIDITY),
                ],
            },
        )
    }

    /// CLMM pool with its tick arrays, bitmaps and, when any array lies
    /// outside the default bitmap, its bitmap extension account
    pub fn clmm_pool_with(
        &self,
        amm_config: &Pubkey,
        mint_0: &Pubkey,
        mint_1: &Pubkey,
        shape: &ClmmShape,
    ) -> Pubkey {
        let spacing = shape.tick_spacing;
        let address = Pubkey::new_unique();
        let boundary = max_tick_in_tickarray_bitmap(spacing);

        let mut bitmap = [0u64; 16];
        let mut extension = TickArrayBitmapExtension::default();
        let mut uses_extension = false;
        let mut arrays: Vec<(i32, Vec<(i32, i128, u128)>)> = Vec::new();
        for &(tick, liquidity_net, liquidity_gross) in &shape.ticks {
            let start = get_array_start_index(tick, spacing);
            if (-boundary..boundary).contains(&start) {
                let position = (start / tick_count(spacing) + 512) as usize;
                bitmap[position / 64] |= 1 << (position % 64);
            } else {
                uses_extension = true;
                let mut block = start.abs() / boundary - 1;
                if start < 0 && start.abs() % boundary == 0 {
                    block -= 1;
                }
                let bit =
                    TickArrayBitmapExtension::tick_array_offset_in_bitmap(start, spacing) as usize;
                let side = if start < 0 {
                    &mut extension.negative_tick_array_bitmap
                } else {
                    &mut extension.positive_tick_array_bitmap
                };
                side[block as usize][bit / 64] |= 1 << (bit % 64);
            }
            match arrays.iter_mut().find(|(s, _)| *s == start) {
                Some((_, entries)) => entries.push((tick, liquidity_net, liquidity_gross)),
                None => arrays.push((start, vec![(tick, liquidity_net, liquidity_gross)])),
            }
        }

        for (start, entries) in arrays {
            let mut data = AccountBytes::zeroed::<ClmmTickArray>()
                .put::<ClmmTickArray>("pool_id", address.as_ref())
                .put::<ClmmTickArray>("start_tick_index", &start.to_le_bytes());
            let ticks_offset = ClmmTickArray::field_offset("ticks").unwrap_or_default();
            for (tick, liquidity_net, liquidity_gross) in entries {
                let slot = ((tick - start) / i32::from(spacing)) as usize;
                let base = ticks_offset + slot * 168;
                data = data
                    .put_at(base, &tick.to_le_bytes())
                    .put_at(base + 4, &liquidity_net.to_le_bytes())
                    .put_at(base + 20, &liquidity_gross.to_le_bytes());
            }
            self.transport.insert(
                self.tick_array_address(&address, start),
                self.programs.raydium_clmm,
                data.0,
            );
        }

        if uses_extension {
            let words = |blocks: &[[u64; 8]]| -> Vec<u8> {
                blocks
                    .iter()
                    .flatten()
                    .flat_map(|word| word.to_le_bytes())
                    .collect()
            };
            let data = AccountBytes::zeroed::<ClmmBitmapExtension>()
                .put::<ClmmBitmapExtension>("pool_id", address.as_ref())
                .put::<ClmmBitmapExtension>(
                    "positive_tick_array_bitmap",
                    &words(&extension.positive_tick_array_bitmap[..]),
                )
                .put::<ClmmBitmapExtension>(
                    "negative_tick_array_bitmap",
                    &words(&extension.negative_tick_array_bitmap[..]),
                );
            self.transport.insert(
                self.bitmap_extension_address(&address),
                self.programs.raydium_clmm,
                data.0,
            );
        }

        let sqrt_price = get_sqrt_price_at_tick(shape.tick_current).unwrap();
        let bitmap_bytes: Vec<u8> = bitmap.iter().flat_map(|word| word.to_le_bytes()).collect();
        let data = AccountBytes::zeroed::<ClmmPoolState>()
            .put::<ClmmPoolState>("amm_config", amm_config.as_ref())
            .put::<ClmmPoolState>("token_mint_0", mint_0.as_ref())
            .put::<ClmmPoolState>("token_mint_1", mint_1.as_ref())
            .put::<ClmmPoolState>("token_vault_0", Pubkey::new_unique().as_ref())
            .put::<ClmmPoolState>("token_vault_1", Pubkey::new_unique().as_ref())
            .put::<ClmmPoolState>("observation_key", Pubkey::new_unique().as_ref())
            .put::<ClmmPoolState>("tick_spacing", &spacing.to_le_bytes())
            .put::<ClmmPoolState>("liquidity", &shape.liquidity.to_le_bytes())
            .put::<ClmmPoolState>("sqrt_price_x64", &sqrt_price.to_le_bytes())
            .put::<ClmmPoolState>("tick_current", &shape.tick_current.to_le_bytes())
            .put::<ClmmPoolState>("tick_array_bitmap", &bitmap_bytes);
        self.transport
            .insert(address, self.programs.raydium_clmm, data.0);
        address
    }

    pub fn tick_array_address(&self, pool: &Pubkey, start_index: i32) -> Pubkey {
        pda::find_tick_array_address(&self.programs.raydium_clmm, pool, start_index).0
    }

    pub fn bitmap_extension_address(&self, pool: &Pubkey) -> Pubkey {
        pda::find_bitmap_extension_address(&self.programs.raydium_clmm, pool).0
    }

    /// Rewrite the stored bytes of `address` in place
    pub async fn patch_account(
        &self,
        address: &Pubkey,
        owner: Pubkey,
        patch: impl FnOnce(AccountBytes) -> AccountBytes,
    ) {
        let data = self.transport.get_account(address).await.unwrap();
        self.transport.insert(*address, owner, patch(AccountBytes(data)).0);
    }
}
