//! Raydium CLMM accounts: pool state, AMM config, tick arrays and the bitmap extension

use solana_sdk::pubkey::Pubkey;
use tideroute_math::tick_array::TICK_ARRAY_SIZE_USIZE;
use tideroute_math::tick_array_bitmap::{
    DefaultBitmap, ExtensionBlock, EXTENSION_TICKARRAY_BITMAP_SIZE,
};
use tideroute_math::{TickArray, TickArrayBitmapExtension, TickState};

use super::{
    check_len, read_i128, read_i32, read_pubkey, read_u128, read_u16, read_u32, read_u64,
    read_u64_words, read_u8, AccountLayout, FieldSpec,
};
use crate::error::DecodeError;

pub const TOKEN_MINT_0_OFFSET: usize = 73;
pub const TOKEN_MINT_1_OFFSET: usize = 105;
const TICK_ARRAY_BITMAP_OFFSET: usize = 904;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClmmPoolState {
    pub address: Pubkey,
    pub bump: u8,
    pub amm_config: Pubkey,
    pub owner: Pubkey,
    pub token_mint_0: Pubkey,
    pub token_mint_1: Pubkey,
    pub token_vault_0: Pubkey,
    pub token_vault_1: Pubkey,
    pub observation_key: Pubkey,
    pub mint_decimals_0: u8,
    pub mint_decimals_1: u8,
    pub tick_spacing: u16,
    pub liquidity: u128,
    pub sqrt_price_x64: u128,
    pub tick_current: i32,
    pub fee_growth_global_0_x64: u128,
    pub fee_growth_global_1_x64: u128,
    pub protocol_fees_token_0: u64,
    pub protocol_fees_token_1: u64,
    /// Bit flags; bit 4 disables swaps
    pub status: u8,
    pub tick_array_bitmap: DefaultBitmap,
    pub fund_fees_token_0: u64,
    pub fund_fees_token_1: u64,
    pub open_time: u64,
    pub recent_epoch: u64,
}

impl ClmmPoolState {
    const SWAP_DISABLED: u8 = 1 << 4;

    pub fn swap_enabled(&self) -> bool {
        self.status & Self::SWAP_DISABLED == 0
    }
}

impl AccountLayout for ClmmPoolState {
    const SPAN: usize = 1544;

    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("bump", 8, 1),
        FieldSpec::new("amm_config", 9, 32),
        FieldSpec::new("owner", 41, 32),
        FieldSpec::new("token_mint_0", TOKEN_MINT_0_OFFSET, 32),
        FieldSpec::new("token_mint_1", TOKEN_MINT_1_OFFSET, 32),
        FieldSpec::new("token_vault_0", 137, 32),
        FieldSpec::new("token_vault_1", 169, 32),
        FieldSpec::new("observation_key", 201, 32),
        FieldSpec::new("mint_decimals_0", 233, 1),
        FieldSpec::new("mint_decimals_1", 234, 1),
        FieldSpec::new("tick_spacing", 235, 2),
        FieldSpec::new("liquidity", 237, 16),
        FieldSpec::new("sqrt_price_x64", 253, 16),
        FieldSpec::new("tick_current", 269, 4),
        FieldSpec::new("fee_growth_global_0_x64", 277, 16),
        FieldSpec::new("fee_growth_global_1_x64", 293, 16),
        FieldSpec::new("protocol_fees_token_0", 309, 8),
        FieldSpec::new("protocol_fees_token_1", 317, 8),
        FieldSpec::new("status", 389, 1),
        FieldSpec::new("reward_infos", 397, 3 * 169),
        FieldSpec::new("tick_array_bitmap", TICK_ARRAY_BITMAP_OFFSET, 128),
        FieldSpec::new("fund_fees_token_0", 1064, 8),
        FieldSpec::new("fund_fees_token_1", 1072, 8),
        FieldSpec::new("open_time", 1080, 8),
        FieldSpec::new("recent_epoch", 1088, 8),
    ];

    fn decode(address: Pubkey, data: &[u8]) -> Result<Self, DecodeError> {
        check_len(data, Self::MIN_LEN)?;
        Ok(Self {
            address,
            bump: read_u8(data, 8)?,
            amm_config: read_pubkey(data, 9)?,
            owner: read_pubkey(data, 41)?,
            token_mint_0: read_pubkey(data, TOKEN_MINT_0_OFFSET)?,
            token_mint_1: read_pubkey(data, TOKEN_MINT_1_OFFSET)?,
            token_vault_0: read_pubkey(data, 137)?,
            token_vault_1: read_pubkey(data, 169)?,
            observation_key: read_pubkey(data, 201)?,
            mint_decimals_0: read_u8(data, 233)?,
            mint_decimals_1: read_u8(data, 234)?,
            tick_spacing: read_u16(data, 235)?,
            liquidity: read_u128(data, 237)?,
            sqrt_price_x64: read_u128(data, 253)?,
            tick_current: read_i32(data, 269)?,
            fee_growth_global_0_x64: read_u128(data, 277)?,
            fee_growth_global_1_x64: read_u128(data, 293)?,
            protocol_fees_token_0: read_u64(data, 309)?,
            protocol_fees_token_1: read_u64(data, 317)?,
            status: read_u8(data, 389)?,
            tick_array_bitmap: read_u64_words(data, TICK_ARRAY_BITMAP_OFFSET)?,
            fund_fees_token_0: read_u64(data, 1064)?,
            fund_fees_token_1: read_u64(data, 1072)?,
            open_time: read_u64(data, 1080)?,
            recent_epoch: read_u64(data, 1088)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClmmAmmConfig {
    pub address: Pubkey,
    pub bump: u8,
    pub index: u16,
    pub owner: Pubkey,
    pub protocol_fee_rate: u32,
    /// Hundredths of a basis point
    pub trade_fee_rate: u32,
    pub tick_spacing: u16,
    pub fund_fee_rate: u32,
    pub fund_owner: Pubkey,
}

impl AccountLayout for ClmmAmmConfig {
    const SPAN: usize = 117;
    const MIN_LEN: usize = 93;

    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("bump", 8, 1),
        FieldSpec::new("index", 9, 2),
        FieldSpec::new("owner", 11, 32),
        FieldSpec::new("protocol_fee_rate", 43, 4),
        FieldSpec::new("trade_fee_rate", 47, 4),
        FieldSpec::new("tick_spacing", 51, 2),
        FieldSpec::new("fund_fee_rate", 53, 4),
        FieldSpec::new("fund_owner", 61, 32),
    ];

    fn decode(address: Pubkey, data: &[u8]) -> Result<Self, DecodeError> {
        check_len(data, Self::MIN_LEN)?;
        Ok(Self {
            address,
            bump: read_u8(data, 8)?,
            index: read_u16(data, 9)?,
            owner: read_pubkey(data, 11)?,
            protocol_fee_rate: read_u32(data, 43)?,
            trade_fee_rate: read_u32(data, 47)?,
            tick_spacing: read_u16(data, 51)?,
            fund_fee_rate: read_u32(data, 53)?,
            fund_owner: read_pubkey(data, 61)?,
        })
    }
}

const TICKS_OFFSET: usize = 44;
const TICK_STATE_LEN: usize = 168;

/// One tick-array account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClmmTickArray {
    pub address: Pubkey,
    pub pool_id: Pubkey,
    pub array: TickArray,
}

impl AccountLayout for ClmmTickArray {
    const SPAN: usize = 10240;
    const MIN_LEN: usize = TICKS_OFFSET + TICK_ARRAY_SIZE_USIZE * TICK_STATE_LEN;

    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("pool_id", 8, 32),
        FieldSpec::new("start_tick_index", 40, 4),
        FieldSpec::new("ticks", TICKS_OFFSET, TICK_ARRAY_SIZE_USIZE * TICK_STATE_LEN),
        FieldSpec::new("initialized_tick_count", 10124, 1),
        FieldSpec::new("recent_epoch", 10125, 8),
    ];

    fn decode(address: Pubkey, data: &[u8]) -> Result<Self, DecodeError> {
        check_len(data, Self::MIN_LEN)?;

        let mut array = TickArray::new(read_i32(data, 40)?);
        for (i, tick) in array.ticks.iter_mut().enumerate() {
            let base = TICKS_OFFSET + i * TICK_STATE_LEN;
            *tick = TickState {
                tick: read_i32(data, base)?,
                liquidity_net: read_i128(data, base + 4)?,
                liquidity_gross: read_u128(data, base + 20)?,
            };
        }

        Ok(Self {
            address,
            pool_id: read_pubkey(data, 8)?,
            array,
        })
    }
}

const POSITIVE_BITMAP_OFFSET: usize = 40;
const EXTENSION_BLOCKS_LEN: usize = EXTENSION_TICKARRAY_BITMAP_SIZE * 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClmmBitmapExtension {
    pub address: Pubkey,
    pub pool_id: Pubkey,
    pub bitmap: TickArrayBitmapExtension,
}

impl AccountLayout for ClmmBitmapExtension {
    const SPAN: usize = 1832;

    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("pool_id", 8, 32),
        FieldSpec::new("positive_tick_array_bitmap", POSITIVE_BITMAP_OFFSET, EXTENSION_BLOCKS_LEN),
        FieldSpec::new(
            "negative_tick_array_bitmap",
            POSITIVE_BITMAP_OFFSET + EXTENSION_BLOCKS_LEN,
            EXTENSION_BLOCKS_LEN,
        ),
    ];

    fn decode(address: Pubkey, data: &[u8]) -> Result<Self, DecodeError> {
        check_len(data, Self::MIN_LEN)?;

        let read_blocks = |offset: usize| -> Result<[ExtensionBlock; EXTENSION_TICKARRAY_BITMAP_SIZE], DecodeError> {
            let mut blocks = [[0u64; 8]; EXTENSION_TICKARRAY_BITMAP_SIZE];
            for (i, block) in blocks.iter_mut().enumerate() {
                *block = read_u64_words(data, offset + i * 64)?;
            }
            Ok(blocks)
        };

        Ok(Self {
            address,
            pool_id: read_pubkey(data, 8)?,
            bitmap: TickArrayBitmapExtension {
                positive_tick_array_bitmap: read_blocks(POSITIVE_BITMAP_OFFSET)?,
                negative_tick_array_bitmap: read_blocks(POSITIVE_BITMAP_OFFSET + EXTENSION_BLOCKS_LEN)?,
            },
        })
    }
}
