//! Raydium CPMM pool state and AMM config accounts

use solana_sdk::pubkey::Pubkey;

use super::{check_len, read_bool, read_pubkey, read_u16, read_u64, read_u8, AccountLayout, FieldSpec};
use crate::error::DecodeError;

pub const TOKEN_0_MINT_OFFSET: usize = 168;
pub const TOKEN_1_MINT_OFFSET: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpmmPoolState {
    pub address: Pubkey,
    pub amm_config: Pubkey,
    pub pool_creator: Pubkey,
    pub token_0_vault: Pubkey,
    pub token_1_vault: Pubkey,
    pub lp_mint: Pubkey,
    pub token_0_mint: Pubkey,
    pub token_1_mint: Pubkey,
    pub token_0_program: Pubkey,
    pub token_1_program: Pubkey,
    pub observation_key: Pubkey,
    pub auth_bump: u8,
    /// Bit flags; bit 2 disables swaps
    pub status: u8,
    pub lp_mint_decimals: u8,
    pub mint_0_decimals: u8,
    pub mint_1_decimals: u8,
    pub lp_supply: u64,
    pub protocol_fees_token_0: u64,
    pub protocol_fees_token_1: u64,
    pub fund_fees_token_0: u64,
    pub fund_fees_token_1: u64,
    pub open_time: u64,
    pub recent_epoch: u64,
}

impl CpmmPoolState {
    const SWAP_DISABLED: u8 = 1 << 2;

    pub fn swap_enabled(&self) -> bool {
        self.status & Self::SWAP_DISABLED == 0
    }

    /// Fees owed to the protocol and fund, held in the vaults but not tradable
    pub fn accrued_fees(&self) -> (u64, u64) {
        (
            self.protocol_fees_token_0
                .saturating_add(self.fund_fees_token_0),
            self.protocol_fees_token_1
                .saturating_add(self.fund_fees_token_1),
        )
    }
}

impl AccountLayout for CpmmPoolState {
    const SPAN: usize = 637;

    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("amm_config", 8, 32),
        FieldSpec::new("pool_creator", 40, 32),
        FieldSpec::new("token_0_vault", 72, 32),
        FieldSpec::new("token_1_vault", 104, 32),
        FieldSpec::new("lp_mint", 136, 32),
        FieldSpec::new("token_0_mint", TOKEN_0_MINT_OFFSET, 32),
        FieldSpec::new("token_1_mint", TOKEN_1_MINT_OFFSET, 32),
        FieldSpec::new("token_0_program", 232, 32),
        FieldSpec::new("token_1_program", 264, 32),
        FieldSpec::new("observation_key", 296, 32),
        FieldSpec::new("auth_bump", 328, 1),
        FieldSpec::new("status", 329, 1),
        FieldSpec::new("lp_mint_decimals", 330, 1),
        FieldSpec::new("mint_0_decimals", 331, 1),
        FieldSpec::new("mint_1_decimals", 332, 1),
        FieldSpec::new("lp_supply", 333, 8),
        FieldSpec::new("protocol_fees_token_0", 341, 8),
        FieldSpec::new("protocol_fees_token_1", 349, 8),
        FieldSpec::new("fund_fees_token_0", 357, 8),
        FieldSpec::new("fund_fees_token_1", 365, 8),
        FieldSpec::new("open_time", 373, 8),
        FieldSpec::new("recent_epoch", 381, 8),
    ];

    fn decode(address: Pubkey, data: &[u8]) -> Result<Self, DecodeError> {
        check_len(data, Self::MIN_LEN)?;
        Ok(Self {
            address,
            amm_config: read_pubkey(data, 8)?,
            pool_creator: read_pubkey(data, 40)?,
            token_0_vault: read_pubkey(data, 72)?,
            token_1_vault: read_pubkey(data, 104)?,
            lp_mint: read_pubkey(data, 136)?,
            token_0_mint: read_pubkey(data, TOKEN_0_MINT_OFFSET)?,
            token_1_mint: read_pubkey(data, TOKEN_1_MINT_OFFSET)?,
            token_0_program: read_pubkey(data, 232)?,
            token_1_program: read_pubkey(data, 264)?,
            observation_key: read_pubkey(data, 296)?,
            auth_bump: read_u8(data, 328)?,
            status: read_u8(data, 329)?,
            lp_mint_decimals: read_u8(data, 330)?,
            mint_0_decimals: read_u8(data, 331)?,
            mint_1_decimals: read_u8(data, 332)?,
            lp_supply: read_u64(data, 333)?,
            protocol_fees_token_0: read_u64(data, 341)?,
            protocol_fees_token_1: read_u64(data, 349)?,
            fund_fees_token_0: read_u64(data, 357)?,
            fund_fees_token_1: read_u64(data, 365)?,
            open_time: read_u64(data, 373)?,
            recent_epoch: read_u64(data, 381)?,
        })
    }
}

/// Fee parameters shared by every pool created under one config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpmmAmmConfig {
    pub address: Pubkey,
    pub bump: u8,
    pub disable_create_pool: bool,
    pub index: u16,
    /// Hundredths of a basis point
    pub trade_fee_rate: u64,
    pub protocol_fee_rate: u64,
    pub fund_fee_rate: u64,
    pub create_pool_fee: u64,
    pub protocol_owner: Pubkey,
    pub fund_owner: Pubkey,
}

impl AccountLayout for CpmmAmmConfig {
    const SPAN: usize = 236;
    const MIN_LEN: usize = 108;

    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("bump", 8, 1),
        FieldSpec::new("disable_create_pool", 9, 1),
        FieldSpec::new("index", 10, 2),
        FieldSpec::new("trade_fee_rate", 12, 8),
        FieldSpec::new("protocol_fee_rate", 20, 8),
        FieldSpec::new("fund_fee_rate", 28, 8),
        FieldSpec::new("create_pool_fee", 36, 8),
        FieldSpec::new("protocol_owner", 44, 32),
        FieldSpec::new("fund_owner", 76, 32),
    ];

    fn decode(address: Pubkey, data: &[u8]) -> Result<Self, DecodeError> {
        check_len(data, Self::MIN_LEN)?;
        Ok(Self {
            address,
            bump: read_u8(data, 8)?,
            disable_create_pool: read_bool(data, 9, "disable_create_pool")?,
            index: read_u16(data, 10)?,
            trade_fee_rate: read_u64(data, 12)?,
            protocol_fee_rate: read_u64(data, 20)?,
            fund_fee_rate: read_u64(data, 28)?,
            create_pool_fee: read_u64(data, 36)?,
            protocol_owner: read_pubkey(data, 44)?,
            fund_owner: read_pubkey(data, 76)?,
        })
    }
}
