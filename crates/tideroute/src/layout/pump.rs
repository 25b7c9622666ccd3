//! Pump AMM pool account

use solana_sdk::pubkey::Pubkey;

use super::{check_len, read_pubkey, read_u16, read_u64, read_u8, AccountLayout, FieldSpec};
use crate::error::DecodeError;

pub const BASE_MINT_OFFSET: usize = 43;
pub const QUOTE_MINT_OFFSET: usize = 75;
const COIN_CREATOR_OFFSET: usize = 211;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpPoolState {
    pub address: Pubkey,
    pub pool_bump: u8,
    pub index: u16,
    pub creator: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub lp_mint: Pubkey,
    pub pool_base_token_account: Pubkey,
    pub pool_quote_token_account: Pubkey,
    pub lp_supply: u64,
    /// Default key for pools created before creator fees existed
    pub coin_creator: Pubkey,
}

impl PumpPoolState {
    pub fn has_coin_creator(&self) -> bool {
        self.coin_creator != Pubkey::default()
    }
}

impl AccountLayout for PumpPoolState {
    const SPAN: usize = 300;
    const MIN_LEN: usize = COIN_CREATOR_OFFSET;

    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("pool_bump", 8, 1),
        FieldSpec::new("index", 9, 2),
        FieldSpec::new("creator", 11, 32),
        FieldSpec::new("base_mint", BASE_MINT_OFFSET, 32),
        FieldSpec::new("quote_mint", QUOTE_MINT_OFFSET, 32),
        FieldSpec::new("lp_mint", 107, 32),
        FieldSpec::new("pool_base_token_account", 139, 32),
        FieldSpec::new("pool_quote_token_account", 171, 32),
        FieldSpec::new("lp_supply", 203, 8),
        FieldSpec::new("coin_creator", COIN_CREATOR_OFFSET, 32),
    ];

    fn decode(address: Pubkey, data: &[u8]) -> Result<Self, DecodeError> {
        check_len(data, Self::MIN_LEN)?;

        let coin_creator = if data.len() >= COIN_CREATOR_OFFSET + 32 {
            read_pubkey(data, COIN_CREATOR_OFFSET)?
        } else {
            Pubkey::default()
        };

        Ok(Self {
            address,
            pool_bump: read_u8(data, 8)?,
            index: read_u16(data, 9)?,
            creator: read_pubkey(data, 11)?,
            base_mint: read_pubkey(data, BASE_MINT_OFFSET)?,
            quote_mint: read_pubkey(data, QUOTE_MINT_OFFSET)?,
            lp_mint: read_pubkey(data, 107)?,
            pool_base_token_account: read_pubkey(data, 139)?,
            pool_quote_token_account: read_pubkey(data, 171)?,
            lp_supply: read_u64(data, 203)?,
            coin_creator,
        })
    }
}
