//! SPL token account balance

use solana_sdk::pubkey::Pubkey;

use super::{check_len, read_pubkey, read_u64, AccountLayout, FieldSpec};
use crate::error::DecodeError;

/// The leading fields of a token account (SPL Token or Token-2022 base layout)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAccountBalance {
    pub address: Pubkey,
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

impl AccountLayout for TokenAccountBalance {
    const SPAN: usize = 165;
    const MIN_LEN: usize = 72;

    const FIELDS: &'static [FieldSpec] = &[
        // Token accounts carry no discriminator.
        FieldSpec::new("mint", 0, 32),
        FieldSpec::new("owner", 32, 32),
        FieldSpec::new("amount", 64, 8),
    ];

    fn decode(address: Pubkey, data: &[u8]) -> Result<Self, DecodeError> {
        check_len(data, Self::MIN_LEN)?;
        Ok(Self {
            address,
            mint: read_pubkey(data, 0)?,
            owner: read_pubkey(data, 32)?,
            amount: read_u64(data, 64)?,
        })
    }
}
