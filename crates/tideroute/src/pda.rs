//! Program-derived and associated token addresses used by swap instructions

use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address_with_program_id;

/// Seeds for the PDAs the router derives
pub mod seeds {
    pub const TICK_ARRAY: &[u8] = b"tick_array";
    pub const TICK_ARRAY_BITMAP_EXTENSION: &[u8] = b"pool_tick_array_bitmap_extension";
    pub const CPMM_AUTHORITY: &[u8] = b"vault_and_lp_mint_auth_seed";
    pub const CREATOR_VAULT: &[u8] = b"creator_vault";
}

/// CLMM tick array starting at `start_index`; the index is encoded big-endian
pub fn find_tick_array_address(program_id: &Pubkey, pool: &Pubkey, start_index: i32) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[seeds::TICK_ARRAY, pool.as_ref(), &start_index.to_be_bytes()],
        program_id,
    )
}

pub fn find_bitmap_extension_address(program_id: &Pubkey, pool: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[seeds::TICK_ARRAY_BITMAP_EXTENSION, pool.as_ref()],
        program_id,
    )
}

/// Vault and LP mint authority shared by every CPMM pool
pub fn find_cpmm_authority_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::CPMM_AUTHORITY], program_id)
}

pub fn find_creator_vault_authority(program_id: &Pubkey, coin_creator: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::CREATOR_VAULT, coin_creator.as_ref()], program_id)
}

/// Token account of the creator vault for `quote_mint`
pub fn creator_vault_token_account(
    program_id: &Pubkey,
    coin_creator: &Pubkey,
    quote_mint: &Pubkey,
    token_program: &Pubkey,
) -> Pubkey {
    let (authority, _) = find_creator_vault_authority(program_id, coin_creator);
    get_associated_token_address_with_program_id(&authority, quote_mint, token_program)
}

pub fn user_token_account(user: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Pubkey {
    get_associated_token_address_with_program_id(user, mint, token_program)
}
