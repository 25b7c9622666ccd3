use borsh::BorshSerialize;
use solana_sdk::instruction::AccountMeta;
use solana_sdk::pubkey::Pubkey;

use super::{impl_instruction, InstructionBuilder, SwapPlan, SwapPlanBuilder};
use crate::error::RouterResult;

const SWAP_V2_DISCRIMINATOR: [u8; 8] = [43, 4, 237, 11, 26, 201, 30, 98];

#[derive(BorshSerialize, Clone, Debug, PartialEq, Eq)]
pub struct SwapV2Params {
    pub amount: u64,
    pub other_amount_threshold: u64,
    /// Zero disables the price limit
    pub sqrt_price_limit_x64: u128,
    pub is_base_input: bool,
}

impl_instruction!(SwapV2Params, SWAP_V2_DISCRIMINATOR);

#[derive(Debug, Clone)]
pub struct ClmmSwapAccounts {
    pub program_id: Pubkey,
    pub payer: Pubkey,
    pub amm_config: Pubkey,
    pub pool_state: Pubkey,
    pub input_token_account: Pubkey,
    pub output_token_account: Pubkey,
    pub input_vault: Pubkey,
    pub output_vault: Pubkey,
    pub observation_state: Pubkey,
    pub token_program: Pubkey,
    pub token_program_2022: Pubkey,
    pub memo_program: Pubkey,
    pub input_vault_mint: Pubkey,
    pub output_vault_mint: Pubkey,
    pub bitmap_extension: Pubkey,
    /// Tick arrays in traversal order
    pub tick_arrays: Vec<Pubkey>,
}

pub fn swap_v2(accounts: &ClmmSwapAccounts, params: SwapV2Params) -> RouterResult<SwapPlan> {
    let builder = SwapPlanBuilder::new(accounts.program_id)
        .add_readonly_signer(accounts.payer)
        .add_readonly(accounts.amm_config)
        .add_writable(accounts.pool_state)
        .add_writable(accounts.input_token_account)
        .add_writable(accounts.output_token_account)
        .add_writable(accounts.input_vault)
        .add_writable(accounts.output_vault)
        .add_writable(accounts.observation_state)
        .add_readonly(accounts.token_program)
        .add_readonly(accounts.token_program_2022)
        .add_readonly(accounts.memo_program)
        .add_readonly(accounts.input_vault_mint)
        .add_readonly(accounts.output_vault_mint)
        .add_writable(accounts.bitmap_extension)
        .add_accounts(
            accounts
                .tick_arrays
                .iter()
                .map(|tick_array| AccountMeta::new(*tick_array, false)),
        );

    Ok(builder.with_data(params.build_data()?).build())
}
