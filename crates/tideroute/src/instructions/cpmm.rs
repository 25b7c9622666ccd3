use borsh::BorshSerialize;
use solana_sdk::pubkey::Pubkey;

use super::{impl_instruction, InstructionBuilder, SwapPlan, SwapPlanBuilder};
use crate::error::RouterResult;

const SWAP_BASE_INPUT_DISCRIMINATOR: [u8; 8] = [143, 190, 90, 218, 196, 30, 51, 222];

/// Exact-input swap
#[derive(BorshSerialize, Clone, Debug, PartialEq, Eq)]
pub struct SwapBaseInputParams {
    pub amount_in: u64,
    pub minimum_amount_out: u64,
}

impl_instruction!(SwapBaseInputParams, SWAP_BASE_INPUT_DISCRIMINATOR);

#[derive(Debug, Clone)]
pub struct CpmmSwapAccounts {
    pub program_id: Pubkey,
    pub payer: Pubkey,
    pub authority: Pubkey,
    pub amm_config: Pubkey,
    pub pool_state: Pubkey,
    pub input_token_account: Pubkey,
    pub output_token_account: Pubkey,
    pub input_vault: Pubkey,
    pub output_vault: Pubkey,
    pub input_token_program: Pubkey,
    pub output_token_program: Pubkey,
    pub input_token_mint: Pubkey,
    pub output_token_mint: Pubkey,
    pub observation_state: Pubkey,
}

pub fn swap_base_input(
    accounts: &CpmmSwapAccounts,
    params: SwapBaseInputParams,
) -> RouterResult<SwapPlan> {
    Ok(SwapPlanBuilder::new(accounts.program_id)
        .add_readonly_signer(accounts.payer)
        .add_readonly(accounts.authority)
        .add_readonly(accounts.amm_config)
        .add_writable(accounts.pool_state)
        .add_writable(accounts.input_token_account)
        .add_writable(accounts.output_token_account)
        .add_writable(accounts.input_vault)
        .add_writable(accounts.output_vault)
        .add_readonly(accounts.input_token_program)
        .add_readonly(accounts.output_token_program)
        .add_readonly(accounts.input_token_mint)
        .add_readonly(accounts.output_token_mint)
        .add_writable(accounts.observation_state)
        .with_data(params.build_data()?)
        .build())
}
