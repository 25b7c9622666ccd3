use borsh::BorshSerialize;
use solana_sdk::pubkey::Pubkey;

use super::{impl_instruction, InstructionBuilder, SwapPlan, SwapPlanBuilder};
use crate::error::RouterResult;

const BUY_DISCRIMINATOR: [u8; 8] = [102, 6, 61, 18, 1, 218, 235, 234];
const SELL_DISCRIMINATOR: [u8; 8] = [51, 230, 133, 164, 1, 127, 131, 173];

/// Buy base with quote
#[derive(BorshSerialize, Clone, Debug, PartialEq, Eq)]
pub struct BuyParams {
    pub base_amount_out: u64,
    pub max_quote_amount_in: u64,
}

impl_instruction!(BuyParams, BUY_DISCRIMINATOR);

/// Sell base for quote
#[derive(BorshSerialize, Clone, Debug, PartialEq, Eq)]
pub struct SellParams {
    pub base_amount_in: u64,
    pub min_quote_amount_out: u64,
}

impl_instruction!(SellParams, SELL_DISCRIMINATOR);

/// Accounts shared by `buy` and `sell`
#[derive(Debug, Clone)]
pub struct PumpSwapAccounts {
    pub program_id: Pubkey,
    pub pool: Pubkey,
    pub user: Pubkey,
    pub global_config: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub user_base_token_account: Pubkey,
    pub user_quote_token_account: Pubkey,
    pub pool_base_token_account: Pubkey,
    pub pool_quote_token_account: Pubkey,
    pub protocol_fee_recipient: Pubkey,
    pub protocol_fee_recipient_token_account: Pubkey,
    pub base_token_program: Pubkey,
    pub quote_token_program: Pubkey,
    pub system_program: Pubkey,
    pub associated_token_program: Pubkey,
    pub event_authority: Pubkey,
    /// Creator vault token account and its authority, for pools with a coin creator
    pub coin_creator_vault: Option<(Pubkey, Pubkey)>,
}

pub fn buy(accounts: &PumpSwapAccounts, params: BuyParams) -> RouterResult<SwapPlan> {
    Ok(swap_accounts(accounts).with_data(params.build_data()?).build())
}

pub fn sell(accounts: &PumpSwapAccounts, params: SellParams) -> RouterResult<SwapPlan> {
    Ok(swap_accounts(accounts).with_data(params.build_data()?).build())
}

fn swap_accounts(accounts: &PumpSwapAccounts) -> SwapPlanBuilder {
    let builder = SwapPlanBuilder::new(accounts.program_id)
        .add_readonly(accounts.pool)
        .add_signer(accounts.user)
        .add_readonly(accounts.global_config)
        .add_readonly(accounts.base_mint)
        .add_readonly(accounts.quote_mint)
        .add_writable(accounts.user_base_token_account)
        .add_writable(accounts.user_quote_token_account)
        .add_writable(accounts.pool_base_token_account)
        .add_writable(accounts.pool_quote_token_account)
        .add_readonly(accounts.protocol_fee_recipient)
        .add_writable(accounts.protocol_fee_recipient_token_account)
        .add_readonly(accounts.base_token_program)
        .add_readonly(accounts.quote_token_program)
        .add_readonly(accounts.system_program)
        .add_readonly(accounts.associated_token_program)
        .add_readonly(accounts.event_authority)
        .add_readonly(accounts.program_id);

    match accounts.coin_creator_vault {
        Some((vault_token_account, vault_authority)) => builder
            .add_writable(vault_token_account)
            .add_readonly(vault_authority),
        None => builder,
    }
}
