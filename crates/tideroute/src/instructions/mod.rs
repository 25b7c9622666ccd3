//! Swap instruction encoders
//!
//! Each family module pairs a borsh parameter struct with its Anchor
//! discriminator and an accounts struct listing the program's ABI order.
//! Nothing here touches the network.

pub mod clmm;
pub mod cpmm;
pub mod pump;

use borsh::BorshSerialize;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

use crate::error::{RouterError, RouterResult};

pub use clmm::{ClmmSwapAccounts, SwapV2Params};
pub use cpmm::{CpmmSwapAccounts, SwapBaseInputParams};
pub use pump::{BuyParams, PumpSwapAccounts, SellParams};

/// Trait for instruction parameter types that carry a discriminator
pub trait InstructionBuilder: BorshSerialize {
    /// The 8-byte instruction discriminator
    const DISCRIMINATOR: [u8; 8];

    /// Build the instruction data (discriminator + serialized params)
    fn build_data(&self) -> RouterResult<Vec<u8>> {
        let mut data = Self::DISCRIMINATOR.to_vec();
        data.extend_from_slice(
            &self
                .try_to_vec()
                .map_err(|e| RouterError::Build(e.to_string()))?,
        );
        Ok(data)
    }
}

/// Implements [`InstructionBuilder`] for a params struct
macro_rules! impl_instruction {
    ($name:ident, $discriminator:expr) => {
        impl $crate::instructions::InstructionBuilder for $name {
            const DISCRIMINATOR: [u8; 8] = $discriminator;
        }
    };
}
pub(crate) use impl_instruction;

/// A single swap instruction ready to be wrapped in a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl SwapPlan {
    pub fn into_instruction(self) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: self.accounts,
            data: self.data,
        }
    }
}

impl From<SwapPlan> for Instruction {
    fn from(plan: SwapPlan) -> Self {
        plan.into_instruction()
    }
}

/// Accumulates accounts in ABI order
pub struct SwapPlanBuilder {
    program_id: Pubkey,
    accounts: Vec<AccountMeta>,
    data: Vec<u8>,
}

impl SwapPlanBuilder {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            accounts: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Add a writable signer account
    pub fn add_signer(mut self, pubkey: Pubkey) -> Self {
        self.accounts.push(AccountMeta::new(pubkey, true));
        self
    }

    /// Add a read-only signer account
    pub fn add_readonly_signer(mut self, pubkey: Pubkey) -> Self {
        self.accounts.push(AccountMeta::new_readonly(pubkey, true));
        self
    }

    /// Add a writable non-signer account
    pub fn add_writable(mut self, pubkey: Pubkey) -> Self {
        self.accounts.push(AccountMeta::new(pubkey, false));
        self
    }

    /// Add a readonly account
    pub fn add_readonly(mut self, pubkey: Pubkey) -> Self {
        self.accounts.push(AccountMeta::new_readonly(pubkey, false));
        self
    }

    /// Add multiple accounts
    pub fn add_accounts(mut self, accounts: impl IntoIterator<Item = AccountMeta>) -> Self {
        self.accounts.extend(accounts);
        self
    }

    /// Set the instruction data
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn build(self) -> SwapPlan {
        SwapPlan {
            program_id: self.program_id,
            accounts: self.accounts,
            data: self.data,
        }
    }
}
