//! JSON-RPC transport over the nonblocking Solana client

use std::sync::Arc;

use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{
    RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSendTransactionConfig,
};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};
use tracing::debug;

use super::{AccountTransport, KeyedAccount, SearchFilter};
use crate::error::TransportError;

/// Largest batch `getMultipleAccounts` accepts
const MAX_MULTIPLE_ACCOUNTS: usize = 100;

/// Result of handing a transaction to the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent(Signature),
    Simulated {
        err: Option<String>,
        logs: Vec<String>,
        units_consumed: Option<u64>,
    },
}

pub struct RpcTransport {
    rpc: Arc<RpcClient>,
    commitment: CommitmentConfig,
}

impl RpcTransport {
    pub fn new(rpc_url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self::with_client(
            Arc::new(RpcClient::new_with_commitment(rpc_url.into(), commitment)),
            commitment,
        )
    }

    pub fn with_client(rpc: Arc<RpcClient>, commitment: CommitmentConfig) -> Self {
        Self { rpc, commitment }
    }

    /// Get the RPC client
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Sign `instructions` with `signer` as fee payer, then either simulate or send.
    /// Sending skips preflight and does not wait for confirmation.
    pub async fn submit(
        &self,
        instructions: &[Instruction],
        signer: &Keypair,
        simulate: bool,
    ) -> Result<SubmitOutcome, TransportError> {
        let recent_blockhash = self.rpc.get_latest_blockhash().await?;

        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&signer.pubkey()),
            &[signer],
            recent_blockhash,
        );

        if simulate {
            let result = self.rpc.simulate_transaction(&tx).await?.value;
            return Ok(SubmitOutcome::Simulated {
                err: result.err.map(|err| err.to_string()),
                logs: result.logs.unwrap_or_default(),
                units_consumed: result.units_consumed,
            });
        }

        let signature = self
            .rpc
            .send_transaction_with_config(
                &tx,
                RpcSendTransactionConfig {
                    skip_preflight: true,
                    ..Default::default()
                },
            )
            .await?;
        Ok(SubmitOutcome::Sent(signature))
    }

    fn rpc_filters(filter: &SearchFilter) -> Vec<RpcFilterType> {
        let mut filters = Vec::with_capacity(filter.memcmp.len() + 1);
        if let Some(size) = filter.data_size {
            filters.push(RpcFilterType::DataSize(size as u64));
        }
        for memcmp in &filter.memcmp {
            filters.push(RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
                memcmp.offset,
                memcmp.bytes.clone(),
            )));
        }
        filters
    }
}

#[async_trait]
impl AccountTransport for RpcTransport {
    async fn get_account(&self, address: &Pubkey) -> Result<Vec<u8>, TransportError> {
        self.rpc
            .get_account_with_commitment(address, self.commitment)
            .await?
            .value
            .map(|account| account.data)
            .ok_or(TransportError::AccountNotFound(*address))
    }

    async fn get_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, TransportError> {
        let mut accounts = Vec::with_capacity(addresses.len());
        for chunk in addresses.chunks(MAX_MULTIPLE_ACCOUNTS) {
            let response = self
                .rpc
                .get_multiple_accounts_with_commitment(chunk, self.commitment)
                .await?;
            accounts.extend(
                response
                    .value
                    .into_iter()
                    .map(|account| account.map(|account| account.data)),
            );
        }
        Ok(accounts)
    }

    async fn search_accounts(
        &self,
        program_id: &Pubkey,
        filter: &SearchFilter,
    ) -> Result<Vec<KeyedAccount>, TransportError> {
        let config = RpcProgramAccountsConfig {
            filters: Some(Self::rpc_filters(filter)),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.commitment),
                ..Default::default()
            },
            ..Default::default()
        };

        let accounts = self
            .rpc
            .get_program_accounts_with_config(program_id, config)
            .await?;
        debug!(program = %program_id, found = accounts.len(), "program account search");

        Ok(accounts
            .into_iter()
            .map(|(address, account)| KeyedAccount {
                address,
                data: account.data,
            })
            .collect())
    }
}
