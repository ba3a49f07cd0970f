//! On-chain RPC + metadata collaborator interfaces, §6. Implementation
//! detail of the underlying RPC client is out of scope (§1); this module
//! is the seam the pipeline's route builders, executor, and settlement
//! processor program against, backed by the reference crate's
//! `RaceClient`/`solana_client::RpcClient` for the concrete calls.

pub mod bonding_curve_account;
pub mod pool_state;

pub use bonding_curve_account::BondingCurveAccount;

use crate::error::{AppError, Result};
use crate::http::race_client::RaceClient;
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureState {
    Success,
    Failed,
    Pending,
}

#[derive(Debug, Clone)]
pub struct TokenAccountBalance {
    pub amount: u64,
    pub decimals: u8,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_signature_status(&self, signature: &str) -> Result<SignatureState>;
    async fn get_token_account_balance(&self, owner: &str, mint: &str) -> Result<TokenAccountBalance>;
    async fn get_bonding_curve_account(
        &self,
        mint: &str,
        program_id: &str,
    ) -> Result<BondingCurveAccount>;
    async fn submit_raw_transaction(&self, base64_tx: &str) -> Result<String>;
    async fn get_parsed_transaction(&self, signature: &str) -> Result<serde_json::Value>;
    /// Raw account bytes for route builders that parse their own pool
    /// layout (e.g. the constant-product builder's AMM pool state).
    async fn get_account_data(&self, address: &str) -> Result<Vec<u8>>;
    /// A recent blockhash to stamp onto a freshly compiled message — every
    /// route builder needs one, a transaction compiled against a zeroed or
    /// stale blockhash is rejected on submission.
    async fn get_latest_blockhash(&self) -> Result<solana_sdk::hash::Hash>;
}

/// Reference implementation pairing the reference crate's racing HTTP
/// client (submit/fetch-raw, where first-response-wins matters for
/// latency) with `solana_client`'s typed RPC client (account reads, where
/// correctness of a single trusted endpoint is preferred over racing).
pub struct RpcChainClient {
    race: RaceClient,
    typed: RpcClient,
}

impl RpcChainClient {
    pub fn new(rpc_endpoints: Vec<String>) -> Result<Self> {
        let race = RaceClient::new(rpc_endpoints.clone())?;
        let primary = rpc_endpoints
            .first()
            .cloned()
            .unwrap_or_else(|| "https://api.mainnet-beta.solana.com".to_string());
        let typed = RpcClient::new_with_commitment(primary, CommitmentConfig::confirmed());
        Ok(Self { race, typed })
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn get_signature_status(&self, signature: &str) -> Result<SignatureState> {
        let sig = solana_sdk::signature::Signature::from_str(signature)
            .map_err(|e| AppError::Parse(e.to_string()))?;
        let statuses = self
            .typed
            .get_signature_statuses(&[sig])
            .await
            .map_err(|e| AppError::Rpc(e.to_string()))?;

        match statuses.value.into_iter().next().flatten() {
            None => Ok(SignatureState::Pending),
            Some(status) => match status.err {
                Some(_) => Ok(SignatureState::Failed),
                None => Ok(SignatureState::Success),
            },
        }
    }

    async fn get_token_account_balance(&self, owner: &str, mint: &str) -> Result<TokenAccountBalance> {
        let owner = Pubkey::from_str(owner).map_err(AppError::Solana)?;
        let mint = Pubkey::from_str(mint).map_err(AppError::Solana)?;
        let amount = crate::utils::token::get_token_balance(&self.typed, &owner, &mint).await?;
        let decimals = crate::utils::token::get_decimals(&self.typed, &mint).await?;
        Ok(TokenAccountBalance { amount, decimals })
    }

    async fn get_bonding_curve_account(
        &self,
        mint: &str,
        program_id: &str,
    ) -> Result<BondingCurveAccount> {
        let mint = Pubkey::from_str(mint).map_err(AppError::Solana)?;
        let program_id = Pubkey::from_str(program_id).map_err(AppError::Solana)?;
        bonding_curve_account::fetch(&self.typed, &mint, &program_id).await
    }

    async fn submit_raw_transaction(&self, base64_tx: &str) -> Result<String> {
        self.race.send_transaction(base64_tx).await
    }

    async fn get_parsed_transaction(&self, signature: &str) -> Result<serde_json::Value> {
        self.race.get_transaction(signature).await
    }

    async fn get_account_data(&self, address: &str) -> Result<Vec<u8>> {
        let address = Pubkey::from_str(address).map_err(AppError::Solana)?;
        let account = self
            .typed
            .get_account(&address)
            .await
            .map_err(|e| AppError::Rpc(e.to_string()))?;
        Ok(account.data)
    }

    async fn get_latest_blockhash(&self) -> Result<solana_sdk::hash::Hash> {
        self.typed
            .get_latest_blockhash()
            .await
            .map_err(|e| AppError::Rpc(e.to_string()))
    }
}
