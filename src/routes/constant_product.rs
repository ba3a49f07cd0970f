//! Constant-Product (CP) route builder §4.4 — direct swap against a
//! Raydium-style `x * y = k` pool, grounded on a sibling example's
//! `RaydiumCpmmPoolState`/`build_raydium_cpmm_swap_instruction` pair, kept
//! real and selectable rather than always deferring to the aggregator
//! (§9 Open Question 3).

use super::{min_amount_with_slippage, retry_with_backoff};
use super::{MinOutFloor, RouteBuilder, RuntimeFlags};
use crate::chain::pool_state::{CpmmPoolState, PoolSide};
use crate::chain::ChainClient;
use crate::domain::{FollowerSwap, SwapDirection};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::message::{v0, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::program_pack::Pack;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::VersionedTransaction;
use spl_associated_token_account::get_associated_token_address;
use spl_token::state::Account as TokenAccount;
use std::str::FromStr;
use std::sync::Arc;

pub const RAYDIUM_CPMM_PROGRAM: &str = "CPMMoo8L3F4NbTegBCKVNunggL7H1ZpdTHKxQB5qKP1C";
const SWAP_BASE_INPUT_DISCRIMINATOR: u8 = 0x09;

pub struct ConstantProductBuilder {
    chain: Arc<dyn ChainClient>,
    max_attempts: u32,
    /// Mint → pool account address. §4.4 treats route resolution (which
    /// pool backs a mint) as a lookup the ingress/cache layer already did;
    /// this builder just needs where to read it from.
    pools: dashmap::DashMap<String, String>,
}

impl ConstantProductBuilder {
    pub fn new(chain: Arc<dyn ChainClient>, max_attempts: u32) -> Self {
        Self {
            chain,
            max_attempts,
            pools: dashmap::DashMap::new(),
        }
    }

    pub fn register_pool(&self, mint: impl Into<String>, pool_address: impl Into<String>) {
        self.pools.insert(mint.into(), pool_address.into());
    }

    fn pool_for(&self, mint: &str) -> Option<String> {
        self.pools.get(mint).map(|v| v.value().clone())
    }

    async fn vault_balance(&self, vault: &Pubkey) -> Result<u64> {
        let data = self.chain.get_account_data(&vault.to_string()).await?;
        let account = TokenAccount::unpack(&data)
            .map_err(|e| AppError::Parse(format!("failed to unpack vault token account: {e}")))?;
        Ok(account.amount)
    }

    async fn fetch_pool_state(&self, pool_id: &Pubkey, pool_address: &str) -> Result<CpmmPoolState> {
        let data = self.chain.get_account_data(pool_address).await?;
        CpmmPoolState::parse(pool_id, &data)
    }
}

#[async_trait]
impl RouteBuilder for ConstantProductBuilder {
    fn accepts(&self, swap: &FollowerSwap) -> bool {
        let mint = match swap.direction {
            SwapDirection::Buy => &swap.output_mint,
            SwapDirection::Sell => &swap.input_mint,
        };
        self.pools.contains_key(mint)
    }

    async fn build(
        &self,
        signer: &Keypair,
        swap: &FollowerSwap,
        min_out_floor: Option<MinOutFloor>,
        flags: RuntimeFlags,
    ) -> Result<VersionedTransaction> {
        let mint = match swap.direction {
            SwapDirection::Buy => &swap.output_mint,
            SwapDirection::Sell => &swap.input_mint,
        };
        let pool_address = self
            .pool_for(mint)
            .ok_or_else(|| AppError::RouteUnavailable(swap.program_id_hint.clone()))?;
        let pool_pubkey = Pubkey::from_str(&pool_address).map_err(AppError::Solana)?;

        let pool = retry_with_backoff(self.max_attempts, || {
            self.fetch_pool_state(&pool_pubkey, &pool_address)
        })
        .await?;

        let mint_pk = Pubkey::from_str(mint).map_err(AppError::Solana)?;
        let side = pool
            .side_for(&mint_pk)
            .ok_or_else(|| AppError::BuildFailed("mint not present in resolved pool".into()))?;

        let (in_vault, out_vault, in_mint, out_mint) = match (swap.direction, side) {
            (SwapDirection::Buy, PoolSide::Zero) => {
                (pool.token_1_vault, pool.token_0_vault, pool.token_1_mint, pool.token_0_mint)
            }
            (SwapDirection::Buy, PoolSide::One) => {
                (pool.token_0_vault, pool.token_1_vault, pool.token_0_mint, pool.token_1_mint)
            }
            (SwapDirection::Sell, PoolSide::Zero) => {
                (pool.token_0_vault, pool.token_1_vault, pool.token_0_mint, pool.token_1_mint)
            }
            (SwapDirection::Sell, PoolSide::One) => {
                (pool.token_1_vault, pool.token_0_vault, pool.token_1_mint, pool.token_0_mint)
            }
        };

        let reserve_in = self.vault_balance(&in_vault).await?;
        let reserve_out = self.vault_balance(&out_vault).await?;
        if reserve_in == 0 || reserve_out == 0 {
            return Err(AppError::BuildFailed("pool has no liquidity on one side".into()));
        }

        let amount_in = swap.amount;
        // x*y=k: out = reserve_out - (reserve_in * reserve_out) / (reserve_in + in)
        let amount_out = reserve_out
            .saturating_sub(
                ((reserve_in as u128 * reserve_out as u128)
                    / (reserve_in as u128 + amount_in as u128)) as u64,
            );

        let min_amount_out = match min_out_floor {
            Some(MinOutFloor(floor)) => {
                if amount_out < floor {
                    return Err(AppError::SlippageFloorViolated {
                        quoted: amount_out,
                        floor,
                    });
                }
                floor
            }
            None => min_amount_with_slippage(amount_out, swap.slippage_bps),
        };

        let owner = signer.pubkey();
        let user_source = get_associated_token_address(&owner, &in_mint);
        let user_dest = get_associated_token_address(&owner, &out_mint);

        let mut instructions = Vec::new();
        instructions.push(
            spl_associated_token_account::instruction::create_associated_token_account_idempotent(
                &owner, &owner, &out_mint, &spl_token::id(),
            ),
        );
        instructions.push(build_swap_instruction(
            &pool,
            &user_source,
            &user_dest,
            &owner,
            amount_in,
            min_amount_out,
        )?);

        if flags.priority_fee_lamports > 0 {
            instructions.insert(
                0,
                solana_sdk::compute_budget::ComputeBudgetInstruction::set_compute_unit_price(
                    flags.priority_fee_lamports,
                ),
            );
        }

        let blockhash = self.chain.get_latest_blockhash().await?;
        let message = v0::Message::try_compile(&owner, &instructions, &[], blockhash)
            .map_err(|e| AppError::BuildFailed(format!("failed to compile message: {e}")))?;
        let mut tx = VersionedTransaction {
            signatures: vec![solana_sdk::signature::Signature::default()],
            message: VersionedMessage::V0(message),
        };
        let signature = signer.sign_message(&tx.message.serialize());
        tx.signatures[0] = signature;

        Ok(tx)
    }
}

fn build_swap_instruction(
    pool: &CpmmPoolState,
    user_source: &Pubkey,
    user_dest: &Pubkey,
    user_owner: &Pubkey,
    amount_in: u64,
    min_amount_out: u64,
) -> Result<Instruction> {
    let program_id = Pubkey::from_str(RAYDIUM_CPMM_PROGRAM).map_err(AppError::Solana)?;

    let mut data = Vec::with_capacity(17);
    data.push(SWAP_BASE_INPUT_DISCRIMINATOR);
    data.extend_from_slice(&amount_in.to_le_bytes());
    data.extend_from_slice(&min_amount_out.to_le_bytes());

    let accounts = vec![
        AccountMeta::new(pool.pool_id, false),
        AccountMeta::new_readonly(pool.authority, false),
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new(pool.token_0_vault, false),
        AccountMeta::new(pool.token_1_vault, false),
        AccountMeta::new(*user_source, false),
        AccountMeta::new(*user_dest, false),
        AccountMeta::new_readonly(*user_owner, true),
    ];

    Ok(Instruction {
        program_id,
        accounts,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_instruction_encodes_amounts_little_endian() {
        let pool = CpmmPoolState {
            pool_id: Pubkey::new_unique(),
            token_0_mint: Pubkey::new_unique(),
            token_1_mint: Pubkey::new_unique(),
            token_0_vault: Pubkey::new_unique(),
            token_1_vault: Pubkey::new_unique(),
            authority: Pubkey::new_unique(),
        };
        let ix = build_swap_instruction(
            &pool,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            1_234_567_890,
            987_654_321,
        )
        .unwrap();

        assert_eq!(ix.data[0], SWAP_BASE_INPUT_DISCRIMINATOR);
        assert_eq!(ix.accounts.len(), 8);
        assert!(ix.accounts[7].is_signer);
    }
}
