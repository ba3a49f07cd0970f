//! Bonding-Curve (BC) route builder §4.4 — analytic swap against a
//! virtual-reserve curve, grounded on the reference implementation's
//! `PumpTransactionBuilder.build_swap_transaction`.

use super::{max_amount_with_slippage, min_amount_with_slippage, retry_with_backoff};
use super::{MinOutFloor, RouteBuilder, RuntimeFlags};
use crate::chain::ChainClient;
use crate::domain::{FollowerSwap, SwapDirection};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::message::{v0, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::system_program;
use solana_sdk::transaction::VersionedTransaction;
use spl_associated_token_account::get_associated_token_address;
use std::str::FromStr;
use std::sync::Arc;

pub const PUMP_FUN_PROGRAM: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";
const PUMP_GLOBAL_ACCOUNT: &str = "4wTV1YmiEkRvAtNtsSGPtUrqRYQMe5SKy2uB4Jjaxnjm";
const PUMP_FUN_ACCOUNT: &str = "Ce6TQqeHC9p8KetsN6JsjHK7UTZk7nasjjnr7XxXp9F1";
const RENT_PROGRAM_ID: &str = "SysvarRent111111111111111111111111111111111";
const FEE_RECIPIENT: &str = "CebN5WGQ4jvEPvsVU4EoHEpgzq1VV7AbicfhtW4xC9iM";

const BUY_DISCRIMINATOR: [u8; 8] = [102, 6, 61, 18, 1, 218, 235, 234];
const SELL_DISCRIMINATOR: [u8; 8] = [51, 230, 133, 164, 1, 127, 131, 173];

pub struct BondingCurveBuilder {
    chain: Arc<dyn ChainClient>,
    max_attempts: u32,
}

impl BondingCurveBuilder {
    pub fn new(chain: Arc<dyn ChainClient>, max_attempts: u32) -> Self {
        Self { chain, max_attempts }
    }
}

#[async_trait]
impl RouteBuilder for BondingCurveBuilder {
    /// Accepts when the leader event's route hint names the pump.fun
    /// program directly (§4.4: "program_id_hint is the bonding-curve
    /// program"). Launch-cache-based mint-suffix detection is an external
    /// collaborator concern (§1 Non-goals: block watcher) — hint-matching
    /// is the pipeline-internal half of that rule.
    fn accepts(&self, swap: &FollowerSwap) -> bool {
        swap.program_id_hint.as_deref() == Some(PUMP_FUN_PROGRAM)
    }

    async fn build(
        &self,
        signer: &Keypair,
        swap: &FollowerSwap,
        min_out_floor: Option<MinOutFloor>,
        flags: RuntimeFlags,
    ) -> Result<VersionedTransaction> {
        let program_id = Pubkey::from_str(PUMP_FUN_PROGRAM).map_err(AppError::Solana)?;
        let mint = Pubkey::from_str(match swap.direction {
            SwapDirection::Buy => &swap.output_mint,
            SwapDirection::Sell => &swap.input_mint,
        })
        .map_err(AppError::Solana)?;

        let curve = retry_with_backoff(self.max_attempts, || {
            self.chain
                .get_bonding_curve_account(&mint.to_string(), PUMP_FUN_PROGRAM)
        })
        .await?;
        if curve.complete {
            return Err(AppError::BuildFailed(
                "bonding curve has migrated, no longer tradable on BC route".into(),
            ));
        }

        let owner = signer.pubkey();
        let (bonding_curve, _) =
            crate::chain::bonding_curve_account::derive_bonding_curve_address(&mint, &program_id);
        let associated_bonding_curve = get_associated_token_address(&bonding_curve, &mint);
        let user_ata = get_associated_token_address(&owner, &mint);

        let mut instructions = Vec::new();

        let instruction = match swap.direction {
            SwapDirection::Buy => {
                let amount_in = swap.amount;
                let token_out = (amount_in as u128 * curve.virtual_token_reserves as u128
                    / curve.virtual_sol_reserves as u128) as u64;

                let sol_threshold = match min_out_floor {
                    Some(MinOutFloor(floor)) => {
                        if (token_out as u64) < floor {
                            return Err(AppError::SlippageFloorViolated {
                                quoted: token_out,
                                floor,
                            });
                        }
                        amount_in
                    }
                    None => max_amount_with_slippage(amount_in, swap.slippage_bps),
                };

                build_swap_instruction(
                    &program_id,
                    &BUY_DISCRIMINATOR,
                    token_out,
                    sol_threshold,
                    BondingCurveAccounts {
                        fee_recipient: Pubkey::from_str(FEE_RECIPIENT).map_err(AppError::Solana)?,
                        mint,
                        bonding_curve,
                        associated_bonding_curve,
                        associated_user: user_ata,
                        user: owner,
                    },
                )
            }
            SwapDirection::Sell => {
                let amount_in = swap.amount;
                let sol_out = (amount_in as u128 * curve.virtual_sol_reserves as u128
                    / curve.virtual_token_reserves as u128) as u64;
                // Get-me-out: sell path always uses the hard 9900bps floor
                // regardless of the order's nominal slippage (§4.3/pump.py).
                let sol_threshold = min_amount_with_slippage(sol_out, 9_900);

                build_swap_instruction(
                    &program_id,
                    &SELL_DISCRIMINATOR,
                    amount_in,
                    sol_threshold,
                    BondingCurveAccounts {
                        fee_recipient: Pubkey::from_str(FEE_RECIPIENT).map_err(AppError::Solana)?,
                        mint,
                        bonding_curve,
                        associated_bonding_curve,
                        associated_user: user_ata,
                        user: owner,
                    },
                )
            }
        };

        if swap.direction == SwapDirection::Buy {
            instructions.push(
                spl_associated_token_account::instruction::create_associated_token_account_idempotent(
                    &owner, &owner, &mint, &spl_token::id(),
                ),
            );
        }
        instructions.push(instruction);

        // ATA closure on a full sell is left disabled, preserving the
        // reference's commented-out behavior (§9 Open Question 1).

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

struct BondingCurveAccounts {
    fee_recipient: Pubkey,
    mint: Pubkey,
    bonding_curve: Pubkey,
    associated_bonding_curve: Pubkey,
    associated_user: Pubkey,
    user: Pubkey,
}

fn build_swap_instruction(
    program_id: &Pubkey,
    discriminator: &[u8; 8],
    amount: u64,
    threshold: u64,
    accounts: BondingCurveAccounts,
) -> Instruction {
    let mut data = Vec::with_capacity(24);
    data.extend_from_slice(discriminator);
    data.extend_from_slice(&amount.to_le_bytes());
    data.extend_from_slice(&threshold.to_le_bytes());

    let global = Pubkey::from_str(PUMP_GLOBAL_ACCOUNT).expect("valid constant");
    let event_authority = Pubkey::from_str(PUMP_FUN_ACCOUNT).expect("valid constant");
    let rent = Pubkey::from_str(RENT_PROGRAM_ID).expect("valid constant");

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(global, false),
            AccountMeta::new(accounts.fee_recipient, false),
            AccountMeta::new_readonly(accounts.mint, false),
            AccountMeta::new(accounts.bonding_curve, false),
            AccountMeta::new(accounts.associated_bonding_curve, false),
            AccountMeta::new(accounts.associated_user, false),
            AccountMeta::new(accounts.user, true),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(rent, false),
            AccountMeta::new_readonly(event_authority, false),
            AccountMeta::new_readonly(*program_id, false),
        ],
        data,
    }
}
