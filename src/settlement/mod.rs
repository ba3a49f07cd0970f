//! Settlement Processor (SP) §4.6 — bounded-poll confirmation of a
//! submitted signature, followed by on-chain analysis and a single
//! `SwapRecord` write. Grounded on the reference crate's
//! `processor::worker` poll/dedup shape, generalized from "watch every
//! signature the block watcher has ever seen" to "watch the one signature
//! this order just produced".

pub mod analyzer;

use crate::chain::{ChainClient, SignatureState};
use crate::config::Config;
use crate::domain::{FollowerSwap, SwapDirection};
use crate::error::{AppError, Result};
use crate::store::models::{SwapRecord, TransactionStatus};
use crate::store::swap_records::NewSwapRecord;
use analyzer::{AnalyzedTransaction, TransactionKind};
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminal {
    Success,
    Failed,
    Expired,
}

/// Polls `signature` up to `Config::settlement_poll_attempts` times (or
/// until `settlement_wall_clock_secs` elapses, whichever comes first),
/// sleeping `settlement_poll_interval_ms` between attempts. Pending stays
/// pending; `Success`/`Failed` are terminal immediately (§4.6 point 1).
async fn poll_until_terminal(
    chain: &dyn ChainClient,
    signature: &str,
    config: &Config,
) -> Terminal {
    let deadline = Instant::now() + Duration::from_secs(config.settlement_wall_clock_secs);

    for attempt in 0..config.settlement_poll_attempts {
        if Instant::now() >= deadline {
            break;
        }
        match chain.get_signature_status(signature).await {
            Ok(SignatureState::Success) => return Terminal::Success,
            Ok(SignatureState::Failed) => return Terminal::Failed,
            Ok(SignatureState::Pending) => {}
            Err(e) => warn!(attempt, error = %e, signature, "status check failed, retrying"),
        }
        tokio::time::sleep(Duration::from_millis(config.settlement_poll_interval_ms)).await;
    }

    Terminal::Expired
}

/// Settles one submitted order: polls for a terminal status, analyzes the
/// landed transaction on success, and returns the record that should be
/// written exactly once for `signature` (§4.6 point 3) along with the
/// derived on-chain analysis the Position Ledger needs, when there is one.
pub async fn settle(
    chain: &dyn ChainClient,
    swap: &FollowerSwap,
    signature: &str,
    input_decimals: u8,
    output_decimals: u8,
    config: &Config,
) -> Result<(NewSwapRecord, Option<AnalyzedTransaction>)> {
    let mint = match swap.direction {
        SwapDirection::Buy => &swap.output_mint,
        SwapDirection::Sell => &swap.input_mint,
    };

    match poll_until_terminal(chain, signature, config).await {
        Terminal::Success => {
            let raw = chain.get_parsed_transaction(signature).await?;
            let analyzed = analyzer::analyze(&raw, &swap.follower_wallet, mint, swap.direction)?;
            let record = record_from_analysis(swap, signature, input_decimals, output_decimals, &analyzed);
            info!(signature, kind = ?analyzed.kind, "settlement succeeded");
            Ok((record, Some(analyzed)))
        }
        Terminal::Failed => {
            warn!(signature, "settlement observed on-chain failure");
            Ok((
                terminal_record(swap, signature, TransactionStatus::Failed, input_decimals, output_decimals),
                None,
            ))
        }
        Terminal::Expired => {
            warn!(signature, "settlement poll exhausted without a terminal status");
            Ok((
                terminal_record(swap, signature, TransactionStatus::Expired, input_decimals, output_decimals),
                None,
            ))
        }
    }
}

/// A `BuildFailed` outcome never reached the chain — no signature, no
/// poll, just the record (§4.5/§4.6).
pub fn record_for_build_failure(
    swap: &FollowerSwap,
    input_decimals: u8,
    output_decimals: u8,
) -> NewSwapRecord {
    NewSwapRecord {
        signature: None,
        status: TransactionStatus::BuildFailed,
        follower_wallet: swap.follower_wallet.clone(),
        direction: swap.direction,
        input_mint: swap.input_mint.clone(),
        output_mint: swap.output_mint.clone(),
        input_amount: swap.amount as i64,
        input_token_decimals: input_decimals as i16,
        output_amount: 0,
        output_token_decimals: output_decimals as i16,
        fee: 0,
        slot: 0,
        timestamp: 0,
        sol_change: 0,
        swap_sol_change: 0,
        other_sol_change: 0,
        program_id: swap.program_id_hint.clone(),
    }
}

fn terminal_record(
    swap: &FollowerSwap,
    signature: &str,
    status: TransactionStatus,
    input_decimals: u8,
    output_decimals: u8,
) -> NewSwapRecord {
    NewSwapRecord {
        signature: Some(signature.to_string()),
        status,
        follower_wallet: swap.follower_wallet.clone(),
        direction: swap.direction,
        input_mint: swap.input_mint.clone(),
        output_mint: swap.output_mint.clone(),
        input_amount: swap.amount as i64,
        input_token_decimals: input_decimals as i16,
        output_amount: 0,
        output_token_decimals: output_decimals as i16,
        fee: 0,
        slot: 0,
        timestamp: 0,
        sol_change: 0,
        swap_sol_change: 0,
        other_sol_change: 0,
        program_id: swap.program_id_hint.clone(),
    }
}

/// Actual settled amounts come from the observed deltas, not the
/// requested order: a partially-filled or differently-routed swap still
/// gets an accurate `SwapRecord` (§4.6 point 2).
fn record_from_analysis(
    swap: &FollowerSwap,
    signature: &str,
    input_decimals: u8,
    output_decimals: u8,
    analyzed: &AnalyzedTransaction,
) -> NewSwapRecord {
    let output_amount = match (swap.direction, analyzed.kind) {
        (SwapDirection::Buy, Some(TransactionKind::Swap)) => analyzed.token_change.unsigned_abs() as i64,
        (SwapDirection::Sell, Some(TransactionKind::Sell)) => analyzed.swap_sol_change.unsigned_abs() as i64,
        _ => 0,
    };

    NewSwapRecord {
        signature: Some(signature.to_string()),
        status: TransactionStatus::Success,
        follower_wallet: swap.follower_wallet.clone(),
        direction: swap.direction,
        input_mint: swap.input_mint.clone(),
        output_mint: swap.output_mint.clone(),
        input_amount: swap.amount as i64,
        input_token_decimals: input_decimals as i16,
        output_amount,
        output_token_decimals: output_decimals as i16,
        fee: analyzed.fee,
        slot: analyzed.slot,
        timestamp: analyzed.timestamp,
        sol_change: analyzed.sol_change,
        swap_sol_change: analyzed.swap_sol_change,
        other_sol_change: analyzed.other_sol_change,
        program_id: swap.program_id_hint.clone(),
    }
}

impl From<&NewSwapRecord> for SwapRecord {
    /// Convenience for call sites (and tests) that want to look at a
    /// freshly-built record before it round-trips through the store; the
    /// `id` is a placeholder since only the database assigns real ones.
    fn from(r: &NewSwapRecord) -> Self {
        SwapRecord {
            id: 0,
            signature: r.signature.clone(),
            status: r.status,
            follower_wallet: r.follower_wallet.clone(),
            direction: r.direction,
            input_mint: r.input_mint.clone(),
            output_mint: r.output_mint.clone(),
            input_amount: r.input_amount,
            input_token_decimals: r.input_token_decimals,
            output_amount: r.output_amount,
            output_token_decimals: r.output_token_decimals,
            fee: r.fee,
            slot: r.slot,
            timestamp: r.timestamp,
            sol_change: r.sol_change,
            swap_sol_change: r.swap_sol_change,
            other_sol_change: r.other_sol_change,
            program_id: r.program_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SwapInType;

    fn sample_swap() -> FollowerSwap {
        FollowerSwap {
            follower_wallet: "Follower1111111111111111111111111111111111".into(),
            subscription_pk: 1,
            direction: SwapDirection::Buy,
            input_mint: crate::domain::WSOL_MINT.into(),
            output_mint: "Mint1111111111111111111111111111111111111111".into(),
            amount: 100_000_000,
            ui_amount: 0.1,
            slippage_bps: 1_000,
            priority_fee: 5_000,
            program_id_hint: None,
            swap_in_type: SwapInType::Qty,
            amount_pct: None,
            by: crate::domain::SwapBy::Copytrade,
            source_leader_event: None,
        }
    }

    #[test]
    fn build_failure_record_carries_no_signature() {
        let record = record_for_build_failure(&sample_swap(), 9, 6);
        assert!(record.signature.is_none());
        assert_eq!(record.status, TransactionStatus::BuildFailed);
        assert_eq!(record.input_amount, 100_000_000);
    }

    #[test]
    fn analyzed_buy_reports_token_change_as_output() {
        let analyzed = AnalyzedTransaction {
            fee: 5_000,
            slot: 1,
            timestamp: 1,
            sol_change: -100_005_000,
            swap_sol_change: -100_000_000,
            other_sol_change: -5_000,
            token_change: 2_000_000,
            kind: Some(TransactionKind::Swap),
        };
        let record = record_from_analysis(&sample_swap(), "sig", 9, 6, &analyzed);
        assert_eq!(record.output_amount, 2_000_000);
        assert_eq!(record.status, TransactionStatus::Success);
    }
}
