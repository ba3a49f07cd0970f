//! On-chain transaction analyzer, §4.6 point 2 — generalizes the reference
//! crate's `processor::transaction::parse_transaction` pre/post balance
//! diffing into the classify-and-derive step the settlement processor
//! needs. The source's analyzer (`analyzer.py`) read this off a
//! webhook-shaped indexer payload (`type`/`actions`/`events`); this crate's
//! on-chain collaborator instead returns a standard `jsonParsed`
//! `getTransaction` response, so classification here is driven by which
//! deltas are actually present rather than an externally-supplied tag.

use crate::domain::SwapDirection;
use crate::error::{AppError, Result};
use crate::processor::transaction::{self, ParsedTransaction};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Swap,
    TokenTransfer,
    Sell,
}

#[derive(Debug, Clone, Copy)]
pub struct AnalyzedTransaction {
    pub fee: i64,
    pub slot: i64,
    pub timestamp: i64,
    pub sol_change: i64,
    pub swap_sol_change: i64,
    pub other_sol_change: i64,
    pub token_change: i64,
    pub kind: Option<TransactionKind>,
}

impl AnalyzedTransaction {
    /// The zero-derived-amounts fallback for an unattributable transaction
    /// (§4.6 point 2): settlement still records `Success`, the Position
    /// Ledger just has nothing to apply.
    fn unattributed(fee: i64, slot: i64, timestamp: i64) -> Self {
        Self {
            fee,
            slot,
            timestamp,
            sol_change: 0,
            swap_sol_change: 0,
            other_sol_change: 0,
            token_change: 0,
            kind: None,
        }
    }
}

/// Derives settlement fields for `follower_wallet`'s side of `signature`,
/// given the direction the order was meant to take and the mint being
/// traded. `sol_change`/`swap_sol_change`/`other_sol_change` are signed
/// lamport deltas: `swap_sol_change` is the movement attributable to the
/// swap itself, `other_sol_change` the network fee, and `sol_change` their
/// sum — the fee is always paid by the follower wallet as fee payer, so
/// `swap_sol_change = sol_change + fee`.
pub fn analyze(
    raw: &Value,
    follower_wallet: &str,
    mint: &str,
    direction: SwapDirection,
) -> Result<AnalyzedTransaction> {
    if raw.is_null() {
        return Err(AppError::Parse("transaction not found or still pending".into()));
    }

    let fee = raw
        .get("meta")
        .and_then(|m| m.get("fee"))
        .and_then(|v| v.as_i64())
        .unwrap_or(0);
    let slot = raw.get("slot").and_then(|v| v.as_i64()).unwrap_or(0);
    let timestamp = raw.get("blockTime").and_then(|v| v.as_i64()).unwrap_or(0);

    let signature_placeholder = "";
    let parsed: ParsedTransaction = transaction::parse_transaction(signature_placeholder, raw)?;

    let Some(change) = parsed.account_changes.get(follower_wallet) else {
        return Ok(AnalyzedTransaction::unattributed(fee, slot, timestamp));
    };

    let token_change = match change.token_deltas.get(mint) {
        Some(delta) => delta.amount_delta as i64,
        None => return Ok(AnalyzedTransaction::unattributed(fee, slot, timestamp)),
    };

    let sol_change = change.sol_delta;
    let swap_sol_change = sol_change + fee;
    let other_sol_change = -fee;

    let kind = classify(direction, token_change, swap_sol_change);

    Ok(AnalyzedTransaction {
        fee,
        slot,
        timestamp,
        sol_change,
        swap_sol_change,
        other_sol_change,
        token_change,
        kind: Some(kind),
    })
}

fn classify(direction: SwapDirection, token_change: i64, swap_sol_change: i64) -> TransactionKind {
    match direction {
        SwapDirection::Buy if token_change > 0 && swap_sol_change < 0 => TransactionKind::Swap,
        SwapDirection::Sell if token_change < 0 && swap_sol_change > 0 => TransactionKind::Sell,
        _ => TransactionKind::TokenTransfer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tx() -> Value {
        json!({
            "slot": 12345,
            "blockTime": 1_700_000_000,
            "meta": {
                "fee": 5000,
                "preBalances": [1_000_000_000u64],
                "postBalances": [899_995_000u64],
                "preTokenBalances": [
                    {"accountIndex": 0, "mint": "Mint1111111111111111111111111111111111111111", "uiTokenAmount": {"amount": "0", "decimals": 6}}
                ],
                "postTokenBalances": [
                    {"accountIndex": 0, "mint": "Mint1111111111111111111111111111111111111111", "uiTokenAmount": {"amount": "1000000", "decimals": 6}}
                ]
            },
            "transaction": {
                "message": {
                    "accountKeys": [
                        {"pubkey": "Follower11111111111111111111111111111111111"}
                    ]
                }
            }
        })
    }

    #[test]
    fn classifies_a_buy_as_swap() {
        let analyzed = analyze(
            &sample_tx(),
            "Follower11111111111111111111111111111111111",
            "Mint1111111111111111111111111111111111111111",
            SwapDirection::Buy,
        )
        .unwrap();
        assert_eq!(analyzed.kind, Some(TransactionKind::Swap));
        assert_eq!(analyzed.token_change, 1_000_000);
        assert_eq!(analyzed.fee, 5000);
        assert_eq!(analyzed.swap_sol_change, -100_000_000);
        assert_eq!(analyzed.other_sol_change, -5000);
    }

    #[test]
    fn unattributed_when_wallet_not_touched() {
        let analyzed = analyze(
            &sample_tx(),
            "SomeoneElse11111111111111111111111111111111",
            "Mint1111111111111111111111111111111111111111",
            SwapDirection::Buy,
        )
        .unwrap();
        assert_eq!(analyzed.kind, None);
        assert_eq!(analyzed.token_change, 0);
    }
}
