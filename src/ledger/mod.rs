//! Position Ledger (PL) §4.7 — atomic holding + subscription counter
//! mutation for one settled copy order, idempotent per
//! `(signature, direction, holding_pk)` (§5/§8 Testable Property 5).
//!
//! Grounded on the reference crate's `HoldingService.update_holding_after_buy`
//! / `update_holding_after_sell`, translated from its read-modify-write ORM
//! pattern into explicit `Store` calls under the caller's subscription lock
//! — the DB-level CAS in `apply_subscription_delta` is the mechanism that
//! stays correct even if that lock is ever bypassed by a second process.

use crate::domain::{FollowerSwap, SwapDirection};
use crate::error::Result;
use crate::store::models::{Holding, Subscription, SubscriptionDelta, TransactionStatus};
use crate::store::Store;
use tracing::info;

/// Applies one settled order's effect on the follower's position.
///
/// `Failed`/`Expired` settlements only bump `subscription.failed_times` —
/// nothing about a position changed on-chain, so nothing here should
/// either (§4.7: "failed/expired settlements touch no positional field").
/// Caller must already hold the subscription's logical lock (§5).
#[allow(clippy::too_many_arguments)]
pub async fn apply(
    store: &Store,
    subscription: &Subscription,
    holding: Option<&Holding>,
    swap: &FollowerSwap,
    status: TransactionStatus,
    signature: Option<&str>,
    output_amount: i64,
    token_symbol: Option<&str>,
    now: i64,
) -> Result<()> {
    if status != TransactionStatus::Success {
        store.increment_failed_times(subscription.id).await?;
        return Ok(());
    }

    let Some(signature) = signature else {
        // Success with no signature can't happen in practice (BuildFailed
        // never polls), but there's nothing to apply idempotently against.
        return Ok(());
    };

    let direction_label = match swap.direction {
        SwapDirection::Buy => "buy",
        SwapDirection::Sell => "sell",
    };

    // The holding's id is only known once it exists — for a brand new buy
    // that means inserting first, so the idempotence check below covers
    // every mutation after the insert rather than the insert itself (the
    // insert has its own guard: admission only accepts a first buy when
    // `get_holding` returned `None`, and the whole stage runs under the
    // subscription's lock). Both branches key off the submitted
    // transaction's own signature, same as the sell path.
    match swap.direction {
        SwapDirection::Buy => {
            apply_buy(store, subscription, holding, swap, output_amount, token_symbol, now, signature).await?
        }
        SwapDirection::Sell => {
            apply_sell(store, subscription, holding, swap, output_amount, now, signature, direction_label)
                .await?
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn apply_buy(
    store: &Store,
    subscription: &Subscription,
    holding: Option<&Holding>,
    swap: &FollowerSwap,
    output_amount: i64,
    token_symbol: Option<&str>,
    now: i64,
    signature: &str,
) -> Result<()> {
    let input_amount = swap.amount as i64;
    let leader_to_amount = swap
        .source_leader_event
        .as_ref()
        .map(|e| e.to_amount as i64)
        .unwrap_or(output_amount);

    match holding {
        None => {
            let new_holding = Holding {
                id: 0,
                leader_wallet: subscription.leader_wallet.clone(),
                mint: swap.output_mint.clone(),
                symbol: token_symbol.unwrap_or_default().to_string(),
                decimals: swap
                    .source_leader_event
                    .as_ref()
                    .map(|e| e.to_decimals as i16)
                    .unwrap_or(0),
                subscription_pk: subscription.id,
                my_amount: output_amount,
                target_amount: leader_to_amount,
                current_position: input_amount,
                max_position: subscription.max_position,
                buy_times: 1,
                max_buy_times: subscription.max_buy_times,
                sol_sold: input_amount,
                sol_earned: 0,
                latest_trade_ts: now,
            };
            let inserted = store.insert_holding(&new_holding).await?;
            let applied = store
                .mark_settlement_applied(signature, "buy", inserted.id, now)
                .await?;
            if !applied {
                return Ok(());
            }

            store
                .apply_subscription_delta(
                    subscription.id,
                    SubscriptionDelta {
                        current_position: input_amount,
                        sol_sold: input_amount,
                        token_number: 1,
                        ..Default::default()
                    },
                )
                .await?;
            info!(subscription = subscription.id, mint = %swap.output_mint, "opened new holding");
        }
        Some(holding) => {
            let applied = store
                .mark_settlement_applied(signature, "buy", holding.id, now)
                .await?;
            if !applied {
                return Ok(());
            }

            store
                .update_holding(
                    holding.id,
                    holding.my_amount + output_amount,
                    holding.target_amount + leader_to_amount,
                    holding.current_position + input_amount,
                    holding.buy_times + 1,
                    holding.sol_sold + input_amount,
                    holding.sol_earned,
                    now,
                )
                .await?;

            store
                .apply_subscription_delta(
                    subscription.id,
                    SubscriptionDelta {
                        current_position: input_amount,
                        sol_sold: input_amount,
                        ..Default::default()
                    },
                )
                .await?;
            info!(subscription = subscription.id, holding = holding.id, "added to holding");
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn apply_sell(
    store: &Store,
    subscription: &Subscription,
    holding: Option<&Holding>,
    swap: &FollowerSwap,
    output_amount: i64,
    now: i64,
    signature: &str,
    direction_label: &str,
) -> Result<()> {
    let Some(holding) = holding else {
        // Admission only accepts a sell when a holding exists; nothing to
        // settle into if it somehow vanished between shaping and landing.
        return Ok(());
    };

    let applied = store
        .mark_settlement_applied(signature, direction_label, holding.id, now)
        .await?;
    if !applied {
        return Ok(());
    }

    let input_amount = swap.amount as i64;
    let leader_from_amount = swap
        .source_leader_event
        .as_ref()
        .map(|e| e.from_amount as i64)
        .unwrap_or(input_amount);

    let my_amount_prior = holding.my_amount.max(1);
    let fraction_sold = (input_amount as f64 / my_amount_prior as f64).min(1.0);

    let new_my_amount = (holding.my_amount - input_amount).max(0);
    let new_target_amount = (holding.target_amount - leader_from_amount).max(0);
    let new_position = (holding.current_position as f64 * (1.0 - fraction_sold)) as i64;
    let subscription_position_delta = -((holding.current_position as f64 * fraction_sold) as i64);

    store
        .update_holding(
            holding.id,
            new_my_amount,
            new_target_amount,
            new_position.max(0),
            holding.buy_times,
            holding.sol_sold,
            holding.sol_earned + output_amount,
            now,
        )
        .await?;

    store
        .apply_subscription_delta(
            subscription.id,
            SubscriptionDelta {
                current_position: subscription_position_delta,
                sol_earned: output_amount,
                ..Default::default()
            },
        )
        .await?;

    info!(subscription = subscription.id, holding = holding.id, "reduced holding");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// §8 S1-style sell-fraction arithmetic: selling 40% of a holding
    /// scales its proportional `current_position` contribution by 0.6,
    /// never by a fixed subtraction.
    #[test]
    fn sell_fraction_scales_current_position_proportionally() {
        let my_amount_prior: i64 = 1_000_000;
        let input_amount: i64 = 400_000;
        let current_position: i64 = 500_000_000;

        let fraction_sold = input_amount as f64 / my_amount_prior as f64;
        let new_position = (current_position as f64 * (1.0 - fraction_sold)) as i64;

        assert_eq!(new_position, 300_000_000);
    }
}
