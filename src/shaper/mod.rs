//! Order Shaper (OS) §4.3 — converts an accepted leader swap into a
//! `FollowerSwap` intent: size, slippage, priority fee, route hint.
//!
//! Sizing/slippage math is pure integer/fixed-point arithmetic so it can
//! be unit tested directly against the §8 scenarios without touching the
//! network or the store.

pub mod slippage;

use crate::domain::{FollowerSwap, LeaderTxEvent, SwapBy, SwapDirection, SwapInType};
use crate::error::Result;
use crate::store::models::{Holding, Subscription};
use slippage::SlippageOracle;

/// Buy sizing per §4.3: `clamp(leader.from_amount * ratio, [min, max])`,
/// then re-clamped to the subscription's remaining headroom so a single
/// copy can't push `current_position` past `max_position`.
pub fn buy_amount_lamports(subscription: &Subscription, leader_from_amount: u64) -> u64 {
    let requested = leader_from_amount as f64 * subscription.auto_buy_ratio;
    let clamped = requested
        .clamp(subscription.min_buy_sol as f64, subscription.max_buy_sol as f64) as u64;

    let remaining = (subscription.max_position - subscription.current_position).max(0) as u64;
    clamped.min(remaining)
}

/// Slippage selection per §4.3's three-way branch.
pub async fn select_slippage_bps(
    subscription: &Subscription,
    follower_wallet: &str,
    mint: &str,
    oracle: &dyn SlippageOracle,
) -> Result<u16> {
    if subscription.anti_sandwich {
        oracle.sandwich_slippage_bps(follower_wallet).await
    } else if subscription.auto_slippage {
        let bps = oracle.adaptive_slippage_bps(mint).await?;
        Ok(bps.clamp(250, 3_000))
    } else {
        Ok((subscription.custom_slippage * 10_000.0) as u16)
    }
}

/// Builds the `FollowerSwap` template Admission hands to the Route
/// Registry. Sell-path slippage/min-out overrides (forced 9900 bps, zero
/// floor) are applied here per §4.3 rather than deferred to the executor,
/// since they're a property of the order, not the route.
pub async fn shape(
    subscription: &Subscription,
    event: &LeaderTxEvent,
    holding: Option<&Holding>,
    oracle: &dyn SlippageOracle,
) -> Result<FollowerSwap> {
    match event.direction {
        SwapDirection::Buy => shape_buy(subscription, event, oracle).await,
        SwapDirection::Sell => shape_sell(subscription, event, holding, oracle).await,
    }
}

async fn shape_buy(
    subscription: &Subscription,
    event: &LeaderTxEvent,
    oracle: &dyn SlippageOracle,
) -> Result<FollowerSwap> {
    let amount = buy_amount_lamports(subscription, event.from_amount);
    let slippage_bps = select_slippage_bps(
        subscription,
        &subscription.follower_wallet,
        &event.mint,
        oracle,
    )
    .await?;

    Ok(FollowerSwap {
        follower_wallet: subscription.follower_wallet.clone(),
        subscription_pk: subscription.id,
        direction: SwapDirection::Buy,
        input_mint: crate::domain::WSOL_MINT.to_string(),
        output_mint: event.mint.clone(),
        amount,
        ui_amount: amount as f64 / 1e9,
        slippage_bps,
        priority_fee: subscription.priority_fee as u64,
        program_id_hint: event.program_id.clone(),
        swap_in_type: SwapInType::Qty,
        amount_pct: None,
        by: SwapBy::Copytrade,
        source_leader_event: Some(event.clone()),
    })
}

async fn shape_sell(
    subscription: &Subscription,
    event: &LeaderTxEvent,
    holding: Option<&Holding>,
    _oracle: &dyn SlippageOracle,
) -> Result<FollowerSwap> {
    let amount_pct = event.sell_fraction();
    let amount = holding
        .map(|h| (h.my_amount as f64 * amount_pct) as u64)
        .unwrap_or(0);

    Ok(FollowerSwap {
        follower_wallet: subscription.follower_wallet.clone(),
        subscription_pk: subscription.id,
        direction: SwapDirection::Sell,
        input_mint: event.mint.clone(),
        output_mint: crate::domain::WSOL_MINT.to_string(),
        amount,
        ui_amount: amount as f64 / 10f64.powi(event.from_decimals as i32),
        // Get-me-out policy, §4.3: sell path forces the hard upper bound
        // regardless of the subscription's normal slippage settings.
        slippage_bps: 9_900,
        priority_fee: subscription.priority_fee as u64,
        program_id_hint: event.program_id.clone(),
        swap_in_type: SwapInType::Pct,
        amount_pct: Some(amount_pct),
        by: SwapBy::Copytrade,
        source_leader_event: Some(event.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_subscription() -> Subscription {
        Subscription {
            id: 1,
            follower_wallet: "Follower1111111111111111111111111111111111".into(),
            follower_chat: 42,
            leader_wallet: "Leader11111111111111111111111111111111111".into(),
            leader_alias: None,
            active: true,
            filter_min_buy: 100_000_000,
            max_buy_times: 3,
            max_position: 2_000_000_000,
            auto_buy: true,
            auto_sell: true,
            auto_buy_ratio: 0.1,
            min_buy_sol: 100_000_000,
            max_buy_sol: 500_000_000,
            min_sell_ratio: 0.02,
            anti_fast_trade: true,
            fast_trade_threshold: 10,
            fast_trade_duration: 60,
            fast_trade_sleep_threshold: 5,
            fast_trade_sleep_time: 3_600,
            fast_trade_window_start: 0,
            fast_trade_count: 0,
            priority_fee: 5_000,
            anti_sandwich: false,
            auto_slippage: true,
            custom_slippage: 0.1,
            current_position: 0,
            sol_sold: 0,
            sol_earned: 0,
            token_number: 0,
            failed_times: 0,
            filtered_times: 0,
        }
    }

    /// S1 — first buy, under cap.
    #[test]
    fn buy_amount_clamps_to_ratio_bounds() {
        let sub = sample_subscription();
        let amount = buy_amount_lamports(&sub, 1_000_000_000);
        assert_eq!(amount, 100_000_000);
    }

    /// S3 — size clamp to remaining capacity.
    #[test]
    fn buy_amount_clamps_to_remaining_headroom() {
        let mut sub = sample_subscription();
        sub.current_position = 1_800_000_000;
        sub.auto_buy_ratio = 50.0;
        let amount = buy_amount_lamports(&sub, 1_000_000_000);
        assert_eq!(amount, 200_000_000);
    }

    #[test]
    fn custom_slippage_converts_to_bps() {
        let sub = sample_subscription();
        assert_eq!((sub.custom_slippage * 10_000.0) as u16, 1_000);
    }

    /// S4 — partial sell carries the sell fraction forward as amount_pct.
    #[tokio::test]
    async fn sell_shapes_percentage_order() {
        let sub = sample_subscription();
        let event = LeaderTxEvent {
            leader_wallet: sub.leader_wallet.clone(),
            mint: "Mint1111111111111111111111111111111111111".into(),
            direction: SwapDirection::Sell,
            program_id: None,
            from_amount: 400_000 * 10u64.pow(6),
            from_decimals: 6,
            to_amount: 0,
            to_decimals: 9,
            pre_token_amount: 1_000_000 * 10u64.pow(6),
            post_token_amount: 600_000 * 10u64.pow(6),
            tx_type: crate::domain::TxType::Reduce,
            timestamp: 0,
            signature: "sig".into(),
        };
        let oracle = slippage::DefaultSlippageOracle;
        let swap = shape(&sub, &event, None, &oracle).await.unwrap();
        assert_eq!(swap.amount_pct, Some(0.4));
        assert_eq!(swap.slippage_bps, 9_900);
    }
}
