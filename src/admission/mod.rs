//! Admission Filter (AF) §4.2 — per-(subscription, event) replication
//! decision under the per-subscription logical lock (§5).
//!
//! Grounded on the source's `HoldingService.check_swap_permission`, with
//! the malformed `target_wallet == X and active == True` predicate (§9
//! Open Question 2) already fixed at the State Store layer
//! (`Store::get_active_subscriptions_for_leader`) rather than re-checked
//! here.

pub mod fast_trade;
pub mod lock;

pub use lock::SubscriptionLocks;

use crate::domain::{LeaderTxEvent, SwapDirection};
use crate::error::Result;
use crate::store::models::{Holding, Subscription};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Inactive,
    AutoBuyDisabled,
    AutoSellDisabled,
    PositionCap,
    BuyCountCap,
    BelowMinBuy,
    BelowMinSellRatio,
    NoHolding,
    FastTradeSleep,
}

pub enum AdmissionOutcome {
    Accepted(Option<Holding>),
    Rejected(RejectReason),
}

/// Evaluates §4.2's buy/sell policy and, on acceptance, updates the
/// subscription-wide fast-trade throttle counters (§9 Open Question 4) in
/// the same pass.
pub async fn check(
    store: &Store,
    subscription: &Subscription,
    event: &LeaderTxEvent,
) -> Result<AdmissionOutcome> {
    let now = crate::utils::time::now_ts() as i64 / 1000;

    if subscription.anti_fast_trade && fast_trade::is_sleeping(subscription, now) {
        return Ok(AdmissionOutcome::Rejected(RejectReason::FastTradeSleep));
    }

    let holding = store.get_holding(subscription.id, &event.mint).await?;

    let decision = match event.direction {
        SwapDirection::Buy => check_buy(subscription, event, holding.as_ref()),
        SwapDirection::Sell => check_sell(subscription, event, holding.as_ref()),
    };

    let Some(reason) = decision else {
        if subscription.anti_fast_trade {
            let delta = fast_trade::advance(subscription, holding.as_ref(), now);
            store.apply_subscription_delta(subscription.id, delta).await?;
        }
        return Ok(AdmissionOutcome::Accepted(holding));
    };

    Ok(AdmissionOutcome::Rejected(reason))
}

/// Returns `None` on acceptance, `Some(reason)` on rejection.
fn check_buy(
    subscription: &Subscription,
    event: &LeaderTxEvent,
    holding: Option<&Holding>,
) -> Option<RejectReason> {
    if !subscription.active {
        return Some(RejectReason::Inactive);
    }
    if !subscription.auto_buy {
        return Some(RejectReason::AutoBuyDisabled);
    }

    let net_spent = subscription.sol_sold - subscription.sol_earned;
    if subscription.current_position >= subscription.max_position
        || net_spent >= subscription.max_position
        || (event.from_amount as i64) < subscription.filter_min_buy
    {
        return Some(if (event.from_amount as i64) < subscription.filter_min_buy {
            RejectReason::BelowMinBuy
        } else {
            RejectReason::PositionCap
        });
    }

    if let Some(holding) = holding {
        if holding.buy_times >= holding.max_buy_times {
            return Some(RejectReason::BuyCountCap);
        }
    }

    None
}

fn check_sell(
    subscription: &Subscription,
    event: &LeaderTxEvent,
    holding: Option<&Holding>,
) -> Option<RejectReason> {
    if !subscription.active {
        return Some(RejectReason::Inactive);
    }
    if !subscription.auto_sell {
        return Some(RejectReason::AutoSellDisabled);
    }
    if event.sell_fraction() < subscription.min_sell_ratio {
        return Some(RejectReason::BelowMinSellRatio);
    }
    match holding {
        Some(h) if h.my_amount > 0 => None,
        _ => Some(RejectReason::NoHolding),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TxType;

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

    fn sample_holding() -> Holding {
        Holding {
            id: 7,
            leader_wallet: "Leader11111111111111111111111111111111111".into(),
            mint: "Mint1111111111111111111111111111111111111111".into(),
            symbol: "TOK".into(),
            decimals: 6,
            subscription_pk: 1,
            my_amount: 1_000_000_000,
            target_amount: 10_000_000,
            current_position: 100_000_000,
            max_position: 2_000_000_000,
            buy_times: 1,
            max_buy_times: 3,
            sol_sold: 100_000_000,
            sol_earned: 0,
            latest_trade_ts: 0,
        }
    }

    fn sample_event(direction: SwapDirection) -> LeaderTxEvent {
        LeaderTxEvent {
            leader_wallet: "Leader11111111111111111111111111111111111".into(),
            mint: "Mint1111111111111111111111111111111111111111".into(),
            direction,
            program_id: None,
            from_amount: 1_000_000_000,
            from_decimals: 9,
            to_amount: 10_000_000,
            to_decimals: 6,
            pre_token_amount: 1_000_000_000,
            post_token_amount: 1_000_000_000,
            tx_type: TxType::Add,
            timestamp: 0,
            signature: "sig1".into(),
        }
    }

    /// S2 — a copy-buy hitting the per-holding buy-count cap is rejected.
    #[test]
    fn buy_rejected_at_buy_count_cap() {
        let sub = sample_subscription();
        let mut holding = sample_holding();
        holding.buy_times = holding.max_buy_times;
        let event = sample_event(SwapDirection::Buy);

        let reason = check_buy(&sub, &event, Some(&holding));
        assert_eq!(reason, Some(RejectReason::BuyCountCap));
    }

    /// S5 — tail rule: a near-total leader sell clamps `sell_fraction` to
    /// 1.0, and a full-exit sell is admitted as long as a holding remains.
    #[test]
    fn sell_admitted_on_tail_rule_full_exit() {
        let sub = sample_subscription();
        let holding = sample_holding();
        let mut event = sample_event(SwapDirection::Sell);
        event.tx_type = TxType::Close;

        assert_eq!(event.sell_fraction(), 1.0);
        let reason = check_sell(&sub, &event, Some(&holding));
        assert_eq!(reason, None);
    }

    /// Regression: `check_buy` must not independently gate on
    /// `fast_trade_count` — that time-aware decision belongs solely to
    /// `fast_trade::is_sleeping`, checked once at the top of `check()`.
    /// A duplicate count-only gate here would reject every future buy
    /// once the threshold is hit, since the counter only resets inside
    /// `advance()`, which an always-rejecting `check_buy` would prevent
    /// from ever running again (permanent lockout, §8 Testable Property 7).
    #[test]
    fn buy_does_not_independently_gate_on_fast_trade_count() {
        let mut sub = sample_subscription();
        sub.fast_trade_count = sub.fast_trade_sleep_threshold;
        let event = sample_event(SwapDirection::Buy);

        let reason = check_buy(&sub, &event, None);
        assert_eq!(reason, None);
    }
}
