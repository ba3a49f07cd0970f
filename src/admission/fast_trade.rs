//! Anti-fast-trade throttle, §4.2/§9 Open Question 4 — counters live on
//! the `Subscription` row (subscription-wide), observed from per-holding
//! trade timestamps, fixed from the source's ambiguous mixing of the two.

use crate::store::models::{Holding, Subscription, SubscriptionDelta};

/// Rejects admission outright while the sleep penalty is active:
/// `fast_trade_count >= fast_trade_sleep_threshold` and less than
/// `fast_trade_sleep_time` seconds have elapsed since the window opened.
pub fn is_sleeping(subscription: &Subscription, now: i64) -> bool {
    subscription.fast_trade_count >= subscription.fast_trade_sleep_threshold
        && (now - subscription.fast_trade_window_start) < subscription.fast_trade_sleep_time
}

/// Computes the counter delta for one observed copy event (buy or sell),
/// per §4.2's rolling-window rule:
/// - if the event lands within `fast_trade_threshold` seconds of the
///   holding's last trade, bump the count;
/// - once the window (`fast_trade_duration` seconds) has elapsed, reset it
///   to start at `now` with count `1`.
pub fn advance(subscription: &Subscription, holding: Option<&Holding>, now: i64) -> SubscriptionDelta {
    let mut delta = SubscriptionDelta::default();

    let window_elapsed = now - subscription.fast_trade_window_start >= subscription.fast_trade_duration;
    if window_elapsed {
        delta.fast_trade_window_start_reset_to = Some(now);
        delta.fast_trade_count_reset_to = Some(1);
        return delta;
    }

    let is_fast = holding
        .map(|h| now - h.latest_trade_ts < subscription.fast_trade_threshold)
        .unwrap_or(false);

    if is_fast {
        delta.fast_trade_count_reset_to = Some(subscription.fast_trade_count + 1);
    }

    delta
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

    fn sample_holding(latest_trade_ts: i64) -> Holding {
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
            latest_trade_ts,
        }
    }

    fn apply(sub: &mut Subscription, delta: SubscriptionDelta) {
        if let Some(count) = delta.fast_trade_count_reset_to {
            sub.fast_trade_count = count;
        }
        if let Some(start) = delta.fast_trade_window_start_reset_to {
            sub.fast_trade_window_start = start;
        }
    }

    /// S6 — five trades 5s apart on the same mint trip the sleep
    /// threshold; admission is rejected while sleeping, and resumes (with
    /// the window reset) once `fast_trade_sleep_time` has elapsed — it
    /// must not stay locked out forever.
    #[test]
    fn sleep_threshold_trips_then_resumes_after_sleep_time() {
        let mut sub = sample_subscription();
        let mut last_trade_ts = 0;

        for t in [5, 10, 15, 20, 25] {
            assert!(!is_sleeping(&sub, t), "must not be sleeping before the threshold trips");
            let holding = sample_holding(last_trade_ts);
            let delta = advance(&sub, Some(&holding), t);
            apply(&mut sub, delta);
            last_trade_ts = t;
        }

        assert_eq!(sub.fast_trade_count, 5);
        assert!(is_sleeping(&sub, 25), "sixth event at t=25 must be rejected while sleeping");
        assert!(is_sleeping(&sub, 3_624), "sleep penalty must still hold just before it elapses");

        assert!(
            !is_sleeping(&sub, 3_625),
            "admission must resume at or after t = window_start + fast_trade_sleep_time"
        );

        let holding = sample_holding(last_trade_ts);
        let delta = advance(&sub, Some(&holding), 3_625);
        apply(&mut sub, delta);
        assert_eq!(sub.fast_trade_count, 1, "the rolling window must reset, not stay pinned at the cap");
        assert_eq!(sub.fast_trade_window_start, 3_625);
    }
}
