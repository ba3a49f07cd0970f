use super::models::{Subscription, SubscriptionDelta};
use super::Store;
use crate::error::Result;

impl Store {
    /// Active subscriptions for a leader wallet.
    ///
    /// This is the predicate the source got wrong (§9 Open Question 2): it
    /// must be the conjunction of both equalities, never a short-circuited
    /// evaluation of one against the other.
    pub async fn get_active_subscriptions_for_leader(
        &self,
        leader_wallet: &str,
    ) -> Result<Vec<Subscription>> {
        let rows = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT * FROM subscriptions
            WHERE leader_wallet = $1 AND active = true
            "#,
        )
        .bind(leader_wallet)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_subscription(&self, pk: i64) -> Result<Option<Subscription>> {
        let row = sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = $1")
            .bind(pk)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Atomic `UPDATE ... SET x = x + $delta ... RETURNING *`, the
    /// compare-and-set redesign from §9 replacing "mutate shared row and
    /// rely on ORM dirty tracking". Callers pass only the fields that
    /// actually change; the rest default to zero/no-op via
    /// `SubscriptionDelta::default()`.
    pub async fn apply_subscription_delta(
        &self,
        pk: i64,
        delta: SubscriptionDelta,
    ) -> Result<Subscription> {
        let row = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions
            SET current_position = current_position + $2,
                sol_sold = sol_sold + $3,
                sol_earned = sol_earned + $4,
                token_number = token_number + $5,
                failed_times = failed_times + $6,
                filtered_times = filtered_times + $7,
                fast_trade_count = COALESCE($8, fast_trade_count),
                fast_trade_window_start = COALESCE($9, fast_trade_window_start)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(pk)
        .bind(delta.current_position)
        .bind(delta.sol_sold)
        .bind(delta.sol_earned)
        .bind(delta.token_number)
        .bind(delta.failed_times)
        .bind(delta.filtered_times)
        .bind(delta.fast_trade_count_reset_to)
        .bind(delta.fast_trade_window_start_reset_to)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn increment_filtered_times(&self, pk: i64) -> Result<()> {
        sqlx::query("UPDATE subscriptions SET filtered_times = filtered_times + 1 WHERE id = $1")
            .bind(pk)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn increment_failed_times(&self, pk: i64) -> Result<()> {
        sqlx::query("UPDATE subscriptions SET failed_times = failed_times + 1 WHERE id = $1")
            .bind(pk)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_invariants_reject_inverted_bounds() {
        let mut sub = sample_subscription();
        sub.min_buy_sol = 500_000_000;
        sub.max_buy_sol = 100_000_000;
        assert!(!sub.invariants_hold());
    }

    #[test]
    fn subscription_invariants_reject_out_of_range_ratio() {
        let mut sub = sample_subscription();
        sub.auto_buy_ratio = 0.0;
        assert!(!sub.invariants_hold());

        let mut sub2 = sample_subscription();
        sub2.auto_buy_ratio = 150.0;
        assert!(!sub2.invariants_hold());
    }

    #[test]
    fn subscription_invariants_hold_for_defaults() {
        assert!(sample_subscription().invariants_hold());
    }

    fn sample_subscription() -> Subscription {
        Subscription {
            id: 1,
            follower_wallet: "Follower1111111111111111111111111111111111".into(),
            follower_chat: 42,
            leader_wallet: "Leader11111111111111111111111111111111111".into(),
            leader_alias: Some("whale".into()),
            active: true,
            filter_min_buy: 100_000_000,
            max_buy_times: 3,
            max_position: 2_000_000_000,
            auto_buy: true,
            auto_sell: true,
            auto_buy_ratio: 10.0,
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
}
