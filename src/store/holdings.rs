use super::models::Holding;
use super::Store;
use crate::error::Result;

impl Store {
    /// A single subscription's position on one mint. Keyed by
    /// `subscription_pk`, not `leader_wallet` — several subscriptions can
    /// follow the same leader and each tracks its own holding row (the
    /// thing `reduce_proportionally` iterates over via
    /// `get_holdings_for_mint`).
    pub async fn get_holding(&self, subscription_pk: i64, mint: &str) -> Result<Option<Holding>> {
        let row = sqlx::query_as::<_, Holding>(
            "SELECT * FROM holdings WHERE subscription_pk = $1 AND mint = $2",
        )
        .bind(subscription_pk)
        .bind(mint)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_holdings_for_leader(&self, leader_wallet: &str) -> Result<Vec<Holding>> {
        let rows = sqlx::query_as::<_, Holding>(
            "SELECT * FROM holdings WHERE leader_wallet = $1 AND target_amount > 0",
        )
        .bind(leader_wallet)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// All holdings across leaders for a given mint — used by the
    /// proportional user-sell reduction path (§9 Open Question 5).
    pub async fn get_holdings_for_mint(&self, mint: &str) -> Result<Vec<Holding>> {
        let rows = sqlx::query_as::<_, Holding>("SELECT * FROM holdings WHERE mint = $1")
            .bind(mint)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// First successful copy-buy for a (leader, mint): creates the holding
    /// row. Must be called inside the same transaction as the matching
    /// subscription counter update (§4.7/§9).
    pub async fn insert_holding(&self, holding: &Holding) -> Result<Holding> {
        let row = sqlx::query_as::<_, Holding>(
            r#"
            INSERT INTO holdings (
                leader_wallet, mint, symbol, decimals, subscription_pk,
                my_amount, target_amount, current_position, max_position,
                buy_times, max_buy_times, sol_sold, sol_earned, latest_trade_ts
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(&holding.leader_wallet)
        .bind(&holding.mint)
        .bind(&holding.symbol)
        .bind(holding.decimals)
        .bind(holding.subscription_pk)
        .bind(holding.my_amount)
        .bind(holding.target_amount)
        .bind(holding.current_position)
        .bind(holding.max_position)
        .bind(holding.buy_times)
        .bind(holding.max_buy_times)
        .bind(holding.sol_sold)
        .bind(holding.sol_earned)
        .bind(holding.latest_trade_ts)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Add-on buy / sell update on an existing holding. `my_amount` and
    /// `current_position` are replaced wholesale rather than deltaed since
    /// the sell path needs to *scale* `current_position`, not add to it
    /// (§4.7) — the caller computes the new absolute values.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_holding(
        &self,
        id: i64,
        my_amount: i64,
        target_amount: i64,
        current_position: i64,
        buy_times: i32,
        sol_sold: i64,
        sol_earned: i64,
        latest_trade_ts: i64,
    ) -> Result<Holding> {
        let row = sqlx::query_as::<_, Holding>(
            r#"
            UPDATE holdings
            SET my_amount = $2,
                target_amount = $3,
                current_position = $4,
                buy_times = $5,
                sol_sold = $6,
                sol_earned = $7,
                latest_trade_ts = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(my_amount)
        .bind(target_amount)
        .bind(current_position)
        .bind(buy_times)
        .bind(sol_sold)
        .bind(sol_earned)
        .bind(latest_trade_ts)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Whether a ledger mutation was already applied for this
    /// `(signature, direction, holding)` — the at-least-once idempotence
    /// guard distinct from `swap_records`' own signature uniqueness
    /// (§4.7/§5/§8 Testable Property 5).
    pub async fn mark_settlement_applied(
        &self,
        signature: &str,
        direction: &str,
        holding_pk: i64,
        applied_at: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO applied_settlements (signature, direction, holding_pk, applied_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (signature, direction, holding_pk) DO NOTHING
            "#,
        )
        .bind(signature)
        .bind(direction)
        .bind(holding_pk)
        .bind(applied_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Reduce every holding on `mint` proportionally to its contribution to
    /// the follower's total balance. Implements the commented-out
    /// multi-leader user-sell path (§9 Open Question 5); not wired into
    /// the copy-trade core pipeline since there is no leader event driving
    /// it, but available for a future user-initiated-sell entry point.
    pub async fn reduce_proportionally(&self, mint: &str, input_amount: i64) -> Result<()> {
        let holdings = self.get_holdings_for_mint(mint).await?;
        let total: i64 = holdings.iter().map(|h| h.my_amount).sum();
        if total == 0 {
            return Ok(());
        }
        for holding in holdings {
            let share = (holding.my_amount as f64 / total as f64) * input_amount as f64;
            let new_my_amount = holding.my_amount - share as i64;
            let scale = 1.0 - (share / holding.my_amount as f64).min(1.0);
            let new_position = (holding.current_position as f64 * scale) as i64;
            self.update_holding(
                holding.id,
                new_my_amount.max(0),
                holding.target_amount,
                new_position.max(0),
                holding.buy_times,
                holding.sol_sold,
                holding.sol_earned,
                holding.latest_trade_ts,
            )
            .await?;
        }
        Ok(())
    }
}
