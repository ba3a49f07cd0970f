use super::models::{SwapRecord, TransactionStatus};
use super::Store;
use crate::domain::SwapDirection;
use crate::error::Result;

/// Fields needed to record a settlement outcome, §4.6/§4.7. Kept separate
/// from `SwapRecord` so callers don't have to fabricate an `id`.
#[derive(Debug, Clone)]
pub struct NewSwapRecord {
    pub signature: Option<String>,
    pub status: TransactionStatus,
    pub follower_wallet: String,
    pub direction: SwapDirection,
    pub input_mint: String,
    pub output_mint: String,
    pub input_amount: i64,
    pub input_token_decimals: i16,
    pub output_amount: i64,
    pub output_token_decimals: i16,
    pub fee: i64,
    pub slot: i64,
    pub timestamp: i64,
    pub sol_change: i64,
    pub swap_sol_change: i64,
    pub other_sol_change: i64,
    pub program_id: Option<String>,
}

impl Store {
    /// `ON CONFLICT (signature) DO NOTHING` — the idempotence guard from
    /// §5/§8 Testable Property 5. A re-delivered settlement for a signature
    /// already recorded is silently absorbed; the caller can tell it was a
    /// duplicate because the returned row's `id` won't match a fresh insert
    /// when none happened, so we report whether a row was actually written.
    pub async fn insert_swap_record(&self, record: NewSwapRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO swap_records (
                signature, status, follower_wallet, direction, input_mint, output_mint,
                input_amount, input_token_decimals, output_amount, output_token_decimals,
                fee, slot, timestamp, sol_change, swap_sol_change, other_sol_change, program_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (signature) DO NOTHING
            "#,
        )
        .bind(&record.signature)
        .bind(record.status)
        .bind(&record.follower_wallet)
        .bind(record.direction)
        .bind(&record.input_mint)
        .bind(&record.output_mint)
        .bind(record.input_amount)
        .bind(record.input_token_decimals)
        .bind(record.output_amount)
        .bind(record.output_token_decimals)
        .bind(record.fee)
        .bind(record.slot)
        .bind(record.timestamp)
        .bind(record.sol_change)
        .bind(record.swap_sol_change)
        .bind(record.other_sol_change)
        .bind(&record.program_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn get_swap_record(&self, signature: &str) -> Result<Option<SwapRecord>> {
        let row = sqlx::query_as::<_, SwapRecord>("SELECT * FROM swap_records WHERE signature = $1")
            .bind(signature)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn recent_swaps_for_follower(
        &self,
        follower_wallet: &str,
        limit: i64,
    ) -> Result<Vec<SwapRecord>> {
        let rows = sqlx::query_as::<_, SwapRecord>(
            "SELECT * FROM swap_records WHERE follower_wallet = $1 ORDER BY id DESC LIMIT $2",
        )
        .bind(follower_wallet)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
