use crate::domain::SwapDirection;
use serde::{Deserialize, Serialize};

/// One (leader, follower) relationship with all policy knobs, §3.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: i64,

    // identity
    pub follower_wallet: String,
    pub follower_chat: i64,
    pub leader_wallet: String,
    pub leader_alias: Option<String>,

    // admission
    pub active: bool,
    pub filter_min_buy: i64,
    pub max_buy_times: i32,
    pub max_position: i64,

    // sizing
    pub auto_buy: bool,
    pub auto_sell: bool,
    pub auto_buy_ratio: f64,
    pub min_buy_sol: i64,
    pub max_buy_sol: i64,
    pub min_sell_ratio: f64,

    // anti-fast-trade throttle
    pub anti_fast_trade: bool,
    pub fast_trade_threshold: i64,
    pub fast_trade_duration: i64,
    pub fast_trade_sleep_threshold: i32,
    pub fast_trade_sleep_time: i64,
    pub fast_trade_window_start: i64,
    pub fast_trade_count: i32,

    // execution
    pub priority_fee: i64,
    pub anti_sandwich: bool,
    pub auto_slippage: bool,
    pub custom_slippage: f64,

    // running totals
    pub current_position: i64,
    pub sol_sold: i64,
    pub sol_earned: i64,
    pub token_number: i32,
    pub failed_times: i32,
    pub filtered_times: i32,
}

impl Subscription {
    /// Invariants from §3. Checked on load/construction in tests and by
    /// the repository layer before any write that could violate them.
    pub fn invariants_hold(&self) -> bool {
        self.min_buy_sol <= self.max_buy_sol
            && self.auto_buy_ratio > 0.0
            && self.auto_buy_ratio <= 100.0
            && self.custom_slippage > 0.0
            && self.custom_slippage <= 1.0
            && self.current_position >= 0
            && (!self.active || !self.leader_wallet.is_empty())
    }
}

/// The follower's open position on one mint, attributed to one leader, §3.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Holding {
    pub id: i64,
    pub leader_wallet: String,
    pub mint: String,
    pub symbol: String,
    pub decimals: i16,
    pub subscription_pk: i64,
    pub my_amount: i64,
    pub target_amount: i64,
    pub current_position: i64,
    pub max_position: i64,
    pub buy_times: i32,
    pub max_buy_times: i32,
    pub sol_sold: i64,
    pub sol_earned: i64,
    pub latest_trade_ts: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Failed,
    Expired,
    BuildFailed,
}

/// Result of settlement, §3. Written exactly once per `signature`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SwapRecord {
    pub id: i64,
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

/// Token metadata backing the Token Info Cache, §6.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TokenInfo {
    pub mint: String,
    pub name: String,
    pub symbol: String,
    pub decimals: i16,
    pub token_program: String,
    pub fetched_at: i64,
}

/// A delta applied atomically to a subscription's running counters, §4.7.
/// All fields default to zero/no-op; only set the ones a given mutation
/// actually changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionDelta {
    pub current_position: i64,
    pub sol_sold: i64,
    pub sol_earned: i64,
    pub token_number: i32,
    pub failed_times: i32,
    pub filtered_times: i32,
    pub fast_trade_count_reset_to: Option<i32>,
    pub fast_trade_window_start_reset_to: Option<i64>,
}
