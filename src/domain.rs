//! Closed, strictly-validated schemas for the events and intents that move
//! through the pipeline. Replacing the duck-typed payloads the source
//! relied on (§9 redesign notes) with explicit enums/structs here means a
//! malformed `leader_tx` message fails to deserialize instead of silently
//! taking a wrong branch three stages downstream.

use serde::{Deserialize, Serialize};

/// Wrapped SOL mint — a buy always spends this as input, a sell always
/// receives it as output (§4.1).
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum SwapDirection {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    Open,
    Add,
    Reduce,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapInType {
    Qty,
    Pct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapBy {
    User,
    Copytrade,
}

/// A classified leader swap, as fanned out by the ingress stage. Carries
/// everything downstream stages need without re-deriving it from raw chain
/// data — that derivation already happened in the (external) block watcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderTxEvent {
    pub leader_wallet: String,
    pub mint: String,
    pub direction: SwapDirection,
    pub program_id: Option<String>,
    pub from_amount: u64,
    pub from_decimals: u8,
    pub to_amount: u64,
    pub to_decimals: u8,
    pub pre_token_amount: u64,
    pub post_token_amount: u64,
    pub tx_type: TxType,
    pub timestamp: i64,
    pub signature: String,
}

impl LeaderTxEvent {
    /// Leader's effective execution price, `to_amount_ui / from_amount_ui`,
    /// used by the order shaper's target-price guard (§4.3).
    pub fn effective_price(&self) -> f64 {
        let from_ui = self.from_amount as f64 / 10f64.powi(self.from_decimals as i32);
        let to_ui = self.to_amount as f64 / 10f64.powi(self.to_decimals as i32);
        if from_ui == 0.0 {
            0.0
        } else {
            to_ui / from_ui
        }
    }

    /// `sell_fraction` per §4.1: 1.0 on `Close`, else `(pre-post)/pre`
    /// rounded to 4 decimals and clamped to 1.0 above 0.95 (the tail rule).
    /// A zero `pre_token_amount` is treated as a full exit rather than a
    /// division-by-zero panic — there was nothing to compute a fraction
    /// against, which is the same situation the tail rule already handles.
    pub fn sell_fraction(&self) -> f64 {
        if self.tx_type == TxType::Close || self.pre_token_amount == 0 {
            return 1.0;
        }
        let raw = (self.pre_token_amount as f64 - self.post_token_amount as f64)
            / self.pre_token_amount as f64;
        let rounded = (raw * 10_000.0).round() / 10_000.0;
        if rounded > 0.95 {
            1.0
        } else {
            rounded
        }
    }
}

/// Order intent produced by the Order Shaper, consumed by the Route
/// Registry / Executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowerSwap {
    pub follower_wallet: String,
    pub subscription_pk: i64,
    pub direction: SwapDirection,
    pub input_mint: String,
    pub output_mint: String,
    /// Raw units of the input side. For `Pct` sells this is already
    /// resolved against the holding snapshot the shaper saw
    /// (`holding.my_amount * amount_pct`) — `amount_pct` is kept alongside
    /// for display/audit, not for builders to re-derive the quantity from.
    pub amount: u64,
    pub ui_amount: f64,
    pub slippage_bps: u16,
    pub priority_fee: u64,
    pub program_id_hint: Option<String>,
    pub swap_in_type: SwapInType,
    pub amount_pct: Option<f64>,
    pub by: SwapBy,
    /// The leader event that caused this order, when `by == Copytrade`.
    pub source_leader_event: Option<LeaderTxEvent>,
}

impl FollowerSwap {
    pub fn target_price(&self) -> Option<f64> {
        if self.by == SwapBy::Copytrade && self.direction == SwapDirection::Buy {
            self.source_leader_event.as_ref().map(|e| e.effective_price())
        } else {
            None
        }
    }
}
