//! Notifier Dispatch (ND) §4.11 — publishes the terminal outcome of a
//! settled copy order for downstream consumers (bot UI, alerting) to pick
//! up. Fire-and-forget: a publish failure is logged and swallowed so a
//! flaky bus never rolls back settlement or ledger correctness, mirroring
//! the reference crate's `NotifyCopyTradeProducer` being best-effort by
//! design (it runs after the trade is already final).

use crate::bus::{Producer, Topic};
use crate::domain::FollowerSwap;
use crate::store::models::SwapRecord;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Serialize)]
pub struct CopySettled {
    pub follower_swap: FollowerSwap,
    pub swap_record: SwapRecord,
}

pub async fn notify(producer: &Producer, follower_swap: &FollowerSwap, swap_record: &SwapRecord) {
    let payload = CopySettled {
        follower_swap: follower_swap.clone(),
        swap_record: swap_record.clone(),
    };
    if let Err(e) = producer.publish(Topic::CopySettled, &payload).await {
        warn!(error = %e, signature = ?swap_record.signature, "failed to publish copy_settled notification");
    }
}
