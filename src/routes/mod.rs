//! Route Registry + Transaction Builders (RB) §4.4 — turns a
//! `FollowerSwap` into a signed transaction via one of three pluggable
//! builders.

pub mod aggregator;
pub mod bonding_curve;
pub mod constant_product;

use crate::domain::FollowerSwap;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::VersionedTransaction;
use std::time::Duration;
use tracing::warn;

/// Shared by the aggregator and (eventually) any other route that gets
/// back an unsigned base64 `VersionedTransaction`: decode, sign as fee
/// payer, return the in-memory struct so the executor can serialize once
/// right before submission.
pub fn sign_base64_transaction(signer: &Keypair, base64_tx: &str) -> Result<VersionedTransaction> {
    let bytes = STANDARD
        .decode(base64_tx)
        .map_err(|e| AppError::BuildFailed(format!("invalid base64 transaction: {e}")))?;
    let mut tx: VersionedTransaction = bincode::deserialize(&bytes)
        .map_err(|e| AppError::BuildFailed(format!("failed to deserialize transaction: {e}")))?;

    let signature = signer.sign_message(&tx.message.serialize());
    if tx.signatures.is_empty() {
        tx.signatures.push(signature);
    } else {
        tx.signatures[0] = signature;
    }
    Ok(tx)
}

/// Priority-fee/relay knobs a builder needs but that aren't part of the
/// order itself (§4.4: "mutually exclusive" bundle-tip vs normal
/// priority-fee submission).
#[derive(Debug, Clone, Copy)]
pub struct RuntimeFlags {
    pub use_bundle_relay: bool,
    pub priority_fee_lamports: u64,
}

/// Pre-trade guard carried alongside the order: the minimum acceptable
/// output, derived from the leader's effective price (§4.3's target-price
/// guard). `None` when the order has no such floor (sells, or non-copy
/// orders).
#[derive(Debug, Clone, Copy)]
pub struct MinOutFloor(pub u64);

#[async_trait]
pub trait RouteBuilder: Send + Sync {
    /// Whether this builder accepts the order's route hint / mint shape.
    fn accepts(&self, swap: &FollowerSwap) -> bool;

    async fn build(
        &self,
        signer: &Keypair,
        swap: &FollowerSwap,
        min_out_floor: Option<MinOutFloor>,
        flags: RuntimeFlags,
    ) -> Result<VersionedTransaction>;
}

/// Ordered list of builders; the first that `accepts()` the order wins.
/// Selection policy is a plain function over this registry rather than a
/// hardcoded chain, per §9 Open Question 3 ("selection is configurable").
pub struct RouteRegistry {
    builders: Vec<Box<dyn RouteBuilder>>,
}

impl RouteRegistry {
    pub fn new(builders: Vec<Box<dyn RouteBuilder>>) -> Self {
        Self { builders }
    }

    pub fn select(&self, swap: &FollowerSwap) -> Option<&dyn RouteBuilder> {
        self.builders
            .iter()
            .find(|b| b.accepts(swap))
            .map(|b| b.as_ref())
    }

    pub async fn build(
        &self,
        signer: &Keypair,
        swap: &FollowerSwap,
        min_out_floor: Option<MinOutFloor>,
        flags: RuntimeFlags,
    ) -> Result<VersionedTransaction> {
        let builder = self
            .select(swap)
            .ok_or_else(|| AppError::RouteUnavailable(swap.program_id_hint.clone()))?;
        builder.build(signer, swap, min_out_floor, flags).await
    }
}

/// Shared retry policy for all three builders' external fetches
/// (bonding-curve account, pool state, aggregator quote): bounded at
/// `max_attempts`, exponential backoff with jitter, per §4.4/§9 ("hidden
/// retries inside HTTP wrappers" redesign — retry lives at the stage
/// boundary instead).
pub async fn retry_with_backoff<T, F, Fut>(max_attempts: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 < max_attempts => {
                let base_ms = 100u64 * 2u64.pow(attempt);
                let jitter_ms = rand::random::<u64>() % 50;
                warn!(attempt, error = %e, "route builder fetch failed, retrying");
                tokio::time::sleep(Duration::from_millis(base_ms + jitter_ms)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Minimum-out computation shared by the slippage-bound builders:
/// `amount * (1 - slippage_bps / 10_000)`.
pub fn min_amount_with_slippage(amount: u64, slippage_bps: u16) -> u64 {
    let factor = 1.0 - (slippage_bps as f64 / 10_000.0);
    (amount as f64 * factor).max(0.0) as u64
}

/// Maximum-in computation for buy-side thresholds:
/// `amount * (1 + slippage_bps / 10_000)`.
pub fn max_amount_with_slippage(amount: u64, slippage_bps: u16) -> u64 {
    let factor = 1.0 + (slippage_bps as f64 / 10_000.0);
    (amount as f64 * factor) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_amount_with_slippage_applies_discount() {
        assert_eq!(min_amount_with_slippage(1_000_000, 100), 990_000);
    }

    #[test]
    fn max_amount_with_slippage_applies_premium() {
        assert_eq!(max_amount_with_slippage(1_000_000, 100), 1_010_000);
    }
}
