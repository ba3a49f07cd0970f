use crate::error::Result;
use async_trait::async_trait;

/// Two slippage inputs the Order Shaper needs from outside the pipeline
/// core (§4.3): the follower's per-user "sandwich slippage" (owned by the
/// chat-UI collaborator, §1 Non-goals) and an adaptive per-mint slippage
/// (owned by the metadata/analytics collaborator, §6). Both are out of
/// scope to implement fully here; this trait is the seam, with a
/// reference implementation that returns the documented defaults so the
/// shaper's arithmetic is exercised without a live collaborator wired up.
#[async_trait]
pub trait SlippageOracle: Send + Sync {
    async fn sandwich_slippage_bps(&self, follower_wallet: &str) -> Result<u16>;
    async fn adaptive_slippage_bps(&self, mint: &str) -> Result<u16>;
}

pub struct DefaultSlippageOracle;

#[async_trait]
impl SlippageOracle for DefaultSlippageOracle {
    async fn sandwich_slippage_bps(&self, _follower_wallet: &str) -> Result<u16> {
        Ok(9_900)
    }

    /// Clamped to `[250, 3000]` bps per §4.3; without a live signal this
    /// returns the midpoint.
    async fn adaptive_slippage_bps(&self, _mint: &str) -> Result<u16> {
        Ok(1_000)
    }
}
