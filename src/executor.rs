//! Executor (EX) §4.5 — selects a route builder, builds, signs, and
//! submits. Reuses the reference crate's bs58-keypair-decode shape
//! (`trading::signer::TransactionSigner`) but sources the key material
//! from the State Store's `get_signing_key` per subscription's follower
//! wallet instead of one process-wide `private_key` config field, and
//! submits through the `ChainClient` seam rather than a bare RPC call.

use crate::chain::ChainClient;
use crate::domain::FollowerSwap;
use crate::error::{AppError, Result};
use crate::routes::{MinOutFloor, RouteRegistry, RuntimeFlags};
use crate::store::Store;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use solana_sdk::signature::Keypair;
use tracing::warn;

/// Outcome of a build+submit attempt. A `BuildFailed` never reaches the
/// chain, so there is no signature to hand to Settlement (§4.5: "A build
/// exception yields a `BuildFailed` outcome (no signature)").
pub enum ExecutionOutcome {
    Submitted { signature: String },
    BuildFailed(String),
}

pub async fn execute(
    store: &Store,
    chain: &dyn ChainClient,
    routes: &RouteRegistry,
    swap: &FollowerSwap,
    min_out_floor: Option<MinOutFloor>,
    flags: RuntimeFlags,
    dev_fallback_key_b58: &str,
) -> Result<ExecutionOutcome> {
    let signer = match load_signer(store, &swap.follower_wallet, dev_fallback_key_b58).await {
        Ok(signer) => signer,
        Err(e) => return Ok(ExecutionOutcome::BuildFailed(e.to_string())),
    };

    let tx = match routes.build(&signer, swap, min_out_floor, flags).await {
        Ok(tx) => tx,
        Err(AppError::BuildFailed(msg)) => return Ok(ExecutionOutcome::BuildFailed(msg)),
        Err(e) => return Ok(ExecutionOutcome::BuildFailed(e.to_string())),
    };

    let bytes = bincode::serialize(&tx)
        .map_err(|e| AppError::BuildFailed(format!("failed to serialize signed tx: {e}")))?;
    let base64_tx = STANDARD.encode(bytes);

    match super::routes::retry_with_backoff(5, || chain.submit_raw_transaction(&base64_tx)).await {
        Ok(signature) => Ok(ExecutionOutcome::Submitted { signature }),
        Err(e) => {
            warn!(error = %e, follower = %swap.follower_wallet, "submit failed after retries");
            Err(AppError::SubmitFailed(e.to_string()))
        }
    }
}

async fn load_signer(
    store: &Store,
    follower_wallet: &str,
    dev_fallback_key_b58: &str,
) -> Result<Keypair> {
    let stored = store.get_signing_key(follower_wallet).await?;
    let private_key_b58 = match stored {
        Some(key) => key,
        None if !dev_fallback_key_b58.is_empty() => {
            warn!(follower = %follower_wallet, "no signing key on file, using dev fallback key");
            dev_fallback_key_b58.to_string()
        }
        None => {
            return Err(AppError::Init(format!(
                "no signing key on file for {follower_wallet}"
            )))
        }
    };

    let key_bytes = bs58::decode(&private_key_b58)
        .into_vec()
        .map_err(|e| AppError::Init(format!("invalid private key encoding: {e}")))?;
    Keypair::from_bytes(&key_bytes).map_err(|e| AppError::Init(format!("invalid keypair bytes: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_fallback_key_must_decode_as_a_keypair() {
        let kp = Keypair::new();
        let encoded = bs58::encode(kp.to_bytes()).into_string();
        let decoded = bs58::decode(&encoded).into_vec().unwrap();
        assert!(Keypair::from_bytes(&decoded).is_ok());
    }
}
