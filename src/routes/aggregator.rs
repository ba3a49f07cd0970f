//! Aggregator (AGG) route builder §4.4 — quote/swap against an external
//! pathfinder. Generalizes the reference crate's `JupiterClient` from a
//! hardcoded trading-engine dependency into one `RouteBuilder`
//! implementor among three.

use super::{min_amount_with_slippage, retry_with_backoff, sign_base64_transaction};
use super::{MinOutFloor, RouteBuilder, RuntimeFlags};
use crate::domain::{FollowerSwap, SwapDirection};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use solana_sdk::signature::Keypair;
use solana_sdk::transaction::VersionedTransaction;
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRequest<'a> {
    input_mint: &'a str,
    output_mint: &'a str,
    amount: u64,
    slippage_bps: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    input_mint: String,
    in_amount: String,
    output_mint: String,
    out_amount: String,
    other_amount_threshold: String,
    slippage_bps: u64,
    #[serde(flatten)]
    rest: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapRequest<'a> {
    user_public_key: &'a str,
    quote_response: QuoteResponse,
    wrap_and_unwrap_sol: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    prioritization_fee_lamports: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bundle_tip_lamports: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    swap_transaction: String,
}

pub struct AggregatorBuilder {
    client: Client,
    base_url: String,
    max_attempts: u32,
}

impl AggregatorBuilder {
    pub fn new(base_url: String, timeout_ms: u64, max_attempts: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(AppError::Http)?;
        Ok(Self {
            client,
            base_url,
            max_attempts,
        })
    }

    async fn fetch_quote(&self, swap: &FollowerSwap) -> Result<QuoteResponse> {
        let url = format!("{}/quote", self.base_url);
        let request = QuoteRequest {
            input_mint: &swap.input_mint,
            output_mint: &swap.output_mint,
            amount: swap.amount.max(1),
            slippage_bps: swap.slippage_bps,
        };
        let response = self
            .client
            .get(&url)
            .query(&request)
            .send()
            .await
            .map_err(AppError::Http)?;
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::BuildFailed(format!("aggregator quote error: {text}")));
        }
        response.json().await.map_err(AppError::Http)
    }

    async fn fetch_swap_tx(
        &self,
        user_public_key: &str,
        quote: QuoteResponse,
        flags: RuntimeFlags,
    ) -> Result<SwapResponse> {
        let url = format!("{}/swap", self.base_url);
        let request = if flags.use_bundle_relay {
            SwapRequest {
                user_public_key,
                quote_response: quote,
                wrap_and_unwrap_sol: true,
                prioritization_fee_lamports: None,
                bundle_tip_lamports: Some(flags.priority_fee_lamports),
            }
        } else {
            SwapRequest {
                user_public_key,
                quote_response: quote,
                wrap_and_unwrap_sol: true,
                prioritization_fee_lamports: Some(flags.priority_fee_lamports),
                bundle_tip_lamports: None,
            }
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(AppError::Http)?;
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::BuildFailed(format!("aggregator swap error: {text}")));
        }
        response.json().await.map_err(AppError::Http)
    }
}

#[async_trait]
impl RouteBuilder for AggregatorBuilder {
    /// The aggregator is the catch-all: it accepts anything the other two
    /// builders don't claim via `program_id_hint` (§9 Open Question 3 keeps
    /// both BC/CP routes real rather than always falling back here).
    fn accepts(&self, _swap: &FollowerSwap) -> bool {
        true
    }

    async fn build(
        &self,
        signer: &Keypair,
        swap: &FollowerSwap,
        min_out_floor: Option<MinOutFloor>,
        flags: RuntimeFlags,
    ) -> Result<VersionedTransaction> {
        use solana_sdk::signature::Signer as _;

        let mut quote = retry_with_backoff(self.max_attempts, || self.fetch_quote(swap)).await?;

        if let Some(MinOutFloor(floor)) = min_out_floor {
            let out_amount: u64 = quote.out_amount.parse().unwrap_or(0);
            if out_amount < floor {
                return Err(AppError::SlippageFloorViolated {
                    quoted: out_amount,
                    floor,
                });
            }
            quote.other_amount_threshold = floor.to_string();
        } else if swap.direction == SwapDirection::Sell {
            // Sell path forces the hard 9900bps/zero-floor get-me-out policy
            // from §4.3 rather than whatever the aggregator itself quoted.
            let out_amount: u64 = quote.out_amount.parse().unwrap_or(0);
            quote.other_amount_threshold =
                min_amount_with_slippage(out_amount, 9_900).to_string();
        }

        let user_pubkey = signer.pubkey().to_string();
        let swap_response =
            retry_with_backoff(self.max_attempts, || self.fetch_swap_tx(&user_pubkey, quote.clone(), flags))
                .await?;

        sign_base64_transaction(signer, &swap_response.swap_transaction)
    }
}
