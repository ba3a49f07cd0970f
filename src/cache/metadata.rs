use crate::error::{AppError, Result};
use crate::store::models::TokenInfo;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Abstracts the external metadata collaborator (the source used Helius,
/// with a commented-out Shyft fallback) so the cache doesn't hardcode one
/// vendor's response shape.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn fetch(&self, mint: &str) -> Result<TokenInfo>;
}

#[derive(Debug, Deserialize)]
struct HeliusAssetResponse {
    result: HeliusAsset,
}

#[derive(Debug, Deserialize)]
struct HeliusAsset {
    id: String,
    content: HeliusContent,
    token_info: HeliusTokenInfo,
}

#[derive(Debug, Deserialize)]
struct HeliusContent {
    metadata: HeliusMetadata,
}

#[derive(Debug, Deserialize)]
struct HeliusMetadata {
    name: String,
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct HeliusTokenInfo {
    decimals: i16,
    #[serde(default)]
    token_program: Option<String>,
}

pub struct HeliusMetadataProvider {
    client: Client,
    base_url: String,
}

impl HeliusMetadataProvider {
    pub fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(5000))
            .build()
            .map_err(AppError::Http)?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl MetadataProvider for HeliusMetadataProvider {
    async fn fetch(&self, mint: &str) -> Result<TokenInfo> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": "copytrade-engine",
            "method": "getAsset",
            "params": { "id": mint },
        });

        let response = self
            .client
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .map_err(AppError::Http)?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Trading(format!("metadata provider error: {text}")));
        }

        let parsed: HeliusAssetResponse = response.json().await.map_err(AppError::Http)?;

        Ok(TokenInfo {
            mint: parsed.result.id,
            name: parsed.result.content.metadata.name,
            symbol: parsed.result.content.metadata.symbol,
            decimals: parsed.result.token_info.decimals,
            token_program: parsed
                .result
                .token_info
                .token_program
                .unwrap_or_else(|| spl_token::id().to_string()),
            fetched_at: crate::utils::time::now_ts() as i64,
        })
    }
}
