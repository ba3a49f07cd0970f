//! Token Info Cache (TIC) — read-through cache over token metadata, §6.
//!
//! The teacher's `processor::cache::DedupCache` is a bare
//! `DashMap<String, Instant>` existence set. This generalizes the same
//! shape (`DashMap` + per-entry `Instant` for TTL) to hold the value
//! itself rather than just a presence marker, matching the 24h TTL the
//! source's `TokenInfoCache.get` carries (`@cached(ttl=60*60*24)`).

pub mod metadata;

use crate::error::Result;
use crate::store::models::TokenInfo;
use crate::store::Store;
use dashmap::DashMap;
use metadata::MetadataProvider;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Clone)]
pub struct TokenInfoCache {
    memory: Arc<DashMap<String, (TokenInfo, Instant)>>,
    ttl: Duration,
    store: Store,
    provider: Arc<dyn MetadataProvider>,
}

impl TokenInfoCache {
    pub fn new(store: Store, provider: Arc<dyn MetadataProvider>, ttl: Duration) -> Self {
        Self {
            memory: Arc::new(DashMap::new()),
            ttl,
            store,
            provider,
        }
    }

    /// In-memory hit -> DB hit -> fetch-and-write-back, in that order. A
    /// fetch failure returns `Ok(None)` rather than propagating, mirroring
    /// the source's `except Exception: return None` — a missing mint
    /// metadata lookup shouldn't abort the whole pipeline stage.
    pub async fn get(&self, mint: &str) -> Result<Option<TokenInfo>> {
        if let Some(entry) = self.memory.get(mint) {
            let (info, inserted_at) = entry.value();
            if inserted_at.elapsed() < self.ttl {
                return Ok(Some(info.clone()));
            }
        }

        if let Some(info) = self.store.get_token_info(mint).await? {
            self.memory.insert(mint.to_string(), (info.clone(), Instant::now()));
            return Ok(Some(info));
        }

        debug!(%mint, "token info not cached, fetching from metadata provider");
        let fetched = match self.provider.fetch(mint).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(%mint, error = %e, "failed to fetch token info");
                return Ok(None);
            }
        };

        self.store.upsert_token_info(&fetched).await?;
        self.memory.insert(mint.to_string(), (fetched.clone(), Instant::now()));
        info!(%mint, symbol = %fetched.symbol, "stored token info");
        Ok(Some(fetched))
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }
}
