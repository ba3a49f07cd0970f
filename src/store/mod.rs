//! State Store (SS) — the durable relational store for subscriptions,
//! holdings, swap records and token metadata, §2/§3/§6.
//!
//! All writes the pipeline makes go through here and are committed before
//! the downstream work item is emitted, per §5's "shared resources" rule.

pub mod holdings;
pub mod models;
pub mod subscriptions;
pub mod swap_records;
pub mod token_info;
pub mod user_keys;

use crate::error::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

#[derive(Clone)]
pub struct Store {
    pub(crate) pool: PgPool,
}

impl Store {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run embedded migrations. Safe to call on every startup.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
