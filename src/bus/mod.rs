//! Event Bus (EB) — persistent, ordered, at-least-once delivery between
//! pipeline stages, §2/§5.
//!
//! The source wired stages together with a bespoke Redis pub/sub
//! producer/consumer pair per event type (`SwapEventProducer`,
//! `TxEventConsumer`, ...). Redis Streams generalizes that into one
//! consumer-group primitive reused across all four topics here, giving
//! every stage its own delivery cursor and replay-on-crash for free.

pub mod consumer;
pub mod producer;
pub mod topics;

pub use consumer::{Consumer, Delivery};
pub use producer::Producer;
pub use topics::Topic;

use crate::error::Result;
use redis::aio::ConnectionManager;

#[derive(Clone)]
pub struct Bus {
    conn: ConnectionManager,
}

impl Bus {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    pub fn producer(&self) -> Producer {
        Producer::new(self.conn.clone())
    }

    pub async fn consumer(&self, topic: Topic, stage: &str, consumer_name: &str) -> Result<Consumer> {
        Consumer::new(self.conn.clone(), topic, stage, consumer_name).await
    }
}
