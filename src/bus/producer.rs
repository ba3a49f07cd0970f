use super::topics::Topic;
use crate::error::{AppError, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::Serialize;

/// Publishes JSON-encoded payloads onto a stream via `XADD`, mirroring the
/// source's per-topic `*Producer` classes (`SwapEventProducer`,
/// `NotifyCopyTradeProducer`) but generalized to any serializable payload
/// instead of one hardcoded type per producer.
#[derive(Clone)]
pub struct Producer {
    conn: ConnectionManager,
}

impl Producer {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// `XADD <stream> * payload <json>`. Returns the stream entry id.
    pub async fn publish<T: Serialize>(&self, topic: Topic, payload: &T) -> Result<String> {
        let body = serde_json::to_string(payload).map_err(|e| AppError::Parse(e.to_string()))?;
        let mut conn = self.conn.clone();
        let id: String = conn
            .xadd(topic.stream_key(), "*", &[("payload", body.as_str())])
            .await?;
        Ok(id)
    }
}
