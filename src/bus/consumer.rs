use super::topics::Topic;
use crate::error::{AppError, Result};
use redis::aio::ConnectionManager;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use serde::de::DeserializeOwned;

/// A single delivered message: the stream entry id (needed to `XACK`) and
/// the decoded payload.
pub struct Delivery<T> {
    pub id: String,
    pub payload: T,
}

/// Consumer-group reader over one stream, mirroring the source's
/// `TxEventConsumer` (subscribe + callback) but pull-based rather than
/// callback-based, which composes better with the pipeline's explicit
/// stage functions.
pub struct Consumer {
    conn: ConnectionManager,
    topic: Topic,
    group: String,
    consumer_name: String,
}

impl Consumer {
    /// Ensures the consumer group exists (`XGROUP CREATE ... MKSTREAM`,
    /// ignoring BUSYGROUP) and returns a reader positioned at new entries.
    pub async fn new(
        mut conn: ConnectionManager,
        topic: Topic,
        stage: &str,
        consumer_name: &str,
    ) -> Result<Self> {
        let group = topic.group(stage);
        let created: std::result::Result<(), redis::RedisError> = conn
            .xgroup_create_mkstream(topic.stream_key(), &group, "$")
            .await;
        if let Err(e) = created {
            if !e.to_string().contains("BUSYGROUP") {
                return Err(AppError::from(e));
            }
        }
        Ok(Self {
            conn,
            topic,
            group,
            consumer_name: consumer_name.to_string(),
        })
    }

    /// `XREADGROUP` for up to `count` new entries, blocking up to
    /// `block_ms`. At-least-once: a message stays pending (and will be
    /// redelivered to whoever claims it) until `ack` is called (§5).
    pub async fn read<T: DeserializeOwned>(
        &mut self,
        count: usize,
        block_ms: usize,
    ) -> Result<Vec<Delivery<T>>> {
        let opts = StreamReadOptions::default()
            .group(&self.group, &self.consumer_name)
            .count(count)
            .block(block_ms);

        let reply: StreamReadReply = self
            .conn
            .xread_options(&[self.topic.stream_key()], &[">"], &opts)
            .await?;

        let mut out = Vec::new();
        for key in reply.keys {
            for entry in key.ids {
                let Some(redis::Value::Data(raw)) = entry.map.get("payload") else {
                    continue;
                };
                let payload: T = serde_json::from_slice(raw)
                    .map_err(|e| AppError::Parse(e.to_string()))?;
                out.push(Delivery {
                    id: entry.id,
                    payload,
                });
            }
        }
        Ok(out)
    }

    pub async fn ack(&mut self, id: &str) -> Result<()> {
        self.conn
            .xack(self.topic.stream_key(), &self.group, &[id])
            .await?;
        Ok(())
    }
}
