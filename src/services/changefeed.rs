use redis::{aio::MultiplexedConnection, AsyncCommands};
use serde_json::{json, Value};
use tracing::debug;

use crate::models::record::EntryKind;

/// Publishes "a row was inserted" on the per-table Redis channel.
///
/// Subscribers get no payload diff; they reload through the today selector.
#[derive(Clone)]
pub struct Changefeed {
    redis: MultiplexedConnection,
}

impl Changefeed {
    pub fn new(redis: MultiplexedConnection) -> Self {
        Self { redis }
    }

    pub async fn publish_insert(&self, kind: EntryKind) -> anyhow::Result<()> {
        let mut conn = self.redis.clone();
        let receivers: i64 = conn.publish(kind.channel(), kind.table()).await?;
        debug!("Published insert on {} to {} subscriber(s)", kind.channel(), receivers);
        Ok(())
    }
}

/// Every channel a board client listens on.
pub fn channels() -> Vec<String> {
    EntryKind::ALL.into_iter().map(EntryKind::channel).collect()
}

/// WebSocket message for an insert notification received on `channel`.
pub fn notification(channel: &str) -> Option<Value> {
    let table = channel.strip_prefix("board:")?;
    let kind = EntryKind::from_table(table)?;
    Some(json!({ "type": "inserted", "table": kind.table() }))
}
