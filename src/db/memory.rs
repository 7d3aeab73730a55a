use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::RecordStore;
use crate::{
    models::record::{EntryKind, Payload, Record},
    services::clock::RecordStamp,
};

/// In-memory record tables with switchable failures.
#[derive(Default)]
pub struct MemoryRecordStore {
    pub records: Mutex<Vec<Record>>,
    pub fail_reads: AtomicBool,
    pub fail_appends: AtomicBool,
}

impl MemoryRecordStore {
    pub async fn seed(&self, record: Record) {
        self.records.lock().await.push(record);
    }

    pub async fn count(&self, kind: EntryKind) -> usize {
        self.records
            .lock()
            .await
            .iter()
            .filter(|r| r.kind() == kind)
            .count()
    }

    fn check(&self, flag: &AtomicBool, what: &str) -> anyhow::Result<()> {
        if flag.load(Ordering::SeqCst) {
            anyhow::bail!("memory store: {what} unavailable");
        }
        Ok(())
    }

    async fn newest_first(&self, filter: impl Fn(&Record) -> bool) -> Vec<Record> {
        let mut out: Vec<Record> = self
            .records
            .lock()
            .await
            .iter()
            .filter(|r| filter(r))
            .cloned()
            .collect();
        out.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        out
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn append(&self, stamp: &RecordStamp, payload: &Payload) -> anyhow::Result<Record> {
        self.check(&self.fail_appends, "insert")?;
        let record = Record {
            id: Uuid::new_v4(),
            date_str: stamp.date_str.clone(),
            formatted_date: stamp.formatted_date.clone(),
            timestamp: stamp.timestamp,
            payload: payload.clone(),
        };
        self.records.lock().await.push(record.clone());
        Ok(record)
    }

    async fn latest(&self, kind: EntryKind) -> anyhow::Result<Option<Record>> {
        Ok(self.list(kind).await?.into_iter().next())
    }

    async fn list(&self, kind: EntryKind) -> anyhow::Result<Vec<Record>> {
        self.check(&self.fail_reads, "read")?;
        Ok(self.newest_first(|r| r.kind() == kind).await)
    }

    async fn dish_photos_on(&self, date_str: &str) -> anyhow::Result<Vec<Record>> {
        self.check(&self.fail_reads, "read")?;
        Ok(self
            .newest_first(|r| r.kind() == EntryKind::DishPhoto && r.date_str == date_str)
            .await)
    }
}
