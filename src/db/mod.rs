pub mod records;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::models::record::{EntryKind, Payload, Record};
use crate::services::clock::RecordStamp;

pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the migrations embedded from ./migrations/
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Append-only record tables, one per [`EntryKind`].
///
/// No update or delete exists: a correction is a new row.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn append(&self, stamp: &RecordStamp, payload: &Payload) -> anyhow::Result<Record>;

    /// The newest row of a table (highest timestamp, then highest id).
    async fn latest(&self, kind: EntryKind) -> anyhow::Result<Option<Record>>;

    /// All rows of a table, newest first.
    async fn list(&self, kind: EntryKind) -> anyhow::Result<Vec<Record>>;

    /// Dish photos posted on one business day, newest first.
    async fn dish_photos_on(&self, date_str: &str) -> anyhow::Result<Vec<Record>>;
}
