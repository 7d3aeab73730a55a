use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use super::RecordStore;
use crate::{
    models::record::{EntryKind, Payload, Record, StatusFlags},
    services::clock::RecordStamp,
};

#[derive(Debug, FromRow)]
struct MenuRow {
    id: Uuid,
    date_str: String,
    formatted_date: String,
    items: String,
    timestamp: i64,
}

impl From<MenuRow> for Record {
    fn from(row: MenuRow) -> Self {
        Record {
            id: row.id,
            date_str: row.date_str,
            formatted_date: row.formatted_date,
            timestamp: row.timestamp,
            payload: Payload::Menu { items: row.items },
        }
    }
}

#[derive(Debug, FromRow)]
struct AdviceRow {
    id: Uuid,
    date_str: String,
    formatted_date: String,
    advice: String,
    photo_url: Option<String>,
    timestamp: i64,
}

impl From<AdviceRow> for Record {
    fn from(row: AdviceRow) -> Self {
        Record {
            id: row.id,
            date_str: row.date_str,
            formatted_date: row.formatted_date,
            timestamp: row.timestamp,
            payload: Payload::Advice {
                advice: row.advice,
                photo_url: row.photo_url,
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct StatusRow {
    id: Uuid,
    date_str: String,
    formatted_date: String,
    bengels: Option<bool>,
    lekker_vreten: Option<bool>,
    korvel: Option<bool>,
    visdag: Option<bool>,
    burritos: Option<bool>,
    timestamp: i64,
}

impl From<StatusRow> for Record {
    fn from(row: StatusRow) -> Self {
        Record {
            id: row.id,
            date_str: row.date_str,
            formatted_date: row.formatted_date,
            timestamp: row.timestamp,
            payload: Payload::Status(StatusFlags {
                bengels: row.bengels,
                lekker_vreten: row.lekker_vreten,
                korvel: row.korvel,
                visdag: row.visdag,
                burritos: row.burritos,
            }),
        }
    }
}

#[derive(Debug, FromRow)]
struct DishPhotoRow {
    id: Uuid,
    date_str: String,
    formatted_date: String,
    dish_section: String,
    photo_url: String,
    uploader_name: String,
    comment: Option<String>,
    rating: Option<i16>,
    timestamp: i64,
}

impl From<DishPhotoRow> for Record {
    fn from(row: DishPhotoRow) -> Self {
        Record {
            id: row.id,
            date_str: row.date_str,
            formatted_date: row.formatted_date,
            timestamp: row.timestamp,
            payload: Payload::DishPhoto {
                dish_section: row.dish_section,
                photo_url: row.photo_url,
                uploader_name: row.uploader_name,
                comment: row.comment,
                // Rows from before ratings existed read back as 0.
                rating: row.rating.unwrap_or(0),
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct BurritoRow {
    id: Uuid,
    date_str: String,
    formatted_date: String,
    has_burritos: bool,
    timestamp: i64,
}

impl From<BurritoRow> for Record {
    fn from(row: BurritoRow) -> Self {
        Record {
            id: row.id,
            date_str: row.date_str,
            formatted_date: row.formatted_date,
            timestamp: row.timestamp,
            payload: Payload::Burrito {
                has_burritos: row.has_burritos,
            },
        }
    }
}

/// Explicit column list per table, in the order the row structs expect.
fn columns(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Menu => r#"id, date_str, formatted_date, items, "timestamp""#,
        EntryKind::Advice => r#"id, date_str, formatted_date, advice, photo_url, "timestamp""#,
        EntryKind::Status => {
            r#"id, date_str, formatted_date, bengels, lekker_vreten, korvel, visdag, burritos, "timestamp""#
        }
        EntryKind::DishPhoto => {
            r#"id, date_str, formatted_date, dish_section, photo_url, uploader_name, comment, rating, "timestamp""#
        }
        EntryKind::Burrito => r#"id, date_str, formatted_date, has_burritos, "timestamp""#,
    }
}

const NEWEST_FIRST: &str = r#"ORDER BY "timestamp" DESC, id DESC"#;

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch<R>(&self, sql: &str) -> anyhow::Result<Vec<Record>>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin + Into<Record>,
    {
        let rows = sqlx::query_as::<_, R>(sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn select(&self, kind: EntryKind, limit: Option<i64>) -> anyhow::Result<Vec<Record>> {
        let limit = limit.map(|n| format!(" LIMIT {n}")).unwrap_or_default();
        let sql = format!(
            "SELECT {} FROM {} {NEWEST_FIRST}{limit}",
            columns(kind),
            kind.table()
        );
        match kind {
            EntryKind::Menu => self.fetch::<MenuRow>(&sql).await,
            EntryKind::Advice => self.fetch::<AdviceRow>(&sql).await,
            EntryKind::Status => self.fetch::<StatusRow>(&sql).await,
            EntryKind::DishPhoto => self.fetch::<DishPhotoRow>(&sql).await,
            EntryKind::Burrito => self.fetch::<BurritoRow>(&sql).await,
        }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn append(&self, stamp: &RecordStamp, payload: &Payload) -> anyhow::Result<Record> {
        let kind = payload.kind();
        let cols = columns(kind);
        let table = kind.table();

        let record: Record = match payload {
            Payload::Menu { items } => sqlx::query_as::<_, MenuRow>(&format!(
                r#"INSERT INTO {table} (date_str, formatted_date, items, "timestamp")
                   VALUES ($1, $2, $3, $4)
                   RETURNING {cols}"#
            ))
            .bind(&stamp.date_str)
            .bind(&stamp.formatted_date)
            .bind(items)
            .bind(stamp.timestamp)
            .fetch_one(&self.pool)
            .await?
            .into(),
            Payload::Advice { advice, photo_url } => sqlx::query_as::<_, AdviceRow>(&format!(
                r#"INSERT INTO {table} (date_str, formatted_date, advice, photo_url, "timestamp")
                   VALUES ($1, $2, $3, $4, $5)
                   RETURNING {cols}"#
            ))
            .bind(&stamp.date_str)
            .bind(&stamp.formatted_date)
            .bind(advice)
            .bind(photo_url)
            .bind(stamp.timestamp)
            .fetch_one(&self.pool)
            .await?
            .into(),
            Payload::Status(flags) => sqlx::query_as::<_, StatusRow>(&format!(
                r#"INSERT INTO {table}
                       (date_str, formatted_date, bengels, lekker_vreten, korvel, visdag, burritos, "timestamp")
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                   RETURNING {cols}"#
            ))
            .bind(&stamp.date_str)
            .bind(&stamp.formatted_date)
            .bind(flags.bengels)
            .bind(flags.lekker_vreten)
            .bind(flags.korvel)
            .bind(flags.visdag)
            .bind(flags.burritos)
            .bind(stamp.timestamp)
            .fetch_one(&self.pool)
            .await?
            .into(),
            Payload::DishPhoto {
                dish_section,
                photo_url,
                uploader_name,
                comment,
                rating,
            } => sqlx::query_as::<_, DishPhotoRow>(&format!(
                r#"INSERT INTO {table}
                       (date_str, formatted_date, dish_section, photo_url, uploader_name, comment, rating, "timestamp")
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                   RETURNING {cols}"#
            ))
            .bind(&stamp.date_str)
            .bind(&stamp.formatted_date)
            .bind(dish_section)
            .bind(photo_url)
            .bind(uploader_name)
            .bind(comment)
            .bind(rating)
            .bind(stamp.timestamp)
            .fetch_one(&self.pool)
            .await?
            .into(),
            Payload::Burrito { has_burritos } => sqlx::query_as::<_, BurritoRow>(&format!(
                r#"INSERT INTO {table} (date_str, formatted_date, has_burritos, "timestamp")
                   VALUES ($1, $2, $3, $4)
                   RETURNING {cols}"#
            ))
            .bind(&stamp.date_str)
            .bind(&stamp.formatted_date)
            .bind(has_burritos)
            .bind(stamp.timestamp)
            .fetch_one(&self.pool)
            .await?
            .into(),
        };

        Ok(record)
    }

    async fn latest(&self, kind: EntryKind) -> anyhow::Result<Option<Record>> {
        Ok(self.select(kind, Some(1)).await?.into_iter().next())
    }

    async fn list(&self, kind: EntryKind) -> anyhow::Result<Vec<Record>> {
        self.select(kind, None).await
    }

    async fn dish_photos_on(&self, date_str: &str) -> anyhow::Result<Vec<Record>> {
        let rows = sqlx::query_as::<_, DishPhotoRow>(&format!(
            "SELECT {} FROM dish_photos WHERE date_str = $1 {NEWEST_FIRST}",
            columns(EntryKind::DishPhoto)
        ))
        .bind(date_str)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
